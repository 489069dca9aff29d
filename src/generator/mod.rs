//! Output generators: one module per target format behind a single
//! registry-style entry point.

pub mod clash;
pub mod clash_enhanced;
pub mod raw;
pub mod rules;
pub mod v2rayn;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{NodeFilter, ProxyNode};

/// Supported subscription output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Clash,
    ClashEnhanced,
    V2rayn,
    Raw,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Clash => "clash",
            OutputFormat::ClashEnhanced => "clash_enhanced",
            OutputFormat::V2rayn => "v2rayn",
            OutputFormat::Raw => "raw",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "clash" => Ok(OutputFormat::Clash),
            "clash_enhanced" | "clash-enhanced" => Ok(OutputFormat::ClashEnhanced),
            "v2rayn" => Ok(OutputFormat::V2rayn),
            "raw" => Ok(OutputFormat::Raw),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Serialize a node collection into the requested format, applying the
/// filter first. Nodes a format cannot render are skipped, not errors.
pub fn generate(
    nodes: &[ProxyNode],
    format: OutputFormat,
    filter: Option<&NodeFilter>,
) -> Result<String> {
    match format {
        OutputFormat::Clash => clash::generate(nodes, filter),
        OutputFormat::ClashEnhanced => clash_enhanced::generate(nodes, filter),
        OutputFormat::V2rayn => v2rayn::generate(nodes, filter),
        OutputFormat::Raw => raw::generate(nodes, filter),
    }
}
