//! subhub — parse, normalize, convert and probe proxy subscription nodes.
//!
//! The pipeline is: raw text → [`parser::ParserRegistry::dispatch`] →
//! deduplicated [`models::ProxyNode`] list → [`models::NodeFilter`] →
//! [`generator::generate`]. The [`probe::Prober`] independently tests
//! stored nodes for TCP reachability and latency.

pub mod error;
pub mod generator;
pub mod models;
pub mod parser;
pub mod probe;
pub mod utils;

pub use error::{Error, Result};
pub use generator::OutputFormat;
pub use models::{NodeFilter, NodeKey, NodeStatus, NodeType, ProxyNode};
pub use parser::{InputKind, ParserRegistry, SubscriptionFetcher};
pub use probe::{ProbeResult, Prober};
