//! Canonical proxy node model.
//!
//! Every parser produces [`ProxyNode`] values and every generator consumes
//! them; the struct is the only currency between input and output formats.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Represents the protocol family of a proxy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    VMess,
    Trojan,
    #[serde(rename = "ss")]
    Shadowsocks,
    #[serde(rename = "ssr")]
    ShadowsocksR,
    Vless,
    Hysteria2,
}

impl NodeType {
    /// Wire name used in dedup keys, filters and output documents.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::VMess => "vmess",
            NodeType::Trojan => "trojan",
            NodeType::Shadowsocks => "ss",
            NodeType::ShadowsocksR => "ssr",
            NodeType::Vless => "vless",
            NodeType::Hysteria2 => "hysteria2",
        }
    }

    /// Label used when synthesizing a display name for an unnamed node.
    pub fn label(self) -> &'static str {
        match self {
            NodeType::VMess => "VMess",
            NodeType::Trojan => "Trojan",
            NodeType::Shadowsocks => "SS",
            NodeType::ShadowsocksR => "SSR",
            NodeType::Vless => "VLESS",
            NodeType::Hysteria2 => "Hysteria2",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime reachability state, owned by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Unknown,
    Active,
    Inactive,
    Error,
    Disabled,
}

/// Identity of a logically unique node: two descriptors with the same
/// address, port and type are the same node no matter what they are named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub address: String,
    pub port: u16,
    pub node_type: NodeType,
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.address, self.port, self.node_type)
    }
}

/// A normalized proxy endpoint, independent of source and target format.
///
/// Parsers fill the descriptor fields and the `country`/`region` enrichment
/// exactly once at creation time; afterwards only the status fields change,
/// and only the prober changes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyNode {
    pub name: String,
    pub node_type: NodeType,
    pub address: String,
    pub port: u16,

    // Credentials / crypto
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,

    // Transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,

    // VLESS / REALITY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    // SSR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    // Hysteria2 (obfs is shared with SSR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lazy: Option<bool>,

    // Enrichment derived from the display name at parse time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    // Runtime status, prober-owned
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
}

impl ProxyNode {
    /// Creates a node with the required fields set and everything else
    /// empty. Enrichment from the name happens here, once.
    pub fn new(node_type: NodeType, name: &str, address: &str, port: u16) -> Self {
        ProxyNode {
            name: name.to_string(),
            node_type,
            address: address.to_string(),
            port,
            uuid: None,
            alter_id: None,
            password: None,
            encryption: None,
            network: None,
            path: None,
            host: None,
            tls: false,
            sni: None,
            flow: None,
            security: None,
            public_key: None,
            short_id: None,
            fingerprint: None,
            protocol: None,
            obfs: None,
            obfs_password: None,
            auth: None,
            up: None,
            down: None,
            insecure: None,
            pin_sha256: None,
            fast_open: None,
            lazy: None,
            country: crate::utils::geo::infer_country(name),
            region: crate::utils::geo::infer_region(name),
            status: NodeStatus::Unknown,
            ping_latency: None,
            last_check: None,
        }
    }

    /// Dedup / probe-result identity.
    pub fn key(&self) -> NodeKey {
        NodeKey {
            address: self.address.clone(),
            port: self.port,
            node_type: self.node_type,
        }
    }

    /// Display label; an empty name falls back to `"<Type>-<address>"`.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{}-{}", self.node_type.label(), self.address)
        } else {
            self.name.clone()
        }
    }

    /// A node is usable only with a resolvable-looking address and a
    /// non-zero port. Candidates that fail this are dropped by the parser
    /// that produced them, without surfacing an error.
    pub fn is_valid(&self) -> bool {
        self.port != 0 && is_valid_address(&self.address)
    }
}

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Accepts IPv4/IPv6 literals (including bracketed IPv6) and domain names.
pub fn is_valid_address(address: &str) -> bool {
    if address.is_empty() {
        return false;
    }
    let bare = address.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return true;
    }
    DOMAIN_RE.is_match(address)
}
