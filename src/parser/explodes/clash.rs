use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::models::{NodeType, ProxyNode};

/// One proxy entry of a Clash `proxies` list. The `type` tag selects the
/// variant; entries with unsupported types fail to deserialize and are
/// skipped individually.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClashProxyInput {
    #[serde(rename = "vmess")]
    VMess {
        #[serde(default)]
        name: String,
        server: String,
        port: u16,
        #[serde(default)]
        uuid: String,
        #[serde(rename = "alterId", default)]
        alter_id: u16,
        #[serde(default)]
        network: Option<String>,
        #[serde(rename = "ws-path", default)]
        ws_path: Option<String>,
        #[serde(rename = "ws-headers", default)]
        ws_headers: Option<HashMap<String, String>>,
        #[serde(rename = "ws-opts", default)]
        ws_opts: Option<WsOpts>,
        #[serde(default)]
        tls: bool,
        #[serde(default)]
        servername: Option<String>,
    },
    #[serde(rename = "trojan")]
    Trojan {
        #[serde(default)]
        name: String,
        server: String,
        port: u16,
        #[serde(default)]
        password: String,
        #[serde(default = "default_true")]
        tls: bool,
        #[serde(default)]
        sni: Option<String>,
    },
    #[serde(rename = "ss")]
    Shadowsocks {
        #[serde(default)]
        name: String,
        server: String,
        port: u16,
        #[serde(default)]
        cipher: String,
        #[serde(default)]
        password: String,
    },
    #[serde(rename = "ssr")]
    ShadowsocksR {
        #[serde(default)]
        name: String,
        server: String,
        port: u16,
        #[serde(default)]
        cipher: String,
        #[serde(default)]
        password: String,
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        obfs: Option<String>,
        #[serde(rename = "obfs-param", default)]
        obfs_param: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct WsOpts {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
}

fn default_true() -> bool {
    true
}

/// Parse a Clash bundle (YAML or JSON document with a `proxies` list) into
/// a vector of nodes. When strict parsing fails or yields nothing, a
/// permissive line scanner picks up inline `- { key: value, ... }` entries.
pub fn explode_clash(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    // serde_yaml accepts JSON as well, so one strict pass covers both.
    if let Ok(doc) = serde_yaml::from_str::<Value>(content) {
        if let Some(proxies) = doc.get("proxies").and_then(Value::as_sequence) {
            for proxy in proxies {
                match serde_yaml::from_value::<ClashProxyInput>(proxy.clone()) {
                    Ok(input) => {
                        if let Some(node) = convert_proxy(input) {
                            nodes.push(node);
                            success = true;
                        }
                    }
                    Err(e) => log::debug!("skipping clash proxy entry: {}", e),
                }
            }
        }
    }

    if !success {
        success = explode_clash_inline(content, nodes);
    }

    success
}

static INLINE_PROXY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*\{([^}]+)\}").unwrap());
static INLINE_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w-]+):\s*("[^"]*"|'[^']*'|[^,}]+)"#).unwrap());

/// Degenerate line-oriented variant: each proxy is a `- { key: value, ... }`
/// fragment. Values are rebuilt into a YAML mapping and routed through the
/// same typed conversion as the strict path.
fn explode_clash_inline(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for line in content.lines() {
        let caps = match INLINE_PROXY_RE.captures(line) {
            Some(c) => c,
            None => continue,
        };

        let mut mapping = serde_yaml::Mapping::new();
        for pair in INLINE_PAIR_RE.captures_iter(&caps[1]) {
            let key = pair[1].to_string();
            let raw = pair[2].trim();
            let unquoted = raw
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
                .unwrap_or(raw);

            let value = if key == "port" || key == "alterId" {
                match unquoted.parse::<u64>() {
                    Ok(n) => Value::Number(n.into()),
                    Err(_) => Value::String(unquoted.to_string()),
                }
            } else if key == "udp" || key == "tls" {
                Value::Bool(matches!(unquoted.to_lowercase().as_str(), "true" | "1" | "yes"))
            } else {
                Value::String(unquoted.to_string())
            };
            mapping.insert(Value::String(key), value);
        }

        if let Ok(input) = serde_yaml::from_value::<ClashProxyInput>(Value::Mapping(mapping)) {
            if let Some(node) = convert_proxy(input) {
                nodes.push(node);
                success = true;
            }
        }
    }

    success
}

fn convert_proxy(input: ClashProxyInput) -> Option<ProxyNode> {
    let node = match input {
        ClashProxyInput::VMess {
            name,
            server,
            port,
            uuid,
            alter_id,
            network,
            ws_path,
            ws_headers,
            ws_opts,
            tls,
            servername,
        } => {
            let mut node = ProxyNode::new(NodeType::VMess, &name, &server, port);
            node.uuid = Some(uuid);
            node.alter_id = Some(alter_id);
            node.network = Some(network.unwrap_or_else(|| "tcp".to_string()));
            let opts = ws_opts.unwrap_or_default();
            node.path = opts.path.or(ws_path);
            node.host = opts
                .headers
                .and_then(|h| h.get("Host").cloned())
                .or_else(|| ws_headers.and_then(|h| h.get("Host").cloned()));
            node.tls = tls;
            node.sni = servername;
            node
        }
        ClashProxyInput::Trojan {
            name,
            server,
            port,
            password,
            tls,
            sni,
        } => {
            let mut node = ProxyNode::new(NodeType::Trojan, &name, &server, port);
            node.password = Some(password);
            node.tls = tls;
            node.sni = sni;
            node
        }
        ClashProxyInput::Shadowsocks {
            name,
            server,
            port,
            cipher,
            password,
        } => {
            let mut node = ProxyNode::new(NodeType::Shadowsocks, &name, &server, port);
            node.encryption = Some(cipher);
            node.password = Some(password);
            node
        }
        ClashProxyInput::ShadowsocksR {
            name,
            server,
            port,
            cipher,
            password,
            protocol,
            obfs,
            obfs_param,
        } => {
            let mut node = ProxyNode::new(NodeType::ShadowsocksR, &name, &server, port);
            node.encryption = Some(cipher);
            node.password = Some(password);
            node.protocol = Some(protocol.unwrap_or_else(|| "origin".to_string()));
            node.obfs = Some(obfs.unwrap_or_else(|| "plain".to_string()));
            node.obfs_password = obfs_param;
            node
        }
    };

    if node.is_valid() {
        Some(node)
    } else {
        None
    }
}
