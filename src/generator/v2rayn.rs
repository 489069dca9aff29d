//! V2RayN output: the whole node list as one opaque base64 blob.

use log::debug;
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::{filter_nodes, NodeFilter, NodeType, ProxyNode};
use crate::utils::base64::base64_encode;

/// Generate a V2RayN subscription document. VMess, Trojan and Shadowsocks
/// nodes are mapped into the VMess JSON-link schema, aggregated into one
/// JSON array and base64-encoded without a scheme prefix. Other node types
/// are skipped; an empty result encodes to an empty string.
pub fn generate(nodes: &[ProxyNode], filter: Option<&NodeFilter>) -> Result<String> {
    let nodes = filter_nodes(nodes, filter);

    let mut configs: Vec<Value> = Vec::new();
    for node in &nodes {
        match node.node_type {
            NodeType::VMess => configs.push(vmess_config(node)),
            NodeType::Trojan => configs.push(trojan_config(node)),
            NodeType::Shadowsocks => configs.push(ss_config(node)),
            _ => debug!("v2rayn generator skipping node {}", node.key()),
        }
    }

    if configs.is_empty() {
        return Ok(String::new());
    }

    let document = Value::Array(configs).to_string();
    Ok(base64_encode(&document))
}

/// VMess JSON-link schema shared by all three mappings: `v, ps, add, port,
/// id, aid, net, type, host, path, tls` plus `sni` when set.
pub(crate) fn vmess_config(node: &ProxyNode) -> Value {
    let mut config = json!({
        "v": "2",
        "ps": node.display_name(),
        "add": node.address,
        "port": node.port.to_string(),
        "id": node.uuid.as_deref().unwrap_or(""),
        "aid": node.alter_id.unwrap_or(0).to_string(),
        "net": node.network.as_deref().unwrap_or("tcp"),
        "type": "none",
        "host": node.host.as_deref().unwrap_or(""),
        "path": node.path.as_deref().unwrap_or(""),
        "tls": if node.tls { "tls" } else { "" },
    });
    if let Some(sni) = &node.sni {
        config["sni"] = Value::String(sni.clone());
    }
    config
}

fn trojan_config(node: &ProxyNode) -> Value {
    let mut config = json!({
        "v": "2",
        "ps": node.display_name(),
        "add": node.address,
        "port": node.port.to_string(),
        "id": node.password.as_deref().unwrap_or(""),
        "aid": "0",
        "net": "tcp",
        "type": "none",
        "host": "",
        "path": "",
        "tls": "tls",
    });
    if let Some(sni) = &node.sni {
        config["sni"] = Value::String(sni.clone());
    }
    config
}

fn ss_config(node: &ProxyNode) -> Value {
    json!({
        "v": "2",
        "ps": node.display_name(),
        "add": node.address,
        "port": node.port.to_string(),
        "id": node.password.as_deref().unwrap_or(""),
        "aid": "0",
        "net": "tcp",
        "type": "none",
        "host": "",
        "path": "",
        "tls": "",
    })
}
