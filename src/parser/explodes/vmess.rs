use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{NodeType, ProxyNode};
use crate::utils::base64::{
    base64_decode, decode_base64_text, decode_text, is_base64_content, strip_whitespace,
};

static VMESS_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vmess://([A-Za-z0-9+/=_-]+)").unwrap());

/// Parse VMess descriptors out of arbitrary text into a vector of nodes.
///
/// Accepts a bare base64 subscription blob, any number of
/// `vmess://<base64-json>` links embedded in the text, or a structured JSON
/// document (an `outbounds` array, a single `{v, ps, ...}` object, or an
/// array of such objects). Malformed candidates are skipped.
pub fn explode_vmess(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return false;
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return explode_vmess_json(trimmed, nodes);
    }

    // A whole-body base64 blob usually wraps a newline-separated link list.
    if !trimmed.contains("vmess://") && is_base64_content(trimmed) {
        let decoded = decode_base64_text(trimmed);
        return explode_vmess_links(&decoded, nodes);
    }

    explode_vmess_links(content, nodes)
}

/// Parse every `vmess://<base64-json>` occurrence in the text.
fn explode_vmess_links(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for caps in VMESS_LINK_RE.captures_iter(content) {
        let encoded = strip_whitespace(&caps[1]);
        let payload = match base64_decode(&encoded) {
            Some(bytes) => decode_text(&bytes),
            None => {
                log::debug!("skipping vmess link with invalid base64 payload");
                continue;
            }
        };

        let json: Value = match serde_json::from_str(&payload) {
            Ok(json) => json,
            Err(_) => continue,
        };

        if let Some(node) = vmess_node_from_json(&json) {
            nodes.push(node);
            success = true;
        }
    }

    success
}

/// Parse a structured JSON document: V2Ray `outbounds`, a single link
/// payload object, or an array of payload objects.
fn explode_vmess_json(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return false,
    };

    let mut success = false;

    if json["outbounds"].is_array() {
        for outbound in json["outbounds"].as_array().unwrap() {
            if outbound["protocol"].as_str().unwrap_or("") != "vmess" {
                continue;
            }
            if let Some(node) = vmess_node_from_outbound(outbound) {
                nodes.push(node);
                success = true;
            }
        }
        return success;
    }

    if json.is_object() && !json["v"].is_null() && !json["ps"].is_null() {
        if let Some(node) = vmess_node_from_json(&json) {
            nodes.push(node);
            success = true;
        }
        return success;
    }

    if let Some(entries) = json.as_array() {
        for entry in entries {
            if entry.is_object() && !entry["v"].is_null() && !entry["ps"].is_null() {
                if let Some(node) = vmess_node_from_json(entry) {
                    nodes.push(node);
                    success = true;
                }
            }
        }
    }

    success
}

/// Build a node from the standard link payload `{v, ps, add, port, id, aid,
/// net, type, host, path, tls, sni}`. Port and aid may be strings or numbers.
fn vmess_node_from_json(json: &Value) -> Option<ProxyNode> {
    let add = json["add"].as_str().unwrap_or("");
    let port = int_or_string(&json["port"]).filter(|p| *p <= u16::MAX as u64)? as u16;
    let name = json["ps"].as_str().unwrap_or("");

    let mut node = ProxyNode::new(NodeType::VMess, name, add, port);
    node.uuid = non_empty(json["id"].as_str().unwrap_or(""));
    node.alter_id = Some(int_or_string(&json["aid"]).unwrap_or(0) as u16);
    node.network = Some(
        json["net"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("tcp")
            .to_string(),
    );
    node.path = non_empty(json["path"].as_str().unwrap_or(""));
    node.host = non_empty(json["host"].as_str().unwrap_or(""));
    node.tls = json["tls"].as_str().map(|s| s == "tls").unwrap_or_else(|| {
        json["tls"].as_bool().unwrap_or(false)
    });
    node.sni = non_empty(json["sni"].as_str().unwrap_or(""));

    if node.is_valid() {
        Some(node)
    } else {
        None
    }
}

/// Build a node from a V2Ray outbound object (`settings.vnext[0]` server,
/// first user, plus `streamSettings`).
fn vmess_node_from_outbound(outbound: &Value) -> Option<ProxyNode> {
    let server = outbound["settings"]["vnext"].as_array()?.first()?;
    let address = server["address"].as_str().unwrap_or("");
    let port = server["port"].as_u64().unwrap_or(0) as u16;
    let user = server["users"].as_array()?.first()?;

    let stream = &outbound["streamSettings"];
    let network = stream["network"].as_str().unwrap_or("tcp");

    let mut node = ProxyNode::new(NodeType::VMess, "", address, port);
    node.uuid = non_empty(user["id"].as_str().unwrap_or(""));
    node.alter_id = Some(user["alterId"].as_u64().unwrap_or(0) as u16);
    node.network = Some(network.to_string());

    match network {
        "ws" => {
            node.path = non_empty(stream["wsSettings"]["path"].as_str().unwrap_or(""));
            node.host = non_empty(
                stream["wsSettings"]["headers"]["Host"]
                    .as_str()
                    .unwrap_or(""),
            );
        }
        "h2" => {
            node.path = non_empty(stream["httpSettings"]["path"].as_str().unwrap_or(""));
            if let Some(hosts) = stream["httpSettings"]["host"].as_array() {
                node.host = hosts.first().and_then(|h| h.as_str()).map(String::from);
            }
        }
        "grpc" => {
            node.path = non_empty(
                stream["grpcSettings"]["serviceName"]
                    .as_str()
                    .unwrap_or(""),
            );
        }
        _ => {}
    }

    if stream["security"].as_str().unwrap_or("") == "tls" {
        node.tls = true;
        node.sni = non_empty(stream["tlsSettings"]["serverName"].as_str().unwrap_or(""));
    }

    if node.is_valid() {
        Some(node)
    } else {
        None
    }
}

fn int_or_string(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
