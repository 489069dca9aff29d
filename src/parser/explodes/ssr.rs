use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{NodeType, ProxyNode};
use crate::utils::base64::{base64_decode_any, decode_text};
use crate::utils::url::url_decode;

static SSR_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ssr://([A-Za-z0-9+/=_-]+)(#[^\s]*)?").unwrap());

/// Parse every `ssr://<base64>` occurrence in the text. The payload is
/// `host:port:protocol:method:obfs:base64(password)[/?obfsparam=...]`,
/// optionally followed by a plain `#fragment` outside the base64.
pub fn explode_ssr(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for caps in SSR_LINK_RE.captures_iter(content) {
        let decoded = match base64_decode_any(&caps[1]) {
            Some(bytes) => decode_text(&bytes),
            None => continue,
        };
        let fragment = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        let parts: Vec<&str> = decoded.split(':').collect();
        if parts.len() < 6 {
            continue;
        }

        let address = parts[0];
        let port = match parts[1].parse::<u16>() {
            Ok(p) => p,
            Err(_) => continue,
        };
        let protocol = parts[2];
        let method = parts[3];
        let obfs = parts[4];

        // The tail is base64(password), possibly followed by /?key=value
        // parameters that are themselves base64-encoded.
        let tail = parts[5..].join(":");
        let (password_part, params_part) = match tail.split_once("/?") {
            Some((p, q)) => (p, Some(q)),
            None => (tail.as_str(), None),
        };
        let password = match base64_decode_any(password_part) {
            Some(bytes) => decode_text(&bytes),
            None => continue,
        };

        let mut obfs_param = None;
        let mut remarks = None;
        if let Some(params) = params_part {
            for pair in params.split('&') {
                if let Some((key, value)) = pair.split_once('=') {
                    let decoded_value = base64_decode_any(value).map(|b| decode_text(&b));
                    match key {
                        "obfsparam" => obfs_param = decoded_value,
                        "remarks" => remarks = decoded_value,
                        _ => {}
                    }
                }
            }
        }

        let name = if let Some(stripped) = fragment.strip_prefix('#') {
            url_decode(stripped)
        } else if let Some(remarks) = remarks {
            remarks
        } else {
            format!("SSR-{}", address)
        };

        let mut node = ProxyNode::new(NodeType::ShadowsocksR, &name, address, port);
        node.encryption = Some(method.to_string());
        node.password = Some(password);
        node.protocol = Some(if protocol.is_empty() {
            "origin".to_string()
        } else {
            protocol.to_string()
        });
        node.obfs = Some(if obfs.is_empty() {
            "plain".to_string()
        } else {
            obfs.to_string()
        });
        node.obfs_password = obfs_param;

        if node.is_valid() {
            nodes.push(node);
            success = true;
        }
    }

    success
}
