use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::{NodeType, ProxyNode};
use crate::utils::url::{parse_query, url_decode};

static VLESS_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"vless://([^@\s]+)@(\[[0-9a-fA-F:]+\]|[^:/?#\s]+):(\d+)(\?[^#\s]*)?(#[^\s]*)?")
        .unwrap()
});

/// Parse every `vless://<uuid>@<host>:<port>[?query][#fragment]` occurrence
/// in the text. `tls` is set iff `security` is `tls` or `reality`.
pub fn explode_vless(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for caps in VLESS_LINK_RE.captures_iter(content) {
        let uuid = caps[1].to_string();
        if Uuid::parse_str(&uuid).is_err() {
            log::debug!("skipping vless link with malformed uuid");
            continue;
        }
        let address = caps[2].to_string();
        let port = match caps[3].parse::<u16>() {
            Ok(p) => p,
            Err(_) => continue,
        };
        let query = caps.get(4).map(|m| m.as_str()).unwrap_or("");
        let fragment = caps.get(5).map(|m| m.as_str()).unwrap_or("");

        let name = if let Some(stripped) = fragment.strip_prefix('#') {
            url_decode(stripped)
        } else {
            format!("VLESS-{}", address)
        };

        let params = parse_query(query.strip_prefix('?').unwrap_or(""));
        let get = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

        let mut node = ProxyNode::new(NodeType::Vless, &name, &address, port);
        node.uuid = Some(uuid);
        node.security = get("security");
        node.sni = get("sni");
        node.fingerprint = get("fp");
        node.public_key = get("pbk");
        node.short_id = get("sid");
        node.network = get("type");
        node.flow = get("flow");
        node.encryption = get("encryption");
        node.path = get("path");
        node.host = get("host");
        node.tls = matches!(node.security.as_deref(), Some("tls") | Some("reality"));

        if node.is_valid() {
            nodes.push(node);
            success = true;
        }
    }

    success
}
