use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{NodeType, ProxyNode};
use crate::utils::base64::{base64_decode_any, decode_text};
use crate::utils::url::url_decode;

static SS_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ss://([A-Za-z0-9+/=_-]+)@(\[[0-9a-fA-F:]+\]|[^:/?#\s]+):(\d+)(#[^\s]*)?").unwrap()
});

/// Parse every `ss://<base64(method:password)>@<host>:<port>[#fragment]`
/// occurrence in the text.
pub fn explode_ss(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for caps in SS_LINK_RE.captures_iter(content) {
        // a vless:// link embeds the ss:// substring
        let start = caps.get(0).unwrap().start();
        if start > 0 && content.as_bytes()[start - 1].is_ascii_alphanumeric() {
            continue;
        }
        let encoded = &caps[1];
        let address = caps[2].to_string();
        let port = match caps[3].parse::<u16>() {
            Ok(p) => p,
            Err(_) => continue,
        };
        let fragment = caps.get(4).map(|m| m.as_str()).unwrap_or("");

        // The userinfo is base64(method:password); providers emit both the
        // standard and the URL-safe alphabet.
        let secret = match base64_decode_any(encoded) {
            Some(bytes) => decode_text(&bytes),
            None => continue,
        };
        let (method, password) = match secret.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };

        let name = if let Some(stripped) = fragment.strip_prefix('#') {
            url_decode(stripped)
        } else {
            format!("SS-{}", address)
        };

        let mut node = ProxyNode::new(NodeType::Shadowsocks, &name, &address, port);
        node.encryption = Some(method.to_string());
        node.password = Some(password.to_string());

        if node.is_valid() {
            nodes.push(node);
            success = true;
        }
    }

    success
}
