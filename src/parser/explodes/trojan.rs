use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{NodeType, ProxyNode};
use crate::utils::url::{parse_query, url_decode};

static TROJAN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"trojan://([^@\s]+)@(\[[0-9a-fA-F:]+\]|[^:/?#\s]+):(\d+)(\?[^#\s]*)?(#[^\s]*)?").unwrap());

/// Parse every `trojan://<password>@<host>:<port>[?query][#fragment]`
/// occurrence in the text. TLS is implied by the scheme.
pub fn explode_trojan(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for caps in TROJAN_LINK_RE.captures_iter(content) {
        let password = url_decode(&caps[1]);
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
            format!("Trojan-{}", address)
        };

        let params = parse_query(query.strip_prefix('?').unwrap_or(""));

        let mut node = ProxyNode::new(NodeType::Trojan, &name, &address, port);
        node.password = Some(password);
        node.tls = true;
        node.sni = params.get("sni").filter(|s| !s.is_empty()).cloned();

        if node.is_valid() {
            nodes.push(node);
            success = true;
        }
    }

    success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explode_trojan_basic() {
        let mut nodes = Vec::new();
        let result = explode_trojan(
            "trojan://secret@example.com:443?sni=cdn.example.com#HK%20Node",
            &mut nodes,
        );

        assert!(result);
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.node_type, NodeType::Trojan);
        assert_eq!(node.name, "HK Node");
        assert_eq!(node.address, "example.com");
        assert_eq!(node.port, 443);
        assert_eq!(node.password.as_deref(), Some("secret"));
        assert!(node.tls);
        assert_eq!(node.sni.as_deref(), Some("cdn.example.com"));
        assert_eq!(node.country.as_deref(), Some("HK"));
    }

    #[test]
    fn test_explode_trojan_percent_encoded_password() {
        let mut nodes = Vec::new();
        assert!(explode_trojan(
            "trojan://p%40ss%3Aword@1.2.3.4:8443",
            &mut nodes
        ));
        assert_eq!(nodes[0].password.as_deref(), Some("p@ss:word"));
        assert_eq!(nodes[0].name, "Trojan-1.2.3.4");
        assert!(nodes[0].sni.is_none());
    }

    #[test]
    fn test_explode_trojan_multiple_links() {
        let text = "trojan://a@1.1.1.1:443#one\ntrojan://b@2.2.2.2:443#two";
        let mut nodes = Vec::new();
        assert!(explode_trojan(text, &mut nodes));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "one");
        assert_eq!(nodes[1].name, "two");
    }

    #[test]
    fn test_explode_trojan_rejects_malformed() {
        let mut nodes = Vec::new();
        assert!(!explode_trojan("trojan://nohostport", &mut nodes));
        assert!(!explode_trojan("trojan://p@host:99999", &mut nodes));
        assert!(nodes.is_empty());
    }
}
