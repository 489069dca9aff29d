use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{NodeType, ProxyNode};
use crate::utils::url::{parse_query, url_decode};

static HY2_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"hy2://([^@\s]+)@(\[[0-9a-fA-F:]+\]|[^:/?#\s]+):(\d+)(\?[^#\s]*)?(#[^\s]*)?")
        .unwrap()
});

/// Parse every `hy2://<password>@<host>:<port>[?query][#fragment]`
/// occurrence in the text.
pub fn explode_hysteria2(content: &str, nodes: &mut Vec<ProxyNode>) -> bool {
    let mut success = false;

    for caps in HY2_LINK_RE.captures_iter(content) {
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
            format!("Hysteria2-{}", address)
        };

        let params = parse_query(query.strip_prefix('?').unwrap_or(""));
        let get = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        let get_bool = |key: &str| {
            params
                .get(key)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        };

        let mut node = ProxyNode::new(NodeType::Hysteria2, &name, &address, port);
        node.password = Some(password);
        node.sni = get("sni");
        node.insecure = get_bool("insecure");
        node.pin_sha256 = get("pinSHA256");
        node.obfs = get("obfs");
        node.obfs_password = get("obfs-password");
        node.auth = get("auth");
        node.up = get("up");
        node.down = get("down");
        node.fast_open = get_bool("fastOpen");
        node.lazy = get_bool("lazy");
        // hy2 endpoints are always TLS-fronted; insecure only skips verification
        node.tls = true;

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
    fn test_explode_hysteria2_full_query() {
        let link = "hy2://pass@example.com:8443?sni=cdn.example.com&insecure=true&pinSHA256=ab%3Acd&obfs=salamander&obfs-password=obfspw&auth=authstr&up=100&down=500&fastOpen=true&lazy=false#SG%20Fast";
        let mut nodes = Vec::new();
        assert!(explode_hysteria2(link, &mut nodes));
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.node_type, NodeType::Hysteria2);
        assert_eq!(node.name, "SG Fast");
        assert_eq!(node.address, "example.com");
        assert_eq!(node.port, 8443);
        assert_eq!(node.password.as_deref(), Some("pass"));
        assert_eq!(node.sni.as_deref(), Some("cdn.example.com"));
        assert_eq!(node.insecure, Some(true));
        assert_eq!(node.pin_sha256.as_deref(), Some("ab:cd"));
        assert_eq!(node.obfs.as_deref(), Some("salamander"));
        assert_eq!(node.obfs_password.as_deref(), Some("obfspw"));
        assert_eq!(node.auth.as_deref(), Some("authstr"));
        assert_eq!(node.up.as_deref(), Some("100"));
        assert_eq!(node.down.as_deref(), Some("500"));
        assert_eq!(node.fast_open, Some(true));
        assert_eq!(node.lazy, Some(false));
        assert_eq!(node.country.as_deref(), Some("SG"));
    }

    #[test]
    fn test_explode_hysteria2_minimal() {
        let mut nodes = Vec::new();
        assert!(explode_hysteria2("hy2://pw@1.2.3.4:443", &mut nodes));
        let node = &nodes[0];
        assert_eq!(node.name, "Hysteria2-1.2.3.4");
        assert!(node.sni.is_none());
        assert!(node.insecure.is_none());
    }

    #[test]
    fn test_explode_hysteria2_case_insensitive_bools() {
        let mut nodes = Vec::new();
        assert!(explode_hysteria2(
            "hy2://pw@1.2.3.4:443?insecure=TRUE&fastOpen=False",
            &mut nodes
        ));
        assert_eq!(nodes[0].insecure, Some(true));
        assert_eq!(nodes[0].fast_open, Some(false));
    }

    #[test]
    fn test_explode_hysteria2_rejects_bad_port() {
        let mut nodes = Vec::new();
        assert!(!explode_hysteria2("hy2://pw@1.2.3.4:70000", &mut nodes));
    }
}
