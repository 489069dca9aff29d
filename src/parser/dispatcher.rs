use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{NodeKey, ProxyNode};
use crate::parser::explodes::{
    explode_clash, explode_hysteria2, explode_ss, explode_ssr, explode_trojan, explode_vless,
    explode_vmess,
};
use crate::parser::fetcher::SubscriptionFetcher;

/// Declared shape of an input record. Only a hint: for URLs the fetched
/// body is re-detected, and the declared kind is never trusted past the
/// fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Url,
    Yaml,
    Json,
    Text,
}

type ParserFn = fn(&str, &mut Vec<ProxyNode>) -> bool;

/// Maps an input kind to the ordered parser set that runs over it.
///
/// Built once at startup and passed by reference; multiple parsers may
/// legitimately match different substrings of the same blob, so the full
/// set always runs.
pub struct ParserRegistry {
    text_parsers: Vec<(&'static str, ParserFn)>,
    yaml_parsers: Vec<(&'static str, ParserFn)>,
    json_parsers: Vec<(&'static str, ParserFn)>,
    fetcher: SubscriptionFetcher,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry {
            text_parsers: vec![
                ("vmess", explode_vmess as ParserFn),
                ("trojan", explode_trojan),
                ("ss", explode_ss),
                ("ssr", explode_ssr),
                ("clash", explode_clash),
                ("vless", explode_vless),
                ("hysteria2", explode_hysteria2),
            ],
            yaml_parsers: vec![("clash", explode_clash as ParserFn)],
            json_parsers: vec![
                ("vmess", explode_vmess as ParserFn),
                ("clash", explode_clash),
            ],
            fetcher: SubscriptionFetcher::default(),
        }
    }

    pub fn with_fetcher(fetcher: SubscriptionFetcher) -> Self {
        ParserRegistry {
            fetcher,
            ..Self::new()
        }
    }

    /// Parses content of a declared kind into a deduplicated node list.
    ///
    /// `Url` inputs are fetched first and the body's actual kind
    /// re-detected. Only fetch failures propagate; a parser that matches
    /// nothing is not an error, and the worst outcome is an empty list.
    pub async fn dispatch(&self, content: &str, kind: InputKind) -> Result<Vec<ProxyNode>> {
        let (content, kind) = match kind {
            InputKind::Url => {
                let body = self.fetcher.fetch(content.trim()).await?;
                let detected = detect_kind(&body);
                (body, detected)
            }
            other => (content.to_string(), other),
        };

        Ok(self.parse(&content, kind))
    }

    /// Runs the configured parser set for a non-URL kind and deduplicates.
    pub fn parse(&self, content: &str, kind: InputKind) -> Vec<ProxyNode> {
        let parsers = match kind {
            InputKind::Yaml => &self.yaml_parsers,
            InputKind::Json => &self.json_parsers,
            // a URL body that still looks like a URL is treated as text
            InputKind::Text | InputKind::Url => &self.text_parsers,
        };

        let mut all_nodes = Vec::new();
        for (name, parser) in parsers {
            if !parser(content, &mut all_nodes) {
                debug!("parser {} matched nothing", name);
            }
        }

        dedup_nodes(all_nodes)
    }
}

/// Auto-classifies a content blob. Detection order: URL scheme prefix,
/// `proxies:` YAML marker, JSON opening brace/bracket, any known link
/// scheme, plain text.
pub fn detect_kind(content: &str) -> InputKind {
    let trimmed = content.trim();

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return InputKind::Url;
    }
    if trimmed.starts_with("proxies:")
        || trimmed.starts_with("proxy-groups:")
        || trimmed.contains("proxies:")
    {
        return InputKind::Yaml;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return InputKind::Json;
    }

    // any known link scheme means parseable text; so does anything else,
    // since the text parser set is the widest
    InputKind::Text
}

/// First occurrence wins per `(address, port, type)` key.
fn dedup_nodes(nodes: Vec<ProxyNode>) -> Vec<ProxyNode> {
    let mut seen: HashSet<NodeKey> = HashSet::new();
    let mut unique = Vec::with_capacity(nodes.len());

    for node in nodes {
        if seen.insert(node.key()) {
            unique.push(node);
        } else {
            debug!("dropping duplicate node {}", node.key());
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind("https://example.com/sub"), InputKind::Url);
        assert_eq!(detect_kind("proxies:\n  - name: x"), InputKind::Yaml);
        assert_eq!(
            detect_kind("port: 7890\nproxies:\n  - name: x"),
            InputKind::Yaml
        );
        assert_eq!(detect_kind("{\"proxies\": []}"), InputKind::Json);
        assert_eq!(detect_kind("[{\"v\": \"2\"}]"), InputKind::Json);
        assert_eq!(detect_kind("trojan://p@h:443"), InputKind::Text);
        assert_eq!(detect_kind("anything else"), InputKind::Text);
    }

    #[test]
    fn test_parse_mixed_text_runs_all_parsers() {
        let registry = ParserRegistry::new();
        let content = format!(
            "trojan://pw@1.1.1.1:443#t\nss://{}@2.2.2.2:8388#s\nhy2://pw@3.3.3.3:443#h",
            base64_encode("aes-256-gcm:pass")
        );
        let nodes = registry.parse(&content, InputKind::Text);
        assert_eq!(nodes.len(), 3);
        let types: Vec<_> = nodes.iter().map(|n| n.node_type).collect();
        assert!(types.contains(&NodeType::Trojan));
        assert!(types.contains(&NodeType::Shadowsocks));
        assert!(types.contains(&NodeType::Hysteria2));
    }

    #[test]
    fn test_parse_dedup_first_wins() {
        let registry = ParserRegistry::new();
        let content = format!(
            "ss://{}@1.2.3.4:8443#first\nss://{}@1.2.3.4:8443#second",
            base64_encode("aes-256-gcm:a"),
            base64_encode("aes-256-gcm:b")
        );
        let nodes = registry.parse(&content, InputKind::Text);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "first");
    }

    #[test]
    fn test_parse_same_endpoint_different_types_kept() {
        let registry = ParserRegistry::new();
        let content = format!(
            "trojan://pw@1.2.3.4:443#t\nss://{}@1.2.3.4:443#s",
            base64_encode("aes-256-gcm:pass")
        );
        let nodes = registry.parse(&content, InputKind::Text);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_parse_yaml_kind_only_runs_clash() {
        let registry = ParserRegistry::new();
        // a trojan link inside a YAML-declared payload is not scanned
        let nodes = registry.parse("trojan://pw@1.1.1.1:443#t", InputKind::Yaml);
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_text_kind() {
        let registry = ParserRegistry::new();
        let nodes = registry
            .dispatch("trojan://pw@1.1.1.1:443#t", InputKind::Text)
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_bad_url_fails_with_fetch_error() {
        let registry = ParserRegistry::new();
        let err = registry.dispatch("::::", InputKind::Url).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Fetch(_)));
    }
}
