//! End-to-end pipeline tests: mixed text in, subscription documents out.

use subhub::generator::{self, OutputFormat};
use subhub::models::{NodeFilter, NodeType};
use subhub::parser::{detect_kind, InputKind, ParserRegistry};

fn mixed_input() -> String {
    // base64("aes-256-gcm:pass") = YWVzLTI1Ni1nY206cGFzcw==
    let vmess_payload = r#"{"v":"2","ps":"HK-01","add":"hk.example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","type":"none","host":"","path":"/ws","tls":"tls"}"#;
    format!(
        "vmess://{}\n\
         ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8443#JP-01\n\
         trojan://pw@trojan.example.com:443?sni=trojan.example.com#US%20Node\n\
         hy2://pw@hy2.example.com:8443?sni=hy2.example.com#SG-01",
        subhub::utils::base64::base64_encode(vmess_payload)
    )
}

#[tokio::test]
async fn test_text_to_clash_pipeline() {
    let input = mixed_input();
    assert_eq!(detect_kind(&input), InputKind::Text);

    let registry = ParserRegistry::new();
    let nodes = registry.dispatch(&input, InputKind::Text).await.unwrap();
    assert_eq!(nodes.len(), 4);

    let output = generator::generate(&nodes, OutputFormat::Clash, None).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    let proxies = doc["proxies"].as_sequence().unwrap();
    assert_eq!(proxies.len(), 4);

    let names: Vec<&str> = proxies
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"HK-01"));
    assert!(names.contains(&"US Node"));
}

#[tokio::test]
async fn test_pipeline_with_country_filter() {
    let registry = ParserRegistry::new();
    let nodes = registry
        .dispatch(&mixed_input(), InputKind::Text)
        .await
        .unwrap();

    let filter = NodeFilter {
        countries: Some(vec!["HK".to_string()]),
        ..Default::default()
    };
    let output = generator::generate(&nodes, OutputFormat::Raw, Some(&filter)).unwrap();
    assert_eq!(output.lines().count(), 1);
    assert!(output.starts_with("vmess://"));
}

#[tokio::test]
async fn test_yaml_bundle_to_v2rayn_pipeline() {
    let yaml = r#"
proxies:
  - name: "bundle-ss"
    type: ss
    server: 5.6.7.8
    port: 8388
    cipher: aes-256-gcm
    password: secret
  - name: "bundle-trojan"
    type: trojan
    server: t.example.com
    port: 443
    password: pw
"#;
    assert_eq!(detect_kind(yaml), InputKind::Yaml);

    let registry = ParserRegistry::new();
    let nodes = registry.dispatch(yaml, InputKind::Yaml).await.unwrap();
    assert_eq!(nodes.len(), 2);

    let output = generator::generate(&nodes, OutputFormat::V2rayn, None).unwrap();
    let decoded = subhub::utils::base64::base64_decode(&output).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_descriptors_across_formats_deduplicate() {
    // the same endpoint delivered as a link and as a clash bundle entry
    let input = "ss://YWVzLTI1Ni1nY206cGFzcw==@9.9.9.9:443#from-link\n\
                 proxies:\n\
                 \x20\x20- { name: from-bundle, type: ss, server: 9.9.9.9, port: 443, cipher: aes-256-gcm, password: pass }";

    let registry = ParserRegistry::new();
    let nodes = registry.dispatch(input, InputKind::Text).await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].node_type, NodeType::Shadowsocks);
    // the link parser runs before the clash parser, so its name wins
    assert_eq!(nodes[0].name, "from-link");
}

#[tokio::test]
async fn test_raw_output_reparses_to_same_nodes() {
    let registry = ParserRegistry::new();
    let first = registry
        .dispatch(&mixed_input(), InputKind::Text)
        .await
        .unwrap();

    let raw = generator::generate(&first, OutputFormat::Raw, None).unwrap();
    let second = registry.dispatch(&raw, InputKind::Text).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.key(), b.key());
        assert_eq!(a.name, b.name);
    }
}
