//! Raw output: one canonical link per node, the inverse of the parsers.

use crate::error::Result;
use crate::models::{filter_nodes, NodeFilter, NodeType, ProxyNode};
use crate::utils::base64::base64_encode;
use crate::utils::url::url_encode;

/// Generate a newline-delimited URI list covering every node type.
pub fn generate(nodes: &[ProxyNode], filter: Option<&NodeFilter>) -> Result<String> {
    let nodes = filter_nodes(nodes, filter);

    let links: Vec<String> = nodes
        .iter()
        .map(|node| match node.node_type {
            NodeType::VMess => vmess_link(node),
            NodeType::Trojan => trojan_link(node),
            NodeType::Shadowsocks => ss_link(node),
            NodeType::ShadowsocksR => ssr_link(node),
            NodeType::Vless => vless_link(node),
            NodeType::Hysteria2 => hysteria2_link(node),
        })
        .collect();

    Ok(links.join("\n"))
}

fn vmess_link(node: &ProxyNode) -> String {
    let config = super::v2rayn::vmess_config(node);
    format!("vmess://{}", base64_encode(&config.to_string()))
}

fn trojan_link(node: &ProxyNode) -> String {
    let mut link = format!(
        "trojan://{}@{}:{}",
        url_encode(node.password.as_deref().unwrap_or("")),
        node.address,
        node.port
    );
    if let Some(sni) = &node.sni {
        link.push_str(&format!("?sni={}", sni));
    }
    push_fragment(&mut link, node);
    link
}

fn ss_link(node: &ProxyNode) -> String {
    let secret = format!(
        "{}:{}",
        node.encryption.as_deref().unwrap_or("aes-256-gcm"),
        node.password.as_deref().unwrap_or("")
    );
    let mut link = format!(
        "ss://{}@{}:{}",
        base64_encode(&secret),
        node.address,
        node.port
    );
    push_fragment(&mut link, node);
    link
}

fn ssr_link(node: &ProxyNode) -> String {
    let inner = format!(
        "{}:{}:{}:{}:{}:{}",
        node.address,
        node.port,
        node.protocol.as_deref().unwrap_or("origin"),
        node.encryption.as_deref().unwrap_or("aes-256-cfb"),
        node.obfs.as_deref().unwrap_or("plain"),
        base64_encode(node.password.as_deref().unwrap_or(""))
    );
    let mut link = format!("ssr://{}", base64_encode(&inner));
    push_fragment(&mut link, node);
    link
}

fn vless_link(node: &ProxyNode) -> String {
    // Key order mirrors the set the parser recognizes.
    let params = [
        ("security", node.security.as_deref()),
        ("sni", node.sni.as_deref()),
        ("fp", node.fingerprint.as_deref()),
        ("pbk", node.public_key.as_deref()),
        ("sid", node.short_id.as_deref()),
        ("type", node.network.as_deref()),
        ("flow", node.flow.as_deref()),
        ("encryption", node.encryption.as_deref()),
        ("path", node.path.as_deref()),
        ("host", node.host.as_deref()),
    ];

    let mut link = format!(
        "vless://{}@{}:{}",
        node.uuid.as_deref().unwrap_or(""),
        node.address,
        node.port
    );
    push_query(&mut link, &params);
    push_fragment(&mut link, node);
    link
}

fn hysteria2_link(node: &ProxyNode) -> String {
    let insecure = node.insecure.map(bool_str);
    let fast_open = node.fast_open.map(bool_str);
    let lazy = node.lazy.map(bool_str);
    let params = [
        ("sni", node.sni.as_deref()),
        ("insecure", insecure),
        ("pinSHA256", node.pin_sha256.as_deref()),
        ("obfs", node.obfs.as_deref()),
        ("obfs-password", node.obfs_password.as_deref()),
        ("auth", node.auth.as_deref()),
        ("up", node.up.as_deref()),
        ("down", node.down.as_deref()),
        ("fastOpen", fast_open),
        ("lazy", lazy),
    ];

    let mut link = format!(
        "hy2://{}@{}:{}",
        url_encode(node.password.as_deref().unwrap_or("")),
        node.address,
        node.port
    );
    push_query(&mut link, &params);
    push_fragment(&mut link, node);
    link
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn push_query(link: &mut String, params: &[(&str, Option<&str>)]) {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, url_encode(v))))
        .collect();
    if !pairs.is_empty() {
        link.push('?');
        link.push_str(&pairs.join("&"));
    }
}

fn push_fragment(link: &mut String, node: &ProxyNode) {
    let name = node.display_name();
    if !name.is_empty() {
        link.push('#');
        link.push_str(&url_encode(&name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::explodes::{
        explode_hysteria2, explode_ss, explode_ssr, explode_trojan, explode_vless, explode_vmess,
    };

    #[test]
    fn test_vmess_round_trip() {
        let payload = r#"{"v":"2","ps":"HK-01","add":"example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","type":"none","host":"cdn.example.com","path":"/ws","tls":"tls","sni":"example.com"}"#;
        let link = format!("vmess://{}", base64_encode(payload));

        let mut first = Vec::new();
        assert!(explode_vmess(&link, &mut first));

        let output = generate(&first, None).unwrap();
        let mut second = Vec::new();
        assert!(explode_vmess(&output, &mut second));

        assert_eq!(first, second);
    }

    #[test]
    fn test_trojan_round_trip() {
        let mut first = Vec::new();
        assert!(explode_trojan(
            "trojan://p%40ss@example.com:443?sni=cdn.example.com#My%20Node",
            &mut first
        ));

        let output = generate(&first, None).unwrap();
        let mut second = Vec::new();
        assert!(explode_trojan(&output, &mut second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_ss_round_trip() {
        let mut first = Vec::new();
        assert!(explode_ss(
            "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8443#MyNode",
            &mut first
        ));

        let output = generate(&first, None).unwrap();
        assert!(output.starts_with("ss://"));
        let mut second = Vec::new();
        assert!(explode_ss(&output, &mut second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_ssr_round_trip() {
        let inner = format!(
            "example.com:8388:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:{}",
            base64_encode("pw")
        );
        let link = format!("ssr://{}", base64_encode(&inner));
        let mut first = Vec::new();
        assert!(explode_ssr(&link, &mut first));

        let output = generate(&first, None).unwrap();
        let mut second = Vec::new();
        assert!(explode_ssr(&output, &mut second));
        assert_eq!(first[0].address, second[0].address);
        assert_eq!(first[0].protocol, second[0].protocol);
        assert_eq!(first[0].obfs, second[0].obfs);
        assert_eq!(first[0].password, second[0].password);
    }

    #[test]
    fn test_vless_round_trip() {
        let link = "vless://b831381d-6324-4d53-ad4f-8cda48b30811@example.com:443?security=reality&sni=cdn.example.com&fp=chrome&pbk=pk123&sid=6ba85179&type=grpc&flow=xtls-rprx-vision&path=%2Fgrpc#US-01";
        let mut first = Vec::new();
        assert!(explode_vless(link, &mut first));

        let output = generate(&first, None).unwrap();
        let mut second = Vec::new();
        assert!(explode_vless(&output, &mut second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_hysteria2_round_trip() {
        let link = "hy2://pw@example.com:8443?sni=cdn.example.com&insecure=true&obfs=salamander&obfs-password=opw&up=100&down=500#SG-01";
        let mut first = Vec::new();
        assert!(explode_hysteria2(link, &mut first));

        let output = generate(&first, None).unwrap();
        let mut second = Vec::new();
        assert!(explode_hysteria2(&output, &mut second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_one_link_per_line() {
        let mut a = ProxyNode::new(NodeType::Shadowsocks, "a", "1.1.1.1", 443);
        a.encryption = Some("aes-256-gcm".to_string());
        a.password = Some("x".to_string());
        let mut b = ProxyNode::new(NodeType::Trojan, "b", "2.2.2.2", 443);
        b.password = Some("y".to_string());
        b.tls = true;

        let output = generate(&[a, b], None).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ss://"));
        assert!(lines[1].starts_with("trojan://"));
    }
}
