use log::debug;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::models::{filter_nodes, NodeFilter, NodeType, ProxyNode};

/// Rule table for the plain Clash output; the final rule is always the
/// catch-all and its ordering is part of the client contract.
const CLASH_RULES: [&str; 9] = [
    "DOMAIN-SUFFIX,local,DIRECT",
    "IP-CIDR,127.0.0.0/8,DIRECT",
    "IP-CIDR,172.16.0.0/12,DIRECT",
    "IP-CIDR,192.168.0.0/16,DIRECT",
    "IP-CIDR,10.0.0.0/8,DIRECT",
    "IP-CIDR,17.0.0.0/8,DIRECT",
    "IP-CIDR,100.64.0.0/10,DIRECT",
    "GEOIP,CN,DIRECT",
    "MATCH,Manual Select",
];

/// Generate a plain Clash YAML document from a node collection.
pub fn generate(nodes: &[ProxyNode], filter: Option<&NodeFilter>) -> Result<String> {
    let nodes = filter_nodes(nodes, filter);

    let mut proxies: Vec<Value> = Vec::new();
    let mut names: Vec<Value> = Vec::new();
    for node in &nodes {
        match node_to_clash_proxy(node, false) {
            Some(proxy) => {
                proxies.push(Value::Mapping(proxy));
                names.push(node.display_name().into());
            }
            None => debug!("clash generator skipping node {}", node.key()),
        }
    }

    let mut auto_group = Mapping::new();
    auto_group.insert("name".into(), "Auto Select".into());
    auto_group.insert("type".into(), "url-test".into());
    auto_group.insert("proxies".into(), Value::Sequence(names.clone()));
    auto_group.insert(
        "url".into(),
        "http://www.gstatic.com/generate_204".into(),
    );
    auto_group.insert("interval".into(), 300.into());

    let mut manual_members: Vec<Value> = vec!["Auto Select".into()];
    manual_members.extend(names);
    let mut manual_group = Mapping::new();
    manual_group.insert("name".into(), "Manual Select".into());
    manual_group.insert("type".into(), "select".into());
    manual_group.insert("proxies".into(), Value::Sequence(manual_members));

    let mut config = Mapping::new();
    config.insert("port".into(), 7890.into());
    config.insert("socks-port".into(), 7891.into());
    config.insert("allow-lan".into(), false.into());
    config.insert("mode".into(), "rule".into());
    config.insert("log-level".into(), "info".into());
    config.insert("external-controller".into(), "127.0.0.1:9090".into());
    config.insert("proxies".into(), Value::Sequence(proxies));
    config.insert(
        "proxy-groups".into(),
        Value::Sequence(vec![
            Value::Mapping(auto_group),
            Value::Mapping(manual_group),
        ]),
    );
    config.insert(
        "rules".into(),
        Value::Sequence(CLASH_RULES.iter().map(|r| (*r).into()).collect()),
    );

    serde_yaml::to_string(&Value::Mapping(config))
        .map_err(|e| Error::Decode(format!("YAML serialization failed: {}", e)))
}

/// Map one node to a Clash proxy mapping. Returns `None` for nothing today
/// (every supported family has a Clash rendering) but keeps the skip
/// contract of the other generators.
pub(crate) fn node_to_clash_proxy(node: &ProxyNode, udp: bool) -> Option<Mapping> {
    let mut proxy = Mapping::new();
    proxy.insert("name".into(), node.display_name().into());

    match node.node_type {
        NodeType::VMess => {
            proxy.insert("type".into(), "vmess".into());
            proxy.insert("server".into(), node.address.as_str().into());
            proxy.insert("port".into(), node.port.into());
            proxy.insert("uuid".into(), node.uuid.as_deref().unwrap_or("").into());
            proxy.insert("alterId".into(), node.alter_id.unwrap_or(0).into());
            proxy.insert("cipher".into(), "auto".into());
            let network = node.network.as_deref().unwrap_or("tcp");
            proxy.insert("network".into(), network.into());
            if udp {
                proxy.insert("udp".into(), true.into());
            }
            insert_transport_opts(&mut proxy, node, network);
            if node.tls {
                proxy.insert("tls".into(), true.into());
                if let Some(sni) = &node.sni {
                    proxy.insert("servername".into(), sni.as_str().into());
                }
            }
        }
        NodeType::Trojan => {
            proxy.insert("type".into(), "trojan".into());
            proxy.insert("server".into(), node.address.as_str().into());
            proxy.insert("port".into(), node.port.into());
            proxy.insert(
                "password".into(),
                node.password.as_deref().unwrap_or("").into(),
            );
            if udp {
                proxy.insert("udp".into(), true.into());
            }
            if node.tls {
                proxy.insert("tls".into(), true.into());
                if let Some(sni) = &node.sni {
                    proxy.insert("sni".into(), sni.as_str().into());
                }
            }
        }
        NodeType::Shadowsocks => {
            proxy.insert("type".into(), "ss".into());
            proxy.insert("server".into(), node.address.as_str().into());
            proxy.insert("port".into(), node.port.into());
            proxy.insert(
                "cipher".into(),
                node.encryption.as_deref().unwrap_or("aes-256-gcm").into(),
            );
            proxy.insert(
                "password".into(),
                node.password.as_deref().unwrap_or("").into(),
            );
            if udp {
                proxy.insert("udp".into(), true.into());
            }
        }
        NodeType::ShadowsocksR => {
            proxy.insert("type".into(), "ssr".into());
            proxy.insert("server".into(), node.address.as_str().into());
            proxy.insert("port".into(), node.port.into());
            proxy.insert(
                "cipher".into(),
                node.encryption.as_deref().unwrap_or("aes-256-cfb").into(),
            );
            proxy.insert(
                "password".into(),
                node.password.as_deref().unwrap_or("").into(),
            );
            proxy.insert(
                "obfs".into(),
                node.obfs.as_deref().unwrap_or("plain").into(),
            );
            proxy.insert(
                "protocol".into(),
                node.protocol.as_deref().unwrap_or("origin").into(),
            );
            if udp {
                proxy.insert("udp".into(), true.into());
            }
        }
        NodeType::Vless => {
            proxy.insert("type".into(), "vless".into());
            proxy.insert("server".into(), node.address.as_str().into());
            proxy.insert("port".into(), node.port.into());
            proxy.insert("uuid".into(), node.uuid.as_deref().unwrap_or("").into());
            let network = node.network.as_deref().unwrap_or("tcp");
            proxy.insert("network".into(), network.into());
            proxy.insert("flow".into(), node.flow.as_deref().unwrap_or("").into());
            proxy.insert(
                "encryption".into(),
                node.encryption.as_deref().unwrap_or("none").into(),
            );
            if udp {
                proxy.insert("udp".into(), true.into());
            }
            insert_transport_opts(&mut proxy, node, network);
            match node.security.as_deref() {
                Some("tls") => {
                    proxy.insert("tls".into(), true.into());
                    if let Some(sni) = &node.sni {
                        proxy.insert("servername".into(), sni.as_str().into());
                    }
                }
                Some("reality") => {
                    proxy.insert("tls".into(), true.into());
                    let mut reality = Mapping::new();
                    reality.insert(
                        "public-key".into(),
                        node.public_key.as_deref().unwrap_or("").into(),
                    );
                    reality.insert(
                        "short-id".into(),
                        node.short_id.as_deref().unwrap_or("").into(),
                    );
                    proxy.insert("reality-opts".into(), Value::Mapping(reality));
                    if let Some(sni) = &node.sni {
                        proxy.insert("servername".into(), sni.as_str().into());
                    }
                }
                _ => {}
            }
        }
        NodeType::Hysteria2 => {
            proxy.insert("type".into(), "hysteria2".into());
            proxy.insert("server".into(), node.address.as_str().into());
            proxy.insert("port".into(), node.port.into());
            proxy.insert(
                "password".into(),
                node.password.as_deref().unwrap_or("").into(),
            );
            if let Some(sni) = &node.sni {
                proxy.insert("sni".into(), sni.as_str().into());
            }
            proxy.insert("skip-cert-verify".into(), (!node.tls).into());
            if let Some(pin) = &node.pin_sha256 {
                proxy.insert("pinSHA256".into(), pin.as_str().into());
            }
            if let Some(obfs) = &node.obfs {
                proxy.insert("obfs".into(), obfs.as_str().into());
                if let Some(obfs_password) = &node.obfs_password {
                    proxy.insert("obfs-password".into(), obfs_password.as_str().into());
                }
            }
            if let Some(auth) = &node.auth {
                proxy.insert("auth".into(), auth.as_str().into());
            }
            if let Some(up) = &node.up {
                proxy.insert("up".into(), up.as_str().into());
            }
            if let Some(down) = &node.down {
                proxy.insert("down".into(), down.as_str().into());
            }
            if let Some(fast_open) = node.fast_open {
                proxy.insert("fast-open".into(), fast_open.into());
            }
            if let Some(lazy) = node.lazy {
                proxy.insert("lazy".into(), lazy.into());
            }
            if udp {
                proxy.insert("udp".into(), true.into());
            }
        }
    }

    Some(proxy)
}

/// Network-specific option blocks shared by the vmess and vless mappings.
fn insert_transport_opts(proxy: &mut Mapping, node: &ProxyNode, network: &str) {
    match network {
        "ws" => {
            let mut ws = Mapping::new();
            if let Some(path) = &node.path {
                ws.insert("path".into(), path.as_str().into());
            }
            if let Some(host) = &node.host {
                let mut headers = Mapping::new();
                headers.insert("Host".into(), host.as_str().into());
                ws.insert("headers".into(), Value::Mapping(headers));
            }
            if !ws.is_empty() {
                proxy.insert("ws-opts".into(), Value::Mapping(ws));
            }
        }
        "h2" => {
            let mut h2 = Mapping::new();
            if let Some(path) = &node.path {
                h2.insert("path".into(), path.as_str().into());
            }
            if let Some(host) = &node.host {
                h2.insert(
                    "host".into(),
                    Value::Sequence(vec![host.as_str().into()]),
                );
            }
            if !h2.is_empty() {
                proxy.insert("h2-opts".into(), Value::Mapping(h2));
            }
        }
        "grpc" => {
            if let Some(path) = &node.path {
                let mut grpc = Mapping::new();
                grpc.insert("grpc-service-name".into(), path.as_str().into());
                proxy.insert("grpc-opts".into(), Value::Mapping(grpc));
            }
        }
        _ => {}
    }
}
