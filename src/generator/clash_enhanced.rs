//! Enhanced Clash output: DNS block, region buckets, themed routing groups
//! and the extended rule table.

use log::debug;
use serde_yaml::{Mapping, Value};

use super::clash::node_to_clash_proxy;
use super::rules::{
    default_dns, DEFAULT_RULES, GROUP_AI, GROUP_APPLE, GROUP_AUTO, GROUP_BILIBILI, GROUP_DIRECT,
    GROUP_DOMESTIC_MEDIA, GROUP_FALLBACK, GROUP_FINAL, GROUP_FOREIGN_MEDIA, GROUP_GAMES,
    GROUP_GOOGLE, GROUP_LOAD_BALANCE, GROUP_MANUAL_1, GROUP_MANUAL_2, GROUP_MICROSOFT,
    GROUP_MUSIC, GROUP_NETFLIX, GROUP_REJECT, GROUP_TELEGRAM, GROUP_YOUTUBE, PROBE_URL,
    REGION_GROUPS,
};
use crate::error::{Error, Result};
use crate::models::{filter_nodes, NodeFilter, ProxyNode};
use crate::utils::geo::infer_country;

/// Generate the enhanced Clash document with the default rule table.
pub fn generate(nodes: &[ProxyNode], filter: Option<&NodeFilter>) -> Result<String> {
    let default_rules: Vec<String> = DEFAULT_RULES.iter().map(|r| r.to_string()).collect();
    generate_with_rules(nodes, filter, &default_rules)
}

/// Generate the enhanced Clash document with a caller-supplied rule table.
/// The list is emitted verbatim; the last entry should be a catch-all.
pub fn generate_with_rules(
    nodes: &[ProxyNode],
    filter: Option<&NodeFilter>,
    rules: &[String],
) -> Result<String> {
    let nodes = filter_nodes(nodes, filter);

    let mut proxies: Vec<Value> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    for node in &nodes {
        match node_to_clash_proxy(node, true) {
            Some(proxy) => {
                proxies.push(Value::Mapping(proxy));
                names.push(node.display_name());
            }
            None => debug!("enhanced clash generator skipping node {}", node.key()),
        }
    }

    let mut config = Mapping::new();
    config.insert("mixed-port".into(), 7890.into());
    config.insert("allow-lan".into(), true.into());
    config.insert("mode".into(), "rule".into());
    config.insert("log-level".into(), "info".into());
    config.insert("external-controller".into(), ":9090".into());
    config.insert("dns".into(), Value::Mapping(default_dns()));
    config.insert("proxies".into(), Value::Sequence(proxies));
    config.insert(
        "proxy-groups".into(),
        Value::Sequence(build_proxy_groups(&nodes, &names)),
    );
    config.insert(
        "rules".into(),
        Value::Sequence(rules.iter().map(|r| r.as_str().into()).collect()),
    );

    serde_yaml::to_string(&Value::Mapping(config))
        .map_err(|e| Error::Decode(format!("YAML serialization failed: {}", e)))
}

fn build_proxy_groups(nodes: &[ProxyNode], names: &[String]) -> Vec<Value> {
    if names.is_empty() {
        return Vec::new();
    }

    let mut groups = Vec::new();

    let mut auto = url_test_group(GROUP_AUTO, names.to_vec());
    auto.insert("tolerance".into(), 50.into());
    groups.push(Value::Mapping(auto));

    groups.push(Value::Mapping(select_group(
        GROUP_MANUAL_1,
        with_auto(names),
    )));
    groups.push(Value::Mapping(select_group(
        GROUP_MANUAL_2,
        with_auto(names),
    )));

    let mut fallback = Mapping::new();
    fallback.insert("name".into(), GROUP_FALLBACK.into());
    fallback.insert("type".into(), "fallback".into());
    fallback.insert("proxies".into(), name_seq(names.to_vec()));
    fallback.insert("url".into(), PROBE_URL.into());
    fallback.insert("interval".into(), 300.into());
    groups.push(Value::Mapping(fallback));

    let mut load_balance = Mapping::new();
    load_balance.insert("name".into(), GROUP_LOAD_BALANCE.into());
    load_balance.insert("type".into(), "load-balance".into());
    load_balance.insert("proxies".into(), name_seq(names.to_vec()));
    load_balance.insert("url".into(), PROBE_URL.into());
    load_balance.insert("interval".into(), 300.into());
    load_balance.insert("strategy".into(), "consistent-hashing".into());
    groups.push(Value::Mapping(load_balance));

    // Region buckets by the same inference tables used at parse time; only
    // buckets with more than one node become a group.
    for (country, label) in REGION_GROUPS {
        let members: Vec<String> = nodes
            .iter()
            .filter(|n| infer_country(&n.display_name()).as_deref() == Some(country))
            .map(|n| n.display_name())
            .collect();
        if members.len() > 1 {
            groups.push(Value::Mapping(url_test_group(label, members)));
        }
    }

    // Themed routing targets; ordering mirrors the rule table.
    for name in [GROUP_TELEGRAM, GROUP_AI, GROUP_YOUTUBE, GROUP_NETFLIX] {
        groups.push(Value::Mapping(select_group(name, with_auto(names))));
    }
    groups.push(Value::Mapping(select_group(
        GROUP_BILIBILI,
        vec![GROUP_DIRECT.to_string()],
    )));
    groups.push(Value::Mapping(select_group(
        GROUP_FOREIGN_MEDIA,
        with_auto(names),
    )));
    groups.push(Value::Mapping(select_group(
        GROUP_DOMESTIC_MEDIA,
        vec![GROUP_DIRECT.to_string()],
    )));
    groups.push(Value::Mapping(select_group(GROUP_GOOGLE, with_auto(names))));
    for name in [GROUP_MICROSOFT, GROUP_APPLE, GROUP_GAMES, GROUP_MUSIC] {
        groups.push(Value::Mapping(select_group(
            name,
            vec![GROUP_DIRECT.to_string()],
        )));
    }
    groups.push(Value::Mapping(select_group(
        GROUP_DIRECT,
        vec!["DIRECT".to_string()],
    )));
    groups.push(Value::Mapping(select_group(
        GROUP_REJECT,
        vec!["REJECT".to_string()],
    )));
    groups.push(Value::Mapping(select_group(GROUP_FINAL, with_auto(names))));

    groups
}

fn with_auto(names: &[String]) -> Vec<String> {
    let mut members = vec![GROUP_AUTO.to_string()];
    members.extend(names.iter().cloned());
    members
}

fn url_test_group(name: &str, members: Vec<String>) -> Mapping {
    let mut group = Mapping::new();
    group.insert("name".into(), name.into());
    group.insert("type".into(), "url-test".into());
    group.insert("proxies".into(), name_seq(members));
    group.insert("url".into(), PROBE_URL.into());
    group.insert("interval".into(), 300.into());
    group
}

fn select_group(name: &str, members: Vec<String>) -> Mapping {
    let mut group = Mapping::new();
    group.insert("name".into(), name.into());
    group.insert("type".into(), "select".into());
    group.insert("proxies".into(), name_seq(members));
    group
}

fn name_seq(names: Vec<String>) -> Value {
    Value::Sequence(names.into_iter().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;

    fn ss_node(name: &str) -> ProxyNode {
        let mut node = ProxyNode::new(NodeType::Shadowsocks, name, "1.2.3.4", 8388);
        node.encryption = Some("aes-256-gcm".to_string());
        node.password = Some("pw".to_string());
        node
    }

    fn nodes() -> Vec<ProxyNode> {
        let mut hk1 = ss_node("HK-01");
        hk1.address = "1.1.1.1".to_string();
        let mut hk2 = ss_node("HK-02");
        hk2.address = "2.2.2.2".to_string();
        let mut jp = ss_node("JP-01");
        jp.address = "3.3.3.3".to_string();
        vec![hk1, hk2, jp]
    }

    #[test]
    fn test_generate_enhanced_document_shape() {
        let output = generate(&nodes(), None).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();

        assert_eq!(doc["mixed-port"].as_u64(), Some(7890));
        assert_eq!(doc["allow-lan"].as_bool(), Some(true));
        assert_eq!(doc["dns"]["enable"].as_bool(), Some(true));
        assert_eq!(doc["proxies"].as_sequence().unwrap().len(), 3);

        let groups = doc["proxy-groups"].as_sequence().unwrap();
        assert_eq!(groups[0]["name"].as_str(), Some(GROUP_AUTO));
        assert_eq!(groups[0]["type"].as_str(), Some("url-test"));

        // catch-all stays last
        let rules = doc["rules"].as_sequence().unwrap();
        assert!(rules.last().unwrap().as_str().unwrap().starts_with("MATCH,"));
    }

    #[test]
    fn test_region_bucket_needs_two_nodes() {
        let output = generate(&nodes(), None).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        let group_names: Vec<&str> = doc["proxy-groups"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|g| g["name"].as_str().unwrap())
            .collect();

        // two HK nodes form a bucket, the lone JP node does not
        assert!(group_names.contains(&"🇭🇰 香港节点"));
        assert!(!group_names.contains(&"🇯🇵 日本节点"));
    }

    #[test]
    fn test_generate_with_custom_rules() {
        let rules = vec![
            "GEOIP,CN,🎯 全球直连".to_string(),
            "MATCH,🐟 漏网之鱼".to_string(),
        ];
        let output = generate_with_rules(&nodes(), None, &rules).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(doc["rules"].as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_groups() {
        let output = generate(&[], None).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert!(doc["proxy-groups"]
            .as_sequence()
            .map(|s| s.is_empty())
            .unwrap_or(true));
    }
}
