//! Node filtering.
//!
//! A [`NodeFilter`] is a conjunction of optional predicates; omitted fields
//! are no-ops. The application order below is fixed for short-circuiting
//! only — the conjunction is commutative, so any order yields the same set.

use serde::{Deserialize, Serialize};

use super::node::{NodeType, ProxyNode};

/// Inclusion/exclusion predicates applied before generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_types: Option<Vec<NodeType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_keywords: Option<Vec<String>>,
}

impl NodeFilter {
    /// True when the node passes every configured predicate.
    pub fn matches(&self, node: &ProxyNode) -> bool {
        if let Some(countries) = &self.countries {
            match &node.country {
                Some(country) if countries.contains(country) => {}
                _ => return false,
            }
        }

        if let Some(regions) = &self.regions {
            match &node.region {
                Some(region) if regions.contains(region) => {}
                _ => return false,
            }
        }

        if let Some(types) = &self.node_types {
            if !types.contains(&node.node_type) {
                return false;
            }
        }

        // Unknown latency always passes; only a measured latency above the
        // ceiling excludes a node.
        if let Some(max_latency) = self.max_latency {
            if let Some(latency) = node.ping_latency {
                if latency > max_latency {
                    return false;
                }
            }
        }

        let name_lower = node.name.to_lowercase();

        if let Some(excludes) = &self.exclude_keywords {
            if excludes
                .iter()
                .any(|kw| name_lower.contains(&kw.to_lowercase()))
            {
                return false;
            }
        }

        if let Some(includes) = &self.include_keywords {
            if !includes.is_empty()
                && !includes
                    .iter()
                    .any(|kw| name_lower.contains(&kw.to_lowercase()))
            {
                return false;
            }
        }

        true
    }
}

/// Applies an optional filter to a node collection. Pure: the input is
/// untouched and the survivors are cloned in their original order.
pub fn filter_nodes(nodes: &[ProxyNode], filter: Option<&NodeFilter>) -> Vec<ProxyNode> {
    match filter {
        Some(f) => nodes.iter().filter(|n| f.matches(n)).cloned().collect(),
        None => nodes.to_vec(),
    }
}
