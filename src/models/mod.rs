//! Core data models for the subscription pipeline.

mod filter;
mod node;

pub use filter::{filter_nodes, NodeFilter};
pub use node::{is_valid_address, NodeKey, NodeStatus, NodeType, ProxyNode};
