//! Concurrent TCP connectivity probing.
//!
//! Reachability is connection establishment only — no protocol handshake
//! is attempted. A batch is bounded by a semaphore, per-node failures are
//! recorded instead of propagated, and the call returns only after every
//! submitted probe has finished.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::models::{NodeKey, NodeStatus, ProxyNode};

/// Timeout for the reachability dial.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shorter timeout for the latency measurement dial.
const LATENCY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on simultaneous dials.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Outcome of probing one node.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub success: bool,
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
}

impl ProbeResult {
    /// Status a stored node should take after this probe.
    pub fn status(&self) -> NodeStatus {
        if self.success {
            NodeStatus::Active
        } else {
            NodeStatus::Inactive
        }
    }
}

/// Probes batches of nodes for TCP reachability and connect latency.
#[derive(Debug, Clone)]
pub struct Prober {
    connect_timeout: Duration,
    latency_timeout: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Prober {
            connect_timeout: CONNECT_TIMEOUT,
            latency_timeout: LATENCY_TIMEOUT,
        }
    }
}

impl Prober {
    pub fn new(connect_timeout: Duration, latency_timeout: Duration) -> Self {
        Prober {
            connect_timeout,
            latency_timeout,
        }
    }

    /// Probe a batch of nodes with at most `max_concurrency` dials in
    /// flight. Excess probes queue behind the semaphore without blocking
    /// the caller. The result map is keyed by node identity; completion
    /// order carries no meaning. Dropping the returned future aborts all
    /// in-flight dials.
    pub async fn probe_batch(
        &self,
        nodes: &[ProxyNode],
        max_concurrency: usize,
    ) -> HashMap<NodeKey, ProbeResult> {
        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for node in nodes {
            let key = node.key();
            let address = node.address.clone();
            let port = node.port;
            let connect_timeout = self.connect_timeout;
            let latency_timeout = self.latency_timeout;
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // Closed only when the JoinSet is dropped, which aborts the
                // task anyway.
                let _permit = semaphore.acquire_owned().await;
                let result = probe_one(&address, port, connect_timeout, latency_timeout).await;
                (key, result)
            });
        }

        let mut results = HashMap::with_capacity(nodes.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, result)) => {
                    debug!(
                        "probe {}: success={} latency={:?}",
                        key, result.success, result.latency_ms
                    );
                    results.insert(key, result);
                }
                Err(e) => warn!("probe task failed to join: {}", e),
            }
        }

        results
    }

    /// Probe one node and stamp its status fields in place.
    pub async fn probe_node(&self, node: &mut ProxyNode) -> ProbeResult {
        let result = probe_one(
            &node.address,
            node.port,
            self.connect_timeout,
            self.latency_timeout,
        )
        .await;
        node.status = result.status();
        node.ping_latency = result.latency_ms;
        node.last_check = Some(chrono::Utc::now());
        result
    }
}

/// Dial once for reachability, then once more under the shorter timeout to
/// measure connect latency in wall-clock milliseconds (two decimals). A
/// reachable endpoint whose measurement dial times out keeps
/// `latency_ms: None`.
async fn probe_one(
    address: &str,
    port: u16,
    connect_timeout: Duration,
    latency_timeout: Duration,
) -> ProbeResult {
    let target = dial_target(address, port);

    match timeout(connect_timeout, TcpStream::connect(&target)).await {
        Ok(Ok(_stream)) => {
            let latency_ms = measure_latency(&target, latency_timeout).await;
            ProbeResult {
                success: true,
                latency_ms,
                error: None,
            }
        }
        Ok(Err(e)) => ProbeResult {
            success: false,
            latency_ms: None,
            error: Some(e.to_string()),
        },
        Err(_) => ProbeResult {
            success: false,
            latency_ms: None,
            error: Some(format!("connect timed out after {:?}", connect_timeout)),
        },
    }
}

async fn measure_latency(target: &str, latency_timeout: Duration) -> Option<f64> {
    let start = Instant::now();
    match timeout(latency_timeout, TcpStream::connect(target)).await {
        Ok(Ok(_stream)) => {
            let ms = start.elapsed().as_secs_f64() * 1000.0;
            Some((ms * 100.0).round() / 100.0)
        }
        _ => None,
    }
}

/// Bare IPv6 literals need brackets for `host:port` dialing.
fn dial_target(address: &str, port: u16) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{}]:{}", address, port)
    } else {
        format!("{}:{}", address, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;
    use tokio::net::TcpListener;

    fn node(address: &str, port: u16) -> ProxyNode {
        ProxyNode::new(NodeType::Shadowsocks, "probe-test", address, port)
    }

    async fn loopback_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_probe_reachable_node() {
        let (listener, port) = loopback_listener().await;
        // keep accepting so both dials succeed
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let prober = Prober::default();
        let results = prober.probe_batch(&[node("127.0.0.1", port)], 4).await;
        assert_eq!(results.len(), 1);
        let result = results.values().next().unwrap();
        assert!(result.success);
        let latency = result.latency_ms.unwrap();
        assert!(latency >= 0.0);
        // rounded to two decimals
        assert_eq!((latency * 100.0).round() / 100.0, latency);
    }

    #[tokio::test]
    async fn test_probe_unreachable_node_fails_fast() {
        let (listener, port) = loopback_listener().await;
        // nothing listens on the port once the listener is gone
        drop(listener);

        let prober = Prober::default();
        let results = prober.probe_batch(&[node("127.0.0.1", port)], 4).await;
        let result = results.values().next().unwrap();
        assert!(!result.success);
        assert!(result.latency_ms.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_probe_batch_more_nodes_than_permits() {
        let (listener, port) = loopback_listener().await;
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let nodes: Vec<ProxyNode> = (0..20).map(|_| node("127.0.0.1", port)).collect();
        let prober = Prober::default();
        // 20 submissions behind 2 permits must still all complete
        let results = prober.probe_batch(&nodes, 2).await;
        // identical endpoints share one identity key
        assert_eq!(results.len(), 1);
        assert!(results.values().all(|r| r.success));
    }

    #[tokio::test]
    async fn test_probe_batch_mixed_outcomes() {
        let (listener, open_port) = loopback_listener().await;
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });
        let (closed, closed_port) = loopback_listener().await;
        drop(closed);

        let nodes = vec![node("127.0.0.1", open_port), node("127.0.0.1", closed_port)];
        let prober = Prober::default();
        let results = prober.probe_batch(&nodes, 10).await;
        assert_eq!(results.len(), 2);

        let open_key = nodes[0].key();
        let closed_key = nodes[1].key();
        assert!(results[&open_key].success);
        assert!(!results[&closed_key].success);
    }

    #[tokio::test]
    async fn test_probe_node_stamps_status() {
        let (listener, port) = loopback_listener().await;
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let mut n = node("127.0.0.1", port);
        let prober = Prober::default();
        let result = prober.probe_node(&mut n).await;
        assert!(result.success);
        assert_eq!(n.status, NodeStatus::Active);
        assert!(n.last_check.is_some());
    }

    #[tokio::test]
    async fn test_probe_respects_timeout() {
        // RFC 5737 TEST-NET-1 address: packets go nowhere, so the dial
        // must be cut off by the timeout rather than hang.
        let prober = Prober::new(Duration::from_millis(300), Duration::from_millis(100));
        let start = Instant::now();
        let results = prober.probe_batch(&[node("192.0.2.1", 81)], 1).await;
        let result = results.values().next().unwrap();
        assert!(!result.success);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_probe_empty_batch() {
        let prober = Prober::default();
        let results = prober.probe_batch(&[], 4).await;
        assert!(results.is_empty());
    }
}
