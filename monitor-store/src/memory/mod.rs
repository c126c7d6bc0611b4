use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use ahash::HashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

pub use store::MemoryStore;

use crate::client::{StoreClient, StoreConnector, StoreEvent};
use crate::error::{Result, StoreError};
use crate::node::StoreNode;

mod store;

const EVENT_CAPACITY: usize = 16;
const STALL_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConnectionEvent {
    Opened { id: u64, node: StoreNode },
    Closed { id: u64, node: StoreNode },
}

#[derive(Debug)]
struct NodeState {
    store: Arc<MemoryStore>,
    role: String,
    reachable: bool,
    stall_ping: bool,
    info_delay: Duration,
    read_only: bool,
}

#[derive(Debug, Default)]
struct Registry {
    nodes: Mutex<HashMap<StoreNode, NodeState>>,
    log: Mutex<Vec<ConnectionEvent>>,
    next_id: AtomicU64,
    password: Mutex<Option<String>>,
}

impl Registry {
    fn with_node<F, R>(&self, node: &StoreNode, f: F) -> Option<R> where F: FnOnce(&mut NodeState) -> R {
        self.nodes.lock().get_mut(node).map(f)
    }

    fn reachable(&self, node: &StoreNode) -> bool {
        self.with_node(node, |state| state.reachable).unwrap_or(false)
    }
}

/// In process stand-in for a set of store nodes. Nodes can share one dataset
/// to model replicas, and every node can be made unreachable, slow or silent.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    registry: Arc<Registry>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node backed by a fresh dataset.
    pub fn add_node(&self, node: StoreNode, role: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        self.add_replica(node, role, store.clone());
        store
    }

    /// Registers a node serving an existing dataset.
    pub fn add_replica(&self, node: StoreNode, role: &str, store: Arc<MemoryStore>) {
        let state = NodeState {
            store,
            role: role.to_string(),
            reachable: true,
            stall_ping: false,
            info_delay: Duration::ZERO,
            read_only: false,
        };
        self.registry.nodes.lock().insert(node, state);
    }

    pub fn set_role(&self, node: &StoreNode, role: &str) {
        self.registry.with_node(node, |state| state.role = role.to_string());
    }

    pub fn set_reachable(&self, node: &StoreNode, reachable: bool) {
        self.registry.with_node(node, |state| state.reachable = reachable);
    }

    /// A stalled node accepts pings but never answers them.
    pub fn set_stall_ping(&self, node: &StoreNode, stall: bool) {
        self.registry.with_node(node, |state| state.stall_ping = stall);
    }

    /// A read only node rejects every write, like a replica serving reads.
    pub fn set_read_only(&self, node: &StoreNode, read_only: bool) {
        self.registry.with_node(node, |state| state.read_only = read_only);
    }

    pub fn set_info_delay(&self, node: &StoreNode, delay: Duration) {
        self.registry.with_node(node, |state| state.info_delay = delay);
    }

    pub fn require_password(&self, password: Option<&str>) {
        *self.registry.password.lock() = password.map(str::to_string);
    }

    pub fn connection_log(&self) -> Vec<ConnectionEvent> {
        self.registry.log.lock().clone()
    }

    pub fn open_connections(&self) -> usize {
        let log = self.registry.log.lock();
        let opened = log.iter().filter(|event| matches!(event, ConnectionEvent::Opened { .. })).count();
        opened - (log.len() - opened)
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, node: &StoreNode, auth: Option<&str>) -> Result<Arc<dyn StoreClient>> {
        let store = self.registry
            .with_node(node, |state| state.reachable.then(|| state.store.clone()))
            .flatten()
            .ok_or_else(|| StoreError::Connect { node: node.clone(), reason: "node unreachable".to_string() })?;
        if let Some(password) = self.registry.password.lock().as_deref() {
            if auth != Some(password) {
                return Err(StoreError::Auth(node.clone()));
            }
        }
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.log.lock().push(ConnectionEvent::Opened { id, node: node.clone() });
        debug!("memory store {} connection {} opened", node, id);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let client = MemoryClient {
            id,
            node: node.clone(),
            store,
            registry: self.registry.clone(),
            closed: AtomicBool::new(false),
            events,
        };
        Ok(Arc::new(client))
    }
}

#[derive(Debug)]
pub struct MemoryClient {
    id: u64,
    node: StoreNode,
    store: Arc<MemoryStore>,
    registry: Arc<Registry>,
    closed: AtomicBool,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryClient {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed(self.node.clone()));
        }
        if !self.registry.reachable(&self.node) {
            let _ = self.events.send(StoreEvent::Error("node unreachable".to_string()));
            return Err(StoreError::Connect { node: self.node.clone(), reason: "node unreachable".to_string() });
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if self.registry.with_node(&self.node, |state| state.read_only).unwrap_or(false) {
            let _ = self.events.send(StoreEvent::Error("write to read only replica".to_string()));
            return Err(StoreError::ReadOnly(self.node.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    fn node(&self) -> &StoreNode {
        &self.node
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        self.store.set(key, value);
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_writable()?;
        self.store.set_with_expiry(key, value, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self.store.get(key))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_writable()?;
        Ok(self.store.delete(key))
    }

    async fn add_to_sorted_set(&self, key: &str, member: &str, score: i64) -> Result<()> {
        self.ensure_writable()?;
        self.store.add_to_sorted_set(key, member, score);
        Ok(())
    }

    async fn range_by_score(&self, key: &str, min: i64, max: Option<i64>) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.store.range_by_score(key, min, max))
    }

    async fn remove_range_by_score(&self, key: &str, max: i64) -> Result<u64> {
        self.ensure_writable()?;
        Ok(self.store.remove_range_by_score(key, max))
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        self.ensure_open()?;
        Ok(self.store.multi_get(keys))
    }

    async fn replication_info(&self) -> Result<String> {
        self.ensure_open()?;
        let (role, delay) = self.registry
            .with_node(&self.node, |state| (state.role.clone(), state.info_delay))
            .ok_or_else(|| StoreError::Closed(self.node.clone()))?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(format!("# Replication\r\nrole:{}\r\nconnected_slaves:0\r\n", role))
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()?;
        while self.registry.with_node(&self.node, |state| state.stall_ping).unwrap_or(false) {
            if self.closed.load(Ordering::Acquire) {
                return Err(StoreError::Closed(self.node.clone()));
            }
            tokio::time::sleep(STALL_POLL).await;
        }
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.registry.log.lock().push(ConnectionEvent::Closed { id: self.id, node: self.node.clone() });
            debug!("memory store {} connection {} closed", self.node, self.id);
            let _ = self.events.send(StoreEvent::Closed);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        let events = self.events.subscribe();
        if !self.closed.load(Ordering::Acquire) {
            let _ = self.events.send(StoreEvent::Connected);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::client::{StoreConnector, StoreEvent};
    use crate::error::StoreError;
    use crate::memory::{ConnectionEvent, MemoryConnector};
    use crate::node::StoreNode;

    #[tokio::test]
    async fn test_replicas_share_dataset() -> anyhow::Result<()> {
        let connector = MemoryConnector::new();
        let master = StoreNode::new("10.0.0.1", 6379);
        let replica = StoreNode::new("10.0.0.2", 6379);
        let store = connector.add_node(master.clone(), "master");
        connector.add_replica(replica.clone(), "slave", store);
        let a = connector.connect(&master, None).await?;
        let b = connector.connect(&replica, None).await?;
        a.set("reg:dev:a", "stop").await?;
        assert_eq!(b.get("reg:dev:a").await?, Some("stop".to_string()));
        assert!(b.replication_info().await?.contains("role:slave"));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_only_replica_rejects_writes() -> anyhow::Result<()> {
        let connector = MemoryConnector::new();
        let master = StoreNode::new("10.0.0.1", 6379);
        let replica = StoreNode::new("10.0.0.2", 6379);
        let store = connector.add_node(master.clone(), "master");
        connector.add_replica(replica.clone(), "slave", store.clone());
        connector.set_read_only(&replica, true);
        let client = connector.connect(&replica, None).await?;
        assert!(matches!(client.set("reg:server:dev:a", "{}").await, Err(StoreError::ReadOnly(_))));
        assert!(matches!(client.add_to_sorted_set("reg:dev", "a", 1).await, Err(StoreError::ReadOnly(_))));
        assert!(matches!(client.delete("reg:dev:a").await, Err(StoreError::ReadOnly(_))));
        assert_eq!(store.score("reg:dev", "a"), None);
        store.set("reg:dev:a", "stop");
        assert_eq!(client.get("reg:dev:a").await?, Some("stop".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_close_is_logged_once() -> anyhow::Result<()> {
        let connector = MemoryConnector::new();
        let node = StoreNode::new("10.0.0.1", 6379);
        connector.add_node(node.clone(), "master");
        let client = connector.connect(&node, None).await?;
        let mut events = client.subscribe();
        client.close().await;
        client.close().await;
        assert_eq!(events.recv().await?, StoreEvent::Connected);
        assert_eq!(events.recv().await?, StoreEvent::Closed);
        assert!(matches!(client.get("k").await, Err(StoreError::Closed(_))));
        assert_eq!(connector.connection_log(), vec![
            ConnectionEvent::Opened { id: 0, node: node.clone() },
            ConnectionEvent::Closed { id: 0, node },
        ]);
        assert_eq!(connector.open_connections(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_and_auth() -> anyhow::Result<()> {
        let connector = MemoryConnector::new();
        let node = StoreNode::new("10.0.0.1", 6379);
        connector.add_node(node.clone(), "master");
        connector.require_password(Some("pw"));
        assert!(matches!(connector.connect(&node, None).await, Err(StoreError::Auth(_))));
        let client = connector.connect(&node, Some("pw")).await?;
        connector.set_reachable(&node, false);
        assert!(matches!(client.ping().await, Err(StoreError::Connect { .. })));
        assert!(matches!(connector.connect(&node, Some("pw")).await, Err(StoreError::Connect { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_stalled_ping_never_answers() -> anyhow::Result<()> {
        let connector = MemoryConnector::new();
        let node = StoreNode::new("10.0.0.1", 6379);
        connector.add_node(node.clone(), "master");
        let client = connector.connect(&node, None).await?;
        connector.set_stall_ping(&node, true);
        assert!(tokio::time::timeout(Duration::from_millis(100), client.ping()).await.is_err());
        connector.set_stall_ping(&node, false);
        client.ping().await?;
        Ok(())
    }
}
