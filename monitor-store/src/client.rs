use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::node::StoreNode;

/// Connection lifecycle notifications. None of them is fatal at this layer,
/// the owner decides whether a lost connection needs a restart.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum StoreEvent {
    Connected,
    Error(String),
    Closed,
    Terminated,
}

/// One connection to one store node. Every operation can fail on its own
/// without affecting the others issued on the same connection.
#[async_trait]
pub trait StoreClient: Debug + Send + Sync + 'static {
    fn node(&self) -> &StoreNode;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Returns `true` only when the key existed and was removed by this call.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn add_to_sorted_set(&self, key: &str, member: &str, score: i64) -> Result<()>;

    /// Members with `min <= score <= max` in ascending score order, `max = None`
    /// meaning unbounded.
    async fn range_by_score(&self, key: &str, min: i64, max: Option<i64>) -> Result<Vec<String>>;

    /// Removes members with `score < max`, returns how many were removed.
    async fn remove_range_by_score(&self, key: &str, max: i64) -> Result<u64>;

    /// Values aligned with `keys`, `None` for absent keys.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Raw replication section, newline delimited `key:value` pairs.
    async fn replication_info(&self) -> Result<String>;

    async fn ping(&self) -> Result<()>;

    async fn close(&self);

    /// Lifecycle events of this connection. A new subscriber of an open
    /// connection receives `Connected` first.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[async_trait]
pub trait StoreConnector: Debug + Send + Sync + 'static {
    async fn connect(&self, node: &StoreNode, auth: Option<&str>) -> Result<Arc<dyn StoreClient>>;
}
