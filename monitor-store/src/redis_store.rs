use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{ErrorKind, FromRedisValue, RedisError};
use tokio::sync::broadcast;
use tracing::{debug, trace};
use url::Url;

use crate::client::{StoreClient, StoreConnector, StoreEvent};
use crate::error::{Result, StoreError};
use crate::node::StoreNode;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Default, Clone)]
pub struct RedisConnector;

#[async_trait]
impl StoreConnector for RedisConnector {
    async fn connect(&self, node: &StoreNode, auth: Option<&str>) -> Result<Arc<dyn StoreClient>> {
        let url = connection_url(node, auth)?;
        let client = redis::Client::open(url.as_str())?;
        let connection = client.get_multiplexed_async_connection().await.map_err(|error| {
            if error.kind() == ErrorKind::AuthenticationFailed {
                StoreError::Auth(node.clone())
            } else {
                StoreError::Connect { node: node.clone(), reason: error.to_string() }
            }
        })?;
        debug!("redis {} connected", node);
        Ok(Arc::new(RedisStore::new(node.clone(), connection)))
    }
}

pub(crate) fn connection_url(node: &StoreNode, auth: Option<&str>) -> Result<Url> {
    let address = format!("redis://{}:{}/", node.host, node.port);
    let mut url = Url::parse(&address).map_err(|_| StoreError::InvalidAddress(node.to_string()))?;
    if let Some(password) = auth {
        url.set_password(Some(password)).map_err(|_| StoreError::InvalidAddress(node.to_string()))?;
    }
    Ok(url)
}

pub struct RedisStore {
    node: StoreNode,
    connection: Mutex<Option<MultiplexedConnection>>,
    events: broadcast::Sender<StoreEvent>,
}

impl RedisStore {
    fn new(node: StoreNode, connection: MultiplexedConnection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            node,
            connection: Mutex::new(Some(connection)),
            events,
        }
    }

    fn connection(&self) -> Result<MultiplexedConnection> {
        self.connection.lock().clone().ok_or_else(|| StoreError::Closed(self.node.clone()))
    }

    async fn query<T>(&self, cmd: redis::Cmd) -> Result<T> where T: FromRedisValue {
        let mut connection = self.connection()?;
        let result: redis::RedisResult<T> = cmd.query_async(&mut connection).await;
        result.map_err(|error| self.on_error(error))
    }

    fn on_error(&self, error: RedisError) -> StoreError {
        let _ = self.events.send(StoreEvent::Error(error.to_string()));
        if error.is_connection_dropped() {
            let _ = self.events.send(StoreEvent::Terminated);
        }
        error.into()
    }
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    fn node(&self) -> &StoreNode {
        &self.node
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.query(redis::cmd("SET").arg(key).arg(value).clone()).await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let millis = ttl.as_millis().max(1) as u64;
        self.query(redis::cmd("SET").arg(key).arg(value).arg("PX").arg(millis).clone()).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.query(redis::cmd("GET").arg(key).clone()).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed: u64 = self.query(redis::cmd("DEL").arg(key).clone()).await?;
        Ok(removed > 0)
    }

    async fn add_to_sorted_set(&self, key: &str, member: &str, score: i64) -> Result<()> {
        self.query(redis::cmd("ZADD").arg(key).arg(score).arg(member).clone()).await
    }

    async fn range_by_score(&self, key: &str, min: i64, max: Option<i64>) -> Result<Vec<String>> {
        let max = max.map(|max| max.to_string()).unwrap_or_else(|| "+inf".to_string());
        self.query(redis::cmd("ZRANGEBYSCORE").arg(key).arg(min).arg(max).clone()).await
    }

    async fn remove_range_by_score(&self, key: &str, max: i64) -> Result<u64> {
        self.query(redis::cmd("ZREMRANGEBYSCORE").arg(key).arg("-inf").arg(format!("({}", max)).clone()).await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.query(redis::cmd("MGET").arg(keys).clone()).await
    }

    async fn replication_info(&self) -> Result<String> {
        self.query(redis::cmd("INFO").arg("replication").clone()).await
    }

    async fn ping(&self) -> Result<()> {
        let pong: String = self.query(redis::cmd("PING")).await?;
        trace!("redis {} {}", self.node, pong);
        Ok(())
    }

    async fn close(&self) {
        if self.connection.lock().take().is_some() {
            debug!("redis {} connection closed", self.node);
            let _ = self.events.send(StoreEvent::Closed);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        let events = self.events.subscribe();
        if self.connection.lock().is_some() {
            let _ = self.events.send(StoreEvent::Connected);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use crate::node::StoreNode;
    use crate::redis_store::connection_url;

    #[test]
    fn test_connection_url() -> anyhow::Result<()> {
        let node = StoreNode::new("127.0.0.1", 6379);
        assert_eq!(connection_url(&node, None)?.as_str(), "redis://127.0.0.1:6379/");
        assert_eq!(connection_url(&node, Some("s3cr3t"))?.as_str(), "redis://:s3cr3t@127.0.0.1:6379/");
        assert_eq!(connection_url(&node, Some("p@ss"))?.as_str(), "redis://:p%40ss@127.0.0.1:6379/");
        Ok(())
    }
}
