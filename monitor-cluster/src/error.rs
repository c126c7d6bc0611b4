use std::time::Duration;

use thiserror::Error;

use monitor_store::{StoreError, StoreNode};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("store connection error: {0}")]
    StoreConnection(#[from] StoreError),
    #[error("malformed registration record of {server_id}: {source}")]
    Serialization {
        server_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("heartbeat to master {node} timed out after {timeout:?}")]
    HeartbeatTimeout { node: StoreNode, timeout: Duration },
    #[error("invalid command payload {payload:?}: {reason}")]
    InvalidCommand { payload: String, reason: String },
}
