use thiserror::Error;

use crate::node::StoreNode;

pub type Result<T, E = StoreError> = core::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no store node configured")]
    NoNodes,
    #[error("cannot connect to store {node}: {reason}")]
    Connect { node: StoreNode, reason: String },
    #[error("authentication to store {0} rejected")]
    Auth(StoreNode),
    #[error("store {0} is a read only replica")]
    ReadOnly(StoreNode),
    #[error("connection to store {0} is closed")]
    Closed(StoreNode),
    #[error("store operation timed out")]
    Timeout,
    #[error("invalid store address {0}")]
    InvalidAddress(String),
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}
