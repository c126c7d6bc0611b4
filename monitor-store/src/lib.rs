pub use client::{StoreClient, StoreConnector, StoreEvent};
pub use error::{Result, StoreError};
pub use node::StoreNode;

pub mod client;
pub mod error;
pub mod memory;
pub mod node;
pub mod redis_store;
