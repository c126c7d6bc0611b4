use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a server advertises about itself. Any extra fields written by other
/// processes are kept in `metadata` and survive a round trip through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub pid: u32,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ServerRecord {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
            pid: std::process::id(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn server_type(&self) -> Option<&str> {
        self.metadata.get("serverType").and_then(Value::as_str)
    }
}
