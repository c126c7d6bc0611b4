use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use monitor_store::StoreClient;

use crate::error::MonitorError;

/// An administrative command written into this server's command slot, e.g.
/// `{"command":"stop"}` or `{"command":"show","moduleId":"connection"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommand {
    pub command: String,
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

impl RemoteCommand {
    pub fn parse(payload: &str) -> Result<Self, MonitorError> {
        let invalid = |reason: String| MonitorError::InvalidCommand { payload: payload.to_string(), reason };
        let value: Value = serde_json::from_str(payload).map_err(|error| invalid(error.to_string()))?;
        if !value.is_object() {
            return Err(invalid("command payload is not an object".to_string()));
        }
        let command: RemoteCommand = serde_json::from_value(value).map_err(|error| invalid(error.to_string()))?;
        if command.command.trim().is_empty() {
            return Err(invalid("empty command name".to_string()));
        }
        Ok(command)
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// Output of a command, written back under the command result key. `kind`
/// selects a sub key so several results of one server can coexist.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommandResult {
    pub payload: String,
    pub kind: Option<String>,
}

impl CommandResult {
    pub fn new(payload: impl Into<String>) -> Self {
        Self { payload: payload.into(), kind: None }
    }

    pub fn with_kind(payload: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { payload: payload.into(), kind: Some(kind.into()) }
    }
}

/// Reads the command slot and removes it. The payload is returned only when this
/// call is the one that deleted the slot, so two racing polls cannot both
/// dispatch the same command.
pub(crate) async fn consume_command(client: &dyn StoreClient, key: &str) -> monitor_store::Result<Option<String>> {
    let Some(payload) = client.get(key).await? else {
        return Ok(None);
    };
    if client.delete(key).await? {
        Ok(Some(payload))
    } else {
        Ok(None)
    }
}
