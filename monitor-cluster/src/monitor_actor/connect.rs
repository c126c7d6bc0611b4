use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;
use monitor_store::{StoreClient, StoreConnector, StoreError, StoreNode};

use crate::monitor_actor::connect_result::ConnectResult;
use crate::monitor_actor::MonitorActor;

/// Opens the primary store connection of a session.
#[derive(Debug)]
pub(crate) struct Connect {
    pub(crate) generation: u64,
}

#[async_trait]
impl Message for Connect {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        if !actor.is_current(self.generation) {
            debug!("{} drop connect of stale generation {}", context.myself(), self.generation);
            return Ok(());
        }
        actor.session.reconnect.take();
        let candidates = actor.config.primary_candidates();
        let connector = actor.connector.clone();
        let auth = actor.config.auth_credential.clone();
        let timeout = actor.config.heartbeat_timeout.to_std_duration();
        let generation = self.generation;
        context.pipe_to_self(async move {
            let result = connect_first(connector.as_ref(), &candidates, auth.as_deref(), timeout).await;
            ConnectResult { generation, result }
        });
        Ok(())
    }
}

/// Tries `candidates` in order and returns the first connection that opens
/// within `timeout`.
pub(crate) async fn connect_first(
    connector: &dyn StoreConnector,
    candidates: &[StoreNode],
    auth: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn StoreClient>, StoreError> {
    let mut last_error = StoreError::NoNodes;
    for node in candidates {
        let connected = tokio::time::timeout(timeout, connector.connect(node, auth))
            .await
            .unwrap_or(Err(StoreError::Timeout));
        match connected {
            Ok(client) => return Ok(client),
            Err(error) => {
                warn!("connect to store {} failed: {}", node, error);
                last_error = error;
            }
        }
    }
    Err(last_error)
}
