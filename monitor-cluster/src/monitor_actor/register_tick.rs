use async_trait::async_trait;
use tracing::{error, trace};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::error::MonitorError;
use crate::keys::registration_key;
use crate::monitor_actor::MonitorActor;

/// Writes this server's registration record with an expiry.
#[derive(Debug)]
pub(crate) struct RegisterTick {
    pub(crate) generation: u64,
}

#[async_trait]
impl Message for RegisterTick {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        if !actor.is_current(self.generation) {
            return Ok(());
        }
        let Some(client) = actor.session.client.clone() else {
            return Ok(());
        };
        let mut record = actor.listener.self_record();
        record.pid = std::process::id();
        let value = match serde_json::to_string(&record) {
            Ok(value) => value,
            Err(source) => {
                error!("{} {}", context.myself(), MonitorError::Serialization { server_id: record.id, source });
                return Ok(());
            }
        };
        let key = registration_key(&actor.config.env, &record.id);
        let ttl = actor.config.registration_ttl();
        let myself = context.myself().clone();
        tokio::spawn(async move {
            match client.set_with_expiry(&key, &value, ttl).await {
                Ok(_) => {
                    trace!("{} registered {} with ttl {:?}", myself, key, ttl);
                }
                Err(error) => {
                    error!("{} register {} failed: {}", myself, key, MonitorError::from(error));
                }
            }
        });
        Ok(())
    }
}
