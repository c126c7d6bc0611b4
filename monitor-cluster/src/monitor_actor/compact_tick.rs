use async_trait::async_trait;
use tracing::{debug, error};

use monitor_core::actor::context::ActorContext;
use monitor_core::ext::now_millis;
use monitor_core::Message;

use crate::error::MonitorError;
use crate::keys::lease_key;
use crate::monitor_actor::MonitorActor;

/// Removes lease entries that expired more than the compaction grace ago.
#[derive(Debug)]
pub(crate) struct CompactTick {
    pub(crate) generation: u64,
}

#[async_trait]
impl Message for CompactTick {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        if !actor.is_current(self.generation) {
            return Ok(());
        }
        let (Some(client), Some(grace)) = (actor.session.client.clone(), actor.config.lease_compaction_grace) else {
            return Ok(());
        };
        let key = lease_key(&actor.config.env);
        let myself = context.myself().clone();
        tokio::spawn(async move {
            let max = now_millis() - grace.as_millis() as i64;
            match client.remove_range_by_score(&key, max).await {
                Ok(removed) => {
                    if removed > 0 {
                        debug!("{} removed {} expired leases from {}", myself, removed, key);
                    }
                }
                Err(error) => {
                    error!("{} compact {} failed: {}", myself, key, MonitorError::from(error));
                }
            }
        });
        Ok(())
    }
}
