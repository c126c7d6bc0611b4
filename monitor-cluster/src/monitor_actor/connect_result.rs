use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;
use monitor_store::{StoreClient, StoreError};

use crate::error::MonitorError;
use crate::monitor_actor::connect::Connect;
use crate::monitor_actor::MonitorActor;

pub(crate) struct ConnectResult {
    pub(crate) generation: u64,
    pub(crate) result: Result<Arc<dyn StoreClient>, StoreError>,
}

impl std::fmt::Debug for ConnectResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectResult")
            .field("generation", &self.generation)
            .field("connected", &self.result.is_ok())
            .finish()
    }
}

#[async_trait]
impl Message for ConnectResult {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, result } = *self;
        if !actor.is_current(generation) {
            if let Ok(client) = result {
                debug!("{} close connection {} of stale generation {}", context.myself(), client.node(), generation);
                client.close().await;
            }
            return Ok(());
        }
        match result {
            Ok(client) => {
                actor.on_connected(context, client);
            }
            Err(error) => {
                let delay = actor.config.reconnect_delay.to_std_duration();
                error!("{} {}, retry after {:?}", context.myself(), MonitorError::from(error), delay);
                let myself = context.myself().clone();
                let key = context.scheduler().schedule_once(delay, move || {
                    myself.tell(Connect { generation });
                });
                actor.session.reconnect = Some(key);
            }
        }
        Ok(())
    }
}
