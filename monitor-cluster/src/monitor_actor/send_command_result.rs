use async_trait::async_trait;
use tracing::{error, warn};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::command::CommandResult;
use crate::error::MonitorError;
use crate::keys::command_result_key;
use crate::monitor_actor::MonitorActor;

#[derive(Debug)]
pub(crate) struct SendCommandResult {
    pub(crate) result: CommandResult,
}

#[async_trait]
impl Message for SendCommandResult {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Some(client) = actor.session.client.clone() else {
            warn!("{} store not connected, drop command result {:?}", context.myself(), self.result);
            return Ok(());
        };
        let CommandResult { payload, kind } = self.result;
        let key = command_result_key(&actor.config.env, &actor.server_id(), kind.as_deref());
        let myself = context.myself().clone();
        tokio::spawn(async move {
            if let Err(error) = client.set(&key, &payload).await {
                error!("{} set {} failed: {}", myself, key, MonitorError::from(error));
            }
        });
        Ok(())
    }
}
