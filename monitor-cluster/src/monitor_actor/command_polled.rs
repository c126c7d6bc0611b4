use async_trait::async_trait;
use tracing::{error, info, warn};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::command::RemoteCommand;
use crate::error::MonitorError;
use crate::keys::command_result_key;
use crate::monitor_actor::MonitorActor;

/// Outcome of polling the command slot. `Some` only when this poll deleted the
/// slot, so the payload is dispatched at most once.
#[derive(Debug)]
pub(crate) struct CommandPolled {
    pub(crate) generation: u64,
    pub(crate) result: monitor_store::Result<Option<String>>,
}

#[async_trait]
impl Message for CommandPolled {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, result } = *self;
        if !actor.is_current(generation) {
            return Ok(());
        }
        let payload = match result {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok(()),
            Err(error) => {
                error!("{} poll command failed: {}", context.myself(), MonitorError::from(error));
                return Ok(());
            }
        };
        let command = match RemoteCommand::parse(&payload) {
            Ok(command) => command,
            Err(error) => {
                warn!("{} {}", context.myself(), error);
                return Ok(());
            }
        };
        info!("{} receive command {}", context.myself(), command.command);
        let listener = actor.listener.clone();
        let client = actor.session.client.clone();
        let env = actor.config.env.clone();
        let server_id = actor.server_id();
        let myself = context.myself().clone();
        actor.dispatches.spawn(async move {
            let Some(result) = listener.on_command(command).await else {
                return;
            };
            let Some(client) = client else {
                return;
            };
            let key = command_result_key(&env, &server_id, result.kind.as_deref());
            if let Err(error) = client.set(&key, &result.payload).await {
                error!("{} set {} failed: {}", myself, key, MonitorError::from(error));
            }
        });
        while let Some(finished) = actor.dispatches.try_join_next() {
            if let Err(error) = finished {
                if error.is_panic() {
                    error!("{} command executor panicked: {}", context.myself(), error);
                }
            }
        }
        Ok(())
    }
}
