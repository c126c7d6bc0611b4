use async_trait::async_trait;
use tracing::{debug, error};

use monitor_core::actor::context::ActorContext;
use monitor_core::ext::now_millis;
use monitor_core::Message;

use crate::command::consume_command;
use crate::error::MonitorError;
use crate::keys::{command_key, lease_key};
use crate::monitor_actor::command_polled::CommandPolled;
use crate::monitor_actor::live_members::LiveMembers;
use crate::monitor_actor::MonitorActor;

/// Refreshes this server's lease, reads the live members and polls the command
/// slot. At most one discovery cycle runs at a time, a tick arriving while the
/// previous cycle is still waiting on the store only polls commands.
#[derive(Debug)]
pub(crate) struct DiscoverTick {
    pub(crate) generation: u64,
}

#[async_trait]
impl Message for DiscoverTick {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let generation = self.generation;
        if !actor.is_current(generation) {
            return Ok(());
        }
        let Some(client) = actor.session.client.clone() else {
            return Ok(());
        };
        let server_id = actor.server_id();
        let env = &actor.config.env;

        let key = command_key(env, &server_id);
        let command_client = client.clone();
        context.pipe_to_self(async move {
            let result = consume_command(command_client.as_ref(), &key).await;
            CommandPolled { generation, result }
        });

        if actor.session.discovery_in_flight {
            debug!("{} previous discovery still in flight, skip this cycle", context.myself());
            return Ok(());
        }
        actor.session.discovery_in_flight = true;
        let key = lease_key(env);
        let expiry = actor.config.lease_expiry.as_millis() as i64;
        let myself = context.myself().clone();
        context.pipe_to_self(async move {
            let score = now_millis() + expiry;
            if let Err(error) = client.add_to_sorted_set(&key, &server_id, score).await {
                error!("{} refresh lease of {} failed: {}", myself, server_id, MonitorError::from(error));
                return LiveMembers { generation, result: None };
            }
            let result = client.range_by_score(&key, now_millis(), None).await;
            LiveMembers { generation, result: Some(result) }
        });
        Ok(())
    }
}
