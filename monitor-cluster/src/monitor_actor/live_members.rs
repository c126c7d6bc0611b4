use async_trait::async_trait;
use tracing::{debug, error};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::discovery::partition_members;
use crate::error::MonitorError;
use crate::keys::registration_key;
use crate::monitor_actor::members_fetched::MembersFetched;
use crate::monitor_actor::MonitorActor;

/// Live member ids of one discovery cycle, ordered by lease expiry. `None`
/// when the lease refresh itself failed and the cycle was abandoned.
#[derive(Debug)]
pub(crate) struct LiveMembers {
    pub(crate) generation: u64,
    pub(crate) result: Option<monitor_store::Result<Vec<String>>>,
}

#[async_trait]
impl Message for LiveMembers {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, result } = *self;
        if !actor.is_current(generation) {
            return Ok(());
        }
        let live = match result {
            Some(Ok(live)) => live,
            Some(Err(error)) => {
                error!("{} query live members failed: {}", context.myself(), MonitorError::from(error));
                actor.session.discovery_in_flight = false;
                return Ok(());
            }
            None => {
                actor.session.discovery_in_flight = false;
                return Ok(());
            }
        };
        let partition = partition_members(&actor.session.snapshot, &live, actor.config.max_missing_batch_size);
        if !partition.deferred.is_empty() {
            debug!(
                "{} fetch {} missing members, defer {} to a later cycle",
                context.myself(),
                partition.missing.len(),
                partition.deferred.len(),
            );
        }
        if partition.missing.is_empty() {
            actor.finish_discovery(partition.known);
            return Ok(());
        }
        let Some(client) = actor.session.client.clone() else {
            actor.session.discovery_in_flight = false;
            return Ok(());
        };
        let keys = partition.missing.iter()
            .map(|server_id| registration_key(&actor.config.env, server_id))
            .collect::<Vec<_>>();
        let known = partition.known;
        let requested = partition.missing;
        context.pipe_to_self(async move {
            let result = client.multi_get(&keys).await;
            MembersFetched { generation, known, requested, result }
        });
        Ok(())
    }
}
