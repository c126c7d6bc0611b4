use async_trait::async_trait;
use tracing::trace;

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::monitor_actor::master::heartbeat_resp::HeartbeatResp;
use crate::monitor_actor::MonitorActor;

#[derive(Debug)]
pub(crate) struct HeartbeatTick {
    pub(crate) generation: u64,
    pub(crate) binding: u64,
}

#[async_trait]
impl Message for HeartbeatTick {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, binding } = *self;
        if !actor.is_current(generation) {
            return Ok(());
        }
        let timeout = actor.config.heartbeat_timeout.to_std_duration();
        let Some(master) = actor.session.master.as_mut().filter(|master| master.binding == binding) else {
            return Ok(());
        };
        if master.ping_outstanding {
            trace!("{} previous ping to {} still outstanding", context.myself(), master.client.node());
            return Ok(());
        }
        master.ping_outstanding = true;
        let client = master.client.clone();
        context.pipe_to_self(async move {
            let result = tokio::time::timeout(timeout, client.ping()).await;
            HeartbeatResp { generation, binding, result }
        });
        Ok(())
    }
}
