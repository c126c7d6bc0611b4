use async_trait::async_trait;
use tokio::time::error::Elapsed;
use tracing::{error, trace};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::error::MonitorError;
use crate::monitor_actor::MonitorActor;

#[derive(Debug)]
pub(crate) struct HeartbeatResp {
    pub(crate) generation: u64,
    pub(crate) binding: u64,
    pub(crate) result: Result<monitor_store::Result<()>, Elapsed>,
}

#[async_trait]
impl Message for HeartbeatResp {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, binding, result } = *self;
        if !actor.is_current(generation) {
            return Ok(());
        }
        let Some(master) = actor.session.master.as_mut().filter(|master| master.binding == binding) else {
            return Ok(());
        };
        master.ping_outstanding = false;
        let node = master.client.node().clone();
        match result {
            Ok(Ok(())) => {
                trace!("{} ping {}", context.myself(), node);
            }
            Ok(Err(error)) => {
                error!("{} ping {} error: {}", context.myself(), node, MonitorError::from(error));
            }
            Err(_) => {
                let timeout = actor.config.heartbeat_timeout.to_std_duration();
                error!("{} {}", context.myself(), MonitorError::HeartbeatTimeout { node, timeout });
                actor.restart(context).await;
            }
        }
        Ok(())
    }
}
