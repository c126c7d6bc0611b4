use ahash::HashMap;
use async_trait::async_trait;
use tracing::{error, warn};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::discovery::merge_fetched;
use crate::error::MonitorError;
use crate::monitor_actor::MonitorActor;
use crate::server_record::ServerRecord;

#[derive(Debug)]
pub(crate) struct MembersFetched {
    pub(crate) generation: u64,
    pub(crate) known: HashMap<String, ServerRecord>,
    pub(crate) requested: Vec<String>,
    pub(crate) result: monitor_store::Result<Vec<Option<String>>>,
}

#[async_trait]
impl Message for MembersFetched {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, mut known, requested, result } = *self;
        if !actor.is_current(generation) {
            return Ok(());
        }
        match result {
            Ok(values) => {
                for error in merge_fetched(&mut known, &requested, values) {
                    warn!("{} skip member: {}", context.myself(), error);
                }
                actor.finish_discovery(known);
            }
            Err(error) => {
                error!("{} fetch members {:?} failed: {}", context.myself(), requested, MonitorError::from(error));
                actor.session.discovery_in_flight = false;
            }
        }
        Ok(())
    }
}
