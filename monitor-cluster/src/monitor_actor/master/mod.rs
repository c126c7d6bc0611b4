use std::sync::Arc;

use tracing::{debug, info, warn};

use monitor_core::actor::context::ActorContext;
use monitor_core::ext::option_ext::OptionExt;
use monitor_store::StoreClient;

use crate::monitor_actor::master::heartbeat_tick::HeartbeatTick;
use crate::monitor_actor::master::probe_master::ProbeMaster;
use crate::monitor_actor::MonitorActor;
use crate::status::MonitorStatus;

pub(crate) mod probe_master;
mod probe_result;
mod heartbeat_tick;
mod heartbeat_resp;

/// The replica currently heartbeated as master. `binding` changes on every
/// rebind so pongs of a replaced master are ignored.
pub(crate) struct BoundMaster {
    pub(crate) binding: u64,
    pub(crate) client: Arc<dyn StoreClient>,
    pub(crate) ping_outstanding: bool,
}

/// One pass over every configured replica.
pub(crate) struct ProbeRound {
    pub(crate) round: u64,
    pub(crate) pending: usize,
    /// Replicas that reported master, kept until the round ends when masters
    /// are chosen by configuration order.
    pub(crate) candidates: Vec<(usize, Arc<dyn StoreClient>)>,
}

impl MonitorActor {
    /// Binds `client` as master and moves every store operation onto it, the
    /// previous primary connection may point at a read only replica.
    pub(crate) async fn bind_master(&mut self, context: &mut ActorContext<Self>, client: Arc<dyn StoreClient>) {
        self.session.heartbeat.take().into_foreach(|key| key.cancel());
        if let Some(previous) = self.session.master.take() {
            warn!(
                "{} replica {} also reports master, rebind from {}",
                context.myself(),
                client.node(),
                previous.client.node(),
            );
            previous.client.close().await;
        }
        if let Some(primary) = self.session.client.replace(client.clone()) {
            debug!("{} switch store operations from {} to master {}", context.myself(), primary.node(), client.node());
            primary.close().await;
        }
        Self::watch_events(self.server_id(), client.as_ref());
        self.session.bindings += 1;
        let binding = self.session.bindings;
        let generation = self.generation;
        info!("{} bind master {}", context.myself(), client.node());
        self.session.master = Some(BoundMaster { binding, client, ping_outstanding: false });
        let myself = context.myself().clone();
        let key = context.scheduler().schedule_with_fixed_delay(None, self.config.heartbeat_period.into(), move || {
            myself.tell(HeartbeatTick { generation, binding });
        });
        self.session.heartbeat = Some(key);
    }

    /// Schedules another probing round after a round found no master.
    pub(crate) fn schedule_reprobe(&mut self, context: &mut ActorContext<Self>) {
        let generation = self.generation;
        let delay = self.config.heartbeat_period.to_std_duration();
        warn!("{} no master found among {} replicas, probe again after {:?}", context.myself(), self.config.store_nodes.len(), delay);
        let myself = context.myself().clone();
        let key = context.scheduler().schedule_once(delay, move || {
            myself.tell(ProbeMaster { generation });
        });
        self.session.timers.push(key);
    }

    /// Tears the whole session down and starts over from connecting the store.
    pub(crate) async fn restart(&mut self, context: &mut ActorContext<Self>) {
        self.set_status(MonitorStatus::Restarting { generation: self.generation });
        self.end_session().await;
        self.generation += 1;
        info!("{} restart monitor with generation {}", context.myself(), self.generation);
        self.listener.on_restart(self.generation);
        self.begin_session(context);
    }
}
