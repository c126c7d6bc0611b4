use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use ahash::HashMap;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use monitor_core::Actor;
use monitor_core::actor::context::ActorContext;
use monitor_core::actor::scheduler::ScheduleKey;
use monitor_core::ext::option_ext::OptionExt;
use monitor_store::{StoreClient, StoreConnector, StoreEvent};

use crate::config::MonitorConfig;
use crate::listener::MonitorListener;
use crate::monitor_actor::compact_tick::CompactTick;
use crate::monitor_actor::connect::Connect;
use crate::monitor_actor::discover_tick::DiscoverTick;
use crate::monitor_actor::master::{BoundMaster, ProbeRound};
use crate::monitor_actor::register_tick::RegisterTick;
use crate::server_record::ServerRecord;
use crate::snapshot::MembershipSnapshot;
use crate::status::MonitorStatus;

pub(crate) mod connect;
pub(crate) mod connect_result;
mod register_tick;
mod discover_tick;
pub(crate) mod live_members;
pub(crate) mod members_fetched;
pub(crate) mod command_polled;
mod compact_tick;
pub(crate) mod send_command_result;
pub(crate) mod master;

/// Owns every piece of mutable monitor state. All of it is touched only from
/// message handlers, store I/O runs on spawned tasks and reports back through
/// the mailbox tagged with the generation it was issued in.
pub(crate) struct MonitorActor {
    pub(crate) config: Arc<MonitorConfig>,
    pub(crate) connector: Arc<dyn StoreConnector>,
    pub(crate) listener: Arc<dyn MonitorListener>,
    pub(crate) generation: u64,
    pub(crate) session: Session,
    pub(crate) read_view: Arc<ArcSwap<MembershipSnapshot>>,
    pub(crate) status: watch::Sender<MonitorStatus>,
    pub(crate) dispatches: JoinSet<()>,
}

/// State of one generation, dropped wholesale on restart or stop.
#[derive(Default)]
pub(crate) struct Session {
    pub(crate) client: Option<Arc<dyn StoreClient>>,
    pub(crate) timers: Vec<ScheduleKey>,
    pub(crate) reconnect: Option<ScheduleKey>,
    pub(crate) snapshot: Arc<MembershipSnapshot>,
    pub(crate) discovery_in_flight: bool,
    pub(crate) master: Option<BoundMaster>,
    pub(crate) heartbeat: Option<ScheduleKey>,
    pub(crate) probe: Option<ProbeRound>,
    pub(crate) probe_rounds: u64,
    pub(crate) bindings: u64,
}

impl MonitorActor {
    pub(crate) fn new(
        config: Arc<MonitorConfig>,
        connector: Arc<dyn StoreConnector>,
        listener: Arc<dyn MonitorListener>,
        read_view: Arc<ArcSwap<MembershipSnapshot>>,
        status: watch::Sender<MonitorStatus>,
    ) -> Self {
        Self {
            config,
            connector,
            listener,
            generation: 0,
            session: Session::default(),
            read_view,
            status,
            dispatches: JoinSet::new(),
        }
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn server_id(&self) -> String {
        self.listener.self_record().id
    }

    pub(crate) fn set_status(&self, status: MonitorStatus) {
        self.status.send_replace(status);
    }

    pub(crate) fn begin_session(&mut self, context: &mut ActorContext<Self>) {
        self.session = Session::default();
        self.set_status(MonitorStatus::Connecting { generation: self.generation });
        context.myself().tell(Connect { generation: self.generation });
    }

    /// Quiesces the current generation: no timer of it fires again and every
    /// connection it opened is closed once this returns.
    pub(crate) async fn end_session(&mut self) {
        let session = std::mem::take(&mut self.session);
        for key in session.timers {
            key.cancel();
        }
        session.reconnect.into_foreach(|key| key.cancel());
        session.heartbeat.into_foreach(|key| key.cancel());
        self.dispatches.abort_all();
        if let Some(round) = session.probe {
            for (_, client) in round.candidates {
                client.close().await;
            }
        }
        if let Some(master) = session.master {
            master.client.close().await;
        }
        if let Some(client) = session.client {
            client.close().await;
        }
    }

    pub(crate) fn on_connected(&mut self, context: &mut ActorContext<Self>, client: Arc<dyn StoreClient>) {
        info!("{} connected to store {} successfully", self.server_id(), client.node());
        Self::watch_events(self.server_id(), client.as_ref());
        self.session.client = Some(client);
        self.set_status(MonitorStatus::Running { generation: self.generation });
        let generation = self.generation;
        let myself = context.myself().clone();
        myself.tell(RegisterTick { generation });
        myself.tell(DiscoverTick { generation });
        self.arm_timers(context);
        if self.config.is_multi() {
            myself.tell(master::probe_master::ProbeMaster { generation });
        }
    }

    fn arm_timers(&mut self, context: &mut ActorContext<Self>) {
        let generation = self.generation;
        let scheduler = context.scheduler();
        let myself = context.myself().clone();
        let register = scheduler.schedule_with_fixed_delay(None, self.config.registration_period.into(), move || {
            myself.tell(RegisterTick { generation });
        });
        let myself = context.myself().clone();
        let discover = scheduler.schedule_with_fixed_delay(None, self.config.lease_refresh_period.into(), move || {
            myself.tell(DiscoverTick { generation });
        });
        self.session.timers.push(register);
        self.session.timers.push(discover);
        if self.config.lease_compaction_grace.is_some() {
            let myself = context.myself().clone();
            let compact = scheduler.schedule_with_fixed_delay(None, self.config.lease_expiry.into(), move || {
                myself.tell(CompactTick { generation });
            });
            self.session.timers.push(compact);
        }
    }

    /// Logs connection lifecycle events. None of them is acted upon, losing the
    /// master is detected by the heartbeat.
    pub(crate) fn watch_events(server_id: String, client: &dyn StoreClient) {
        let node = client.node().clone();
        let mut events = client.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreEvent::Connected) => {
                        debug!("{} store {} connected", server_id, node);
                    }
                    Ok(StoreEvent::Error(error)) => {
                        error!("{} has errors with store {}: {}", server_id, node, error);
                    }
                    Ok(StoreEvent::Closed) => {
                        warn!("{} connection to store {} has been closed", server_id, node);
                        break;
                    }
                    Ok(StoreEvent::Terminated) => {
                        warn!("{} connection to store {} is over and without reconnection", server_id, node);
                        break;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("{} skipped {} store events", server_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Ends a discovery cycle by replacing the snapshot wholesale.
    pub(crate) fn finish_discovery(&mut self, members: HashMap<String, ServerRecord>) {
        self.session.discovery_in_flight = false;
        let snapshot = MembershipSnapshot::new(members);
        debug!("{} cluster servers info: {:?}", self.server_id(), snapshot.ids());
        let snapshot = Arc::new(snapshot);
        self.session.snapshot = snapshot.clone();
        self.read_view.store(snapshot.clone());
        self.listener.on_membership_changed(snapshot);
    }
}

impl Debug for MonitorActor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorActor")
            .field("env", &self.config.env)
            .field("mode", &self.config.mode)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Actor for MonitorActor {
    async fn started(&mut self, context: &mut ActorContext<Self>) -> anyhow::Result<()> {
        self.begin_session(context);
        Ok(())
    }

    async fn stopped(&mut self, context: &mut ActorContext<Self>) -> anyhow::Result<()> {
        self.end_session().await;
        context.scheduler().cancel_all();
        self.set_status(MonitorStatus::Stopped);
        debug!("{} monitor of {} stopped", context.myself(), self.config.env);
        Ok(())
    }
}
