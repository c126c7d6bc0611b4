use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use monitor_core::actor::actor_ref::ActorRef;
use monitor_core::actor::scheduler::scheduler;
use monitor_core::actor::spawn_actor;
use monitor_store::StoreConnector;

use crate::command::CommandResult;
use crate::config::MonitorConfig;
use crate::listener::MonitorListener;
use crate::monitor_actor::send_command_result::SendCommandResult;
use crate::monitor_actor::MonitorActor;
use crate::snapshot::MembershipSnapshot;
use crate::status::MonitorStatus;

#[derive(TypedBuilder)]
pub struct MonitorSetting {
    pub config: MonitorConfig,
    pub connector: Arc<dyn StoreConnector>,
    pub listener: Arc<dyn MonitorListener>,
}

impl Debug for MonitorSetting {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorSetting")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Handle to a running membership monitor. Dropping the handle does not stop
/// the monitor, call [`Monitor::stop`].
pub struct Monitor {
    env: String,
    actor: ActorRef<MonitorActor>,
    handle: Mutex<Option<JoinHandle<()>>>,
    read_view: Arc<ArcSwap<MembershipSnapshot>>,
    status: watch::Receiver<MonitorStatus>,
}

impl Monitor {
    /// Spawns the monitor on the current tokio runtime. Connecting happens in
    /// the background, failures are logged and retried, never returned here.
    pub fn start(setting: MonitorSetting) -> Self {
        let MonitorSetting { config, connector, listener } = setting;
        let env = config.env.clone();
        let server_id = listener.self_record().id;
        let read_view = Arc::new(ArcSwap::from_pointee(MembershipSnapshot::default()));
        let (status_tx, status) = watch::channel(MonitorStatus::Connecting { generation: 0 });
        let actor = MonitorActor::new(Arc::new(config), connector, listener, read_view.clone(), status_tx);
        let (actor, handle) = spawn_actor(format!("monitor/{}/{}", env, server_id), actor, scheduler());
        info!("{} start monitor of env {}", actor, env);
        Self {
            env,
            actor,
            handle: Mutex::new(Some(handle)),
            read_view,
            status,
        }
    }

    /// Stops the monitor and waits until every timer is cancelled and every
    /// connection is closed. Calling it again is a no-op.
    pub async fn stop(&self) {
        let Some(handle) = self.handle.lock().await.take() else {
            debug!("{} already stopped", self.actor);
            return;
        };
        self.actor.stop();
        if let Err(error) = handle.await {
            tracing::error!("{} stop with error {}", self.actor, error);
        }
        info!("{} monitor of env {} stopped", self.actor, self.env);
    }

    /// Latest published membership snapshot.
    pub fn membership(&self) -> Arc<MembershipSnapshot> {
        self.read_view.load_full()
    }

    pub fn status(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// Writes `result` under this server's command result key, `kind`
    /// selecting a sub key.
    pub fn send_command_result(&self, result: impl Into<String>, kind: Option<&str>) {
        let result = match kind {
            None => CommandResult::new(result),
            Some(kind) => CommandResult::with_kind(result, kind),
        };
        self.actor.tell(SendCommandResult { result });
    }
}

impl Debug for Monitor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("env", &self.env)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}
