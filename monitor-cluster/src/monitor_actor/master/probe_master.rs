use async_trait::async_trait;
use tracing::debug;

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;

use crate::monitor_actor::master::probe_result::{probe, ProbeResult};
use crate::monitor_actor::master::ProbeRound;
use crate::monitor_actor::MonitorActor;

/// Starts a probing round: every configured replica is asked for its
/// replication role concurrently.
#[derive(Debug)]
pub(crate) struct ProbeMaster {
    pub(crate) generation: u64,
}

#[async_trait]
impl Message for ProbeMaster {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let generation = self.generation;
        if !actor.is_current(generation) {
            return Ok(());
        }
        if actor.session.probe.is_some() {
            debug!("{} probing round already running", context.myself());
            return Ok(());
        }
        actor.session.probe_rounds += 1;
        let round = actor.session.probe_rounds;
        let nodes = actor.config.store_nodes.clone();
        actor.session.probe = Some(ProbeRound { round, pending: nodes.len(), candidates: Vec::new() });
        if nodes.is_empty() {
            actor.session.probe = None;
            actor.schedule_reprobe(context);
            return Ok(());
        }
        let timeout = actor.config.heartbeat_timeout.to_std_duration();
        debug!("{} probe master among {:?}", context.myself(), nodes);
        for (index, node) in nodes.into_iter().enumerate() {
            let connector = actor.connector.clone();
            let auth = actor.config.auth_credential.clone();
            context.pipe_to_self(async move {
                let result = probe(connector.as_ref(), &node, auth.as_deref(), timeout).await;
                ProbeResult { generation, round, index, node, result }
            });
        }
        Ok(())
    }
}
