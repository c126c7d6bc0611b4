use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use monitor_core::actor::context::ActorContext;
use monitor_core::Message;
use monitor_store::{StoreClient, StoreConnector, StoreError, StoreNode};

use crate::config::MasterTieBreak;
use crate::error::MonitorError;
use crate::monitor_actor::MonitorActor;
use crate::replication::is_master;

/// Connects to `node` and asks for its replication role, each step bounded by
/// `timeout` so a silent replica cannot hold the probing round open. The
/// connection is handed back whatever the role, the caller decides whether to
/// keep it.
pub(crate) async fn probe(
    connector: &dyn StoreConnector,
    node: &StoreNode,
    auth: Option<&str>,
    timeout: Duration,
) -> Result<(Arc<dyn StoreClient>, bool), StoreError> {
    let client = tokio::time::timeout(timeout, connector.connect(node, auth))
        .await
        .map_err(|_| StoreError::Timeout)??;
    match tokio::time::timeout(timeout, client.replication_info()).await {
        Ok(Ok(info)) => Ok((client, is_master(&info))),
        Ok(Err(error)) => {
            client.close().await;
            Err(error)
        }
        Err(_) => {
            client.close().await;
            Err(StoreError::Timeout)
        }
    }
}

pub(crate) struct ProbeResult {
    pub(crate) generation: u64,
    pub(crate) round: u64,
    pub(crate) index: usize,
    pub(crate) node: StoreNode,
    pub(crate) result: Result<(Arc<dyn StoreClient>, bool), StoreError>,
}

impl std::fmt::Debug for ProbeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeResult")
            .field("generation", &self.generation)
            .field("round", &self.round)
            .field("node", &self.node)
            .field("master", &self.result.as_ref().map(|(_, master)| *master))
            .finish()
    }
}

#[async_trait]
impl Message for ProbeResult {
    type A = MonitorActor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
        let Self { generation, round, index, node, result } = *self;
        let current_round = actor.is_current(generation)
            && actor.session.probe.as_ref().is_some_and(|probe| probe.round == round);
        if !current_round {
            if let Ok((client, _)) = result {
                client.close().await;
            }
            return Ok(());
        }
        match result {
            Ok((client, true)) => {
                debug!("{} replica {} reports master", context.myself(), node);
                match actor.config.master_tie_break {
                    MasterTieBreak::LastResponse => {
                        actor.bind_master(context, client).await;
                    }
                    MasterTieBreak::ConfigOrder => {
                        if let Some(probe) = actor.session.probe.as_mut() {
                            probe.candidates.push((index, client));
                        }
                    }
                }
            }
            Ok((client, false)) => {
                debug!("{} replica {} is not master, close it", context.myself(), node);
                client.close().await;
            }
            Err(error) => {
                error!("{} probe replica {} failed: {}", context.myself(), node, MonitorError::from(error));
            }
        }
        let finished = match actor.session.probe.as_mut() {
            Some(probe) => {
                probe.pending = probe.pending.saturating_sub(1);
                probe.pending == 0
            }
            None => false,
        };
        if finished {
            if let Some(probe) = actor.session.probe.take() {
                let mut candidates = probe.candidates;
                candidates.sort_by_key(|(index, _)| *index);
                let mut candidates = candidates.into_iter();
                if let Some((_, client)) = candidates.next() {
                    actor.bind_master(context, client).await;
                }
                for (_, client) in candidates {
                    client.close().await;
                }
            }
            if actor.session.master.is_none() {
                actor.schedule_reprobe(context);
            }
        }
        Ok(())
    }
}
