use std::sync::Arc;

use async_trait::async_trait;

use crate::command::{CommandResult, RemoteCommand};
use crate::server_record::ServerRecord;
use crate::snapshot::MembershipSnapshot;

/// Callbacks through which the hosting application feeds the monitor and
/// receives what it discovers. Callbacks run on the monitor's own task, except
/// [`MonitorListener::on_command`] which runs on a task of its own.
#[async_trait]
pub trait MonitorListener: Send + Sync + 'static {
    /// The record this process registers. Asked again on every registration
    /// and discovery tick so live metadata is picked up.
    fn self_record(&self) -> ServerRecord;

    fn on_membership_changed(&self, snapshot: Arc<MembershipSnapshot>);

    /// Executes a remote command, the returned result is written back to the
    /// command result key.
    #[allow(unused_variables)]
    async fn on_command(&self, command: RemoteCommand) -> Option<CommandResult> {
        None
    }

    /// Called after a heartbeat timeout tore the session down, before the new
    /// session connects.
    #[allow(unused_variables)]
    fn on_restart(&self, generation: u64) {}
}
