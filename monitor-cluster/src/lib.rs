pub use command::{CommandResult, RemoteCommand};
pub use config::{MasterTieBreak, Mode, MonitorConfig};
pub use error::MonitorError;
pub use listener::MonitorListener;
pub use monitor::{Monitor, MonitorSetting};
pub use server_record::ServerRecord;
pub use snapshot::MembershipSnapshot;
pub use status::MonitorStatus;

pub mod command;
pub mod config;
pub(crate) mod discovery;
pub mod error;
pub mod keys;
pub mod listener;
pub mod monitor;
pub(crate) mod monitor_actor;
pub mod replication;
pub mod server_record;
pub mod snapshot;
pub mod status;

pub const MONITOR_CONFIG: &str = include_str!("../monitor.toml");

#[cfg(test)]
mod cluster_test {
    use tracing::Level;

    use monitor_core::ext::init_logger;

    #[ctor::ctor]
    fn init() {
        init_logger(Level::DEBUG)
    }
}
