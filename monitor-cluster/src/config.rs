use std::time::Duration;

use config::{File, FileFormat, Source};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use monitor_core::config::ConfigBuilder;
use monitor_core::util::duration::ConfigDuration;
use monitor_store::StoreNode;

use crate::MONITOR_CONFIG;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Single,
    #[serde(alias = "multiple")]
    Multi,
}

/// How a probing round resolves more than one replica claiming to be master.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MasterTieBreak {
    /// Every master response rebinds, the last one to arrive wins.
    LastResponse,
    /// Wait for the whole round, then bind the first master in node order.
    ConfigOrder,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MonitorConfig {
    pub env: String,
    pub mode: Mode,
    pub store_nodes: Vec<StoreNode>,
    pub lease_refresh_period: ConfigDuration,
    pub lease_expiry: ConfigDuration,
    pub registration_period: ConfigDuration,
    pub registration_ttl_multiplier: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_missing_batch_size: Option<usize>,
    pub heartbeat_period: ConfigDuration,
    pub heartbeat_timeout: ConfigDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_credential: Option<String>,
    pub reconnect_delay: ConfigDuration,
    pub master_tie_break: MasterTieBreak,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_compaction_grace: Option<ConfigDuration>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            mode: Mode::Single,
            store_nodes: vec![StoreNode::new("127.0.0.1", 6379)],
            lease_refresh_period: ConfigDuration::from_secs(10),
            lease_expiry: ConfigDuration::from_secs(30),
            registration_period: ConfigDuration::from_secs(10),
            registration_ttl_multiplier: 3,
            max_missing_batch_size: None,
            heartbeat_period: ConfigDuration::from_secs(10),
            heartbeat_timeout: ConfigDuration::from_secs(5),
            auth_credential: None,
            reconnect_delay: ConfigDuration::from_secs(3),
            master_tie_break: MasterTieBreak::LastResponse,
            lease_compaction_grace: None,
        }
    }
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Expiry of the registration record, long enough to survive missed
    /// registration ticks before the store reclaims it.
    pub fn registration_ttl(&self) -> Duration {
        self.registration_period.to_std_duration() * self.registration_ttl_multiplier
    }

    pub fn is_multi(&self) -> bool {
        self.mode == Mode::Multi
    }

    /// Nodes the primary connection may use, in the order they are tried.
    pub fn primary_candidates(&self) -> Vec<StoreNode> {
        match self.mode {
            Mode::Single => self.store_nodes.iter().take(1).cloned().collect(),
            Mode::Multi => self.store_nodes.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    builder: config::ConfigBuilder<DefaultState>,
}

impl ConfigBuilder for MonitorConfigBuilder {
    type C = MonitorConfig;

    fn add_source<T>(self, source: T) -> anyhow::Result<Self> where T: Source + Send + Sync + 'static {
        Ok(Self { builder: self.builder.add_source(source) })
    }

    fn build(self) -> anyhow::Result<Self::C> {
        let builder = config::Config::builder()
            .add_source(File::from_str(MONITOR_CONFIG, FileFormat::Toml))
            .add_source(self.builder.build()?);
        let monitor_config = builder.build()?.try_deserialize::<Self::C>()?;
        Ok(monitor_config)
    }
}
