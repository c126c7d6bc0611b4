use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use tracing::info;

use monitor_cluster::{CommandResult, MembershipSnapshot, Mode, Monitor, MonitorConfig, MonitorListener, MonitorSetting, RemoteCommand, ServerRecord};
use monitor_core::config::ConfigBuilder;
use monitor_core::ext::init_logger_with_filter;
use monitor_store::redis_store::RedisConnector;
use monitor_store::StoreNode;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum ModeArg {
    Single,
    Multi,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long)]
    env: Option<String>,
    #[arg(short, long)]
    id: String,
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(short, long)]
    port: u16,
    #[arg(short, long)]
    redis: Vec<StoreNode>,
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long)]
    server_type: Option<String>,
    /// Optional toml file layered over the built in defaults.
    #[arg(short, long)]
    config: Option<String>,
}

struct NodeListener {
    record: ServerRecord,
}

#[async_trait]
impl MonitorListener for NodeListener {
    fn self_record(&self) -> ServerRecord {
        self.record.clone()
    }

    fn on_membership_changed(&self, snapshot: Arc<MembershipSnapshot>) {
        info!("{} members: {:?}", self.record.id, snapshot.ids());
    }

    async fn on_command(&self, command: RemoteCommand) -> Option<CommandResult> {
        info!("{} receive command {:?}", self.record.id, command);
        Some(CommandResult::new(format!("{} handled {}", self.record.id, command.command)))
    }

    fn on_restart(&self, generation: u64) {
        info!("{} monitor restarted, generation {}", self.record.id, generation);
    }
}

/// Flags win over the config file, absent flags leave it untouched.
fn apply_args(config: &mut MonitorConfig, args: &Args) {
    if let Some(env) = &args.env {
        config.env = env.clone();
    }
    if !args.redis.is_empty() {
        config.store_nodes = args.redis.clone();
    }
    if let Some(mode) = args.mode {
        config.mode = match mode {
            ModeArg::Single => Mode::Single,
            ModeArg::Multi => Mode::Multi,
        };
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger_with_filter("monitor_cluster=debug,monitor_store=debug,node=info");
    let mut builder = MonitorConfig::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::with_name(path))?;
    }
    let mut config = builder.build()?;
    apply_args(&mut config, &args);
    let mut record = ServerRecord::new(args.id, args.host, args.port);
    if let Some(server_type) = args.server_type {
        record = record.with_metadata("serverType", server_type);
    }
    let setting = MonitorSetting::builder()
        .config(config)
        .connector(Arc::new(RedisConnector::default()))
        .listener(Arc::new(NodeListener { record }))
        .build();
    let monitor = Monitor::start(setting);
    tokio::signal::ctrl_c().await?;
    monitor.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use config::{File, FileFormat};

    use monitor_cluster::{Mode, MonitorConfig};
    use monitor_core::config::ConfigBuilder;
    use monitor_store::StoreNode;

    use crate::{apply_args, Args};

    const FILE: &str = r#"
env = "production"
mode = "multi"
store-nodes = [{ host = "10.0.0.1", port = 6379 }, { host = "10.0.0.2", port = 6380 }]
"#;

    fn file_config() -> anyhow::Result<MonitorConfig> {
        MonitorConfig::builder()
            .add_source(File::from_str(FILE, FileFormat::Toml))?
            .build()
    }

    #[test]
    fn test_absent_flags_keep_file_values() -> anyhow::Result<()> {
        let mut config = file_config()?;
        let args = Args::try_parse_from(["node", "--id", "a", "--port", "4000"])?;
        apply_args(&mut config, &args);
        assert_eq!(config.env, "production");
        assert!(matches!(config.mode, Mode::Multi));
        assert_eq!(config.store_nodes, vec![StoreNode::new("10.0.0.1", 6379), StoreNode::new("10.0.0.2", 6380)]);
        Ok(())
    }

    #[test]
    fn test_given_flags_override_file_values() -> anyhow::Result<()> {
        let mut config = file_config()?;
        let args = Args::try_parse_from([
            "node", "--id", "a", "--port", "4000", "--env", "staging", "--mode", "single", "--redis", "127.0.0.1:7000",
        ])?;
        apply_args(&mut config, &args);
        assert_eq!(config.env, "staging");
        assert!(matches!(config.mode, Mode::Single));
        assert_eq!(config.store_nodes, vec![StoreNode::new("127.0.0.1", 7000)]);
        Ok(())
    }
}
