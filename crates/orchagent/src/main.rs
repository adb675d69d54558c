//! SONiC orchagent entry point.
//!
//! Builds the port registry, the error monitor tables and the counter
//! source, registers ErrorMonitorOrch with the OrchDaemon and runs the event
//! loop until SIGINT. In Redis mode two background tasks follow CONFIG_DB
//! and the STATE_DB clear channel for the lifetime of the process.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use sonic_orch_common::{
    ConsumerSender, MemoryTable, NotificationSender, RedisConfig, Table, TableResult,
};
use tokio::sync::Notify;
use sonic_orchagent::daemon::{OrchDaemon, OrchDaemonConfig};
use sonic_orchagent::error_monitor::{ErrorMonitorOrch, ErrorMonitorOrchConfig};
use sonic_orchagent::ports::{LocalPortRegistry, Port};
use sonic_sai::{PortApi, PortOid, PortStat, PortStatsApi, SaiResult, SwitchOid};

/// First port OID handed out to ports given on the command line.
const PORT_OID_BASE: u64 = 0x1000000000001;
const SWITCH_OID: u64 = 0x21000000000000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Plain text through env_logger
    Text,
    /// JSON lines through tracing-subscriber
    Json,
}

/// SONiC Switch Orchestration Agent
#[derive(Parser, Debug)]
#[command(name = "orchagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Batch size for consumer table operations
    #[arg(short = 'b', long, default_value = "128")]
    batch_size: usize,

    /// Heartbeat interval in milliseconds
    #[arg(long, default_value = "1000")]
    heartbeat_interval: u64,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,

    /// Redis database index for CONFIG_DB
    #[arg(long, default_value = "4")]
    config_db: u8,

    /// Redis database index for STATE_DB
    #[arg(long, default_value = "6")]
    state_db: u8,

    /// Keep all tables in memory instead of Redis
    #[arg(long)]
    simulation: bool,

    /// Physical ports to monitor (repeat or comma-separate)
    #[arg(short = 'p', long = "port", value_delimiter = ',')]
    ports: Vec<String>,

    /// JSON file with ErrorMonitorOrch settings
    #[arg(long)]
    error_monitor_config: Option<PathBuf>,

    /// Poll interval in seconds, overrides the config file
    #[arg(long)]
    poll_interval: Option<u32>,
}

/// Counter source for simulation mode: every port reports no errors.
struct IdleCounters;

impl PortStatsApi for IdleCounters {
    fn get_port_stats(&self, _port: PortOid, counters: &[PortStat]) -> SaiResult<Vec<u64>> {
        Ok(vec![0; counters.len()])
    }
}

fn load_error_monitor_config(args: &Args) -> Result<ErrorMonitorOrchConfig, String> {
    let mut config = match &args.error_monitor_config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?
        }
        None => ErrorMonitorOrchConfig::default(),
    };

    if let Some(secs) = args.poll_interval {
        config.poll_interval_secs = secs;
    }
    Ok(config.with_batch_size(args.batch_size))
}

fn build_port_registry(aliases: &[String]) -> Arc<LocalPortRegistry> {
    let registry = Arc::new(LocalPortRegistry::new());
    for (alias, raw) in aliases.iter().zip(PORT_OID_BASE..) {
        match PortOid::from_raw(raw) {
            Some(oid) => registry.add_port(Port::phy(alias.clone(), oid)),
            None => warn!("No OID available for port {}", alias),
        }
    }
    registry.set_all_ports_ready(true);
    registry
}

/// Live Redis sources for the orch's config and clear channels.
struct RedisFeeds {
    config_db: RedisConfig,
    state_db: RedisConfig,
    separator: String,
}

/// Tables, counter source and live feeds for the chosen backend.
struct Backend {
    state_table: Table,
    config_table: Table,
    counters: Arc<dyn PortStatsApi>,
    feeds: Option<RedisFeeds>,
}

fn simulation_backend(config: &ErrorMonitorOrchConfig) -> Backend {
    Backend {
        state_table: Table::new(MemoryTable::new(config.state_table.clone())),
        config_table: Table::new(MemoryTable::new(config.config_table.clone())),
        counters: Arc::new(IdleCounters),
        feeds: None,
    }
}

fn redis_backend(
    args: &Args,
    config: &mut ErrorMonitorOrchConfig,
) -> Result<Backend, sonic_orch_common::TableError> {
    use sonic_orch_common::{RedisDb, RedisTable};

    let config_db = RedisConfig::new(args.redis_host.clone(), args.redis_port, RedisDb::ConfigDb)
        .with_db_index(args.config_db);
    let state_db = RedisConfig::new(args.redis_host.clone(), args.redis_port, RedisDb::StateDb)
        .with_db_index(args.state_db);

    let state_table = RedisTable::connect(&state_db, config.state_table.clone())?;
    let config_table = RedisTable::connect(&config_db, config.config_table.clone())?;
    config.key_separator = config_table.separator().to_string();

    let switch_id = SwitchOid::from_raw(SWITCH_OID).unwrap_or_default();

    Ok(Backend {
        state_table: Table::new(state_table),
        config_table: Table::new(config_table),
        counters: Arc::new(PortApi::new(switch_id)),
        feeds: Some(RedisFeeds {
            config_db,
            state_db,
            separator: config.key_separator.clone(),
        }),
    })
}

fn log_feed_exit(name: &str, result: TableResult<()>) {
    match result {
        Ok(()) => info!("{} feed closed", name),
        Err(e) => error!("{} feed failed: {}", name, e),
    }
}

/// Starts the CONFIG_DB table watcher and the clear channel subscriber.
///
/// Existing config rows reach the orch through the watcher's first batch.
fn spawn_redis_feeds(
    feeds: RedisFeeds,
    config_table: String,
    clear_channel: String,
    config_tx: ConsumerSender,
    clear_tx: NotificationSender,
    waker: Arc<Notify>,
) {
    let config_tx = config_tx.with_waker(waker.clone());
    let clear_tx = clear_tx.with_waker(waker);

    tokio::spawn(async move {
        let result = sonic_orch_common::watch_table(
            feeds.config_db,
            config_table.clone(),
            feeds.separator,
            config_tx,
        )
        .await;
        log_feed_exit(&config_table, result);
    });
    tokio::spawn(async move {
        let result =
            sonic_orch_common::watch_channel(feeds.state_db, clear_channel.clone(), clear_tx)
                .await;
        log_feed_exit(&clear_channel, result);
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match args.log_format {
        LogFormat::Text => {
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(&args.log_level),
            )
            .init();
        }
        LogFormat::Json => sonic_orchagent::audit::init_logging(&args.log_level),
    }

    info!("====================================================================");
    info!("Starting SONiC orchagent (TX error monitor)");
    info!("====================================================================");
    info!("Batch size: {}", args.batch_size);
    info!("Heartbeat interval: {}ms", args.heartbeat_interval);
    if args.simulation {
        info!("Simulation mode: ENABLED");
    } else {
        info!("Redis: {}:{}", args.redis_host, args.redis_port);
        info!("CONFIG_DB: {}", args.config_db);
        info!("STATE_DB: {}", args.state_db);
    }

    let mut monitor_config = match load_error_monitor_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let registry = build_port_registry(&args.ports);
    info!("{} ports registered", registry.port_count());

    let backend = if args.simulation {
        simulation_backend(&monitor_config)
    } else {
        match redis_backend(&args, &mut monitor_config) {
            Ok(backend) => backend,
            Err(e) => {
                error!("Failed to open Redis tables: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };

    let orch = ErrorMonitorOrch::new(
        monitor_config,
        backend.state_table,
        backend.config_table,
        registry,
        backend.counters,
    );

    let mut daemon = OrchDaemon::new(OrchDaemonConfig {
        heartbeat_interval_ms: args.heartbeat_interval,
    });
    if let Some(feeds) = backend.feeds {
        spawn_redis_feeds(
            feeds,
            orch.config().config_table.clone(),
            orch.config().clear_channel.clone(),
            orch.config_sender(),
            orch.clear_sender(),
            daemon.waker(),
        );
    }
    daemon.register_orch(Box::new(orch));

    info!("Initializing orchagent daemon...");
    if !daemon.init().await {
        error!("Failed to initialize orchagent daemon");
        return ExitCode::FAILURE;
    }

    info!("Starting event loop...");
    daemon
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => warn!("Received SIGINT, shutting down gracefully..."),
                Err(err) => {
                    error!("Failed to listen for ctrl-c: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await;

    info!("====================================================================");
    info!("SONiC orchagent shutdown complete");
    info!("====================================================================");

    ExitCode::SUCCESS
}
