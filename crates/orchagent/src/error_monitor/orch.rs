//! ErrorMonitorOrch implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use sonic_orch_common::{
    Consumer, ConsumerConfig, ConsumerSender, KeyOpFieldsValues, Notification,
    NotificationConsumer, NotificationSender, Orch, SelectableTimer, Table, TableError,
};
use sonic_sai::{PortStat, PortStatsApi, SaiError};
use thiserror::Error;

use super::context::ContextStore;
use super::types::{
    parse_config_key, ClearTarget, ConfigField, MonitorAdminStatus, MonitorContext,
    TxErrorStatus, CLEAR_ERROR_MONITOR_CHANNEL, CLEAR_OP_TX_ERROR_STATUS,
    DEFAULT_KEY_SEPARATOR, ERROR_MONITOR_CONFIG_TABLE, ERROR_MONITOR_STATE_TABLE,
    FIELD_POLL_INTERVAL, FIELD_TX_ERROR, FIELD_TX_ERROR_STATUS, FIELD_TX_ERROR_THRESHOLD,
};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::ports::{PortRegistry, PortSubscription, PortUpdate};

const ORCH_NAME: &str = "ErrorMonitorOrch";

/// Error type for ErrorMonitorOrch operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorMonitorOrchError {
    #[error("Invalid key {key}: expected <table>{separator}<port>")]
    InvalidKey { key: String, separator: String },

    #[error("Port {0} not found")]
    PortNotFound(String),

    #[error("Port {0} is not a physical port")]
    NotPhysicalPort(String),

    #[error("Invalid value '{value}' for field {field}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported field {0}")]
    UnsupportedField(String),

    #[error("Unsupported clear operation {0}")]
    UnsupportedClearOp(String),

    #[error("Failed to read TX errors of {port}: {source}")]
    CounterQuery { port: String, source: SaiError },

    #[error(transparent)]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, ErrorMonitorOrchError>;

/// Configuration for ErrorMonitorOrch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorMonitorOrchConfig {
    /// Config table name; also the consumer name.
    pub config_table: String,
    /// State table name.
    pub state_table: String,
    /// Notification channel carrying clear requests.
    pub clear_channel: String,
    /// Separator between table name and port in config keys.
    pub key_separator: String,
    /// Poll period applied at startup, 0 leaves the timer stopped.
    pub poll_interval_secs: u32,
    /// Config batches pulled per `do_task()`.
    pub batch_size: usize,
}

impl Default for ErrorMonitorOrchConfig {
    fn default() -> Self {
        Self {
            config_table: ERROR_MONITOR_CONFIG_TABLE.to_string(),
            state_table: ERROR_MONITOR_STATE_TABLE.to_string(),
            clear_channel: CLEAR_ERROR_MONITOR_CHANNEL.to_string(),
            key_separator: DEFAULT_KEY_SEPARATOR.to_string(),
            poll_interval_secs: 0,
            batch_size: 128,
        }
    }
}

impl ErrorMonitorOrchConfig {
    pub fn with_key_separator(mut self, separator: impl Into<String>) -> Self {
        self.key_separator = separator.into();
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u32) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Statistics for ErrorMonitorOrch operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMonitorOrchStats {
    /// Config fields processed, valid or not.
    pub config_updates: u64,
    /// Config fields or clear requests rejected.
    pub invalid_events: u64,
    pub clears_processed: u64,
    pub poll_ticks: u64,
    pub query_failures: u64,
    pub counter_regressions: u64,
    pub ports_purged: u64,
    /// Events discarded because ports were not ready.
    pub events_dropped: u64,
    pub flush_failures: u64,
}

/// Tables flushed at the end of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushScope {
    State,
    StateAndConfig,
}

/// Per-port TX error threshold monitor.
///
/// Owns the per-port contexts, the poll timer and both tables. All entry
/// points run on the daemon task; each one ends with a flush of the tables
/// it wrote to.
pub struct ErrorMonitorOrch {
    config: ErrorMonitorOrchConfig,
    ports: Arc<dyn PortRegistry>,
    counters: Arc<dyn PortStatsApi>,
    consumer: Consumer,
    config_sender: ConsumerSender,
    clear_consumer: NotificationConsumer,
    clear_sender: NotificationSender,
    port_updates: Option<PortSubscription>,
    state_table: Table,
    config_table: Table,
    store: ContextStore,
    timer: SelectableTimer,
    stats: ErrorMonitorOrchStats,
}

impl std::fmt::Debug for ErrorMonitorOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorMonitorOrch")
            .field("config", &self.config)
            .field("contexts", &self.store.len())
            .field("enabled", &self.store.enabled_ports().len())
            .field("timer", &self.timer)
            .field("subscribed", &self.port_updates.is_some())
            .finish()
    }
}

impl ErrorMonitorOrch {
    /// Creates the monitor, subscribes to port updates and clears every
    /// row left in the state table by a previous run.
    pub fn new(
        config: ErrorMonitorOrchConfig,
        state_table: Table,
        config_table: Table,
        ports: Arc<dyn PortRegistry>,
        counters: Arc<dyn PortStatsApi>,
    ) -> Self {
        let (consumer, config_sender) = Consumer::channel(
            ConsumerConfig::new(config.config_table.clone()).with_batch_size(config.batch_size),
        );
        let (clear_consumer, clear_sender) =
            NotificationConsumer::channel(config.clear_channel.clone());
        let port_updates = Some(ports.subscribe());

        let mut orch = Self {
            config,
            ports,
            counters,
            consumer,
            config_sender,
            clear_consumer,
            clear_sender,
            port_updates,
            state_table,
            config_table,
            store: ContextStore::new(),
            timer: SelectableTimer::new(Duration::ZERO),
            stats: ErrorMonitorOrchStats::default(),
        };

        orch.remove_all_status();
        if orch.config.poll_interval_secs > 0 {
            orch.apply_poll_interval(orch.config.poll_interval_secs, Instant::now());
        }

        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, ORCH_NAME, "start")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "config_table": orch.config.config_table,
                "state_table": orch.config.state_table,
                "clear_channel": orch.config.clear_channel,
            })));

        orch
    }

    pub fn config(&self) -> &ErrorMonitorOrchConfig {
        &self.config
    }

    pub fn stats(&self) -> &ErrorMonitorOrchStats {
        &self.stats
    }

    /// Sender feeding config table changes into this orch.
    pub fn config_sender(&self) -> ConsumerSender {
        self.config_sender.clone()
    }

    /// Sender for clear requests.
    pub fn clear_sender(&self) -> NotificationSender {
        self.clear_sender.clone()
    }

    pub fn context(&self, port: &str) -> Option<&MonitorContext> {
        self.store.get(port)
    }

    pub fn context_count(&self) -> usize {
        self.store.len()
    }

    pub fn is_enabled(&self, port: &str) -> bool {
        self.store.is_enabled(port)
    }

    /// Current poll period, `None` while polling is stopped.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.timer.is_running().then(|| self.timer.interval())
    }

    /// False once [`ErrorMonitorOrch::shutdown`] has run.
    pub fn is_subscribed(&self) -> bool {
        self.port_updates.is_some()
    }

    pub fn dump(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{}: {} contexts, poll interval {:?}",
            ORCH_NAME,
            self.store.len(),
            self.poll_interval()
        )];
        for ctx in self.store.iter() {
            lines.push(format!(
                "  {} threshold={} last={} enabled={}",
                ctx.port_name,
                ctx.error_threshold,
                ctx.last_error_count,
                self.store.is_enabled(&ctx.port_name)
            ));
        }
        lines
    }

    fn ports_ready(&mut self, event: &str, subject: &str) -> bool {
        if self.ports.all_ports_ready() {
            return true;
        }
        debug!("Ports not ready, dropping {} event for {}", event, subject);
        self.stats.events_dropped += 1;
        false
    }

    /// Runs `f` and flushes the tables in `scope` afterwards, on every path.
    fn flushing<R>(&mut self, scope: FlushScope, f: impl FnOnce(&mut Self) -> R) -> R {
        let result = f(self);
        self.flush_table(false);
        if scope == FlushScope::StateAndConfig {
            self.flush_table(true);
        }
        result
    }

    fn flush_table(&mut self, config: bool) {
        let table = if config {
            &mut self.config_table
        } else {
            &mut self.state_table
        };
        if let Err(e) = table.flush() {
            error!("Failed to flush {}: {}", table.name(), e);
            audit_log!(AuditRecord::new(AuditCategory::ErrorCondition, ORCH_NAME, "flush")
                .with_object_id(table.name())
                .with_object_type("table")
                .with_error(e.to_string()));
            self.stats.flush_failures += 1;
        }
    }

    fn remove_all_status(&mut self) {
        self.flushing(FlushScope::State, |orch| {
            match orch.state_table.get_keys() {
                Ok(keys) => {
                    for key in &keys {
                        orch.state_table.del(key);
                    }
                    if !keys.is_empty() {
                        info!("Removed {} stale rows from {}", keys.len(), orch.state_table.name());
                    }
                }
                Err(e) => error!("Failed to list {}: {}", orch.state_table.name(), e),
            }
        });
    }

    // ============ Configuration ============

    /// Applies one config table change.
    pub fn handle_config_entry(&mut self, entry: &KeyOpFieldsValues) {
        if !self.ports_ready("config", &entry.key) {
            return;
        }
        if entry.op.is_del() {
            debug!("Ignoring DEL for {}", entry.key);
            return;
        }

        for (field, value) in &entry.fvs {
            self.stats.config_updates += 1;
            let result = match field.parse::<ConfigField>() {
                Ok(ConfigField::TxErrorThreshold) => self.set_threshold(&entry.key, value),
                Ok(ConfigField::TxErrorStatus) => {
                    self.flushing(FlushScope::State, |orch| orch.set_status(&entry.key, value))
                }
                Ok(ConfigField::PollInterval) => self.set_poll_interval(value),
                Err(_) => Err(ErrorMonitorOrchError::UnsupportedField(field.clone())),
            };

            if let Err(e) = result {
                self.stats.invalid_events += 1;
                match e {
                    ErrorMonitorOrchError::UnsupportedField(_) => {
                        info!("{}: {} on {}", ORCH_NAME, e, entry.key)
                    }
                    _ => error!("{}: {}", ORCH_NAME, e),
                }
            }
        }
    }

    /// Resolves a config key to its context, creating it on first use.
    fn resolve_context(&mut self, key: &str) -> Result<&mut MonitorContext> {
        let port_name = parse_config_key(key, &self.config.key_separator).ok_or_else(|| {
            ErrorMonitorOrchError::InvalidKey {
                key: key.to_string(),
                separator: self.config.key_separator.clone(),
            }
        })?;

        let port = self
            .ports
            .get_port(port_name)
            .ok_or_else(|| ErrorMonitorOrchError::PortNotFound(port_name.to_string()))?;
        if !port.is_physical() {
            return Err(ErrorMonitorOrchError::NotPhysicalPort(port_name.to_string()));
        }

        if !self.store.contains(port_name) {
            debug!("Creating error monitor context for {}", port_name);
        }
        Ok(self.store.get_or_create(port_name))
    }

    fn set_threshold(&mut self, key: &str, value: &str) -> Result<()> {
        let threshold: u64 = value.parse().map_err(|_| ErrorMonitorOrchError::InvalidValue {
            field: FIELD_TX_ERROR_THRESHOLD.to_string(),
            value: value.to_string(),
        })?;

        let ctx = self.resolve_context(key)?;
        let previous = std::mem::replace(&mut ctx.error_threshold, threshold);
        let port = ctx.port_name.clone();

        if previous != threshold {
            audit_log!(AuditRecord::new(
                AuditCategory::ConfigurationChange,
                ORCH_NAME,
                "set_tx_error_threshold"
            )
            .with_outcome(AuditOutcome::Success)
            .with_object_id(&port)
            .with_object_type("port")
            .with_details(serde_json::json!({
                "previous": previous,
                "threshold": threshold,
            })));
        }
        Ok(())
    }

    fn set_status(&mut self, key: &str, value: &str) -> Result<()> {
        let port = self.resolve_context(key)?.port_name.clone();

        match value.parse::<MonitorAdminStatus>() {
            Ok(MonitorAdminStatus::Enable) => self.enable(&port),
            Ok(MonitorAdminStatus::Disable) => self.disable(&port),
            Err(_) => {
                return Err(ErrorMonitorOrchError::InvalidValue {
                    field: FIELD_TX_ERROR_STATUS.to_string(),
                    value: value.to_string(),
                })
            }
        }
        Ok(())
    }

    fn enable(&mut self, port: &str) {
        if !self.store.enable(port) {
            debug!("TX error monitor already enabled on {}", port);
            return;
        }

        self.state_table
            .hset(port, FIELD_TX_ERROR_STATUS, TxErrorStatus::Ok.as_str());
        self.state_table.hset(port, FIELD_TX_ERROR, "0");

        audit_log!(AuditRecord::new(AuditCategory::ResourceModify, ORCH_NAME, "enable")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(port)
            .with_object_type("port"));
    }

    fn disable(&mut self, port: &str) {
        if !self.store.disable(port) {
            debug!("TX error monitor not enabled on {}", port);
            return;
        }

        self.state_table.del(port);

        audit_log!(AuditRecord::new(AuditCategory::ResourceModify, ORCH_NAME, "disable")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(port)
            .with_object_type("port"));
    }

    fn set_poll_interval(&mut self, value: &str) -> Result<()> {
        let secs: u32 = value.parse().map_err(|_| ErrorMonitorOrchError::InvalidValue {
            field: FIELD_POLL_INTERVAL.to_string(),
            value: value.to_string(),
        })?;
        self.apply_poll_interval(secs, Instant::now());
        Ok(())
    }

    fn apply_poll_interval(&mut self, secs: u32, now: Instant) {
        if secs == 0 {
            if self.timer.stop() {
                info!("TX error polling stopped");
            } else {
                debug!("TX error polling already stopped");
            }
        } else {
            self.timer.set_interval(Duration::from_secs(u64::from(secs)));
            self.timer.reset(now);
            info!("TX error poll interval set to {}s", secs);
        }

        audit_log!(AuditRecord::new(
            AuditCategory::ConfigurationChange,
            ORCH_NAME,
            "set_poll_interval"
        )
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({ "poll_interval": secs })));
    }

    // ============ Clear requests ============

    /// Applies one clear request.
    pub fn handle_clear(&mut self, notification: &Notification) {
        if !self.ports_ready("clear", &notification.data) {
            return;
        }

        let result = self.flushing(FlushScope::State, |orch| {
            if notification.op != CLEAR_OP_TX_ERROR_STATUS {
                return Err(ErrorMonitorOrchError::UnsupportedClearOp(
                    notification.op.clone(),
                ));
            }

            let cleared = match ClearTarget::from_payload(&notification.data) {
                ClearTarget::All => orch
                    .store
                    .port_names()
                    .iter()
                    .filter(|port| orch.clear_port(port))
                    .count(),
                ClearTarget::Port(port) => usize::from(orch.clear_port(&port)),
            };
            Ok(cleared)
        });

        match result {
            Ok(cleared) => {
                self.stats.clears_processed += 1;
                audit_log!(AuditRecord::new(AuditCategory::AdminAction, ORCH_NAME, "clear")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(&notification.data)
                    .with_details(serde_json::json!({ "cleared": cleared })));
            }
            Err(e) => {
                self.stats.invalid_events += 1;
                info!("{}: {}", ORCH_NAME, e);
            }
        }
    }

    /// Resets the baseline of `port` and republishes a clean status if the
    /// port currently has a status row. Returns false for unknown ports.
    fn clear_port(&mut self, port: &str) -> bool {
        if let Err(e) = self.store.reset_baseline(port) {
            debug!("Nothing to clear: {}", e);
            return false;
        }

        match self.state_table.hget(port, FIELD_TX_ERROR_STATUS) {
            Ok(Some(_)) => {
                self.state_table
                    .hset(port, FIELD_TX_ERROR_STATUS, TxErrorStatus::Ok.as_str());
                self.state_table.hset(port, FIELD_TX_ERROR, "0");
            }
            Ok(None) => {}
            Err(e) => error!("Failed to read status of {}: {}", port, e),
        }
        true
    }

    // ============ Polling ============

    /// Runs one poll sweep over the enabled ports.
    pub fn poll(&mut self) {
        if !self.ports_ready("poll", "tick") {
            return;
        }
        self.stats.poll_ticks += 1;

        self.flushing(FlushScope::State, |orch| {
            for port in orch.store.enabled_ports() {
                if let Err(e) = orch.poll_port(&port) {
                    error!("{}: {}", ORCH_NAME, e);
                }
            }
        });
    }

    fn poll_port(&mut self, port_name: &str) -> Result<()> {
        let port = self
            .ports
            .get_port(port_name)
            .ok_or_else(|| ErrorMonitorOrchError::PortNotFound(port_name.to_string()))?;

        let count = self
            .counters
            .get_port_stat(port.port_id, PortStat::IfOutErrors)
            .map_err(|source| {
                self.stats.query_failures += 1;
                debug!(
                    "Counter query on {} returned status {}",
                    port_name,
                    source.status().as_raw()
                );
                ErrorMonitorOrchError::CounterQuery {
                    port: port_name.to_string(),
                    source,
                }
            })?;

        let Some(ctx) = self.store.get_mut(port_name) else {
            return Ok(());
        };

        if count >= ctx.last_error_count {
            let delta = count - ctx.last_error_count;
            let status = TxErrorStatus::evaluate(delta, ctx.error_threshold);
            if status == TxErrorStatus::NotOk {
                warn!(
                    "TX errors on {} over threshold: {} > {}",
                    port_name, delta, ctx.error_threshold
                );
            }
            self.state_table
                .hset(port_name, FIELD_TX_ERROR_STATUS, status.as_str());
            self.state_table
                .hset(port_name, FIELD_TX_ERROR, &delta.to_string());
        } else {
            debug!(
                "TX error counter on {} went back from {} to {}, resyncing",
                port_name, ctx.last_error_count, count
            );
            self.stats.counter_regressions += 1;
        }

        ctx.last_error_count = count;
        Ok(())
    }

    // ============ Port lifecycle ============

    /// Purges all monitor state of a removed physical port.
    pub fn handle_port_update(&mut self, update: &PortUpdate) {
        if update.add || !update.port.is_physical() {
            return;
        }

        let alias = update.port.alias.clone();
        self.flushing(FlushScope::StateAndConfig, |orch| {
            if !orch.store.contains(&alias) {
                return;
            }
            orch.disable(&alias);
            orch.config_table.del(&alias);
            orch.store.remove(&alias);
            orch.stats.ports_purged += 1;

            audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, ORCH_NAME, "purge_port")
                .with_outcome(AuditOutcome::Success)
                .with_object_id(&alias)
                .with_object_type("port"));
        });
    }

    fn drain_port_updates(&mut self) {
        while let Some(update) = self.port_updates.as_mut().and_then(|s| s.try_recv()) {
            self.handle_port_update(&update);
        }
    }

    // ============ Teardown ============

    /// Deletes the config and state rows of every tracked port and releases
    /// the port subscription. Runs once; later calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(subscription) = self.port_updates.take() else {
            return;
        };

        let ports = self.store.port_names();
        self.flushing(FlushScope::StateAndConfig, |orch| {
            for port in &ports {
                orch.state_table.del(port);
                orch.config_table.del(port);
            }
        });
        self.timer.stop();
        self.ports.unsubscribe(subscription.id());

        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, ORCH_NAME, "stop")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({ "ports_removed": ports.len() })));
    }
}

impl Drop for ErrorMonitorOrch {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl Orch for ErrorMonitorOrch {
    fn name(&self) -> &str {
        ORCH_NAME
    }

    async fn do_task(&mut self) {
        self.drain_port_updates();

        self.consumer.pull();
        for entry in self.consumer.drain() {
            self.handle_config_entry(&entry);
        }

        for notification in self.clear_consumer.pops() {
            self.handle_clear(&notification);
        }
    }

    fn has_pending_tasks(&self) -> bool {
        self.consumer.has_pending()
            || self.clear_consumer.has_pending()
            || self.port_updates.as_ref().is_some_and(|s| s.has_pending())
    }

    fn dump_pending_tasks(&self) -> Vec<String> {
        self.consumer.dump()
    }

    fn next_timer_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    fn on_timer(&mut self, now: Instant) {
        if self.timer.fire(now) {
            self.poll();
        }
    }

    fn on_shutdown(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{LocalPortRegistry, Port, PortType};
    use pretty_assertions::assert_eq;
    use sonic_orch_common::MemoryTable;
    use sonic_sai::{PortOid, SaiResult};

    struct ZeroStats;

    impl PortStatsApi for ZeroStats {
        fn get_port_stats(&self, _port: PortOid, counters: &[PortStat]) -> SaiResult<Vec<u64>> {
            Ok(vec![0; counters.len()])
        }
    }

    fn setup(ready: bool) -> (ErrorMonitorOrch, Arc<LocalPortRegistry>, MemoryTable) {
        let registry = Arc::new(LocalPortRegistry::new());
        registry.add_port(Port::phy("Ethernet0", PortOid::from_raw(0x1000000000001).unwrap()));
        registry.add_port(Port::new(
            "PortChannel0001",
            PortType::Lag,
            PortOid::from_raw(0x2000000000001).unwrap(),
        ));
        registry.set_all_ports_ready(ready);

        let state = MemoryTable::new(ERROR_MONITOR_STATE_TABLE);
        let orch = ErrorMonitorOrch::new(
            ErrorMonitorOrchConfig::default(),
            Table::new(state.clone()),
            Table::new(MemoryTable::new(ERROR_MONITOR_CONFIG_TABLE)),
            registry.clone(),
            Arc::new(ZeroStats),
        );
        (orch, registry, state)
    }

    fn set(key: &str, field: &str, value: &str) -> KeyOpFieldsValues {
        KeyOpFieldsValues::set(key, vec![(field.to_string(), value.to_string())])
    }

    #[test]
    fn test_config_default() {
        let config = ErrorMonitorOrchConfig::default();
        assert_eq!(config.config_table, "ERROR_MONITOR");
        assert_eq!(config.state_table, "ERROR_MONITOR_TABLE");
        assert_eq!(config.clear_channel, "CLEAR_ERROR_MONITOR");
        assert_eq!(config.key_separator, ":");
        assert_eq!(config.poll_interval_secs, 0);
        assert_eq!(config.batch_size, 128);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ErrorMonitorOrchConfig =
            serde_json::from_str(r#"{"key_separator": "|", "poll_interval_secs": 10}"#).unwrap();
        assert_eq!(
            config,
            ErrorMonitorOrchConfig::default()
                .with_key_separator("|")
                .with_poll_interval_secs(10)
        );
    }

    #[test]
    fn test_startup_poll_interval() {
        let registry = Arc::new(LocalPortRegistry::new());
        let orch = ErrorMonitorOrch::new(
            ErrorMonitorOrchConfig::default().with_poll_interval_secs(30),
            Table::new(MemoryTable::new(ERROR_MONITOR_STATE_TABLE)),
            Table::new(MemoryTable::new(ERROR_MONITOR_CONFIG_TABLE)),
            registry,
            Arc::new(ZeroStats),
        );
        assert_eq!(orch.poll_interval(), Some(Duration::from_secs(30)));
        assert!(orch.next_timer_deadline().is_some());
    }

    #[test]
    fn test_rejected_keys_create_nothing() {
        let (mut orch, _registry, _state) = setup(true);

        orch.handle_config_entry(&set("Ethernet0", "tx_error_threshold", "5"));
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0:x", "tx_error_threshold", "5"));
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet99", "tx_error_threshold", "5"));
        orch.handle_config_entry(&set("ERROR_MONITOR:PortChannel0001", "tx_error_status", "enable"));
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "tx_error_threshold", "five"));

        assert_eq!(orch.context_count(), 0);
        assert_eq!(orch.stats().invalid_events, 5);
    }

    #[test]
    fn test_unsupported_field_ignored() {
        let (mut orch, _registry, state) = setup(true);
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "rx_error_threshold", "1"));

        assert_eq!(orch.context_count(), 0);
        assert_eq!(orch.stats().config_updates, 1);
        assert_eq!(orch.stats().invalid_events, 1);
        assert!(state.keys().is_empty());
    }

    #[test]
    fn test_del_is_ignored() {
        let (mut orch, _registry, _state) = setup(true);
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "tx_error_status", "enable"));
        orch.handle_config_entry(&KeyOpFieldsValues::del("ERROR_MONITOR:Ethernet0"));

        assert!(orch.is_enabled("Ethernet0"));
        assert_eq!(orch.stats().config_updates, 1);
    }

    #[test]
    fn test_events_dropped_until_ready() {
        let (mut orch, registry, state) = setup(false);

        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "tx_error_status", "enable"));
        orch.handle_clear(&Notification::new("tx_error_status", "ALL"));
        orch.poll();

        assert_eq!(orch.context_count(), 0);
        assert_eq!(orch.stats().events_dropped, 3);
        assert_eq!(orch.stats().poll_ticks, 0);
        assert!(state.keys().is_empty());

        registry.set_all_ports_ready(true);
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "tx_error_status", "enable"));
        assert!(orch.is_enabled("Ethernet0"));
    }

    #[test]
    fn test_invalid_status_value_creates_context_only() {
        let (mut orch, _registry, state) = setup(true);
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "tx_error_status", "on"));

        assert_eq!(orch.context_count(), 1);
        assert!(!orch.is_enabled("Ethernet0"));
        assert!(state.keys().is_empty());
    }

    #[test]
    fn test_poll_interval_zero_stops_timer() {
        let (mut orch, _registry, _state) = setup(true);
        assert_eq!(orch.poll_interval(), None);

        orch.handle_config_entry(&set("ERROR_MONITOR:global", "poll_interval", "0"));
        assert_eq!(orch.poll_interval(), None);

        orch.handle_config_entry(&set("ERROR_MONITOR:global", "poll_interval", "10"));
        assert_eq!(orch.poll_interval(), Some(Duration::from_secs(10)));

        orch.handle_config_entry(&set("ERROR_MONITOR:global", "poll_interval", "0"));
        assert_eq!(orch.poll_interval(), None);
        assert_eq!(orch.next_timer_deadline(), None);

        orch.handle_config_entry(&set("ERROR_MONITOR:global", "poll_interval", "-1"));
        assert_eq!(orch.stats().invalid_events, 1);
        assert_eq!(orch.context_count(), 0);
    }

    #[test]
    fn test_unsupported_clear_op() {
        let (mut orch, _registry, _state) = setup(true);
        orch.handle_clear(&Notification::new("rx_error_status", "ALL"));
        assert_eq!(orch.stats().clears_processed, 0);
        assert_eq!(orch.stats().invalid_events, 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut orch, registry, _state) = setup(true);
        assert_eq!(registry.observer_count(), 1);

        orch.shutdown();
        assert!(!orch.is_subscribed());
        assert_eq!(registry.observer_count(), 0);

        orch.shutdown();
        drop(orch);
        assert_eq!(registry.observer_count(), 0);
    }

    #[test]
    fn test_dump() {
        let (mut orch, _registry, _state) = setup(true);
        orch.handle_config_entry(&set("ERROR_MONITOR:Ethernet0", "tx_error_threshold", "7"));
        let lines = orch.dump();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "  Ethernet0 threshold=7 last=0 enabled=false");
    }
}
