//! Per-port context store.
//!
//! Owns every [`MonitorContext`] plus the index of ports being polled. The
//! enabled index is a subset of the context keys: [`ContextStore::enable`]
//! refuses unknown ports and [`ContextStore::remove`] drops the index entry
//! with the context.

use std::collections::BTreeSet;

use sonic_orch_common::{SyncMap, SyncMapError};

use super::types::MonitorContext;

#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: SyncMap<String, MonitorContext>,
    enabled: BTreeSet<String>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn contains(&self, port: &str) -> bool {
        self.contexts.contains_key(port)
    }

    pub fn get(&self, port: &str) -> Option<&MonitorContext> {
        self.contexts.get(port)
    }

    pub fn get_mut(&mut self, port: &str) -> Option<&mut MonitorContext> {
        self.contexts.get_mut(port)
    }

    /// Returns the context for `port`, creating a zeroed one if needed.
    pub fn get_or_create(&mut self, port: &str) -> &mut MonitorContext {
        self.contexts
            .get_or_insert_with(port.to_string(), || MonitorContext::new(port))
    }

    /// Zeroes the baseline of an existing context and returns the old one.
    pub fn reset_baseline(&mut self, port: &str) -> Result<u64, SyncMapError> {
        self.contexts
            .update(port, |ctx| std::mem::take(&mut ctx.last_error_count))
    }

    pub fn remove(&mut self, port: &str) -> Option<MonitorContext> {
        self.enabled.remove(port);
        self.contexts.remove(port)
    }

    pub fn is_enabled(&self, port: &str) -> bool {
        self.enabled.contains(port)
    }

    /// Adds `port` to the polled set; false if already there or unknown.
    pub fn enable(&mut self, port: &str) -> bool {
        self.contexts.contains_key(port) && self.enabled.insert(port.to_string())
    }

    /// Removes `port` from the polled set; false if it was not there.
    pub fn disable(&mut self, port: &str) -> bool {
        self.enabled.remove(port)
    }

    /// Snapshot of polled ports in name order.
    pub fn enabled_ports(&self) -> Vec<String> {
        self.enabled.iter().cloned().collect()
    }

    /// Snapshot of all tracked ports in name order.
    pub fn port_names(&self) -> Vec<String> {
        self.contexts.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitorContext> {
        self.contexts.values()
    }
}
