//! Port registry and port-change subscriptions.
//!
//! Orchs that need to react to ports being added or removed call
//! [`PortRegistry::subscribe`] and keep the returned [`PortSubscription`].
//! The registry keeps only the sending half of each subscription, so an
//! observer never needs a reference back into the registry to receive
//! updates; it hands its [`SubscriptionId`] back through
//! [`PortRegistry::unsubscribe`] when it shuts down.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use sonic_orch_common::SyncMap;
use tokio::sync::mpsc;

use super::port::Port;

pub type SubscriptionId = u64;

/// A port add/remove event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortUpdate {
    pub port: Port,
    /// true when the port was added, false when it was removed
    pub add: bool,
}

/// Receiving half of a registry subscription.
pub struct PortSubscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<PortUpdate>,
}

impl PortSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn try_recv(&mut self) -> Option<PortUpdate> {
        self.rx.try_recv().ok()
    }
}

/// Read access to ports plus change subscriptions.
pub trait PortRegistry: Send + Sync {
    fn get_port(&self, alias: &str) -> Option<Port>;

    /// True once the initial port set has been created.
    fn all_ports_ready(&self) -> bool;

    fn subscribe(&self) -> PortSubscription;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Observer list for port updates.
#[derive(Debug, Default)]
pub struct PortSubject {
    next_id: SubscriptionId,
    observers: BTreeMap<SubscriptionId, mpsc::UnboundedSender<PortUpdate>>,
}

impl PortSubject {
    pub fn subscribe(&mut self) -> PortSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id;
        self.next_id += 1;
        self.observers.insert(id, tx);
        PortSubscription { id, rx }
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(&id).is_some()
    }

    /// Sends `update` to every observer; observers whose receiver is gone
    /// are dropped. Returns the number of deliveries.
    pub fn notify(&mut self, update: &PortUpdate) -> usize {
        self.observers.retain(|id, tx| {
            let delivered = tx.send(update.clone()).is_ok();
            if !delivered {
                debug!("Dropping closed port subscription {}", id);
            }
            delivered
        });
        self.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[derive(Default)]
struct LocalState {
    ports: SyncMap<String, Port>,
    ready: bool,
    subject: PortSubject,
}

/// In-process port registry.
///
/// Used by the daemon in simulation mode and by tests.
#[derive(Default)]
pub struct LocalPortRegistry {
    state: Mutex<LocalState>,
}

impl LocalPortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds or replaces a port and notifies observers.
    pub fn add_port(&self, port: Port) {
        let mut state = self.lock();
        info!("Adding port {}", port);
        state.ports.insert(port.alias.clone(), port.clone());
        state.subject.notify(&PortUpdate { port, add: true });
    }

    /// Removes a port and notifies observers.
    pub fn remove_port(&self, alias: &str) -> Option<Port> {
        let mut state = self.lock();
        let port = state.ports.remove(alias)?;
        info!("Removing port {}", port);
        state.subject.notify(&PortUpdate {
            port: port.clone(),
            add: false,
        });
        Some(port)
    }

    pub fn set_all_ports_ready(&self, ready: bool) {
        self.lock().ready = ready;
    }

    pub fn port_count(&self) -> usize {
        self.lock().ports.len()
    }

    pub fn observer_count(&self) -> usize {
        self.lock().subject.observer_count()
    }
}

impl PortRegistry for LocalPortRegistry {
    fn get_port(&self, alias: &str) -> Option<Port> {
        self.lock().ports.get(alias).cloned()
    }

    fn all_ports_ready(&self) -> bool {
        self.lock().ready
    }

    fn subscribe(&self) -> PortSubscription {
        self.lock().subject.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if !self.lock().subject.unsubscribe(id) {
            debug!("Port subscription {} already released", id);
        }
    }
}
