//! Common orchestration abstractions for SONiC.
//!
//! This crate provides the core traits and types used by the orchestration
//! modules in the SONiC control plane:
//!
//! - [`Orch`]: Base trait for orchestration agents
//! - [`Consumer`]: Merging queue of table changes
//! - [`NotificationConsumer`]: Queue of channel notifications
//! - [`SelectableTimer`]: Interval timer polled by the daemon loop
//! - [`Table`]: Buffered table writes over a [`DbTable`] backend
//! - [`SyncMap`]: Ordered map that never creates entries implicitly
//!
//! # Architecture
//!
//! 1. Configuration changes arrive on a [`ConsumerSender`], clear requests
//!    and similar commands on a [`NotificationSender`]
//! 2. The OrchDaemon event loop calls `do_task()` on Orchs with pending
//!    work and `on_timer()` on Orchs whose timer deadline has passed
//! 3. Orchs query hardware and queue writes on their [`Table`]s
//! 4. Each unit of work ends with a single `flush()` per table
//!
//! # Example
//!
//! ```ignore
//! use sonic_orch_common::{Consumer, ConsumerConfig, Orch};
//!
//! struct MyOrch {
//!     consumer: Consumer,
//! }
//!
//! #[async_trait]
//! impl Orch for MyOrch {
//!     fn name(&self) -> &str { "MyOrch" }
//!
//!     async fn do_task(&mut self) {
//!         self.consumer.pull();
//!         for entry in self.consumer.drain() {
//!             log::info!("{} {}", entry.op.as_str(), entry.key);
//!         }
//!     }
//!
//!     fn has_pending_tasks(&self) -> bool {
//!         self.consumer.has_pending()
//!     }
//! }
//! ```

mod consumer;
mod notification;
mod orch;
#[cfg(feature = "redis")]
mod redis_backend;
#[cfg(feature = "redis")]
mod redis_subscriber;
mod sync_map;
mod table;
mod timer;

pub use consumer::{
    Consumer, ConsumerConfig, ConsumerSender, FieldValue, KeyOpFieldsValues, Operation,
};
pub use notification::{Notification, NotificationConsumer, NotificationSender};
pub use orch::Orch;
#[cfg(feature = "redis")]
pub use redis_backend::{RedisConfig, RedisDb, RedisTable};
#[cfg(feature = "redis")]
pub use redis_subscriber::{
    parse_keyspace_event, parse_notification, watch_channel, watch_table, KeyspaceChange,
};
pub use sync_map::{SyncMap, SyncMapError};
pub use table::{DbTable, MemoryTable, Table, TableError, TableOp, TableResult};
pub use timer::SelectableTimer;
