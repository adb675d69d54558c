//! Port model and registry.
//!
//! Orchs never own ports. They look them up by alias through a
//! [`PortRegistry`] and learn about additions and removals from a
//! [`PortSubscription`].
//!
//! ```text
//! LocalPortRegistry ──add_port/remove_port──> PortSubject
//!                                                 │ PortUpdate
//!                                                 ▼
//!                                    PortSubscription (per observer)
//! ```

mod port;
mod registry;

pub use port::{Port, PortType};
pub use registry::{
    LocalPortRegistry, PortRegistry, PortSubject, PortSubscription, PortUpdate, SubscriptionId,
};
