//! Serialized access to the single peripheral link.
//!
//! The peripheral accepts one outstanding GATT operation at a time, so every
//! link access funnels through the [`queue::OperationQueue`]; the
//! [`manager::ConnectionManager`] layers the connection state machine,
//! automatic reconnection and notification dispatch on top of it.

pub mod manager;
pub mod queue;
pub mod traits;

#[cfg(test)]
pub(crate) mod testkit;

pub use manager::{
    ConnectionManager, ConnectionState, LinkEvent, NotifyRecord, ReconnectPolicy,
};
pub use queue::{
    OperationKind, OperationOutput, OperationQueue, OperationRequest, OperationTicket,
    QueueRunner,
};
pub use traits::{DeviceStore, LinkAdapter, LinkTimer};
