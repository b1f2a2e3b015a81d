//! Capability traits the link layer consumes. The concrete platform pieces
//! (BLE stack, clock, persistence) are injected through these seams, which
//! keeps the core testable against fakes.

pub mod adapter;
pub mod store;
pub mod timer;

pub use adapter::LinkAdapter;
pub use store::{DeviceStore, MemoryStore};
pub use timer::{EmbassyTimer, LinkTimer};
