//! `lumilink` library: communication core for BLE-attached addressable LED
//! matrix displays. The crate exposes the infrastructure modules (hex codec,
//! CRC), the data-driven command protocol, device-profile detection, the
//! serialized link layer (operation queue, connection manager), and the
//! chunked image framing protocol. Platform BLE primitives, persistence and
//! presentation stay outside; the core consumes them through narrow traits.
#![no_std]

extern crate alloc;

//==================================================================================
/// Core data types shared across the protocol and link modules.
pub mod core;
/// Domain and low-level errors (validation, transport, protocol framing,
/// timeouts, cancellation).
pub mod error;
/// Image framing: pixel packing and SOF/CHUNK/EOF frame construction.
pub mod image;
/// Byte-level utilities: hex codec and the CRC16-CCITT primitive.
pub mod infra;
/// Serialized link access: adapter traits, the operation queue, and the
/// connection state machine with reconnect and notification dispatch.
pub mod link;
/// Command protocol: static command catalog and the template-driven encoder.
pub mod protocol;
/// Known device profiles, detection against discovered services, scan
/// filtering, and device-info parsing.
pub mod profile;
//==================================================================================
