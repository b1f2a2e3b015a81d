//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (parameter validation,
//! wire-format construction, transport failures), with [`LinkError`] as the
//! single surface every link operation settles with.

use alloc::string::String;
use thiserror_no_std::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Command parameters that fail their declared constraints.
/// Always synchronous, never retried.
pub enum ValidationError {
    /// Parameter declared without a default and absent from the call.
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },
    /// Value remains outside the type's natural range after clamping to the
    /// declared bounds.
    #[error("Parameter {name} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// A numeric value was supplied where the definition expects text, or
    /// the other way around.
    #[error("Parameter {name} has the wrong type")]
    WrongType { name: &'static str },
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Wire-format failures: unknown catalog entries, malformed hex, corrupted
/// frames. Always synchronous, never retried.
pub enum ProtocolError {
    /// Category/command pair absent from the static catalog.
    #[error("Unknown command: {category}.{command}")]
    UnknownCommand { category: String, command: String },
    /// Hex string with an odd number of digits.
    #[error("Odd hex string length: {len}")]
    OddHexLength { len: usize },
    /// Character outside `[0-9a-fA-F]` in a hex string.
    #[error("Invalid hex digit: {digit}")]
    InvalidHexDigit { digit: char },
    /// Trailing CRC16 does not match the frame contents (receive path).
    #[error("CRC mismatch: expected {expected:#06X}, got {actual:#06X}")]
    CrcMismatch { expected: u16, actual: u16 },
    /// Frame too short to carry its header and CRC.
    #[error("Frame too short: {len} bytes")]
    FrameTooShort { len: usize },
    /// Notification matched the device-info shape but could not be parsed.
    #[error("Malformed device info response")]
    MalformedDeviceInfo,
    /// No known profile matches the discovered services.
    #[error("No device profile matched the discovered services")]
    ProfileNotDetected,
    /// The detected profile exposes no characteristic for the requested role.
    #[error("No target characteristic available for the command")]
    NoTargetCharacteristic,
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Failures reported by the platform adapter or by link-state checks.
pub enum TransportError {
    /// The adapter rejected a connect/write/discovery call. Carries the
    /// adapter error rendered with `Debug` so the queue result stays
    /// un-generic.
    #[error("Adapter error: {detail}")]
    Adapter { detail: String },
    /// Entry point called while the link is in an incompatible state.
    #[error("Link busy: connection sequence already in progress")]
    LinkBusy,
    /// Operation requires an established connection.
    #[error("Not connected")]
    NotConnected,
    /// Reconnect requested with no persisted device id.
    #[error("No known device to reconnect to")]
    NoKnownDevice,
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Settlement surface for every link operation and waiter.
///
/// Invariant: anything enqueued on the operation queue eventually settles
/// with `Ok` or exactly one of these variants; nothing is silently dropped.
pub enum LinkError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Operation exceeded its allotted time. The queue proceeds to the next
    /// operation; a connect-phase timeout counts as a link failure.
    #[error("Operation timed out after {ms} ms")]
    Timeout { ms: u64 },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Queue cleared or explicit disconnect while the operation was pending.
    #[error("Operation cancelled")]
    Cancelled,
}

impl LinkError {
    /// Wrap an adapter error, keeping only its `Debug` rendering.
    pub fn adapter<E: core::fmt::Debug>(err: E) -> Self {
        Self::Transport(TransportError::Adapter {
            detail: alloc::format!("{err:?}"),
        })
    }
}
