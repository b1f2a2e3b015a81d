//! Shared data types: UUID handling, peripheral identifiers, discovered
//! service metadata and write modes. Everything the adapter boundary and the
//! protocol layer agree on lives here.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Normalize a UUID string for comparison: lowercase, hyphens stripped.
/// BLE stacks disagree on case and hyphenation; profile matching must not.
pub fn normalize_uuid(uuid: &str) -> String {
    uuid.chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Owned UUID of a GATT service or characteristic.
///
/// Equality is case- and hyphen-insensitive; the original spelling is kept
/// so it can be handed back to the platform adapter untouched.
#[derive(Debug, Clone)]
pub struct Uuid(String);

impl Uuid {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self(uuid.into())
    }

    /// Raw spelling as received from the platform.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Comparison form (lowercase, no hyphens).
    pub fn normalized(&self) -> String {
        normalize_uuid(&self.0)
    }

    /// Case- and hyphen-insensitive comparison against any UUID spelling.
    pub fn matches(&self, other: &str) -> bool {
        self.normalized() == normalize_uuid(other)
    }
}

impl PartialEq for Uuid {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.as_str())
    }
}

impl Eq for Uuid {}

impl From<&str> for Uuid {
    fn from(uuid: &str) -> Self {
        Self::new(uuid)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque peripheral identifier as reported by the platform adapter
/// (a MAC address on Android, a CoreBluetooth UUID on iOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One discovered GATT service with its characteristic UUIDs.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub uuid: Uuid,
    pub characteristics: Vec<Uuid>,
}

impl ServiceInfo {
    pub fn new(uuid: impl Into<Uuid>, characteristics: Vec<Uuid>) -> Self {
        Self {
            uuid: uuid.into(),
            characteristics,
        }
    }
}

impl From<&str> for ServiceInfo {
    fn from(uuid: &str) -> Self {
        Self::new(Uuid::new(uuid), Vec::new())
    }
}

/// GATT write mode for a characteristic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    WithResponse,
    WithoutResponse,
}
