//! Persistence boundary for the last-connected device id, used by automatic
//! reconnection across app restarts.

use crate::core::DeviceId;

/// Key-value persistence for the last known peripheral.
pub trait DeviceStore {
    /// Load the persisted device id, if any.
    fn load(&self) -> Option<DeviceId>;
    /// Persist `device` as the last connected peripheral.
    fn save(&mut self, device: &DeviceId);
    /// Forget the persisted device id.
    fn clear(&mut self);
}

/// In-memory store for hosts without persistence (and for tests).
#[derive(Debug, Default)]
pub struct MemoryStore {
    last: Option<DeviceId>,
}

impl DeviceStore for MemoryStore {
    fn load(&self) -> Option<DeviceId> {
        self.last.clone()
    }

    fn save(&mut self, device: &DeviceId) {
        self.last = Some(device.clone());
    }

    fn clear(&mut self) {
        self.last = None;
    }
}
