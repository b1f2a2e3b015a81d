//! Known device profiles and detection logic. A profile is an app-level
//! template describing one service/characteristic layout a display may
//! expose; detection classifies a freshly discovered peripheral against the
//! table in fixed priority order, primary profile first.

pub mod device_info;

use crate::core::{normalize_uuid, ServiceInfo, Uuid};
use crate::protocol::catalog::TargetRole;
use alloc::vec::Vec;

/// Characteristic UUID sets per role for one known layout.
#[derive(Debug)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub service_uuid: &'static str,
    pub notify: &'static [&'static str],
    pub notify_write: &'static [&'static str],
    pub write: &'static [&'static str],
    pub write_no_response: &'static [&'static str],
}

/// Primary profile: transparent UART service.
pub static UART_PROFILE: DeviceProfile = DeviceProfile {
    name: "UART_4953",
    service_uuid: "49535343-fe7d-4ae5-8fa9-9fafd205e455",
    notify: &["49535343-1e4d-4bd9-ba61-23c647249616"],
    notify_write: &["49535343-aca3-481c-91ec-d85e28a60318"],
    write: &["49535343-6daa-4d02-abf6-19569aca69fe"],
    write_no_response: &["49535343-8841-43f4-a8d4-ecbe34729bb3"],
};

/// Fallback profile exposed by a second firmware family.
pub static FALLBACK_PROFILE: DeviceProfile = DeviceProfile {
    name: "FFF0_FALLBACK",
    service_uuid: "0000fff0-0000-1000-8000-00805f9b34fb",
    notify: &["0000fff1-0000-1000-8000-00805f9b34fb"],
    notify_write: &[],
    write: &["0000fff2-0000-1000-8000-00805f9b34fb"],
    write_no_response: &[],
};

/// Legacy profile kept for first-generation displays.
pub static LEGACY_PROFILE: DeviceProfile = DeviceProfile {
    name: "LEGACY_FEE7",
    service_uuid: "0000fee7-0000-1000-8000-00805f9b34fb",
    notify: &["000036f6-0000-1000-8000-00805f9b34fb"],
    notify_write: &[],
    write: &["000036f5-0000-1000-8000-00805f9b34fb"],
    write_no_response: &[],
};

/// Detection order: primary first, legacy last.
pub static PROFILES: &[&DeviceProfile] = &[&UART_PROFILE, &FALLBACK_PROFILE, &LEGACY_PROFILE];

/// Advertised name prefixes accepted by the scan filter.
pub static SCAN_NAME_PREFIXES: &[&str] = &["YS"];

/// Service UUID legacy displays advertise before connection.
pub const LEGACY_ADVERTISED_SERVICE: &str = "0000fee7-0000-1000-8000-00805f9b34fb";

/// A matched profile plus the characteristic UUIDs actually discovered on
/// the peripheral, per role (each list may be a subset of the declared one).
/// Created once per successful connection and discarded on disconnect.
#[derive(Debug, Clone)]
pub struct DetectedProfile {
    pub profile: &'static DeviceProfile,
    /// Concrete service UUID spelling as discovered.
    pub service: Uuid,
    pub notify: Vec<Uuid>,
    pub notify_write: Vec<Uuid>,
    pub write: Vec<Uuid>,
    pub write_no_response: Vec<Uuid>,
}

impl DetectedProfile {
    /// Resolve the concrete characteristic for a command's target role,
    /// falling back across roles when the preferred one was not discovered.
    pub fn write_target(&self, role: TargetRole) -> Option<&Uuid> {
        match role {
            TargetRole::Write => self.write.first().or_else(|| self.notify_write.first()),
            TargetRole::WriteNoResponse => {
                self.write_no_response.first().or_else(|| self.write.first())
            }
        }
    }

    /// Every characteristic that must be subscribed for notifications.
    pub fn notify_characteristics(&self) -> impl Iterator<Item = &Uuid> {
        self.notify.iter().chain(self.notify_write.iter())
    }
}

/// Match discovered services against the profile table.
///
/// The first profile whose service UUID is present wins; its discovered
/// characteristics are classified into declared roles by normalized UUID
/// membership. Characteristics matching no declared UUID are ignored.
pub fn detect_profile(services: &[ServiceInfo]) -> Option<DetectedProfile> {
    for profile in PROFILES {
        let Some(service) = services
            .iter()
            .find(|s| s.uuid.matches(profile.service_uuid))
        else {
            continue;
        };

        let classify = |declared: &'static [&'static str]| -> Vec<Uuid> {
            service
                .characteristics
                .iter()
                .filter(|c| declared.iter().any(|d| c.matches(d)))
                .cloned()
                .collect()
        };

        return Some(DetectedProfile {
            profile,
            service: service.uuid.clone(),
            notify: classify(profile.notify),
            notify_write: classify(profile.notify_write),
            write: classify(profile.write),
            write_no_response: classify(profile.write_no_response),
        });
    }
    None
}

/// Scan filter: accept a peripheral when its advertised name starts with a
/// configured prefix, or when it advertises the legacy service UUID.
pub fn matches_scan_filter(name: Option<&str>, advertised_services: &[Uuid]) -> bool {
    if let Some(name) = name {
        let upper: alloc::string::String = name.chars().map(|c| c.to_ascii_uppercase()).collect();
        if SCAN_NAME_PREFIXES.iter().any(|p| upper.starts_with(p)) {
            return true;
        }
    }
    let legacy = normalize_uuid(LEGACY_ADVERTISED_SERVICE);
    advertised_services.iter().any(|s| s.normalized() == legacy)
}
