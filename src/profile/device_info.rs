//! Device-info handshake: request commands and response parsing. After a
//! connection reaches Ready the app asks the display what hardware it is
//! and sizes content to the reported matrix.

use alloc::vec::Vec;

/// Request hex commands, written to the active write characteristic.
/// Responses arrive as notifications prefixed with `A5`.
pub const GET_DEVICE_INFO: &str = "A5010100";
pub const GET_SCREEN_SIZE: &str = "A5010200";
pub const GET_CAPABILITIES: &str = "A5010300";

const RESPONSE_MAGIC: u8 = 0xA5;
const CMD_DEVICE_INFO: u8 = 0x01;

/// Matrix dimensions of the connected display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSize {
    Square16,
    Square32,
    Square64,
}

impl ScreenSize {
    /// Edge length in pixels.
    pub fn edge(self) -> u16 {
        match self {
            ScreenSize::Square16 => 16,
            ScreenSize::Square32 => 32,
            ScreenSize::Square64 => 64,
        }
    }

    /// Color depth the hardware tier supports.
    pub fn max_colors(self) -> u32 {
        match self {
            ScreenSize::Square16 => 256,
            ScreenSize::Square32 => 65_536,
            ScreenSize::Square64 => 16_777_216,
        }
    }

    /// Sustained refresh rate in frames per second.
    pub fn refresh_rate(self) -> u8 {
        match self {
            ScreenSize::Square16 => 30,
            ScreenSize::Square32 => 25,
            ScreenSize::Square64 => 20,
        }
    }

    /// Content sized for `other` fits on a display of this size when the
    /// display is at least as large.
    pub fn fits(self, other: ScreenSize) -> bool {
        self.edge() >= other.edge()
    }
}

/// Optional features reported by larger hardware tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ExtendedAnimations,
    DetailedImages,
    VideoPlayback,
    AdvancedGames,
}

/// Parsed device-info response.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub screen_size: ScreenSize,
    /// Raw firmware revision bytes, when present.
    pub firmware: Option<[u8; 2]>,
    pub capabilities: Vec<Capability>,
}

/// Waiter predicate: `A5 01`-prefixed notifications carry device info.
pub fn is_device_info_response(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == RESPONSE_MAGIC && bytes[1] == CMD_DEVICE_INFO
}

/// Parse a device-info notification: `A5 01 <len> <screen> <model> <fw_hi>
/// <fw_lo>`. Returns `None` for anything that is not a well-formed response.
pub fn parse_device_info(bytes: &[u8]) -> Option<DeviceInfo> {
    if !is_device_info_response(bytes) || bytes.len() < 5 {
        return None;
    }
    let data = &bytes[3..];

    let screen_size = match data[0] {
        0x01 => Some(ScreenSize::Square16),
        0x02 => Some(ScreenSize::Square32),
        0x03 => Some(ScreenSize::Square64),
        _ => None,
    };
    // Unknown screen code: fall back to the model code.
    let screen_size = screen_size.or_else(|| match data.get(1) {
        Some(0x10) => Some(ScreenSize::Square16),
        Some(0x20) => Some(ScreenSize::Square32),
        Some(0x30) => Some(ScreenSize::Square64),
        _ => None,
    })?;

    let firmware = if data.len() >= 4 {
        Some([data[2], data[3]])
    } else {
        None
    };

    let capabilities = match screen_size {
        ScreenSize::Square16 => Vec::new(),
        ScreenSize::Square32 => alloc::vec![
            Capability::ExtendedAnimations,
            Capability::DetailedImages,
        ],
        ScreenSize::Square64 => alloc::vec![
            Capability::ExtendedAnimations,
            Capability::DetailedImages,
            Capability::VideoPlayback,
            Capability::AdvancedGames,
        ],
    };

    Some(DeviceInfo {
        screen_size,
        firmware,
        capabilities,
    })
}
