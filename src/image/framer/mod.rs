//! Pixel packing and frame building for image upload.
//!
//! A transfer is one SOF frame, `chunk_total` CHUNK frames each carrying a
//! run of whole rows, and one EOF frame. Every frame ends with a CRC16-CCITT
//! trailer over everything before it, appended low byte first.

use crate::error::ProtocolError;
use crate::infra::crc;
use alloc::vec::Vec;

/// Wire pixel formats, with their SOF format codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 5-6-5 packing, two bytes per pixel, little-endian.
    Rgb565Le,
    /// Three bytes per pixel in R, G, B order.
    Rgb888,
    /// Three bytes per pixel in G, R, B order, for GRB-wired strips.
    Grb888,
}

impl PixelFormat {
    /// Format code carried in the SOF header.
    pub fn code(self) -> u16 {
        match self {
            PixelFormat::Rgb565Le => 0x0001,
            PixelFormat::Rgb888 => 0x0002,
            PixelFormat::Grb888 => 0x0003,
        }
    }

    /// Bytes one packed pixel occupies.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565Le => 2,
            PixelFormat::Rgb888 | PixelFormat::Grb888 => 3,
        }
    }
}

/// Convert an RGBA buffer (4 bytes per pixel, alpha ignored) to the target
/// wire format. Trailing bytes that do not form a whole pixel are dropped.
pub fn pack_pixels(rgba: &[u8], format: PixelFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * format.bytes_per_pixel());
    for px in rgba.chunks_exact(4) {
        let (r, g, b) = (px[0], px[1], px[2]);
        match format {
            PixelFormat::Rgb565Le => {
                let value = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
                out.push((value & 0xFF) as u8);
                out.push((value >> 8) as u8);
            }
            PixelFormat::Rgb888 => out.extend_from_slice(&[r, g, b]),
            PixelFormat::Grb888 => out.extend_from_slice(&[g, r, b]),
        }
    }
    out
}

/// How many whole rows fit in one chunk payload under the MTU's usable size
/// (`mtu - 3` for the ATT header, minus the 11-byte chunk header and 2-byte
/// CRC trailer). Always at least one row.
pub fn plan_rows_per_chunk(width: u16, format: PixelFormat, mtu: u16) -> u16 {
    let row_bytes = usize::from(width) * format.bytes_per_pixel();
    let usable = usize::from(mtu).saturating_sub(3 + CHUNK_HEADER_LEN + 2);
    ((usable / row_bytes.max(1)).max(1)) as u16
}

const SOF_MAGIC: [u8; 5] = [0xAA, 0x55, 0x49, 0x4D, 0x01];
const CHUNK_MAGIC: [u8; 2] = [0xA1, 0xC1];
const EOF_MAGIC: [u8; 2] = [0xA2, 0xC2];
const CHUNK_HEADER_LEN: usize = 11;

/// Frame-level metadata shared by every frame of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub frame_id: u8,
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
    pub chunk_total: u16,
}

impl FrameDescriptor {
    /// Start-of-frame header: magic, frame id, dimensions, format code and
    /// chunk count, all multi-byte fields little-endian.
    pub fn build_sof(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SOF_MAGIC.len() + 9 + 2);
        out.extend_from_slice(&SOF_MAGIC);
        out.push(self.frame_id);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.format.code().to_le_bytes());
        out.extend_from_slice(&self.chunk_total.to_le_bytes());
        crc::append_crc(&mut out);
        out
    }

    /// Chunk frame carrying `row_count` rows starting at `row_start`. The
    /// two bytes after `row_start` are reserved and zero.
    pub fn build_chunk(&self, row_start: u16, row_count: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + payload.len() + 2);
        out.extend_from_slice(&CHUNK_MAGIC);
        out.push(self.frame_id);
        out.extend_from_slice(&row_start.to_le_bytes());
        out.extend_from_slice(&[0x00, 0x00]);
        out.extend_from_slice(&row_count.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        crc::append_crc(&mut out);
        out
    }

    /// End-of-frame marker repeating the chunk count for the receiver's
    /// completeness check.
    pub fn build_eof(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(EOF_MAGIC.len() + 3 + 2);
        out.extend_from_slice(&EOF_MAGIC);
        out.push(self.frame_id);
        out.extend_from_slice(&self.chunk_total.to_le_bytes());
        crc::append_crc(&mut out);
        out
    }
}

/// Validate a frame's trailing CRC, as a receiver would.
pub fn check_frame(frame: &[u8]) -> Result<(), ProtocolError> {
    crc::check_trailing_crc(frame)
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
