//! Tests for pixel packing and frame construction.
use super::*;
use crate::infra::crc::crc16_ccitt;
use alloc::vec;

// One red, one green, one blue pixel, opaque.
const RGBA: [u8; 12] = [
    0xFF, 0x00, 0x00, 0xFF, //
    0x00, 0xFF, 0x00, 0xFF, //
    0x00, 0x00, 0xFF, 0xFF,
];

#[test]
fn rgb565_packs_five_six_five_little_endian() {
    let packed = pack_pixels(&RGBA, PixelFormat::Rgb565Le);
    // red 0xF800, green 0x07E0, blue 0x001F, each low byte first.
    assert_eq!(packed, [0x00, 0xF8, 0xE0, 0x07, 0x1F, 0x00]);
}

#[test]
fn rgb888_drops_alpha() {
    let packed = pack_pixels(&RGBA, PixelFormat::Rgb888);
    assert_eq!(packed, [0xFF, 0, 0, 0, 0xFF, 0, 0, 0, 0xFF]);
}

#[test]
fn grb888_swaps_red_and_green() {
    let packed = pack_pixels(&RGBA, PixelFormat::Grb888);
    assert_eq!(packed, [0, 0xFF, 0, 0xFF, 0, 0, 0, 0, 0xFF]);
}

#[test]
fn partial_trailing_pixel_is_dropped() {
    let packed = pack_pixels(&[1, 2, 3, 4, 5, 6], PixelFormat::Rgb888);
    assert_eq!(packed, [1, 2, 3]);
}

fn descriptor() -> FrameDescriptor {
    FrameDescriptor {
        frame_id: 0x07,
        width: 32,
        height: 32,
        format: PixelFormat::Rgb565Le,
        chunk_total: 0x0104,
    }
}

#[test]
fn sof_layout_and_crc() {
    let sof = descriptor().build_sof();
    assert_eq!(sof.len(), 16);
    assert_eq!(&sof[..5], [0xAA, 0x55, 0x49, 0x4D, 0x01]);
    assert_eq!(sof[5], 0x07);
    assert_eq!(&sof[6..8], [32, 0]);
    assert_eq!(&sof[8..10], [32, 0]);
    assert_eq!(&sof[10..12], [0x01, 0x00]);
    assert_eq!(&sof[12..14], [0x04, 0x01]);
    let crc = crc16_ccitt(&sof[..14]);
    assert_eq!(&sof[14..], [(crc & 0xFF) as u8, (crc >> 8) as u8]);
    check_frame(&sof).unwrap();
}

#[test]
fn chunk_layout_and_crc() {
    let payload = [0xDE, 0xAD, 0xBE, 0xEF];
    let chunk = descriptor().build_chunk(0x0201, 2, &payload);
    assert_eq!(chunk.len(), 11 + 4 + 2);
    assert_eq!(&chunk[..2], [0xA1, 0xC1]);
    assert_eq!(chunk[2], 0x07);
    assert_eq!(&chunk[3..5], [0x01, 0x02]);
    assert_eq!(&chunk[5..7], [0x00, 0x00]);
    assert_eq!(&chunk[7..9], [0x02, 0x00]);
    assert_eq!(&chunk[9..11], [0x04, 0x00]);
    assert_eq!(&chunk[11..15], payload);
    check_frame(&chunk).unwrap();
}

#[test]
fn eof_layout_and_crc() {
    let eof = descriptor().build_eof();
    assert_eq!(eof.len(), 7);
    assert_eq!(&eof[..2], [0xA2, 0xC2]);
    assert_eq!(eof[2], 0x07);
    assert_eq!(&eof[3..5], [0x04, 0x01]);
    check_frame(&eof).unwrap();
}

#[test]
fn any_single_byte_flip_fails_validation() {
    let chunk = descriptor().build_chunk(0, 1, &[1, 2, 3]);
    for i in 0..chunk.len() {
        let mut corrupt = chunk.clone();
        corrupt[i] ^= 0x01;
        assert!(check_frame(&corrupt).is_err(), "flip at {i} undetected");
    }
}

#[test]
fn short_frame_is_rejected() {
    assert!(matches!(
        check_frame(&[0xA2, 0xC2]),
        Err(crate::error::ProtocolError::FrameTooShort { .. })
    ));
}

#[test]
fn rows_per_chunk_fits_usable_mtu() {
    // 32px RGB565 rows are 64 bytes; 247 MTU leaves 231 usable.
    assert_eq!(plan_rows_per_chunk(32, PixelFormat::Rgb565Le, 247), 3);
    // Never less than one row, even under a minimal MTU.
    assert_eq!(plan_rows_per_chunk(64, PixelFormat::Rgb888, 23), 1);
}

#[test]
fn whole_transfer_frames_validate() {
    let desc = FrameDescriptor {
        frame_id: 1,
        width: 16,
        height: 16,
        format: PixelFormat::Grb888,
        chunk_total: 4,
    };
    let rgba = vec![0x80u8; 16 * 16 * 4];
    let packed = pack_pixels(&rgba, desc.format);
    let row_bytes = 16 * desc.format.bytes_per_pixel();
    let rows = plan_rows_per_chunk(16, desc.format, 247) as usize;

    check_frame(&desc.build_sof()).unwrap();
    for (i, payload) in packed.chunks(rows * row_bytes).enumerate() {
        let chunk = desc.build_chunk((i * rows) as u16, rows as u16, payload);
        check_frame(&chunk).unwrap();
    }
    check_frame(&desc.build_eof()).unwrap();
}
