//! CRC16-CCITT primitive: polynomial 0x1021, initial value 0xFFFF, no output
//! XOR. Used in two independent places with the same parameters: the optional
//! command-protocol checksum and the always-on image frame trailer.

use crate::error::ProtocolError;
use alloc::vec::Vec;

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Compute the CRC16-CCITT of a byte slice.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc = INIT;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Append the CRC of the buffer's current contents, low byte first.
pub fn append_crc(buf: &mut Vec<u8>) {
    let crc = crc16_ccitt(buf);
    buf.push((crc & 0xFF) as u8);
    buf.push((crc >> 8) as u8);
}

/// Verify a trailing low-byte-first CRC over everything that precedes it.
pub fn check_trailing_crc(frame: &[u8]) -> Result<(), ProtocolError> {
    if frame.len() < 3 {
        return Err(ProtocolError::FrameTooShort { len: frame.len() });
    }
    let (body, trailer) = frame.split_at(frame.len() - 2);
    let expected = crc16_ccitt(body);
    let actual = u16::from_le_bytes([trailer[0], trailer[1]]);
    if expected != actual {
        return Err(ProtocolError::CrcMismatch { expected, actual });
    }
    Ok(())
}
