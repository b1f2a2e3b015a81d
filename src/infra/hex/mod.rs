//! Hex string codec. Encoding is uppercase without separators; decoding is
//! tolerant of whitespace and an optional `0x` prefix, since command
//! templates and user input both pass through here.

use crate::error::ProtocolError;
use alloc::string::String;
use alloc::vec::Vec;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Encode bytes as an uppercase hex string (no separators).
pub fn encode_upper(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX_UPPER[(b >> 4) as usize] as char);
        out.push(HEX_UPPER[(b & 0x0F) as usize] as char);
    }
    out
}

/// Encode bytes as uppercase hex with one space between bytes, for logs.
pub fn format_spaced(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(HEX_UPPER[(b >> 4) as usize] as char);
        out.push(HEX_UPPER[(b & 0x0F) as usize] as char);
    }
    out
}

/// Decode a hex string into bytes.
///
/// Whitespace is stripped and a single leading `0x`/`0X` is accepted. An odd
/// digit count or a non-hex character is a [`ProtocolError`].
pub fn decode(hex: &str) -> Result<Vec<u8>, ProtocolError> {
    let clean: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let clean = clean
        .strip_prefix("0x")
        .or_else(|| clean.strip_prefix("0X"))
        .unwrap_or(&clean);

    if clean.len() % 2 != 0 {
        return Err(ProtocolError::OddHexLength { len: clean.len() });
    }

    let mut out = Vec::with_capacity(clean.len() / 2);
    let mut chars = clean.chars();
    while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
        out.push((digit(hi)? << 4) | digit(lo)?);
    }
    Ok(out)
}

fn digit(c: char) -> Result<u8, ProtocolError> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or(ProtocolError::InvalidHexDigit { digit: c })
}
