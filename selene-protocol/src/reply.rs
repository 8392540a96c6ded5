//! Reply encoding
//!
//! Numeric replies are uppercase, zero-padded hex of fixed width. Every
//! reply ends with the frame terminator `#`.

use heapless::Vec;

use crate::frame::FRAME_TERMINATOR;

/// Longest encoded reply (`XXXX#`)
pub const MAX_REPLY_SIZE: usize = 5;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// A reply to a query command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Four hex digits
    Hex16(u16),
    /// Two hex digits
    Hex8(u8),
    /// Fixed text
    Text(&'static str),
}

impl Reply {
    /// Boolean flag in Moonlite style (`01`/`00`)
    pub fn flag(set: bool) -> Self {
        Reply::Hex8(set as u8)
    }

    /// Encode into a byte buffer including the terminator
    pub fn encode(&self) -> Vec<u8, MAX_REPLY_SIZE> {
        let mut out = Vec::new();
        match *self {
            Reply::Hex16(value) => push_hex(&mut out, value as u32, 4),
            Reply::Hex8(value) => push_hex(&mut out, value as u32, 2),
            Reply::Text(text) => {
                // Literals are compile-time constants well under the limit
                let _ = out.extend_from_slice(text.as_bytes());
            }
        }
        let _ = out.push(FRAME_TERMINATOR);
        out
    }
}

fn push_hex(out: &mut Vec<u8, MAX_REPLY_SIZE>, value: u32, digits: u32) {
    for shift in (0..digits).rev() {
        let nibble = (value >> (shift * 4)) & 0xF;
        let _ = out.push(HEX_DIGITS[nibble as usize]);
    }
}
