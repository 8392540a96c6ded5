//! Frame decoding for the Moonlite protocol.
//!
//! Frame format:
//! - START (1 byte): `:`
//! - PAYLOAD (0-8 bytes): two-character command code plus optional hex
//! - TERMINATOR (1 byte): `#`
//!
//! Bytes outside a frame (line noise, stray newlines from terminal clients)
//! are ignored. A frame longer than the payload buffer is dropped as a
//! whole, never truncated.

use heapless::Vec;

/// Frame start byte
pub const FRAME_START: u8 = b':';

/// Frame terminator byte, also used to terminate replies
pub const FRAME_TERMINATOR: u8 = b'#';

/// Maximum payload size in bytes (command code plus hex argument)
pub const MAX_PAYLOAD_SIZE: usize = 8;

/// Errors that can occur during frame parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeded [`MAX_PAYLOAD_SIZE`]; the frame is being discarded
    Overflow,
}

/// A received frame with framing bytes stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Payload data (command code followed by argument)
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a frame from raw payload bytes
    pub fn new(payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::Overflow)?;
        Ok(Self {
            payload: payload_vec,
        })
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Collecting payload bytes until TERMINATOR
    ReadingPayload,
    /// Frame overflowed, skipping until TERMINATOR or a new START
    Discarding,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` once when a frame
    /// overflows the payload buffer.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.start_frame();
                }
                Ok(None)
            }
            ParseState::ReadingPayload => match byte {
                FRAME_START => {
                    // Unterminated frame followed by a new one: keep the new one
                    self.start_frame();
                    Ok(None)
                }
                FRAME_TERMINATOR => {
                    let frame = Frame {
                        payload: self.buffer.clone(),
                    };
                    self.reset();
                    Ok(Some(frame))
                }
                _ => {
                    if self.buffer.push(byte).is_err() {
                        self.buffer.clear();
                        self.state = ParseState::Discarding;
                        return Err(FrameError::Overflow);
                    }
                    Ok(None)
                }
            },
            ParseState::Discarding => {
                match byte {
                    FRAME_START => self.start_frame(),
                    FRAME_TERMINATOR => self.reset(),
                    _ => {}
                }
                Ok(None)
            }
        }
    }

    fn start_frame(&mut self) {
        self.buffer.clear();
        self.state = ParseState::ReadingPayload;
    }
}
