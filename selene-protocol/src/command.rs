//! Command table for the Moonlite protocol
//!
//! Commands are identified by the first two payload characters. Lookup is a
//! linear scan over [`COMMAND_TABLE`] in declaration order; set-commands
//! carry a hex argument starting right after the code.

use crate::frame::Frame;

/// Operations understood by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandCode {
    /// `FQ` - halt motion immediately
    Stop,
    /// `GP` - report current position
    GetPosition,
    /// `SP` - overwrite current position
    SetPosition,
    /// `GN` - report target position
    GetTarget,
    /// `SN` - set target position
    SetTarget,
    /// `FG` - start moving to target
    Go,
    /// `GH` - report whether half-step (fine) resolution is active
    GetHalfStep,
    /// `SF` - select full-step (coarse) resolution
    SetFullStep,
    /// `SH` - select half-step (fine) resolution
    SetHalfStep,
    /// `GI` - report whether a move is in progress
    GetMoving,
    /// `GV` - report firmware version
    GetVersion,
    /// `GB` - report red LED backlight value
    GetBacklight,
    /// `GD` - report speed divisor
    GetSpeed,
    /// `SD` - set speed divisor
    SetSpeed,
    /// `GT` - report temperature
    GetTemperature,
    /// `HE` - keep the driver energized at rest
    HoldEnable,
    /// `HD` - release the driver at rest
    HoldDisable,
}

/// Two-character codes in lookup order
pub const COMMAND_TABLE: [(&[u8; 2], CommandCode); 17] = [
    (b"FQ", CommandCode::Stop),
    (b"GP", CommandCode::GetPosition),
    (b"SP", CommandCode::SetPosition),
    (b"GN", CommandCode::GetTarget),
    (b"SN", CommandCode::SetTarget),
    (b"FG", CommandCode::Go),
    (b"GH", CommandCode::GetHalfStep),
    (b"SF", CommandCode::SetFullStep),
    (b"SH", CommandCode::SetHalfStep),
    (b"GI", CommandCode::GetMoving),
    (b"GV", CommandCode::GetVersion),
    (b"GB", CommandCode::GetBacklight),
    (b"GD", CommandCode::GetSpeed),
    (b"SD", CommandCode::SetSpeed),
    (b"GT", CommandCode::GetTemperature),
    (b"HE", CommandCode::HoldEnable),
    (b"HD", CommandCode::HoldDisable),
];

/// Errors from command decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Payload does not start with a known code
    Unrecognized,
}

/// A decoded command with its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Stop,
    GetPosition,
    SetPosition(u16),
    GetTarget,
    SetTarget(u16),
    Go,
    GetHalfStep,
    SetFullStep,
    SetHalfStep,
    GetMoving,
    GetVersion,
    GetBacklight,
    GetSpeed,
    SetSpeed(u8),
    GetTemperature,
    HoldEnable,
    HoldDisable,
}

impl CommandCode {
    /// Look up a code by the first two bytes of a payload
    pub fn lookup(payload: &[u8]) -> Option<Self> {
        let prefix = payload.get(..2)?;
        COMMAND_TABLE
            .iter()
            .find(|(code, _)| code.as_slice() == prefix)
            .map(|&(_, command)| command)
    }
}

impl Command {
    /// Decode a command from a frame payload
    ///
    /// Arguments shorter than their field width are read as the digits
    /// present; a missing argument reads as zero.
    pub fn parse(payload: &[u8]) -> Result<Self, CommandError> {
        let code = CommandCode::lookup(payload).ok_or(CommandError::Unrecognized)?;
        let arg = &payload[2..];

        Ok(match code {
            CommandCode::Stop => Command::Stop,
            CommandCode::GetPosition => Command::GetPosition,
            CommandCode::SetPosition => Command::SetPosition(parse_hex(arg) as u16),
            CommandCode::GetTarget => Command::GetTarget,
            CommandCode::SetTarget => Command::SetTarget(parse_hex(arg) as u16),
            CommandCode::Go => Command::Go,
            CommandCode::GetHalfStep => Command::GetHalfStep,
            CommandCode::SetFullStep => Command::SetFullStep,
            CommandCode::SetHalfStep => Command::SetHalfStep,
            CommandCode::GetMoving => Command::GetMoving,
            CommandCode::GetVersion => Command::GetVersion,
            CommandCode::GetBacklight => Command::GetBacklight,
            CommandCode::GetSpeed => Command::GetSpeed,
            CommandCode::SetSpeed => Command::SetSpeed(parse_hex(arg) as u8),
            CommandCode::GetTemperature => Command::GetTemperature,
            CommandCode::HoldEnable => Command::HoldEnable,
            CommandCode::HoldDisable => Command::HoldDisable,
        })
    }

    /// Decode a command from a received frame
    pub fn from_frame(frame: &Frame) -> Result<Self, CommandError> {
        Self::parse(frame.payload())
    }

    /// Check if this command changes focuser state
    ///
    /// Only mutations of position, target, resolution and speed are refused
    /// while a move is in progress.
    pub fn requires_idle(&self) -> bool {
        matches!(
            self,
            Command::SetPosition(_)
                | Command::SetTarget(_)
                | Command::SetFullStep
                | Command::SetHalfStep
                | Command::SetSpeed(_)
        )
    }
}

/// Parse leading hex digits, case-insensitive
///
/// Stops at the first non-hex byte. An empty or non-hex argument is 0.
/// Digits beyond eight shift out the top, so callers narrowing the result
/// keep the low-order digits.
pub fn parse_hex(arg: &[u8]) -> u32 {
    arg.iter()
        .map_while(|&byte| (byte as char).to_digit(16))
        .fold(0, |acc, digit| (acc << 4) | digit)
}
