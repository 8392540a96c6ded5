//! Settings record layout
//!
//! ```text
//! offset  0       1        2       3      4      5           6        7
//!       ┌───────┬────────┬───────┬──────┬──────┬───────────┬────────┬──────┐
//!       │ 'S'   │ ver 1  │ len 5 │ pos  │ pos  │ resolution│ speed  │ hold │
//!       │ 0x53  │        │       │ lo   │ hi   │ 0/1       │ divisor│ 0/1  │
//!       └───────┴────────┴───────┴──────┴──────┴───────────┴────────┴──────┘
//! ```

use selene_hal::StorageError;

use crate::config::Resolution;

/// Marker byte identifying an initialized record
pub const RECORD_MARKER: u8 = b'S';

/// Current record layout version
pub const RECORD_VERSION: u8 = 1;

/// Header size (marker, version, payload length)
pub const RECORD_HEADER_SIZE: usize = 3;

/// Payload size for [`RECORD_VERSION`]
pub const RECORD_PAYLOAD_SIZE: usize = 5;

/// Total record size
pub const RECORD_SIZE: usize = RECORD_HEADER_SIZE + RECORD_PAYLOAD_SIZE;

/// Errors from the settings layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Stored bytes are not a valid record
    Uninitialized,
    /// Underlying storage failed
    Storage(StorageError),
}

impl From<StorageError> for SettingsError {
    fn from(err: StorageError) -> Self {
        SettingsError::Storage(err)
    }
}

/// Fields that survive a power cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PersistedSettings {
    pub position: u16,
    pub resolution: Resolution,
    pub speed_divisor: u8,
    pub hold: bool,
}

impl PersistedSettings {
    /// Values used when storage holds no valid record
    pub const DEFAULT: Self = Self {
        position: 0,
        resolution: Resolution::Fine,
        speed_divisor: 2,
        hold: false,
    };

    /// Encode into the on-storage layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let [pos_lo, pos_hi] = self.position.to_le_bytes();
        [
            RECORD_MARKER,
            RECORD_VERSION,
            RECORD_PAYLOAD_SIZE as u8,
            pos_lo,
            pos_hi,
            self.resolution.is_fine() as u8,
            self.speed_divisor,
            self.hold as u8,
        ]
    }

    /// Decode a stored record
    ///
    /// A wrong header or a flag byte other than 0/1 means the storage was
    /// never initialized by this layout.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Result<Self, SettingsError> {
        if bytes[0] != RECORD_MARKER
            || bytes[1] != RECORD_VERSION
            || bytes[2] as usize != RECORD_PAYLOAD_SIZE
        {
            return Err(SettingsError::Uninitialized);
        }

        let resolution = match bytes[5] {
            0 => Resolution::Coarse,
            1 => Resolution::Fine,
            _ => return Err(SettingsError::Uninitialized),
        };
        let hold = match bytes[7] {
            0 => false,
            1 => true,
            _ => return Err(SettingsError::Uninitialized),
        };

        Ok(Self {
            position: u16::from_le_bytes([bytes[3], bytes[4]]),
            resolution,
            speed_divisor: bytes[6],
            hold,
        })
    }
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
