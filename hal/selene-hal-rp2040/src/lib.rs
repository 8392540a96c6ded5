//! RP2040-specific HAL for the focuser firmware
//!
//! The RP2040 has no EEPROM. This crate emulates a small byte-addressed
//! EEPROM on top of the QSPI flash and implements
//! `selene_hal::ByteStorage` for it.

#![no_std]

pub mod flash;

pub use flash::{Rp2040Eeprom, EEPROM_SIZE};
pub use selene_hal::{ByteStorage, StorageError};
