//! Moonlite Focuser Serial Protocol
//!
//! This crate defines the ASCII protocol spoken between focuser client
//! software (INDI, ASCOM, N.I.N.A. drivers) and the Selene controller. It is
//! wire-compatible with the Moonlite focuser family.
//!
//! # Protocol Overview
//!
//! Every command is a short ASCII frame:
//! ```text
//! ┌───────┬──────────┬──────────────────┬────────────┐
//! │ START │ CODE     │ PAYLOAD          │ TERMINATOR │
//! │ ':'   │ 2 chars  │ 0–6 hex chars    │ '#'        │
//! └───────┴──────────┴──────────────────┴────────────┘
//! ```
//!
//! Replies are uppercase hex (or a fixed literal) followed by `#`. Commands
//! that have nothing to report produce no bytes at all, and the protocol has
//! no error reply: anything the controller cannot act on is dropped.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod frame;
pub mod reply;

pub use command::{parse_hex, Command, CommandCode, CommandError, COMMAND_TABLE};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, FRAME_TERMINATOR, MAX_PAYLOAD_SIZE};
pub use reply::{Reply, MAX_REPLY_SIZE};
