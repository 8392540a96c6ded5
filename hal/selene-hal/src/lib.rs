//! Selene Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the focuser core needs
//! from a board, so the same motion and settings logic runs on the RP2040
//! build and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (selene-firmware)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  selene-core (settings store)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  selene-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ selene-hal-   │       │ MemoryStorage │
//! │    rp2040     │       │ (host tests)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! Pin and delay access goes through `embedded-hal` directly; only the
//! byte-addressed persistent storage needs a trait of its own.

#![no_std]
#![deny(unsafe_code)]

pub mod storage;

pub use storage::{ByteStorage, MemoryStorage, StorageError, ERASED_BYTE};
