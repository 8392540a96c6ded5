//! Persistent settings
//!
//! The persisted fields are packed into a small versioned record and kept
//! in byte-addressed non-volatile storage. Saves only write bytes that
//! changed, since the backing store is wear-limited.

pub mod record;
pub mod store;

pub use record::*;
pub use store::SettingsStore;
