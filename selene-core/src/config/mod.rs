//! Configuration types
//!
//! Board tuning is fixed at build time (`focuser.toml` in the firmware
//! crate). The core only sees the tick-domain values in [`FocuserConfig`].

pub mod focuser;

pub use focuser::*;
