//! Safety monitoring
//!
//! Host link supervision for the focuser.

pub mod watchdog;

pub use watchdog::LinkWatchdog;
