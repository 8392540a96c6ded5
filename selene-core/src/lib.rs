//! Board-agnostic core logic for the Selene focuser firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Stepper driver trait
//! - Tick-driven motion controller with driver power management
//! - Moonlite command dispatch against the controller
//! - Persistent settings record and store
//! - Link watchdog
//! - Runtime configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dispatch;
pub mod motion;
pub mod safety;
pub mod settings;
pub mod traits;

pub use config::{FocuserConfig, Resolution};
pub use dispatch::dispatch;
pub use motion::{Focuser, MotionState};
pub use safety::LinkWatchdog;
pub use settings::{PersistedSettings, SettingsError, SettingsStore};
pub use traits::{Direction, StepperDriver};
