//! Build-time board configuration
//!
//! Values come from `focuser.toml`, validated and turned into constants by
//! `build.rs`.

use selene_core::FocuserConfig;
use selene_drivers::stepper::Drv8825Config;

include!(concat!(env!("OUT_DIR"), "/focuser_config.rs"));

/// Motion timing for the core
pub const FOCUSER_CONFIG: FocuserConfig = FocuserConfig::from_timing(
    TICK_PERIOD_US,
    DISABLE_DELAY_MS,
    ENABLE_SETTLE_US,
    COARSE_MICROSTEPS,
    FINE_MICROSTEPS,
);

/// Driver polarity
pub const DRIVER_CONFIG: Drv8825Config = Drv8825Config {
    enable_active_low: ENABLE_ACTIVE_LOW,
    invert_direction: INVERT_DIRECTION,
};
