//! Motion timing and microstep configuration

/// Default tick period
pub const DEFAULT_TICK_PERIOD_US: u32 = 500;

/// Default delay between arrival and de-energizing the driver
pub const DEFAULT_DISABLE_DELAY_MS: u32 = 1000;

/// Default settle time after enabling the driver for a move
pub const DEFAULT_ENABLE_SETTLE_US: u32 = 1000;

/// Default microstep multiplier for coarse ("full step") resolution
pub const DEFAULT_COARSE_MICROSTEPS: u8 = 8;

/// Default microstep multiplier for fine ("half step") resolution
pub const DEFAULT_FINE_MICROSTEPS: u8 = 32;

/// Microstep resolution selected by the host
///
/// The protocol calls these "full" and "half" step; the actual multipliers
/// come from [`FocuserConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Coarse,
    #[default]
    Fine,
}

impl Resolution {
    /// Check if fine resolution is selected
    pub fn is_fine(self) -> bool {
        self == Resolution::Fine
    }

    /// Microstep multiplier for this resolution
    pub fn microsteps(self, config: &FocuserConfig) -> u8 {
        match self {
            Resolution::Coarse => config.coarse_microsteps,
            Resolution::Fine => config.fine_microsteps,
        }
    }
}

/// Runtime configuration for the motion controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FocuserConfig {
    /// Period of the stepping tick in microseconds
    pub tick_period_us: u32,
    /// Ticks between arrival and de-energizing the driver
    pub disable_delay_ticks: u32,
    /// Ticks to wait after enabling the driver before the first step
    pub enable_settle_ticks: u32,
    /// Multiplier used for [`Resolution::Coarse`]
    pub coarse_microsteps: u8,
    /// Multiplier used for [`Resolution::Fine`]
    pub fine_microsteps: u8,
}

impl Default for FocuserConfig {
    fn default() -> Self {
        Self::from_timing(
            DEFAULT_TICK_PERIOD_US,
            DEFAULT_DISABLE_DELAY_MS,
            DEFAULT_ENABLE_SETTLE_US,
            DEFAULT_COARSE_MICROSTEPS,
            DEFAULT_FINE_MICROSTEPS,
        )
    }
}

impl FocuserConfig {
    /// Build a config from wall-clock timings
    ///
    /// Durations are rounded up to whole ticks. A zero tick period is
    /// treated as 1 µs.
    pub const fn from_timing(
        tick_period_us: u32,
        disable_delay_ms: u32,
        enable_settle_us: u32,
        coarse_microsteps: u8,
        fine_microsteps: u8,
    ) -> Self {
        let tick = if tick_period_us == 0 { 1 } else { tick_period_us };
        Self {
            tick_period_us: tick,
            disable_delay_ticks: (disable_delay_ms.saturating_mul(1000)).div_ceil(tick),
            enable_settle_ticks: enable_settle_us.div_ceil(tick),
            coarse_microsteps,
            fine_microsteps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let config = FocuserConfig::default();
        assert_eq!(config.tick_period_us, 500);
        assert_eq!(config.disable_delay_ticks, 2000);
        assert_eq!(config.enable_settle_ticks, 2);
        assert_eq!(config.coarse_microsteps, 8);
        assert_eq!(config.fine_microsteps, 32);
    }

    #[test]
    fn test_timing_rounds_up() {
        let config = FocuserConfig::from_timing(500, 1, 1, 1, 2);
        assert_eq!(config.disable_delay_ticks, 2);
        assert_eq!(config.enable_settle_ticks, 1);

        let config = FocuserConfig::from_timing(500, 0, 0, 1, 2);
        assert_eq!(config.disable_delay_ticks, 0);
        assert_eq!(config.enable_settle_ticks, 0);
    }

    #[test]
    fn test_zero_tick_period() {
        let config = FocuserConfig::from_timing(0, 1, 3, 1, 2);
        assert_eq!(config.tick_period_us, 1);
        assert_eq!(config.disable_delay_ticks, 1000);
        assert_eq!(config.enable_settle_ticks, 3);
    }

    #[test]
    fn test_resolution_microsteps() {
        let config = FocuserConfig::default();
        assert_eq!(Resolution::Coarse.microsteps(&config), 8);
        assert_eq!(Resolution::Fine.microsteps(&config), 32);
        assert_eq!(Resolution::default(), Resolution::Fine);
        assert!(Resolution::Fine.is_fine());
        assert!(!Resolution::Coarse.is_fine());
    }
}
