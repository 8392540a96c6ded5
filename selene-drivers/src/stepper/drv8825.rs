//! DRV8825 step/dir stepper driver
//!
//! Pin interface:
//! - DIR: high steps forward
//! - STEP: one rising edge per microstep, held at least 1.9 µs
//! - EN: active low; the charge pump needs a moment after switching
//! - M0/M1/M2: microstep selector, sampled by the driver on every step
//!
//! Delays are microsecond busy-waits, short enough for the tick context.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use selene_core::traits::{Direction, StepperDriver};

/// Settle time after changing the enable line
const ENABLE_SETTLE_US: u32 = 1;

/// STEP high time
const STEP_PULSE_US: u32 = 2;

/// Mode pin patterns for 1, 2, 4, 8, 16 and 32 microsteps
const STEP_TABLE: [(u8, u8); 6] = [
    (1, 0b000),
    (2, 0b001),
    (4, 0b010),
    (8, 0b011),
    (16, 0b100),
    (32, 0b111),
];

/// M2..M0 selector bits for a microstep multiplier
///
/// Unsupported multipliers select full step.
pub fn microstep_bits(microsteps: u8) -> u8 {
    STEP_TABLE
        .iter()
        .find(|(value, _)| *value == microsteps)
        .map(|&(_, bits)| bits)
        .unwrap_or(0b000)
}

/// Board-level polarity options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Drv8825Config {
    /// EN pin is driven low to enable (true on stock DRV8825 carriers)
    pub enable_active_low: bool,
    /// Swap DIR levels when the motor is wired backwards
    pub invert_direction: bool,
}

impl Default for Drv8825Config {
    fn default() -> Self {
        Self {
            enable_active_low: true,
            invert_direction: false,
        }
    }
}

/// Output pins wired to the driver
pub struct Drv8825Pins<P> {
    pub dir: P,
    pub step: P,
    pub enable: P,
    pub m0: P,
    pub m1: P,
    pub m2: P,
}

/// DRV8825 driver over embedded-hal output pins
///
/// Pin errors are ignored; GPIO writes on the supported boards cannot fail.
pub struct Drv8825<P, D> {
    pins: Drv8825Pins<P>,
    delay: D,
    config: Drv8825Config,
    enabled: bool,
    microsteps: u8,
}

impl<P: OutputPin, D: DelayNs> Drv8825<P, D> {
    /// Create a driver in full-step mode with the outputs disabled
    pub fn new(pins: Drv8825Pins<P>, delay: D, config: Drv8825Config) -> Self {
        let mut driver = Self {
            pins,
            delay,
            config,
            enabled: false,
            microsteps: 1,
        };
        driver.set_microsteps(1);
        driver.disable();
        driver
    }

    /// Current microstep multiplier (1 if an unsupported value was requested)
    pub fn microsteps(&self) -> u8 {
        self.microsteps
    }

    fn write_enable(&mut self, enabled: bool) {
        let level = enabled != self.config.enable_active_low;
        let _ = set_level(&mut self.pins.enable, level);
        self.delay.delay_us(ENABLE_SETTLE_US);
        self.enabled = enabled;
    }
}

impl<P: OutputPin, D: DelayNs> StepperDriver for Drv8825<P, D> {
    fn set_microsteps(&mut self, microsteps: u8) {
        let bits = microstep_bits(microsteps);
        let _ = set_level(&mut self.pins.m0, bits & 0b001 != 0);
        let _ = set_level(&mut self.pins.m1, bits & 0b010 != 0);
        let _ = set_level(&mut self.pins.m2, bits & 0b100 != 0);
        self.microsteps = if bits == 0 { 1 } else { microsteps };
    }

    fn enable(&mut self) {
        self.write_enable(true);
    }

    fn disable(&mut self) {
        self.write_enable(false);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn step(&mut self, direction: Direction) {
        let forward = direction == Direction::Forward;
        let _ = set_level(&mut self.pins.dir, forward != self.config.invert_direction);
        let _ = self.pins.step.set_high();
        self.delay.delay_us(STEP_PULSE_US);
        let _ = self.pins.step.set_low();
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}
