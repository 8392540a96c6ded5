//! Stepper motor driver trait
//!
//! Abstracts over step/dir drivers (DRV8825, A4988 and friends). Calls are
//! made from the tick context, so implementations must only use short
//! microsecond delays.

/// Direction of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Towards higher positions
    Forward,
    /// Towards lower positions
    Reverse,
}

/// Trait for step/dir stepper drivers
pub trait StepperDriver {
    /// Select the microstep multiplier
    ///
    /// Supported values are 1, 2, 4, 8, 16 and 32. Anything else selects
    /// full step.
    fn set_microsteps(&mut self, microsteps: u8);

    /// Energize the motor and wait for the driver to settle
    fn enable(&mut self);

    /// De-energize the motor and wait for the driver to settle
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn disable(&mut self);

    /// Last commanded enable state
    fn is_enabled(&self) -> bool;

    /// Emit one step pulse in the given direction
    fn step(&mut self, direction: Direction);
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording driver for host tests

    use super::*;

    #[derive(Debug, Default)]
    pub struct MockStepper {
        pub enabled: bool,
        pub microsteps: u8,
        pub forward_steps: u32,
        pub reverse_steps: u32,
        pub enable_calls: u32,
        pub disable_calls: u32,
    }

    impl MockStepper {
        pub fn total_steps(&self) -> u32 {
            self.forward_steps + self.reverse_steps
        }
    }

    impl StepperDriver for MockStepper {
        fn set_microsteps(&mut self, microsteps: u8) {
            self.microsteps = microsteps;
        }

        fn enable(&mut self) {
            self.enabled = true;
            self.enable_calls += 1;
        }

        fn disable(&mut self) {
            self.enabled = false;
            self.disable_calls += 1;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn step(&mut self, direction: Direction) {
            match direction {
                Direction::Forward => self.forward_steps += 1,
                Direction::Reverse => self.reverse_steps += 1,
            }
        }
    }
}
