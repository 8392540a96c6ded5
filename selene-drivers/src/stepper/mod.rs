//! Stepper driver implementations

pub mod drv8825;

pub use drv8825::{microstep_bits, Drv8825, Drv8825Config, Drv8825Pins};
