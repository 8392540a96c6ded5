//! Hardware abstraction traits
//!
//! These traits define the interface between core logic and hardware
//! drivers. Implementations live in the `selene-drivers` crate.

pub mod stepper;

pub use stepper::{Direction, StepperDriver};
