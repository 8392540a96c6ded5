//! Motion control
//!
//! Tick-driven stepping towards a target position, with driver power
//! management between moves.

pub mod focuser;

pub use focuser::{Focuser, MotionState};
