//! Embassy async tasks
//!
//! Each task runs independently and communicates through the shared
//! focuser and signals in `channels`.

pub mod led;
pub mod serial;
pub mod tick;

pub use led::led_task;
pub use serial::{serial_task, BoardSettingsStore};
pub use tick::stepper_tick_task;
