//! Shared state between tasks
//!
//! The focuser lives in one critical-section mutex. The tick task runs in
//! an interrupt executor and the serial task in thread mode; masking
//! interrupts while the lock is held keeps every field consistent across
//! both.

use core::cell::RefCell;

use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Delay;

use selene_core::Focuser;
use selene_drivers::stepper::Drv8825;

/// Stepper driver as wired on the board
pub type BoardDriver = Drv8825<Output<'static>, Delay>;

/// Focuser with the board's driver
pub type BoardFocuser = Focuser<BoardDriver>;

/// The focuser, installed once by `main`
pub static FOCUSER: Mutex<CriticalSectionRawMutex, RefCell<Option<BoardFocuser>>> =
    Mutex::new(RefCell::new(None));

/// Signal that a command was handled (blinks the activity LED)
pub static ACTIVITY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Install the focuser for the tasks to use
pub fn install_focuser(focuser: BoardFocuser) {
    FOCUSER.lock(|cell| {
        cell.replace(Some(focuser));
    });
}

/// Run `f` with exclusive access to the focuser
///
/// Returns `None` before the focuser is installed. Keep `f` short: it runs
/// with interrupts masked.
pub fn with_focuser<R>(f: impl FnOnce(&mut BoardFocuser) -> R) -> Option<R> {
    FOCUSER.lock(|cell| cell.borrow_mut().as_mut().map(f))
}
