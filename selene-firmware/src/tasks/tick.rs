//! Stepper tick task
//!
//! Runs in the high-priority interrupt executor so serial traffic and
//! flash writes never delay a step.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::with_focuser;
use crate::config::TICK_PERIOD_US;

/// Stepper tick task - advances the motion controller every tick period
#[embassy_executor::task]
pub async fn stepper_tick_task() {
    info!("Stepper tick task started ({} us)", TICK_PERIOD_US);

    let mut ticker = Ticker::every(Duration::from_micros(TICK_PERIOD_US as u64));

    loop {
        ticker.next().await;
        with_focuser(|focuser| focuser.tick());
    }
}
