//! Activity LED task

use embassy_rp::gpio::Output;
use embassy_time::Timer;

use crate::channels::ACTIVITY;

/// How long the LED stays on per command
const FLASH_MS: u64 = 30;

/// Flash the LED whenever a command is handled
#[embassy_executor::task]
pub async fn led_task(mut led: Output<'static>) {
    loop {
        ACTIVITY.wait().await;
        led.set_high();
        Timer::after_millis(FLASH_MS).await;
        led.set_low();
    }
}
