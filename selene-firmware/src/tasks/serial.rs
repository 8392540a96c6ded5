//! Moonlite serial task
//!
//! Receives frames from the host, dispatches them against the focuser and
//! writes replies. Between reads it services the link watchdog and any
//! pending settings save, so slow flash writes stay out of the tick.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Instant, Timer};
use embedded_io_async::{Read, Write};

use selene_core::{dispatch, LinkWatchdog, SettingsStore};
use selene_hal_rp2040::Rp2040Eeprom;
use selene_protocol::{Command, Frame, FrameParser};

use crate::channels::{with_focuser, ACTIVITY};
use crate::config::LINK_TIMEOUT_MS;

/// Settings store on the emulated EEPROM
pub type BoardSettingsStore = SettingsStore<Rp2040Eeprom<'static>>;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Longest wait for input before servicing the watchdog and saves
const POLL_INTERVAL_MS: u64 = 100;

/// Serial task - Moonlite command loop
#[embassy_executor::task]
pub async fn serial_task(
    mut rx: BufferedUartRx,
    mut tx: BufferedUartTx,
    mut store: BoardSettingsStore,
) {
    info!("Serial task started");

    let mut parser = FrameParser::new();
    let mut watchdog = LinkWatchdog::new(LINK_TIMEOUT_MS, now_ms());
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match select(rx.read(&mut buf), Timer::after_millis(POLL_INTERVAL_MS)).await {
            Either::First(Ok(n)) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => handle_frame(&frame, &mut tx, &mut watchdog).await,
                        Ok(None) => {}
                        Err(e) => debug!("Frame dropped: {:?}", e),
                    }
                }
            }
            Either::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Either::Second(()) => {}
        }

        if watchdog.poll(now_ms()) {
            info!("Host silent for {} ms, releasing motor", watchdog.timeout_ms());
            with_focuser(|focuser| focuser.force_disable());
        }

        save_if_requested(&mut store).await;
    }
}

/// Decode, dispatch and answer one frame
async fn handle_frame(frame: &Frame, tx: &mut BufferedUartTx, watchdog: &mut LinkWatchdog) {
    let command = match Command::from_frame(frame) {
        Ok(command) => command,
        Err(e) => {
            debug!("Ignoring frame: {:?}", e);
            return;
        }
    };

    watchdog.command_received(now_ms());
    ACTIVITY.signal(());
    trace!("Command: {:?}", command);

    let Some(reply) = with_focuser(|focuser| dispatch(focuser, command)).flatten() else {
        return;
    };

    if let Err(e) = tx.write_all(&reply.encode()).await {
        warn!("UART write error: {:?}", e);
    }
}

/// Write settings to flash if the focuser asked for it
async fn save_if_requested(store: &mut BoardSettingsStore) {
    let pending = with_focuser(|focuser| {
        focuser
            .take_persist_request()
            .then(|| focuser.settings())
    })
    .flatten();

    let Some(settings) = pending else {
        return;
    };

    match store.save(&settings).await {
        Ok(written) => debug!("Settings saved ({} bytes changed)", written),
        Err(e) => {
            warn!("Settings save failed, retrying next poll: {:?}", e);
            with_focuser(|focuser| focuser.request_persist());
        }
    }
}

/// Milliseconds since boot, wrapping
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
