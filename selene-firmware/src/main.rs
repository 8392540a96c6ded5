//! Selene - Moonlite-compatible Focuser Firmware
//!
//! Main firmware binary for RP2040 boards driving a DRV8825 step/dir
//! stepper. Speaks the Moonlite serial protocol on UART0.
//!
//! Two executors share one focuser:
//! - an interrupt executor (SWI_IRQ_1) running the stepping tick
//! - the thread-mode executor running the serial command loop and the
//!   activity LED

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use selene_core::{Focuser, SettingsStore};
use selene_drivers::stepper::{Drv8825, Drv8825Pins};
use selene_hal_rp2040::Rp2040Eeprom;

#[macro_use]
mod config;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// High-priority executor for the stepping tick
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Selene firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Settings from the emulated EEPROM
    let mut eeprom = Rp2040Eeprom::new(p.FLASH, p.DMA_CH0);
    if let Err(e) = eeprom.load().await {
        warn!("EEPROM image unreadable ({:?}), erasing partition", e);
        if let Err(e) = eeprom.erase_all().await {
            error!("EEPROM erase failed: {:?}", e);
        }
    }
    let mut store = SettingsStore::new(eeprom, config::STORAGE_BASE_ADDRESS);
    let settings = store.load().await;
    info!(
        "Settings: position={} resolution={} speed={} hold={}",
        settings.position, settings.resolution, settings.speed_divisor, settings.hold
    );

    // Stepper driver
    let (dir, step, enable, m0, m1, m2, led) = take_board_pins!(p);
    let enable_idle = if config::ENABLE_ACTIVE_LOW {
        Level::High
    } else {
        Level::Low
    };
    let driver = Drv8825::new(
        Drv8825Pins {
            dir: Output::new(dir, Level::Low),
            step: Output::new(step, Level::Low),
            enable: Output::new(enable, enable_idle),
            m0: Output::new(m0, Level::Low),
            m1: Output::new(m1, Level::Low),
            m2: Output::new(m2, Level::Low),
        },
        Delay,
        config::DRIVER_CONFIG,
    );
    info!(
        "DRV8825: DIR=GPIO{} STEP=GPIO{} EN=GPIO{} M0-2=GPIO{}/{}/{}",
        config::PIN_DIR,
        config::PIN_STEP,
        config::PIN_ENABLE,
        config::PIN_M0,
        config::PIN_M1,
        config::PIN_M2
    );

    let mut focuser = Focuser::new(driver, config::FOCUSER_CONFIG);
    focuser.apply_settings(&settings);
    channels::install_focuser(focuser);

    // Setup UART for the Moonlite host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config::SERIAL_BAUDRATE;

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config::SERIAL_BAUDRATE);

    let led = Output::new(led, Level::Low);
    debug!("Activity LED on GPIO{}", config::PIN_LED);

    // Tick runs above everything else in thread mode
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(tasks::stepper_tick_task()).unwrap();

    spawner.spawn(tasks::serial_task(rx, tx, store)).unwrap();
    spawner.spawn(tasks::led_task(led)).unwrap();

    info!("All tasks spawned, firmware running");
}
