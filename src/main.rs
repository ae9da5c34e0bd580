// Cyclometer - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up logging, the I2C bus and the OLED.
//   2. Create the event queue and the ESP timer service.
//   3. Start the periodic history tick and the button poll thread.
//   4. Show the Active view and run the event loop on the main task.
//
// Everything after boot is driven by events: wheel pulses, the wake button,
// the idle timer and the history tick all land in one queue.

mod drivers;
mod tasks;

use std::sync::mpsc;
use std::thread;

use esp_idf_hal::gpio::{IOPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;
use esp_idf_svc::timer::EspTaskTimerService;

use cyclometer::config::*;
use cyclometer::{Calibration, DeviceState, DisplayController, PowerMonitor};

use crate::drivers::adc::EspAdc;
use crate::drivers::oled::Ssd1306;
use crate::tasks::timers::{start_history_timer, EspIdleScheduler};

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot
// ---------------------------------------------------------------------------
pub fn now_ms() -> u64 {
    (unsafe { esp_idf_sys::esp_timer_get_time() } / 1000) as u64
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Cyclometer firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus + OLED ---------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // PIN_I2C_SDA
        peripherals.pins.gpio22, // PIN_I2C_SCL
        &i2c_config,
    )?;
    let mut oled = Ssd1306::new(i2c);
    oled.init()?;

    // ---- Event queue ------------------------------------------------------
    let (event_tx, event_rx) = mpsc::sync_channel(EVENT_QUEUE_DEPTH);

    // ---- Timers -----------------------------------------------------------
    let timer_service = EspTaskTimerService::new()?;
    let _history_timer = start_history_timer(&timer_service, event_tx.clone())?;
    let idle_scheduler = EspIdleScheduler::new(timer_service.clone(), event_tx.clone());

    // ---- Buttons (wake + wheel sensor, active LOW) ------------------------
    log::info!(
        "I2C SDA GPIO{} / SCL GPIO{}, wake GPIO{}, sensor GPIO{}",
        PIN_I2C_SDA,
        PIN_I2C_SCL,
        PIN_WAKE_BUTTON,
        PIN_SENSOR
    );
    let mut wake_pin = PinDriver::input(peripherals.pins.gpio0.downgrade())?; // PIN_WAKE_BUTTON
    wake_pin.set_pull(Pull::Up)?;
    let mut sensor_pin = PinDriver::input(peripherals.pins.gpio4.downgrade())?; // PIN_SENSOR
    sensor_pin.set_pull(Pull::Up)?;

    thread::Builder::new()
        .name("buttons".into())
        .stack_size(STACK_BUTTONS)
        .spawn(move || {
            tasks::buttons::button_task(wake_pin, sensor_pin, event_tx);
        })?;

    // ---- Device state -----------------------------------------------------
    let controller = DisplayController::new(oled, idle_scheduler, IDLE_TIMEOUT);
    let power = PowerMonitor::new(EspAdc, Calibration::default());
    let mut device = DeviceState::new(MotionConfig::default(), controller, power);

    log::info!(
        "Wheel step {:.0} mm, bounce filter {} ms",
        STEP_LENGTH_MM,
        MIN_STEP_DURATION_MS
    );
    device.start();
    device.run(event_rx);

    // The timer callbacks and the button task hold senders, so run() only
    // returns if every one of them is gone.
    anyhow::bail!("event loop exited")
}
