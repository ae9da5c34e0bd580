//! Control core of a wheel-sensor bike computer.
//!
//! Everything in this crate is plain Rust and runs on the host: the firmware
//! binary (`--features device`) only wires ESP-IDF drivers to the traits in
//! [`display`] and [`power`] and feeds [`device::DeviceState`] with events.
//!
//! Usage: `cargo test` (no hardware required)

pub mod config;
pub mod device;
pub mod display;
pub mod events;
pub mod history;
pub mod input;
pub mod motion;
pub mod power;

pub use device::DeviceState;
pub use display::{Display, DisplayController, DisplayMode, IdleScheduler};
pub use events::{ButtonEvent, ButtonId, DeviceEvent};
pub use history::{Bitmap, HistoryBuffer, HistorySummary};
pub use motion::{Baseline, MotionTracker, RotationOutcome};
pub use power::{AdcDriver, AdcUnit, BatteryReading, Calibration, PowerMonitor};
