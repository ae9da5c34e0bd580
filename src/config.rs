// Cyclometer - Hardware & System Configuration
// Target: ESP32 DevKit + SSD1306 OLED + reed switch on the front fork

use std::time::Duration;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_WAKE_BUTTON: i32 = 0;   // BOOT button (INPUT_PULLUP, active LOW)
pub const PIN_SENSOR: i32 = 4;        // Reed switch (INPUT_PULLUP, active LOW)
pub const PIN_I2C_SDA: i32 = 21;
pub const PIN_I2C_SCL: i32 = 22;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024
pub const LINE_HEIGHT: u32 = 8;
pub const ACTIVE_CONTRAST: u8 = 0xCF;
pub const FADE_STEPS: u8 = 8;
pub const FADE_STEP_MS: u64 = 40;

// History bar chart occupies everything below the three text lines.
pub const CHART_X: u32 = 0;
pub const CHART_Y: u32 = 3 * LINE_HEIGHT;
pub const CHART_WIDTH: u32 = SCREEN_WIDTH;
pub const CHART_HEIGHT: u32 = SCREEN_HEIGHT - CHART_Y; // 40

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_BUTTONS: usize = 4096;

// ---------------------------------------------------------------------------
// Event queue
// ---------------------------------------------------------------------------
pub const EVENT_QUEUE_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
pub const BUTTON_POLL_INTERVAL_MS: u64 = 2;
pub const WAKE_DEBOUNCE_MS: u64 = 50;
pub const SENSOR_DEBOUNCE_MS: u64 = 6;
pub const LONG_PRESS_MS: u64 = 1500;
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wheel geometry / motion
// ---------------------------------------------------------------------------
pub const WHEEL_CIRCUMFERENCE_MM: u32 = 2105; // 700x25C
pub const PULSES_PER_ROTATION: u32 = 1;
pub const STEP_LENGTH_MM: f32 = WHEEL_CIRCUMFERENCE_MM as f32 / PULSES_PER_ROTATION as f32;
pub const STEP_LENGTH_KM: f32 = STEP_LENGTH_MM / 1_000_000.0;
pub const MAX_PLAUSIBLE_SPEED_KMH: u32 = 90;

/// Shortest interval between two pulses that is still a real rotation.
/// Anything quicker would imply riding faster than `MAX_PLAUSIBLE_SPEED_KMH`.
pub const MIN_STEP_DURATION_MS: u32 =
    WHEEL_CIRCUMFERENCE_MM * 3600 / (PULSES_PER_ROTATION * MAX_PLAUSIBLE_SPEED_KMH * 1000); // 84

pub const MS_PER_HOUR: f32 = 3_600_000.0;

// ---------------------------------------------------------------------------
// Activity history
// ---------------------------------------------------------------------------
pub const HISTORY_LEN: usize = 128;
pub const HISTORY_WINDOW: Duration = Duration::from_secs(24 * 3600);
pub const HISTORY_STEP: Duration = Duration::from_secs(HISTORY_WINDOW.as_secs() / HISTORY_LEN as u64); // 675 s

// ---------------------------------------------------------------------------
// Battery ADC (ADC1, GPIO34 through a 1:2 divider)
// ---------------------------------------------------------------------------
pub const BATTERY_ADC_CHANNEL: u32 = 6;
pub const BATTERY_ADC_ATTEN_DB: u32 = 11;
pub const BATTERY_ADC_BITWIDTH: u32 = 12;

/// Two measured (raw reading, battery volts) pairs used for linear interpolation.
pub const BATTERY_CAL_LOW: (i32, f32) = (1785, 3.00);
pub const BATTERY_CAL_HIGH: (i32, f32) = (2520, 4.20);

pub const LIPO_EMPTY_V: f32 = 3.3;
pub const LIPO_FULL_V: f32 = 4.2;

/// Runtime carrier of the wheel geometry the motion tracker works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pub step_length_km: f32,
    pub min_step_duration_ms: u32,
}

impl MotionConfig {
    /// Derive the bounce filter interval from a step length and the fastest
    /// speed the bike can plausibly reach.
    pub fn from_geometry(step_length_mm: f32, max_speed_kmh: f32) -> Self {
        // mm / (km/h) * 3.6 == ms
        let min_step_duration_ms = if max_speed_kmh > 0.0 {
            (step_length_mm * 3.6 / max_speed_kmh) as u32
        } else {
            0
        };
        Self {
            step_length_km: step_length_mm / 1_000_000.0,
            min_step_duration_ms,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            step_length_km: STEP_LENGTH_KM,
            min_step_duration_ms: MIN_STEP_DURATION_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_window_is_covered_by_the_buffer() {
        assert_eq!(HISTORY_STEP.as_secs() * HISTORY_LEN as u64, HISTORY_WINDOW.as_secs());
    }

    #[test]
    fn min_step_duration_matches_geometry() {
        let derived = MotionConfig::from_geometry(STEP_LENGTH_MM, MAX_PLAUSIBLE_SPEED_KMH as f32);
        assert_eq!(derived.min_step_duration_ms, MIN_STEP_DURATION_MS);
        assert_eq!(MotionConfig::default().min_step_duration_ms, MIN_STEP_DURATION_MS);
    }

    #[test]
    fn chart_fits_below_text_lines() {
        assert_eq!(CHART_Y + CHART_HEIGHT, SCREEN_HEIGHT);
        assert_eq!(CHART_WIDTH as usize, HISTORY_LEN);
    }
}
