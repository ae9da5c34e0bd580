// Cyclometer - Display Controller
//
// Owns the presentation state (Active / Idle / Service) and the single idle
// timer. Renders the motion view (distance, speed, 24h history) or the
// battery service view through the `Display` collaborator.
//
// Display writes are best effort: a failed write is logged and the state
// machine carries on.

use std::time::Duration;

use crate::config::*;
use crate::history::{Bitmap, HistoryBuffer};
use crate::motion::MotionTracker;
use crate::power::{AdcDriver, BatteryReading, PowerMonitor};

/// Low-level OLED operations the controller relies on.
pub trait Display {
    fn display_text(&mut self, line: u32, text: &str, invert: bool) -> anyhow::Result<()>;
    fn display_bitmap(&mut self, x: u32, y: u32, bitmap: &Bitmap, invert: bool) -> anyhow::Result<()>;
    fn clear_screen(&mut self, invert: bool) -> anyhow::Result<()>;
    fn set_contrast(&mut self, value: u8) -> anyhow::Result<()>;
    fn fade_out(&mut self) -> anyhow::Result<()>;
}

/// One-shot timer service. The returned handle owns the timer: dropping it
/// cancels the pending expiry.
pub trait IdleScheduler {
    type Handle;

    /// Arrange for `DeviceEvent::IdleTimeout(token)` to be delivered after `delay`.
    fn schedule(&mut self, delay: Duration, token: u32) -> anyhow::Result<Self::Handle>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Active,
    Idle,
    Service,
}

pub struct DisplayController<D: Display, T: IdleScheduler> {
    display: D,
    scheduler: T,
    idle_timeout: Duration,
    mode: DisplayMode,
    idle_timer: Option<T::Handle>,
    generation: u32,
}

impl<D: Display, T: IdleScheduler> DisplayController<D, T> {
    pub fn new(display: D, scheduler: T, idle_timeout: Duration) -> Self {
        Self {
            display,
            scheduler,
            idle_timeout,
            mode: DisplayMode::Active,
            idle_timer: None,
            generation: 0,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Token carried by the currently armed idle timer.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn idle_timer_armed(&self) -> bool {
        self.idle_timer.is_some()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    /// Boot into the Active view.
    pub fn start<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        log::info!("Display: boot -> Active");
        self.enter_active(motion, history);
    }

    /// Short press on the wake button.
    pub fn on_wake_press<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        log::info!("Display: {:?} -> Active (wake)", self.mode);
        self.enter_active(motion, history);
    }

    /// Long press on the wake button.
    pub fn on_wake_long_press<A: AdcDriver>(&mut self, power: &mut PowerMonitor<A>) {
        log::info!("Display: {:?} -> Service", self.mode);
        self.wake_screen();
        self.mode = DisplayMode::Service;
        self.arm_idle_timer();

        if let Some(reading) = power.read_battery_voltage() {
            self.render_service(&reading);
        }
    }

    /// An accepted rotation pulse. Keeps the screen awake while riding.
    pub fn on_rotation<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        if self.mode != DisplayMode::Active {
            return;
        }
        self.arm_idle_timer();
        self.render_motion(motion, history);
    }

    /// Idle timer expiry. Timers armed before the latest transition are stale
    /// and ignored.
    pub fn on_idle_timeout(&mut self, token: u32) {
        if token != self.generation {
            log::debug!("Display: stale idle timer {} (current {})", token, self.generation);
            return;
        }
        if self.mode == DisplayMode::Idle {
            return;
        }

        log::info!("Display: {:?} -> Idle", self.mode);
        self.mode = DisplayMode::Idle;
        self.idle_timer = None;
        let result = self.display.fade_out();
        self.report("fade out", result);
    }

    /// History shifted; refresh the history part of the motion view.
    pub fn on_history_tick<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        if self.mode == DisplayMode::Active {
            self.render_history(motion, history);
        }
    }

    fn enter_active<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        self.wake_screen();
        self.mode = DisplayMode::Active;
        self.arm_idle_timer();
        self.render_motion(motion, history);
    }

    fn wake_screen(&mut self) {
        // fade_out leaves the panel dimmed
        let result = self.display.set_contrast(ACTIVE_CONTRAST);
        self.report("contrast", result);
        let result = self.display.clear_screen(false);
        self.report("clear", result);
    }

    /// Replace the idle timer. The old handle is dropped (cancelled) before
    /// the new one is created so two expiries can never race.
    fn arm_idle_timer(&mut self) {
        self.idle_timer = None;
        self.generation = self.generation.wrapping_add(1);
        match self.scheduler.schedule(self.idle_timeout, self.generation) {
            Ok(handle) => self.idle_timer = Some(handle),
            Err(e) => log::warn!("Idle timer not armed: {:#}", e),
        }
    }

    fn render_motion<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        let result = self.display.display_text(0, &format_distance(motion.total_distance_km()), false);
        self.report("distance", result);

        let result = self.display.display_text(
            1,
            &format_speed(motion.current_speed_kmh(), motion.max_speed_kmh()),
            false,
        );
        self.report("speed", result);

        self.render_history(motion, history);
    }

    fn render_history<const N: usize>(&mut self, motion: &MotionTracker, history: &HistoryBuffer<N>) {
        let summary = history.summary();
        let text = format_window(motion.steps_to_km(summary.max), motion.steps_to_km(summary.total));
        let result = self.display.display_text(2, &text, false);
        self.report("history summary", result);

        // An emptied window still has to wipe the bars drawn before it.
        let bars = history
            .render_bars(CHART_WIDTH, CHART_HEIGHT)
            .unwrap_or_else(|| Bitmap::new(CHART_WIDTH, CHART_HEIGHT));
        let result = self.display.display_bitmap(CHART_X, CHART_Y, &bars, false);
        self.report("history chart", result);
    }

    fn render_service(&mut self, reading: &BatteryReading) {
        let result = self.display.display_text(0, &format_battery_voltage(reading.voltage), false);
        self.report("battery voltage", result);
        let result = self.display.display_text(1, &format_battery_percent(reading.percent), false);
        self.report("battery level", result);
    }

    fn report(&self, what: &str, result: anyhow::Result<()>) {
        if let Err(e) = result {
            log::warn!("Display {} failed: {:#}", what, e);
        }
    }
}

// ---------------------------------------------------------------------------
// Text lines
// ---------------------------------------------------------------------------

pub fn format_distance(km: f32) -> String {
    format!("{:.3} km", km)
}

pub fn format_speed(current_kmh: f32, max_kmh: f32) -> String {
    format!("{:.3}/{:.3} km/h", current_kmh, max_kmh)
}

/// Busiest bucket / whole 24h window, both in km.
pub fn format_window(max_km: f32, total_km: f32) -> String {
    format!("{:.3}/{:.3} 24h", max_km, total_km)
}

pub fn format_battery_voltage(volts: f32) -> String {
    format!("Bat {:.3} V", volts)
}

pub fn format_battery_percent(percent: f32) -> String {
    format!("{:.0}%", percent)
}
