// Cyclometer - Device State & Event Loop
//
// Single owner of the motion tracker, history, display controller and battery
// monitor. Button threads and timer callbacks only send `DeviceEvent`s; this
// loop applies them one at a time, so no state is shared between contexts.

use std::sync::mpsc::Receiver;

use crate::config::MotionConfig;
use crate::display::{Display, DisplayController, DisplayMode, IdleScheduler};
use crate::events::{ButtonEvent, ButtonId, DeviceEvent};
use crate::history::HistoryBuffer;
use crate::motion::{MotionTracker, RotationOutcome};
use crate::power::{AdcDriver, PowerMonitor};

pub struct DeviceState<D: Display, T: IdleScheduler, A: AdcDriver> {
    motion: MotionTracker,
    history: HistoryBuffer,
    display: DisplayController<D, T>,
    power: PowerMonitor<A>,
}

impl<D: Display, T: IdleScheduler, A: AdcDriver> DeviceState<D, T, A> {
    pub fn new(motion_config: MotionConfig, display: DisplayController<D, T>, power: PowerMonitor<A>) -> Self {
        Self {
            motion: MotionTracker::new(motion_config),
            history: HistoryBuffer::new(),
            display,
            power,
        }
    }

    /// Show the initial Active view and arm the first idle timer.
    pub fn start(&mut self) {
        self.display.start(&self.motion, &self.history);
    }

    pub fn handle(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Button {
                id: ButtonId::Sensor,
                event: ButtonEvent::Pressed,
                at_ms,
            } => {
                // Counting happens in every mode; only the Active view redraws.
                if self.motion.on_rotation(at_ms, &mut self.history) == RotationOutcome::Accepted {
                    self.display.on_rotation(&self.motion, &self.history);
                }
            }
            DeviceEvent::Button {
                id: ButtonId::Wake,
                event: ButtonEvent::Pressed,
                ..
            } => self.display.on_wake_press(&self.motion, &self.history),
            DeviceEvent::Button {
                id: ButtonId::Wake,
                event: ButtonEvent::PressedLong,
                ..
            } => self.display.on_wake_long_press(&mut self.power),
            DeviceEvent::Button { .. } => {}
            DeviceEvent::IdleTimeout(token) => self.display.on_idle_timeout(token),
            DeviceEvent::HistoryTick => {
                self.history.shift_tick();
                self.display.on_history_tick(&self.motion, &self.history);
            }
        }
    }

    /// Drain the event queue until every sender has gone away.
    pub fn run(&mut self, events: Receiver<DeviceEvent>) {
        log::info!("Event loop started");
        while let Ok(event) = events.recv() {
            self.handle(event);
        }
        log::warn!("Event channel closed - exiting event loop");
    }

    pub fn motion(&self) -> &MotionTracker {
        &self.motion
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn display(&self) -> &DisplayController<D, T> {
        &self.display
    }

    pub fn mode(&self) -> DisplayMode {
        self.display.mode()
    }
}
