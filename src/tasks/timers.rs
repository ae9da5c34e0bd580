// Cyclometer - Timers
//
// Both timers run on the ESP timer task and only post events; the event loop
// does the work. The idle timer is one-shot and owned by the display
// controller (dropping the `EspTimer` cancels it). The history tick is
// periodic and lives as long as `main`.

use std::sync::mpsc::{SyncSender, TrySendError};
use std::time::Duration;

use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use cyclometer::config::HISTORY_STEP;
use cyclometer::{DeviceEvent, IdleScheduler};

fn post(events: &SyncSender<DeviceEvent>, event: DeviceEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(dropped)) => log::warn!("Event queue full - dropped {:?}", dropped),
        Err(TrySendError::Disconnected(_)) => log::debug!("Event loop gone, {:?} discarded", event),
    }
}

pub struct EspIdleScheduler {
    service: EspTaskTimerService,
    events: SyncSender<DeviceEvent>,
}

impl EspIdleScheduler {
    pub fn new(service: EspTaskTimerService, events: SyncSender<DeviceEvent>) -> Self {
        Self { service, events }
    }
}

impl IdleScheduler for EspIdleScheduler {
    type Handle = EspTimer<'static>;

    fn schedule(&mut self, delay: Duration, token: u32) -> anyhow::Result<EspTimer<'static>> {
        let events = self.events.clone();
        let timer = self
            .service
            .timer(move || post(&events, DeviceEvent::IdleTimeout(token)))?;
        timer.after(delay)?;
        Ok(timer)
    }
}

/// Start the periodic history shift. Keep the returned timer alive.
pub fn start_history_timer(
    service: &EspTaskTimerService,
    events: SyncSender<DeviceEvent>,
) -> anyhow::Result<EspTimer<'static>> {
    let timer = service.timer(move || post(&events, DeviceEvent::HistoryTick))?;
    timer.every(HISTORY_STEP)?;
    log::info!("History tick every {} s", HISTORY_STEP.as_secs());
    Ok(timer)
}
