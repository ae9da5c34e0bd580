// Cyclometer - Button Task
//
// Polls the wake button and the wheel sensor, decodes debounced edges and
// posts them to the event loop. Rotation timestamps are taken at the press
// edge so queueing delay never skews the speed.

use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver};

use cyclometer::config::*;
use cyclometer::input::ButtonDecoder;
use cyclometer::{ButtonEvent, ButtonId, DeviceEvent};

pub fn button_task(
    wake_pin: PinDriver<'static, AnyIOPin, Input>,
    sensor_pin: PinDriver<'static, AnyIOPin, Input>,
    events: SyncSender<DeviceEvent>,
) {
    log::info!("Button task started");

    let mut wake = ButtonDecoder::new(WAKE_DEBOUNCE_MS, LONG_PRESS_MS);
    let mut sensor = ButtonDecoder::new(SENSOR_DEBOUNCE_MS, LONG_PRESS_MS);
    let poll_interval = Duration::from_millis(BUTTON_POLL_INTERVAL_MS);

    loop {
        let now = crate::now_ms();

        // Both inputs are active LOW (pull-up).
        let polled = [
            (ButtonId::Wake, wake.update(wake_pin.is_low(), now), wake.press_start_ms()),
            (ButtonId::Sensor, sensor.update(sensor_pin.is_low(), now), sensor.press_start_ms()),
        ];

        for (id, event, press_ms) in polled {
            let Some(event) = event else { continue };
            let at_ms = if event == ButtonEvent::Pressed { press_ms } else { now };

            match events.try_send(DeviceEvent::Button { id, event, at_ms }) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    log::warn!("Event queue full - dropped {:?}", dropped);
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::warn!("Event channel closed - exiting button task");
                    return;
                }
            }
        }

        thread::sleep(poll_interval);
    }
}
