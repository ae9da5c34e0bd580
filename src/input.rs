// Cyclometer - Button Edge Decoder
//
// Debounced press / long-press / release detection for one button. The
// decoder is fed the raw level and a millisecond timestamp on every poll, so
// the same logic serves the wake button and the wheel sensor.

use crate::events::ButtonEvent;

pub struct ButtonDecoder {
    debounce_ms: u64,
    long_press_ms: u64,

    // Debounce state
    last_raw: bool,
    last_change_ms: u64,

    // Press tracking
    button_down: bool,
    press_start_ms: u64,
    long_reported: bool,
}

impl ButtonDecoder {
    pub fn new(debounce_ms: u64, long_press_ms: u64) -> Self {
        Self {
            debounce_ms,
            long_press_ms,
            last_raw: false,
            last_change_ms: 0,
            button_down: false,
            press_start_ms: 0,
            long_reported: false,
        }
    }

    /// `pressed` is the raw (undebounced) level, already converted from the
    /// pin's active level.
    pub fn update(&mut self, pressed: bool, now_ms: u64) -> Option<ButtonEvent> {
        // ---- debounce filter ----
        if pressed != self.last_raw {
            self.last_raw = pressed;
            self.last_change_ms = now_ms;
        }
        if now_ms.saturating_sub(self.last_change_ms) < self.debounce_ms {
            return None;
        }

        // ---- pressed edge ----
        if pressed && !self.button_down {
            self.button_down = true;
            self.press_start_ms = self.last_change_ms;
            self.long_reported = false;
            return Some(ButtonEvent::Pressed);
        }

        // ---- released edge ----
        if !pressed && self.button_down {
            self.button_down = false;
            return Some(ButtonEvent::Released);
        }

        // ---- long hold ----
        if self.button_down
            && !self.long_reported
            && now_ms.saturating_sub(self.press_start_ms) >= self.long_press_ms
        {
            self.long_reported = true;
            return Some(ButtonEvent::PressedLong);
        }

        None
    }

    /// Timestamp of the debounced press edge currently held (or last held).
    pub fn press_start_ms(&self) -> u64 {
        self.press_start_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &mut ButtonDecoder, level: bool, from: u64, to: u64) -> Vec<(u64, ButtonEvent)> {
        (from..to)
            .filter_map(|t| decoder.update(level, t).map(|e| (t, e)))
            .collect()
    }

    #[test]
    fn bounces_shorter_than_window_are_ignored() {
        let mut decoder = ButtonDecoder::new(10, 1000);
        let mut events = Vec::new();
        for t in 0..30 {
            // toggles every 3 ms
            if let Some(e) = decoder.update((t / 3) % 2 == 0, t) {
                events.push(e);
            }
        }
        assert!(events.is_empty());
    }

    #[test]
    fn short_press_yields_press_then_release() {
        let mut decoder = ButtonDecoder::new(10, 1000);
        let down = feed(&mut decoder, true, 100, 200);
        assert_eq!(down, vec![(110, ButtonEvent::Pressed)]);
        assert_eq!(decoder.press_start_ms(), 100);

        let up = feed(&mut decoder, false, 200, 300);
        assert_eq!(up, vec![(210, ButtonEvent::Released)]);
    }

    #[test]
    fn long_hold_reports_once() {
        let mut decoder = ButtonDecoder::new(10, 1000);
        let events = feed(&mut decoder, true, 0, 3000);
        assert_eq!(
            events,
            vec![(10, ButtonEvent::Pressed), (1000, ButtonEvent::PressedLong)]
        );
        let events = feed(&mut decoder, false, 3000, 3100);
        assert_eq!(events, vec![(3010, ButtonEvent::Released)]);
    }
}
