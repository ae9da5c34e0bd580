// Cyclometer - System Events
//
// Every asynchronous source (button poll thread, idle timer, history timer)
// funnels into a single queue of `DeviceEvent`s drained by the event loop.

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    /// User button: short press wakes, long press opens the service view.
    Wake,
    /// Wheel rotation sensor (reed switch), one press per magnet pass.
    Sensor,
}

/// Debounced button transitions as delivered by the input driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    PressedLong,
    Released,
}

// ---------------------------------------------------------------------------
// Device Events - sent to the event loop via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A debounced button transition, stamped where it was observed.
    Button {
        id: ButtonId,
        event: ButtonEvent,
        at_ms: u64,
    },
    /// The idle timer armed with this generation token expired.
    IdleTimeout(u32),
    /// Periodic history shift.
    HistoryTick,
}

impl DeviceEvent {
    pub fn rotation(at_ms: u64) -> Self {
        Self::Button {
            id: ButtonId::Sensor,
            event: ButtonEvent::Pressed,
            at_ms,
        }
    }

    pub fn wake(event: ButtonEvent, at_ms: u64) -> Self {
        Self::Button {
            id: ButtonId::Wake,
            event,
            at_ms,
        }
    }
}
