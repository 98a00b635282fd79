//! "Waiting for a controller" blink on the status LED.
//!
//! While disconnected the LED is switched on once every `interval_ms` and
//! off again half an interval later.  While connected it is held off.
//! Times are wrapping `u32` milliseconds since boot.

#[derive(Debug)]
pub struct WaitingIndicator {
    interval_ms: u32,
    last_on_ms: u32,
    lit: Option<bool>,
}

impl WaitingIndicator {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_on_ms: 0,
            lit: None,
        }
    }

    /// Advance to `now_ms`.  Returns the level to write when it differs
    /// from the last one written.
    pub fn tick(&mut self, now_ms: u32, connected: bool) -> Option<bool> {
        let want = if connected {
            false
        } else {
            let elapsed = now_ms.wrapping_sub(self.last_on_ms);
            if elapsed > self.interval_ms {
                self.last_on_ms = now_ms;
                true
            } else if elapsed > self.interval_ms / 2 {
                false
            } else {
                return None;
            }
        };
        self.set(want)
    }

    /// Force the LED off, e.g. on connect.
    pub fn clear(&mut self) -> Option<bool> {
        self.set(false)
    }

    fn set(&mut self, on: bool) -> Option<bool> {
        if self.lit == Some(on) {
            None
        } else {
            self.lit = Some(on);
            Some(on)
        }
    }
}
