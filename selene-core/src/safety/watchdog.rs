//! Link watchdog
//!
//! De-energizes the motor when the host has gone quiet. Driven from the
//! serial polling path with a millisecond clock that may wrap.

/// Tracks time since the last recognized command
#[derive(Debug, Clone)]
pub struct LinkWatchdog {
    timeout_ms: u32,
    last_command_ms: u32,
    /// Fired for the current silence period
    tripped: bool,
}

impl LinkWatchdog {
    /// Create a watchdog, counting silence from `now_ms`
    pub fn new(timeout_ms: u32, now_ms: u32) -> Self {
        Self {
            timeout_ms,
            last_command_ms: now_ms,
            tripped: false,
        }
    }

    /// Record a recognized command
    pub fn command_received(&mut self, now_ms: u32) {
        self.last_command_ms = now_ms;
        self.tripped = false;
    }

    /// Check for a timeout
    ///
    /// Returns `true` once per silence period, on the first poll at or
    /// after the timeout.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if self.tripped || self.silence_ms(now_ms) < self.timeout_ms {
            return false;
        }
        debug!("link silent for {} ms", self.silence_ms(now_ms));
        self.tripped = true;
        true
    }

    /// Milliseconds since the last recognized command
    fn silence_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_command_ms)
    }

    /// Configured timeout
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
