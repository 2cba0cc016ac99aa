//! Connection watchdog - forces a full restart after a long disconnection.
//!
//! Some hosts leave the peripheral advertising but never finish connecting.
//! Rather than retrying inside the BLE stack, the firmware resets the chip
//! and lets advertising start from a clean boot.

use crate::config::RESTART_TIMEOUT_MS;

/// Request to blank the display and reset the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RestartSignal {
    /// How long the link had been down when the timeout fired (ms).
    pub disconnected_for_ms: u64,
}

/// Tracks how long the transport has been continuously disconnected.
#[derive(Clone, Debug)]
pub struct ConnectionWatchdog {
    timeout_ms: u64,
    disconnected_since: Option<u64>,
}

impl Default for ConnectionWatchdog {
    fn default() -> Self {
        Self::new(RESTART_TIMEOUT_MS)
    }
}

impl ConnectionWatchdog {
    pub const fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            disconnected_since: None,
        }
    }

    /// Start of the current disconnection window, if any.
    pub fn disconnected_since(&self) -> Option<u64> {
        self.disconnected_since
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Observe the link once. Call at least once per control-loop tick.
    ///
    /// A single connected observation clears the window; the next
    /// disconnection starts counting afresh.
    pub fn tick(&mut self, now: u64, connected: bool) -> Option<RestartSignal> {
        if connected {
            self.disconnected_since = None;
            return None;
        }

        match self.disconnected_since {
            None => {
                self.disconnected_since = Some(now);
                None
            }
            Some(since) => {
                let elapsed = now.saturating_sub(since);
                (elapsed > self.timeout_ms).then_some(RestartSignal {
                    disconnected_for_ms: elapsed,
                })
            }
        }
    }
}
