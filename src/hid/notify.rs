//! Host-side subscription to the mouse input report.
//!
//! A host enables notifications by writing the input report's CCCD. Until it
//! does, reports are dropped quietly; once enabled, a run of failed notifies
//! is reported once rather than once per report.

/// Whether a CCCD value enables notifications (bit 0).
pub fn notifications_enabled(cccd: &[u8]) -> bool {
    cccd.first().is_some_and(|b| b & 0x01 != 0)
}

/// Notification state of the input report for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSubscription {
    enabled: bool,
    failing: bool,
}

impl InputSubscription {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            failing: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.failing = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the outcome of one notify. Returns `true` only for the first
    /// failure of a streak.
    pub fn record(&mut self, ok: bool) -> bool {
        let first_failure = !ok && !self.failing;
        self.failing = !ok;
        first_failure
    }
}
