//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, motion tuning, display geometry and BLE identity
//! strings live here so they can be tuned in one place.

// Control loop

/// Fixed pacing sleep between control-loop ticks (ms).
pub const TICK_MS: u64 = 2;

/// Delay between animation frames (ms).
pub const FRAME_DELAY_MS: u64 = 100;

/// Pause between blanking the display and resetting the chip (ms).
pub const RESTART_BLANK_MS: u64 = 100;

// Connection watchdog

/// Maximum time the link may stay down before a full restart (ms).
///
/// A restart re-runs advertising from scratch, which unsticks hosts that
/// keep the device connectable but never complete a connection.
pub const RESTART_TIMEOUT_MS: u64 = 30_000;

// Motion model

/// Largest radial offset of a drift target from the virtual origin (counts).
pub const MAX_MOVE_RANGE: f32 = 15.0;

/// Fraction of the remaining distance covered per drift tick.
pub const MOUSE_SPEED_FACTOR: f32 = 0.05;

/// Dwell duration bounds between two drifts (ms).
pub const MIN_WAIT_TIME_MS: u64 = 2_000;
pub const MAX_WAIT_TIME_MS: u64 = 15_000;

/// Remaining distance above which hand tremor is added (counts).
pub const TREMOR_THRESHOLD: f32 = 2.0;

/// Peak tremor added to each velocity component per tick (counts).
pub const TREMOR_AMPLITUDE: f32 = 0.2;

/// Per-axis distance under which a drift is considered finished (counts).
pub const CONVERGENCE_EPSILON: f32 = 0.5;

/// Bounds of the pacing timer armed when a drift starts (ms).
pub const PACING_MIN_MS: u64 = 50;
pub const PACING_MAX_MS: u64 = 200;

// Display
//
// SSD1306 128×64 on TWIM0:
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27

/// Bundled animation size (pixels). Centred on the panel at boot.
pub const ANIMATION_WIDTH: u32 = 48;
pub const ANIMATION_HEIGHT: u32 = 20;

/// Widest row the animation blitter will batch (pixels).
pub const MAX_ROW_PIXELS: usize = 320;

/// Status badge geometry (pixels).
pub const BADGE_SIZE: u32 = 26;
pub const BADGE_CORNER_RADIUS: u32 = 8;
pub const BADGE_MARGIN: u32 = 10;

// BLE identity

/// Advertised GAP name. Hosts list the device under this name.
pub const BLE_DEVICE_NAME: &str = "Logitech MX Master 3";

/// Device Information Service manufacturer string.
pub const BLE_MANUFACTURER: &str = "Logitech";

/// Battery level reported by the Battery Service (percent).
pub const BLE_BATTERY_LEVEL: u8 = 100;

/// GAP appearance: HID mouse.
pub const BLE_APPEARANCE_MOUSE: u16 = 0x03C2;

/// BLE connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms, which HID hosts usually accept.
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// Depth of the queue between the control loop and the BLE notifier.
pub const MOUSE_REPORT_QUEUE: usize = 8;

/// First pause after a failed advertising attempt (ms). Doubles per
/// consecutive failure up to [`ADVERTISE_RETRY_MAX_MS`].
pub const ADVERTISE_RETRY_MS: u64 = 250;
pub const ADVERTISE_RETRY_MAX_MS: u64 = 4_000;

/// Pause before the next advertising attempt after `failures` consecutive
/// failed ones (ms). Never zero, so the BLE task always yields.
pub fn advertise_backoff_ms(failures: u32) -> u64 {
    let shift = failures.saturating_sub(1).min(16);
    (ADVERTISE_RETRY_MS << shift).clamp(ADVERTISE_RETRY_MS, ADVERTISE_RETRY_MAX_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_params_are_within_ble_limits() {
        assert!((6..=3200).contains(&BLE_CONN_INTERVAL_MIN));
        assert!((6..=3200).contains(&BLE_CONN_INTERVAL_MAX));
        assert!(BLE_CONN_INTERVAL_MIN <= BLE_CONN_INTERVAL_MAX);
        assert!(BLE_SLAVE_LATENCY <= 499);
        assert!((10..=3200).contains(&BLE_SUP_TIMEOUT));
    }

    #[test]
    fn supervision_timeout_outlasts_latency_window() {
        // timeout (10 ms units) > (1 + latency) * max interval (1.25 ms units) * 2
        let timeout_us = BLE_SUP_TIMEOUT as u32 * 10_000;
        let window_us = (1 + BLE_SLAVE_LATENCY as u32) * BLE_CONN_INTERVAL_MAX as u32 * 1_250 * 2;
        assert!(timeout_us > window_us);
    }

    #[test]
    fn advertise_backoff_grows_and_caps() {
        assert_eq!(advertise_backoff_ms(0), ADVERTISE_RETRY_MS);
        assert_eq!(advertise_backoff_ms(1), ADVERTISE_RETRY_MS);
        assert_eq!(advertise_backoff_ms(2), 2 * ADVERTISE_RETRY_MS);
        assert_eq!(advertise_backoff_ms(3), 4 * ADVERTISE_RETRY_MS);
        assert_eq!(advertise_backoff_ms(u32::MAX), ADVERTISE_RETRY_MAX_MS);
    }

    #[test]
    fn advertise_backoff_never_spins_and_leaves_room_for_watchdog() {
        for failures in 0..64 {
            let pause = advertise_backoff_ms(failures);
            assert!(pause > 0);
            assert!(pause < RESTART_TIMEOUT_MS);
        }
    }
}
