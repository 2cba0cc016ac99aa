//! Unified error type for gatinho.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! The motion model and watchdog are infallible; these errors only come
//! from the BLE stack and the display bus.

/// Top-level error type used by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    /// Registering the GATT services failed.
    GattServer,

    /// Advertising could not be started or ended with an error.
    Advertise,

    /// Sending a HID input notification failed.
    Notify,

    // Display
    /// I²C transaction to the display failed.
    Display,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Adding a service, characteristic or descriptor failed.
    RegisterFailed,
    /// Advertising timed out or was rejected.
    AdvertiseFailed,
    /// Security procedure (pairing / encryption) failed.
    SecurityFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        match e {
            BleError::AdvertiseFailed => Error::Advertise,
            BleError::RegisterFailed => Error::GattServer,
            other => Error::Ble(other),
        }
    }
}
