//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **HID Service** - HID-over-GATT mouse plus the Battery and Device
//!    Information services hosts expect from a real mouse.
//! 2. **Advertiser** - advertises as a mouse, accepts Just-Works pairing and
//!    serves one host at a time, re-advertising after every disconnect.
//!
//! The control loop talks to the BLE task through two shared objects only:
//! the [`CONNECTED`] flag and the [`MOUSE_REPORTS`] queue.

pub mod advertiser;
pub mod hid_service;

use core::mem;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::warn;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use gatinho::config;
use gatinho::hid::MouseReport;
use gatinho::{PointerDelta, Transport};
use nrf_softdevice::raw;

/// `true` while a host is connected.
pub static CONNECTED: AtomicBool = AtomicBool::new(false);

/// Reports waiting to be notified to the connected host.
pub static MOUSE_REPORTS: Channel<CriticalSectionRawMutex, MouseReport, { config::MOUSE_REPORT_QUEUE }> =
    Channel::new();

/// [`Transport`] backed by the BLE task.
pub struct BleMouse {
    dropped: u32,
}

impl BleMouse {
    pub const fn new() -> Self {
        Self { dropped: 0 }
    }

    /// Reports dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Transport for BleMouse {
    fn is_connected(&self) -> bool {
        CONNECTED.load(Ordering::Acquire)
    }

    fn move_pointer(&mut self, delta: PointerDelta) {
        if MOUSE_REPORTS.try_send(MouseReport::from_delta(delta)).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("mouse report queue full, dropped {}", self.dropped);
        }
    }
}

/// SoftDevice configuration: one peripheral link, GAP name set to the
/// advertised mouse name.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::BLE_DEVICE_NAME.as_ptr() as _,
            current_len: config::BLE_DEVICE_NAME.len() as u16,
            max_len: config::BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Set the GAP appearance characteristic to "mouse".
pub fn set_appearance() -> Result<(), gatinho::BleError> {
    let ret = unsafe { raw::sd_ble_gap_appearance_set(config::BLE_APPEARANCE_MOUSE) };
    match ret {
        raw::NRF_SUCCESS => Ok(()),
        code => Err(gatinho::BleError::Raw(code)),
    }
}

/// Publish the preferred connection parameters so the host picks a short
/// interval suited to a pointing device.
pub fn set_preferred_conn_params() -> Result<(), gatinho::BleError> {
    let params = raw::ble_gap_conn_params_t {
        min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
        max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
        slave_latency: config::BLE_SLAVE_LATENCY,
        conn_sup_timeout: config::BLE_SUP_TIMEOUT,
    };
    let ret = unsafe { raw::sd_ble_gap_ppcp_set(&params) };
    match ret {
        raw::NRF_SUCCESS => Ok(()),
        code => Err(gatinho::BleError::Raw(code)),
    }
}
