//! GATT server for the HID-over-GATT mouse profile.
//!
//! Registers three services with the SoftDevice:
//!
//! 1. **HID** (0x1812) - information, report map, control point, protocol
//!    mode and the mouse input report with its Report Reference descriptor.
//! 2. **Battery** (0x180F) - fixed level.
//! 3. **Device Information** (0x180A) - manufacturer name.
//!
//! HID attributes require an encrypted link; hosts pair (Just Works) before
//! reading the report map.

use defmt::{debug, info};
use gatinho::config;
use gatinho::hid::{
    notifications_enabled, MouseReport, HID_INFORMATION, MOUSE_INPUT_REFERENCE,
    MOUSE_REPORT_DESCRIPTOR, MOUSE_REPORT_SIZE, PROTOCOL_MODE_REPORT,
};
use gatinho::{BleError, Error};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::Softdevice;

const HID_SERVICE: Uuid = Uuid::new_16(0x1812);
const HID_INFO: Uuid = Uuid::new_16(0x2a4a);
const HID_REPORT_MAP: Uuid = Uuid::new_16(0x2a4b);
const HID_CONTROL_POINT: Uuid = Uuid::new_16(0x2a4c);
const HID_REPORT: Uuid = Uuid::new_16(0x2a4d);
const HID_PROTOCOL_MODE: Uuid = Uuid::new_16(0x2a4e);
const REPORT_REFERENCE: Uuid = Uuid::new_16(0x2908);

const BATTERY_SERVICE: Uuid = Uuid::new_16(0x180f);
const BATTERY_LEVEL: Uuid = Uuid::new_16(0x2a19);

const DEVICE_INFORMATION: Uuid = Uuid::new_16(0x180a);
const MANUFACTURER_NAME: Uuid = Uuid::new_16(0x2a29);

/// HID Control Point values.
const CONTROL_SUSPEND: u8 = 0x00;

/// Host writes the server reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum ServerEvent {
    /// CCCD of the input report written; `true` when notifications are on.
    InputNotifications(bool),
    /// HID Control Point: `true` on suspend, `false` on exit suspend.
    Suspend(bool),
    /// Protocol Mode written (0 = boot, 1 = report).
    ProtocolMode(u8),
}

/// Attribute handles of the registered services.
pub struct MouseServer {
    input_report: u16,
    input_cccd: u16,
    control_point: u16,
    protocol_mode: u16,
}

impl MouseServer {
    /// Register all services. Must run before the SoftDevice task starts.
    pub fn new(sd: &mut Softdevice) -> Result<Self, Error> {
        let server = Self::register(sd).map_err(|_| BleError::RegisterFailed)?;
        info!("GATT services registered");
        Ok(server)
    }

    fn register(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut hid = ServiceBuilder::new(sd, HID_SERVICE)?;

        hid.add_characteristic(
            HID_INFO,
            Attribute::new(HID_INFORMATION).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        hid.add_characteristic(
            HID_REPORT_MAP,
            Attribute::new(MOUSE_REPORT_DESCRIPTOR).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        let control_point = hid
            .add_characteristic(
                HID_CONTROL_POINT,
                Attribute::new([0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build();

        let protocol_mode = hid
            .add_characteristic(
                HID_PROTOCOL_MODE,
                Attribute::new([PROTOCOL_MODE_REPORT]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        let mut input = hid.add_characteristic(
            HID_REPORT,
            Attribute::new([0u8; MOUSE_REPORT_SIZE]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().notify()),
        )?;
        input.add_descriptor(
            REPORT_REFERENCE,
            Attribute::new(MOUSE_INPUT_REFERENCE).security(SecurityMode::JustWorks),
        )?;
        let input = input.build();

        hid.build();

        let mut battery = ServiceBuilder::new(sd, BATTERY_SERVICE)?;
        battery
            .add_characteristic(
                BATTERY_LEVEL,
                Attribute::new([config::BLE_BATTERY_LEVEL]),
                Metadata::new(Properties::new().read()),
            )?
            .build();
        battery.build();

        let mut info = ServiceBuilder::new(sd, DEVICE_INFORMATION)?;
        info.add_characteristic(
            MANUFACTURER_NAME,
            Attribute::new(config::BLE_MANUFACTURER.as_bytes()),
            Metadata::new(Properties::new().read()),
        )?
        .build();
        info.build();

        Ok(Self {
            input_report: input.value_handle,
            input_cccd: input.cccd_handle,
            control_point: control_point.value_handle,
            protocol_mode: protocol_mode.value_handle,
        })
    }

    /// Notify one mouse input report to the host.
    pub fn send(&self, conn: &Connection, report: &MouseReport) -> Result<(), Error> {
        gatt_server::notify_value(conn, self.input_report, &report.to_bytes())
            .map_err(|_| Error::Notify)
    }
}

impl gatt_server::Server for MouseServer {
    type Event = ServerEvent;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        let first = *data.first()?;
        debug!("GATT write handle={} value={}", handle, first);

        if handle == self.input_cccd {
            Some(ServerEvent::InputNotifications(notifications_enabled(data)))
        } else if handle == self.control_point {
            Some(ServerEvent::Suspend(first == CONTROL_SUSPEND))
        } else if handle == self.protocol_mode {
            Some(ServerEvent::ProtocolMode(first))
        } else {
            None
        }
    }
}
