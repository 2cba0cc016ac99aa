//! Advertising, pairing and the per-connection GATT loop.
//!
//! One host at a time. After a disconnect the task clears the report queue
//! and advertises again; the control loop's watchdog decides when a stuck
//! link warrants a full restart.

use core::cell::RefCell;
use core::sync::atomic::Ordering;

use crate::ble::hid_service::{MouseServer, ServerEvent};
use crate::ble::{CONNECTED, MOUSE_REPORTS};
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use gatinho::config;
use gatinho::hid::InputSubscription;
use gatinho::{BleError, Error};
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload,
    ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{
    gatt_server, peripheral, Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode,
};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

const APPEARANCE: [u8; 2] = config::BLE_APPEARANCE_MOUSE.to_le_bytes();

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(
        ServiceList::Incomplete,
        &[ServiceUuid16::HUMAN_INTERFACE_DEVICE, ServiceUuid16::BATTERY],
    )
    .raw(AdvertisementDataType::APPEARANCE, &APPEARANCE)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(config::BLE_DEVICE_NAME)
    .build();

struct PeerBond {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
}

/// Just-Works bond for the last paired host, RAM only. Pairing with a new
/// host replaces it; a restart forgets it.
struct Bonder {
    bond: RefCell<Option<PeerBond>>,
}

impl Bonder {
    fn new() -> Self {
        Self {
            bond: RefCell::new(None),
        }
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::None
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        true
    }

    fn on_bonded(
        &self,
        _conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        info!("host bonded");
        *self.bond.borrow_mut() = Some(PeerBond {
            master_id,
            key,
            peer_id,
        });
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.bond
            .borrow()
            .as_ref()
            .filter(|b| b.master_id == master_id)
            .map(|b| b.key)
    }

    fn get_peripheral_key(&self, conn: &Connection) -> Option<(MasterId, EncryptionInfo)> {
        self.bond
            .borrow()
            .as_ref()
            .filter(|b| b.peer_id.is_match(conn.peer_address()))
            .map(|b| (b.master_id, b.key))
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("BLE security mode updated: {}", mode);
    }
}

/// Advertise and serve hosts forever.
pub async fn run(sd: &'static Softdevice, server: MouseServer) -> ! {
    static BONDER: StaticCell<Bonder> = StaticCell::new();
    let bonder: &'static Bonder = BONDER.init(Bonder::new());

    let mut failures: u32 = 0;
    loop {
        let result = serve_one_host(sd, &server, bonder).await;
        CONNECTED.store(false, Ordering::Release);
        MOUSE_REPORTS.clear();

        match result {
            Ok(()) => {
                info!("host disconnected");
                failures = 0;
            }
            Err(e) => {
                // The SoftDevice can fail before the first await; always yield.
                failures = failures.saturating_add(1);
                let pause = config::advertise_backoff_ms(failures);
                warn!("BLE session failed: {}, retrying in {} ms", e, pause);
                Timer::after(Duration::from_millis(pause)).await;
            }
        }
    }
}

async fn serve_one_host(
    sd: &'static Softdevice,
    server: &MouseServer,
    bonder: &'static Bonder,
) -> Result<(), Error> {
    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data: &ADV_DATA,
        scan_data: &SCAN_DATA,
    };
    let adv_config = peripheral::Config::default();

    info!("advertising as \"{}\"", config::BLE_DEVICE_NAME);
    let conn = peripheral::advertise_pairable(sd, adv, &adv_config, bonder)
        .await
        .map_err(|_| BleError::AdvertiseFailed)?;

    info!("host connected");
    // Drop whatever the loop queued while nobody was listening.
    MOUSE_REPORTS.clear();
    CONNECTED.store(true, Ordering::Release);

    let subscription = RefCell::new(InputSubscription::new());

    let gatt = gatt_server::run(&conn, server, |event| match event {
        ServerEvent::InputNotifications(on) => {
            info!("input notifications: {}", on);
            subscription.borrow_mut().set_enabled(on);
        }
        ServerEvent::Suspend(suspended) => info!("host suspend: {}", suspended),
        ServerEvent::ProtocolMode(mode) => info!("protocol mode: {}", mode),
    });

    let notify = async {
        loop {
            let report = MOUSE_REPORTS.receive().await;
            // Nothing to send until the host subscribes to the input report.
            if !subscription.borrow().is_enabled() {
                continue;
            }
            let result = server.send(&conn, &report);
            if subscription.borrow_mut().record(result.is_ok()) {
                if let Err(e) = result {
                    warn!("notify failed: {}", e);
                }
            }
        }
    };

    match select(gatt, notify).await {
        Either::First(_) | Either::Second(_) => Ok(()),
    }
}
