//! gatinho firmware - nRF52840 + SoftDevice S140 + SSD1306.
//!
//! Boot sequence:
//! 1. Embassy HAL with SoftDevice-compatible interrupt priorities.
//! 2. SoftDevice enabled, GATT services registered, BLE tasks spawned.
//! 3. OLED cleared, RNG seeded from the SoftDevice TRNG.
//! 4. Control loop: one [`Jiggler::tick`] every `TICK_MS`.

#![no_std]
#![no_main]

mod ble;
mod display;

use defmt::{error, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::{Duration, Instant, Timer};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use gatinho::config;
use gatinho::ui::animation::centered_offset;
use gatinho::ui::{BadgeStyle, FrameDecoder, RowBlitter, StaticAnimation, PAW_TAP_FRAMES};
use gatinho::{Error, Jiggler, JigglerConfig, TickOutcome};
use nrf_softdevice::Softdevice;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use {defmt_rtt as _, panic_probe as _};

use crate::ble::hid_service::MouseServer;
use crate::ble::BleMouse;

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Ink and background of the monochrome panel, indexed by the sprite cells.
static PALETTE: [BinaryColor; 2] = [BinaryColor::Off, BinaryColor::On];

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: MouseServer) -> ! {
    ble::advertiser::run(sd, server).await
}

/// Seed for the motion model. The TRNG pool can be empty right after boot.
async fn rng_seed(sd: &Softdevice) -> u64 {
    let mut bytes = [0u8; 8];
    for _ in 0..10 {
        if nrf_softdevice::random_bytes(sd, &mut bytes).is_ok() {
            return u64::from_le_bytes(bytes);
        }
        Timer::after(Duration::from_millis(10)).await;
    }
    warn!("TRNG unavailable, seeding from uptime");
    Instant::now().as_ticks()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("gatinho starting...");

    // SoftDevice reserves priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);

    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = unwrap!(MouseServer::new(sd));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));
    if let Err(e) = ble::set_appearance() {
        warn!("could not set GAP appearance: {}", e);
    }
    if let Err(e) = ble::set_preferred_conn_params() {
        warn!("could not set preferred connection parameters: {}", e);
    }

    // OLED on TWIM0 (SDA P0.26, SCL P0.27).
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut oled = display::new(i2c);
    if let Err(e) = display::start(&mut oled) {
        warn!("display init failed: {}", e);
    }

    let mut animation = StaticAnimation::new(
        Size::new(config::ANIMATION_WIDTH, config::ANIMATION_HEIGHT),
        &PAW_TAP_FRAMES,
        &PALETTE,
    );
    let panel = oled.size();
    let blitter = RowBlitter::new(
        centered_offset(panel, animation.canvas_size()),
        panel.width,
    );

    unwrap!(spawner.spawn(ble_task(sd, server)));

    let rng = SmallRng::seed_from_u64(rng_seed(sd).await);
    let mut app = Jiggler::new(
        JigglerConfig::default(),
        rng,
        BadgeStyle::monochrome(),
        blitter,
    );
    let mut mouse = BleMouse::new();

    if app
        .boot(&mut oled)
        .map_err(|_| Error::Display)
        .and_then(|()| display::flush(&mut oled))
        .is_err()
    {
        warn!("initial badge draw failed");
    }

    info!("control loop running");
    let tick = Duration::from_millis(config::TICK_MS);
    let mut was_connected = false;

    loop {
        let started = Instant::now();

        match app.tick(started.as_millis(), &mut mouse, &mut oled, &mut animation) {
            Ok(TickOutcome::Continue(report)) => {
                if report.connected != was_connected {
                    was_connected = report.connected;
                    info!("link {}", if was_connected { "up" } else { "down" });
                }
                if report.frame == gatinho::ui::FramePoll::OpenFailed {
                    warn!("animation failed to open, retrying");
                }
                if report.needs_flush() {
                    if let Err(e) = display::flush(&mut oled) {
                        warn!("display flush failed: {}", e);
                    }
                }
            }
            Ok(TickOutcome::Restart(signal)) => {
                error!(
                    "no host for {} ms, restarting",
                    signal.disconnected_for_ms
                );
                let _ = display::blank(&mut oled);
                Timer::after(Duration::from_millis(config::RESTART_BLANK_MS)).await;
                cortex_m::peripheral::SCB::sys_reset();
            }
            Err(_) => warn!("display draw failed: {}", Error::Display),
        }

        let spent = started.elapsed();
        Timer::after(tick.checked_sub(spent).unwrap_or(Duration::MIN)).await;
    }
}
