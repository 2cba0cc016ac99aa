//! Cooperative control loop.
//!
//! One [`Jiggler::tick`] per loop iteration, in this order:
//!
//! 1. connection watchdog (never skipped, even when a frame is due)
//! 2. motion model, forwarding any delta to the transport
//! 3. status badge, repainted on link changes only
//! 4. animation, at most one frame when its delay has elapsed
//!
//! The transport link state is sampled once per tick and shared by all
//! four steps.

use crate::config::{FRAME_DELAY_MS, RESTART_TIMEOUT_MS};
use crate::motion::{MotionConfig, MotionEngine, PointerDelta};
use crate::random::RandomSource;
use crate::ui::animation::{AnimationPlayer, DrawTargetSink, FrameDecoder, FramePoll, RowBlitter};
use crate::ui::badge::{draw_badge, BadgeStyle, StatusBadge};
use crate::watchdog::{ConnectionWatchdog, RestartSignal};
use embedded_graphics::prelude::*;

/// Wireless HID link as seen by the control loop.
pub trait Transport {
    fn is_connected(&self) -> bool;

    /// Queue a relative pointer report.
    fn move_pointer(&mut self, delta: PointerDelta);
}

/// Tunables for the whole loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JigglerConfig {
    pub motion: MotionConfig,
    pub restart_timeout_ms: u64,
    pub frame_delay_ms: u64,
}

impl Default for JigglerConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            restart_timeout_ms: RESTART_TIMEOUT_MS,
            frame_delay_ms: FRAME_DELAY_MS,
        }
    }
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub connected: bool,
    pub moved: Option<PointerDelta>,
    pub badge_redrawn: bool,
    pub frame: FramePoll,
}

impl TickReport {
    /// Whether a buffered display must be flushed.
    pub fn needs_flush(&self) -> bool {
        self.badge_redrawn || self.frame.drew()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    Continue(TickReport),
    /// Blank the display and reset the device. Nothing else ran this tick.
    Restart(RestartSignal),
}

/// Motion model, watchdog and display state of the device.
pub struct Jiggler<R, C> {
    motion: MotionEngine,
    watchdog: ConnectionWatchdog,
    badge: StatusBadge,
    badge_style: BadgeStyle<C>,
    player: AnimationPlayer,
    rng: R,
}

impl<R, C> Jiggler<R, C>
where
    R: RandomSource,
    C: PixelColor,
{
    pub fn new(
        config: JigglerConfig,
        rng: R,
        badge_style: BadgeStyle<C>,
        blitter: RowBlitter,
    ) -> Self {
        Self {
            motion: MotionEngine::new(config.motion),
            watchdog: ConnectionWatchdog::new(config.restart_timeout_ms),
            badge: StatusBadge::new(),
            badge_style,
            player: AnimationPlayer::with_frame_delay(blitter, config.frame_delay_ms),
            rng,
        }
    }

    pub fn motion(&self) -> &MotionEngine {
        &self.motion
    }

    pub fn watchdog(&self) -> &ConnectionWatchdog {
        &self.watchdog
    }

    /// Boot-time screen: the disconnected badge, before the link exists.
    pub fn boot<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = C>,
    {
        draw_badge(display, false, &self.badge_style)
    }

    /// Run one control-loop iteration at `now` (ms).
    ///
    /// Display errors are returned after the watchdog and motion steps have
    /// already run, so a flaky bus never stalls the pointer or the restart.
    pub fn tick<T, D, F>(
        &mut self,
        now: u64,
        transport: &mut T,
        display: &mut D,
        decoder: &mut F,
    ) -> Result<TickOutcome, D::Error>
    where
        T: Transport + ?Sized,
        D: DrawTarget<Color = C>,
        F: FrameDecoder<C> + ?Sized,
    {
        let connected = transport.is_connected();

        if let Some(signal) = self.watchdog.tick(now, connected) {
            return Ok(TickOutcome::Restart(signal));
        }

        let moved = self.motion.advance(now, connected, &mut self.rng);
        if let Some(delta) = moved {
            transport.move_pointer(delta);
        }

        let badge_redrawn = self.badge.update(display, connected, &self.badge_style)?;
        let frame = self
            .player
            .poll(now, decoder, &mut DrawTargetSink(display))?;

        Ok(TickOutcome::Continue(TickReport {
            connected,
            moved,
            badge_redrawn,
            frame,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::animation::centered_offset;
    use crate::ui::sprite::{StaticAnimation, PAW_TAP_FRAMES};
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::pixelcolor::BinaryColor;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    static PALETTE: [BinaryColor; 2] = [BinaryColor::Off, BinaryColor::On];

    struct Link {
        connected: bool,
        sent: usize,
    }

    impl Transport for Link {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn move_pointer(&mut self, _delta: PointerDelta) {
            self.sent += 1;
        }
    }

    fn fixture() -> (
        Jiggler<SmallRng, BinaryColor>,
        MockDisplay<BinaryColor>,
        StaticAnimation<BinaryColor>,
    ) {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        let anim = StaticAnimation::new(Size::new(48, 20), &PAW_TAP_FRAMES, &PALETTE);
        let offset = centered_offset(display.size(), anim.canvas_size());
        let app = Jiggler::new(
            JigglerConfig::default(),
            SmallRng::seed_from_u64(11),
            BadgeStyle::monochrome(),
            RowBlitter::new(offset, display.size().width),
        );
        (app, display, anim)
    }

    #[test]
    fn disconnected_tick_draws_but_never_moves() {
        let (mut app, mut display, mut anim) = fixture();
        let mut link = Link {
            connected: false,
            sent: 0,
        };

        for now in (0..1_000).step_by(2) {
            match app.tick(now, &mut link, &mut display, &mut anim).unwrap() {
                TickOutcome::Continue(report) => assert_eq!(report.moved, None),
                TickOutcome::Restart(_) => panic!("restart before timeout"),
            }
        }
        assert_eq!(link.sent, 0);
    }

    #[test]
    fn watchdog_follows_link_and_configured_timeout() {
        let (mut app, mut display, mut anim) = fixture();
        let mut link = Link {
            connected: false,
            sent: 0,
        };
        assert_eq!(app.watchdog().timeout_ms(), RESTART_TIMEOUT_MS);
        assert_eq!(app.watchdog().disconnected_since(), None);

        app.tick(0, &mut link, &mut display, &mut anim).unwrap();
        app.tick(500, &mut link, &mut display, &mut anim).unwrap();
        assert_eq!(app.watchdog().disconnected_since(), Some(0));

        link.connected = true;
        app.tick(502, &mut link, &mut display, &mut anim).unwrap();
        assert_eq!(app.watchdog().disconnected_since(), None);
    }

    #[test]
    fn restart_short_circuits_the_tick() {
        let (mut app, mut display, mut anim) = fixture();
        let mut link = Link {
            connected: false,
            sent: 0,
        };

        app.tick(0, &mut link, &mut display, &mut anim).unwrap();
        let outcome = app
            .tick(RESTART_TIMEOUT_MS + 1, &mut link, &mut display, &mut anim)
            .unwrap();

        assert_eq!(
            outcome,
            TickOutcome::Restart(RestartSignal {
                disconnected_for_ms: RESTART_TIMEOUT_MS + 1
            })
        );
    }

    #[test]
    fn first_tick_paints_badge_and_first_frame() {
        let (mut app, mut display, mut anim) = fixture();
        let mut link = Link {
            connected: true,
            sent: 0,
        };

        let TickOutcome::Continue(report) =
            app.tick(0, &mut link, &mut display, &mut anim).unwrap()
        else {
            panic!("unexpected restart");
        };

        assert!(report.badge_redrawn);
        assert_eq!(report.frame, FramePoll::Drawn);
        assert!(report.needs_flush());
    }

    #[test]
    fn blitter_offset_centres_asset() {
        let (app, _, _) = fixture();
        assert_eq!(app.player.blitter(), &RowBlitter::new(Point::new(8, 22), 64));
    }
}
