//! Synthetic human pointer motion.
//!
//! The engine alternates between two phases:
//!
//! - **Dwell**: the hand rests. Nothing happens until the dwell deadline
//!   passes, then a new target is picked around the virtual origin.
//! - **Drift**: the pointer chases the target with a velocity proportional
//!   to the remaining distance (so it decelerates on approach), plus a little
//!   uniform tremor while still far away.
//!
//! Velocity is continuous but HID reports carry whole counts, so every
//! velocity step is also accumulated into a residue; the integer part of the
//! residue is emitted and the fraction carries forward. Over a long run the
//! emitted counts never lose distance to rounding.

use crate::config;
use crate::random::RandomSource;

/// Tunables of the motion model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Largest target distance from the origin (counts).
    pub max_move_range: f32,
    /// Fraction of the remaining distance covered per drift tick.
    pub speed_factor: f32,
    /// Dwell duration bounds (ms).
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    /// Tremor is only added while either axis is further than this.
    pub tremor_threshold: f32,
    /// Peak tremor per velocity component (counts per tick).
    pub tremor_amplitude: f32,
    /// Drift ends once both axes are closer than this.
    pub convergence_epsilon: f32,
    /// Pacing timer bounds armed when a drift starts (ms).
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_move_range: config::MAX_MOVE_RANGE,
            speed_factor: config::MOUSE_SPEED_FACTOR,
            min_wait_ms: config::MIN_WAIT_TIME_MS,
            max_wait_ms: config::MAX_WAIT_TIME_MS,
            tremor_threshold: config::TREMOR_THRESHOLD,
            tremor_amplitude: config::TREMOR_AMPLITUDE,
            convergence_epsilon: config::CONVERGENCE_EPSILON,
            pacing_min_ms: config::PACING_MIN_MS,
            pacing_max_ms: config::PACING_MAX_MS,
        }
    }
}

/// Integer pointer displacement for one HID report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerDelta {
    pub dx: i32,
    pub dy: i32,
}

impl PointerDelta {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Physics state of the virtual hand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionState {
    /// Accumulated virtual position. Never reset.
    pub current_x: f32,
    pub current_y: f32,
    /// Drift destination, anchored at the virtual origin.
    pub target_x: f32,
    pub target_y: f32,
    /// Velocity applied on the last drift tick.
    pub velocity_x: f32,
    pub velocity_y: f32,
    /// Fractional counts not yet emitted. Always in (-1, 1).
    pub residue_x: f32,
    pub residue_y: f32,
    /// `false` while dwelling, `true` while drifting.
    pub is_moving: bool,
    /// Dwell deadline, or the pacing timer while drifting (ms).
    ///
    /// The drift phase arms this but does not consult it yet; it is the
    /// hook for jittering the report cadence.
    pub next_action_time: u64,
}

/// Dwell/drift state machine producing human-looking pointer deltas.
#[derive(Clone, Debug)]
pub struct MotionEngine {
    config: MotionConfig,
    state: MotionState,
}

impl Default for MotionEngine {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

impl MotionEngine {
    /// Create an engine at rest at the origin, ready to drift on the first
    /// connected tick.
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: MotionState::default(),
        }
    }

    /// Create an engine resuming from an explicit state.
    pub fn with_state(config: MotionConfig, state: MotionState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Advance the model by one control-loop tick.
    ///
    /// Returns the delta to send, if any. Nothing is mutated while the
    /// transport is disconnected.
    pub fn advance<R>(&mut self, now: u64, connected: bool, rng: &mut R) -> Option<PointerDelta>
    where
        R: RandomSource + ?Sized,
    {
        if !connected {
            return None;
        }

        if self.state.is_moving {
            self.drift(now, rng)
        } else {
            self.dwell(now, rng);
            None
        }
    }

    fn dwell<R>(&mut self, now: u64, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        if now <= self.state.next_action_time {
            return;
        }

        let angle = rng.random(0, 628) as f32 / 100.0;
        let distance = pick_distance(self.config.max_move_range, rng);

        self.state.target_x = libm::cosf(angle) * distance;
        self.state.target_y = libm::sinf(angle) * distance;
        self.state.is_moving = true;
        self.state.next_action_time =
            now + draw_ms(rng, self.config.pacing_min_ms, self.config.pacing_max_ms);
    }

    fn drift<R>(&mut self, now: u64, rng: &mut R) -> Option<PointerDelta>
    where
        R: RandomSource + ?Sized,
    {
        let cfg = &self.config;
        let s = &mut self.state;

        let dx = s.target_x - s.current_x;
        let dy = s.target_y - s.current_y;

        s.velocity_x = dx * cfg.speed_factor;
        s.velocity_y = dy * cfg.speed_factor;

        if libm::fabsf(dx) > cfg.tremor_threshold || libm::fabsf(dy) > cfg.tremor_threshold {
            s.velocity_x += tremor(cfg.tremor_amplitude, rng);
            s.velocity_y += tremor(cfg.tremor_amplitude, rng);
        }

        s.current_x += s.velocity_x;
        s.current_y += s.velocity_y;

        s.residue_x += s.velocity_x;
        s.residue_y += s.velocity_y;

        // `as` truncates toward zero, keeping the residue inside (-1, 1).
        let delta = PointerDelta::new(s.residue_x as i32, s.residue_y as i32);
        s.residue_x -= delta.dx as f32;
        s.residue_y -= delta.dy as f32;

        if libm::fabsf(dx) < cfg.convergence_epsilon && libm::fabsf(dy) < cfg.convergence_epsilon
        {
            s.is_moving = false;
            s.next_action_time = now + draw_ms(rng, cfg.min_wait_ms, cfg.max_wait_ms);
        }

        (!delta.is_zero()).then_some(delta)
    }
}

/// Radial target distance: mean of two uniform draws, scaled to the range.
///
/// Peaks at half the range instead of spreading flat over it.
pub fn pick_distance<R>(max_move_range: f32, rng: &mut R) -> f32
where
    R: RandomSource + ?Sized,
{
    let a = rng.random(1, 100);
    let b = rng.random(1, 100);
    (a + b) as f32 / 200.0 * max_move_range
}

/// Uniform tremor in `[-amplitude, amplitude]`, in 21 steps.
fn tremor<R>(amplitude: f32, rng: &mut R) -> f32
where
    R: RandomSource + ?Sized,
{
    rng.random(-10, 11) as f32 / 10.0 * amplitude
}

fn draw_ms<R>(rng: &mut R, lo: u64, hi: u64) -> u64
where
    R: RandomSource + ?Sized,
{
    let lo = lo.min(i32::MAX as u64) as i32;
    let hi = hi.min(i32::MAX as u64) as i32;
    rng.random(lo, hi).max(0) as u64
}
