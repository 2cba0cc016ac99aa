//! User interface subsystem - status badge + animated image.
//!
//! Everything here draws through `embedded-graphics`, so the same code runs
//! against the SSD1306 on the board and against `MockDisplay` in tests.
//!
//! ## Components
//!
//! - **Badge**: edge-triggered Bluetooth link indicator, top-right corner
//! - **Animation**: row blitter + frame-paced player for a `FrameDecoder`
//! - **Sprite**: the bundled paw-tap animation

pub mod animation;
pub mod badge;
pub mod sprite;

pub use animation::{
    AnimationPlayer, DrawTargetSink, FrameDecoder, FramePoll, RowBlitter, RowDraw, RowSink,
};
pub use badge::{BadgeStyle, StatusBadge};
pub use sprite::{StaticAnimation, PAW_TAP_FRAMES};
