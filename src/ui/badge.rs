//! Bluetooth connection badge in the top-right corner of the panel.
//!
//! Redrawing is edge-triggered: the badge is only repainted when the link
//! state differs from what is currently on screen.

use crate::config::{BADGE_CORNER_RADIUS, BADGE_MARGIN, BADGE_SIZE};
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{BinaryColor, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, RoundedRectangle};

/// Fill and glyph colour for one link state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeColors<C> {
    pub fill: C,
    pub glyph: C,
}

/// Colours used to paint the badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeStyle<C> {
    /// Panel background behind the rounded corners.
    pub background: C,
    pub connected: BadgeColors<C>,
    pub disconnected: BadgeColors<C>,
}

impl<C: Copy> BadgeStyle<C> {
    pub fn colors(&self, connected: bool) -> BadgeColors<C> {
        if connected {
            self.connected
        } else {
            self.disconnected
        }
    }
}

impl BadgeStyle<BinaryColor> {
    /// OLED style: solid badge when connected, hollow glyph otherwise.
    pub const fn monochrome() -> Self {
        Self {
            background: BinaryColor::Off,
            connected: BadgeColors {
                fill: BinaryColor::On,
                glyph: BinaryColor::Off,
            },
            disconnected: BadgeColors {
                fill: BinaryColor::Off,
                glyph: BinaryColor::On,
            },
        }
    }
}

impl BadgeStyle<Rgb565> {
    /// Colour-panel style: pastel blue when connected, grey otherwise, on
    /// a white background.
    pub fn rgb565() -> Self {
        Self {
            background: Rgb565::WHITE,
            connected: BadgeColors {
                fill: Rgb565::from(RawU16::new(0xF651)),
                glyph: Rgb565::WHITE,
            },
            disconnected: BadgeColors {
                fill: Rgb565::from(RawU16::new(0xCE79)),
                glyph: Rgb565::WHITE,
            },
        }
    }
}

/// Area the badge occupies on a display of the given width.
pub fn badge_area(display_width: u32) -> Rectangle {
    let x = display_width.saturating_sub(BADGE_SIZE + BADGE_MARGIN) as i32;
    Rectangle::new(
        Point::new(x, BADGE_MARGIN as i32),
        Size::new(BADGE_SIZE, BADGE_SIZE),
    )
}

/// Paint the badge for `connected` unconditionally.
pub fn draw_badge<D>(
    display: &mut D,
    connected: bool,
    style: &BadgeStyle<D::Color>,
) -> Result<(), D::Error>
where
    D: DrawTarget,
{
    let area = badge_area(display.bounding_box().size.width);
    let colors = style.colors(connected);

    area.into_styled(PrimitiveStyle::with_fill(style.background))
        .draw(display)?;
    RoundedRectangle::with_equal_corners(
        area,
        Size::new(BADGE_CORNER_RADIUS, BADGE_CORNER_RADIUS),
    )
    .into_styled(PrimitiveStyle::with_fill(colors.fill))
    .draw(display)?;

    let c = area.center();
    let stroke = PrimitiveStyle::with_stroke(colors.glyph, 1);
    let p = |dx: i32, dy: i32| c + Point::new(dx, dy);

    // Rune: spine plus the two crossed arrow heads.
    for (from, to) in [
        (p(0, -6), p(0, 6)),
        (p(0, -6), p(4, -2)),
        (p(4, -2), p(-3, 4)),
        (p(0, 6), p(4, 2)),
        (p(4, 2), p(-3, -4)),
    ] {
        Line::new(from, to).into_styled(stroke).draw(display)?;
    }

    Ok(())
}

/// Edge-triggered badge renderer.
#[derive(Clone, Debug, Default)]
pub struct StatusBadge {
    drawn: Option<bool>,
}

impl StatusBadge {
    pub const fn new() -> Self {
        Self { drawn: None }
    }

    /// `true` on first use and whenever `connected` differs from the
    /// state currently on screen.
    pub fn needs_redraw(&self, connected: bool) -> bool {
        self.drawn != Some(connected)
    }

    /// Repaint if needed. Returns whether anything was drawn.
    ///
    /// The on-screen state is only recorded once the draw succeeded, so a
    /// failed draw is retried on the next call.
    pub fn update<D>(
        &mut self,
        display: &mut D,
        connected: bool,
        style: &BadgeStyle<D::Color>,
    ) -> Result<bool, D::Error>
    where
        D: DrawTarget,
    {
        if !self.needs_redraw(connected) {
            return Ok(false);
        }
        draw_badge(display, connected, style)?;
        self.drawn = Some(connected);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;

    fn display() -> MockDisplay<BinaryColor> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display
    }

    #[test]
    fn redraws_only_on_state_change() {
        let mut display = display();
        let mut badge = StatusBadge::new();
        let style = BadgeStyle::monochrome();

        let redraws = [false, false, true, true, false]
            .iter()
            .filter(|&&connected| badge.update(&mut display, connected, &style).unwrap())
            .count();

        assert_eq!(redraws, 3);
    }

    #[test]
    fn first_update_always_draws() {
        let badge = StatusBadge::new();
        assert!(badge.needs_redraw(false));
        assert!(badge.needs_redraw(true));
    }

    #[test]
    fn badge_sits_in_top_right_corner() {
        let area = badge_area(128);
        assert_eq!(area.top_left, Point::new(92, 10));
        assert_eq!(area.size, Size::new(26, 26));
    }

    #[test]
    fn connected_badge_is_solid_with_dark_rune() {
        let mut display = display();
        draw_badge(&mut display, true, &BadgeStyle::monochrome()).unwrap();

        let area = badge_area(64);
        let c = area.center();
        assert_eq!(display.get_pixel(c), Some(BinaryColor::Off));
        assert_eq!(
            display.get_pixel(c + Point::new(-8, 0)),
            Some(BinaryColor::On)
        );
        // Rounded corner keeps the background colour.
        assert_eq!(display.get_pixel(area.top_left), Some(BinaryColor::Off));
        // Nothing outside the badge is touched.
        assert_eq!(display.get_pixel(Point::new(0, 0)), None);
    }

    #[test]
    fn disconnected_badge_draws_lit_rune_on_dark_fill() {
        let mut display = display();
        draw_badge(&mut display, false, &BadgeStyle::monochrome()).unwrap();

        let c = badge_area(64).center();
        assert_eq!(display.get_pixel(c), Some(BinaryColor::On));
        assert_eq!(
            display.get_pixel(c + Point::new(-8, 0)),
            Some(BinaryColor::Off)
        );
    }

    #[test]
    fn rgb565_style_uses_distinct_state_fills() {
        let style = BadgeStyle::rgb565();
        assert_ne!(style.colors(true).fill, style.colors(false).fill);
        assert_eq!(style.colors(true).glyph, Rgb565::WHITE);
    }
}
