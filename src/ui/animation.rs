//! Animated image playback.
//!
//! Decoding is delegated to a [`FrameDecoder`]; this module owns what
//! happens to each decoded row: clipping, transparency and batching of
//! opaque runs into as few blits as possible.
//!
//! ## Pacing
//!
//! The player never blocks. Every control-loop tick calls
//! [`AnimationPlayer::poll`], which renders at most one frame once the frame
//! delay has elapsed, so the watchdog and motion model keep running between
//! frames.

use crate::config::{FRAME_DELAY_MS, MAX_ROW_PIXELS};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

/// Palette index reserved as transparent when a frame restores to background.
pub const RESERVED_TRANSPARENT_INDEX: u8 = 255;

/// GIF-style frame disposal method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposal {
    Unspecified,
    /// Leave the frame in place.
    Keep,
    /// Clear the frame area to the background before the next frame.
    RestoreBackground,
    /// Restore what was under the frame before it was drawn.
    RestorePrevious,
}

impl From<u8> for Disposal {
    fn from(code: u8) -> Self {
        match code {
            1 => Disposal::Keep,
            2 => Disposal::RestoreBackground,
            3 => Disposal::RestorePrevious,
            _ => Disposal::Unspecified,
        }
    }
}

/// One decoded row handed out by a [`FrameDecoder`].
#[derive(Clone, Copy, Debug)]
pub struct RowDraw<'a, C> {
    /// Frame origin inside the animation canvas.
    pub frame_x: i32,
    pub frame_y: i32,
    /// Row index inside the frame.
    pub row: i32,
    /// Colours indexed by the pixel bytes.
    pub palette: &'a [C],
    /// Palette indices, one per pixel.
    pub pixels: &'a [u8],
    /// Index to skip, if the frame declares one.
    pub transparent: Option<u8>,
    pub disposal: Disposal,
}

impl<C> RowDraw<'_, C> {
    /// Transparent index after applying the disposal rule.
    pub fn effective_transparency(&self) -> Option<u8> {
        match self.disposal {
            Disposal::RestoreBackground => Some(RESERVED_TRANSPARENT_INDEX),
            _ => self.transparent,
        }
    }
}

/// Animated-image decoder driven one frame at a time.
pub trait FrameDecoder<C> {
    /// Prepare the asset for playback from its first frame.
    ///
    /// Returns `false` for a malformed or oversized asset.
    fn open(&mut self) -> bool;

    /// Decode the next frame, calling `on_row` once per row in order.
    ///
    /// Returns `true` while more frames remain after this one.
    fn play_frame(&mut self, on_row: &mut dyn FnMut(&RowDraw<'_, C>)) -> bool;

    fn close(&mut self);

    /// Canvas size of the asset (pixels).
    fn canvas_size(&self) -> Size;
}

/// Destination of batched pixel runs.
pub trait RowSink<C> {
    type Error;

    /// Draw `pixels` left to right starting at `(x, y)`, one row high.
    fn push_row(&mut self, x: i32, y: i32, pixels: &[C]) -> Result<(), Self::Error>;
}

/// Blits rows straight into an `embedded-graphics` draw target.
pub struct DrawTargetSink<'a, D>(pub &'a mut D);

impl<D> RowSink<D::Color> for DrawTargetSink<'_, D>
where
    D: DrawTarget,
{
    type Error = D::Error;

    fn push_row(&mut self, x: i32, y: i32, pixels: &[D::Color]) -> Result<(), Self::Error> {
        let area = Rectangle::new(Point::new(x, y), Size::new(pixels.len() as u32, 1));
        self.0.fill_contiguous(&area, pixels.iter().copied())
    }
}

/// Offsets that centre a `canvas` on a `display`.
///
/// Negative when the canvas is larger than the display.
pub fn centered_offset(display: Size, canvas: Size) -> Point {
    Point::new(
        (display.width as i32 - canvas.width as i32) / 2,
        (display.height as i32 - canvas.height as i32) / 2,
    )
}

/// Turns decoded rows into blits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBlitter {
    offset: Point,
    max_width: usize,
}

impl RowBlitter {
    /// `offset` is added to every blit; rows are clipped to `display_width`.
    pub fn new(offset: Point, display_width: u32) -> Self {
        Self {
            offset,
            max_width: (display_width as usize).min(MAX_ROW_PIXELS),
        }
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Blit one row. Returns the number of blits issued.
    ///
    /// Opaque pixels are batched into contiguous runs; transparent pixels
    /// and indices outside the palette split runs and are not drawn.
    pub fn draw_row<C, S>(&self, row: &RowDraw<'_, C>, sink: &mut S) -> Result<usize, S::Error>
    where
        C: Copy,
        S: RowSink<C>,
    {
        let width = row.pixels.len().min(self.max_width);
        let transparent = row.effective_transparency();
        let y = row.frame_y + row.row + self.offset.y;
        let x0 = row.frame_x + self.offset.x;

        let mut run: Vec<C, MAX_ROW_PIXELS> = Vec::new();
        let mut run_start = 0usize;
        let mut blits = 0;

        for (x, &index) in row.pixels[..width].iter().enumerate() {
            let color = match row.palette.get(index as usize) {
                Some(&c) if Some(index) != transparent => c,
                _ => {
                    if !run.is_empty() {
                        sink.push_row(x0 + run_start as i32, y, &run)?;
                        blits += 1;
                        run.clear();
                    }
                    continue;
                }
            };

            if run.is_empty() {
                run_start = x;
            }
            // Capacity matches the clip width, so this cannot overflow.
            let _ = run.push(color);
        }

        if !run.is_empty() {
            sink.push_row(x0 + run_start as i32, y, &run)?;
            blits += 1;
        }

        Ok(blits)
    }
}

/// What a call to [`AnimationPlayer::poll`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramePoll {
    /// The frame delay has not elapsed yet.
    Waiting,
    /// A frame was drawn; more follow.
    Drawn,
    /// The last frame was drawn and the decoder closed; playback restarts
    /// on the next due poll.
    Finished,
    /// The decoder refused the asset; retried after the next frame delay.
    OpenFailed,
}

impl FramePoll {
    /// Whether pixels changed and the display needs flushing.
    pub fn drew(&self) -> bool {
        matches!(self, FramePoll::Drawn | FramePoll::Finished)
    }
}

/// Plays a [`FrameDecoder`] in a loop, one frame per poll at most.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    blitter: RowBlitter,
    frame_delay_ms: u64,
    last_frame_at: Option<u64>,
    open: bool,
}

impl AnimationPlayer {
    pub fn new(blitter: RowBlitter) -> Self {
        Self::with_frame_delay(blitter, FRAME_DELAY_MS)
    }

    pub fn with_frame_delay(blitter: RowBlitter, frame_delay_ms: u64) -> Self {
        Self {
            blitter,
            frame_delay_ms,
            last_frame_at: None,
            open: false,
        }
    }

    /// Player centring the decoder's canvas on a display of `display` size.
    pub fn centered<C, F>(display: Size, decoder: &F) -> Self
    where
        F: FrameDecoder<C> + ?Sized,
    {
        let offset = centered_offset(display, decoder.canvas_size());
        Self::new(RowBlitter::new(offset, display.width))
    }

    pub fn blitter(&self) -> &RowBlitter {
        &self.blitter
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Render the next frame if it is due.
    ///
    /// Blit errors abort the frame and are returned; the decoder stays open
    /// and the next frame is attempted after the usual delay.
    pub fn poll<C, F, S>(
        &mut self,
        now: u64,
        decoder: &mut F,
        sink: &mut S,
    ) -> Result<FramePoll, S::Error>
    where
        C: Copy,
        F: FrameDecoder<C> + ?Sized,
        S: RowSink<C>,
    {
        if let Some(last) = self.last_frame_at {
            if now.saturating_sub(last) < self.frame_delay_ms {
                return Ok(FramePoll::Waiting);
            }
        }
        self.last_frame_at = Some(now);

        if !self.open {
            if !decoder.open() {
                return Ok(FramePoll::OpenFailed);
            }
            self.open = true;
        }

        let blitter = self.blitter;
        let mut failure = None;
        let more = decoder.play_frame(&mut |row: &RowDraw<'_, C>| {
            if failure.is_none() {
                if let Err(e) = blitter.draw_row(row, sink) {
                    failure = Some(e);
                }
            }
        });

        if !more {
            decoder.close();
            self.open = false;
        }

        match failure {
            Some(e) => Err(e),
            None if more => Ok(FramePoll::Drawn),
            None => Ok(FramePoll::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::pixelcolor::BinaryColor;

    /// Records every blit as (x, y, len).
    #[derive(Default)]
    struct Recorder {
        blits: std::vec::Vec<(i32, i32, usize)>,
    }

    impl RowSink<u16> for Recorder {
        type Error = ();

        fn push_row(&mut self, x: i32, y: i32, pixels: &[u16]) -> Result<(), ()> {
            self.blits.push((x, y, pixels.len()));
            Ok(())
        }
    }

    struct Failing;

    impl RowSink<u16> for Failing {
        type Error = &'static str;

        fn push_row(&mut self, _: i32, _: i32, _: &[u16]) -> Result<(), Self::Error> {
            Err("bus")
        }
    }

    const PALETTE: [u16; 4] = [0x0000, 0x1111, 0x2222, 0x3333];

    fn row<'a>(pixels: &'a [u8], transparent: Option<u8>, disposal: Disposal) -> RowDraw<'a, u16> {
        RowDraw {
            frame_x: 2,
            frame_y: 1,
            row: 3,
            palette: &PALETTE,
            pixels,
            transparent,
            disposal,
        }
    }

    #[test]
    fn opaque_row_is_a_single_blit() {
        let blitter = RowBlitter::new(Point::new(10, 20), 128);
        let mut sink = Recorder::default();

        let n = blitter
            .draw_row(&row(&[0, 1, 2, 3, 2, 1], None, Disposal::Keep), &mut sink)
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(sink.blits, [(12, 24, 6)]);
    }

    #[test]
    fn transparent_runs_split_blits() {
        let blitter = RowBlitter::new(Point::zero(), 128);
        let mut sink = Recorder::default();

        let pixels = [1, 1, 0, 0, 2, 0, 3, 3, 3];
        let n = blitter
            .draw_row(&row(&pixels, Some(0), Disposal::Keep), &mut sink)
            .unwrap();

        assert_eq!(n, 3);
        assert_eq!(sink.blits, [(2, 4, 2), (6, 4, 1), (8, 4, 3)]);
    }

    #[test]
    fn restore_background_makes_reserved_index_transparent() {
        let blitter = RowBlitter::new(Point::zero(), 128);
        let mut sink = Recorder::default();

        // Index 0 is declared transparent but disposal overrides it.
        let pixels = [255, 0, 0, 255, 255, 1];
        let n = blitter
            .draw_row(&row(&pixels, Some(0), Disposal::RestoreBackground), &mut sink)
            .unwrap();

        assert_eq!(n, 2);
        assert_eq!(sink.blits, [(3, 4, 2), (7, 4, 1)]);
    }

    #[test]
    fn indices_outside_palette_are_skipped() {
        let blitter = RowBlitter::new(Point::zero(), 128);
        let mut sink = Recorder::default();

        let n = blitter
            .draw_row(&row(&[1, 9, 1], None, Disposal::Keep), &mut sink)
            .unwrap();

        assert_eq!(n, 2);
    }

    #[test]
    fn rows_are_clipped_to_display_width() {
        let blitter = RowBlitter::new(Point::zero(), 4);
        let mut sink = Recorder::default();

        blitter
            .draw_row(&row(&[1; 10], None, Disposal::Keep), &mut sink)
            .unwrap();

        assert_eq!(sink.blits, [(2, 4, 4)]);
    }

    #[test]
    fn fully_transparent_row_issues_no_blit() {
        let blitter = RowBlitter::new(Point::zero(), 128);
        let mut sink = Recorder::default();

        let n = blitter
            .draw_row(&row(&[0, 0, 0], Some(0), Disposal::Keep), &mut sink)
            .unwrap();

        assert_eq!(n, 0);
        assert!(sink.blits.is_empty());
    }

    #[test]
    fn centred_offset_handles_larger_canvas() {
        assert_eq!(
            centered_offset(Size::new(128, 64), Size::new(48, 20)),
            Point::new(40, 22)
        );
        assert_eq!(
            centered_offset(Size::new(128, 64), Size::new(240, 101)),
            Point::new(-56, -18)
        );
    }

    #[test]
    fn disposal_codes_follow_gif_numbering() {
        assert_eq!(Disposal::from(0), Disposal::Unspecified);
        assert_eq!(Disposal::from(1), Disposal::Keep);
        assert_eq!(Disposal::from(2), Disposal::RestoreBackground);
        assert_eq!(Disposal::from(3), Disposal::RestorePrevious);
        assert_eq!(Disposal::from(7), Disposal::Unspecified);
    }

    /// Three one-row frames; optionally refuses to open.
    struct Strip {
        refuse: bool,
        next: usize,
        opens: usize,
        closes: usize,
    }

    impl Strip {
        fn new(refuse: bool) -> Self {
            Self {
                refuse,
                next: 0,
                opens: 0,
                closes: 0,
            }
        }
    }

    impl FrameDecoder<u16> for Strip {
        fn open(&mut self) -> bool {
            self.opens += 1;
            self.next = 0;
            !self.refuse
        }

        fn play_frame(&mut self, on_row: &mut dyn FnMut(&RowDraw<'_, u16>)) -> bool {
            let pixels = [1u8, 2, 3];
            on_row(&RowDraw {
                frame_x: 0,
                frame_y: 0,
                row: self.next as i32,
                palette: &PALETTE,
                pixels: &pixels,
                transparent: None,
                disposal: Disposal::Keep,
            });
            self.next += 1;
            self.next < 3
        }

        fn close(&mut self) {
            self.closes += 1;
        }

        fn canvas_size(&self) -> Size {
            Size::new(3, 3)
        }
    }

    #[test]
    fn player_paces_frames_and_loops() {
        let mut player = AnimationPlayer::with_frame_delay(RowBlitter::new(Point::zero(), 128), 100);
        let mut decoder = Strip::new(false);
        let mut sink = Recorder::default();

        assert_eq!(player.poll(0, &mut decoder, &mut sink), Ok(FramePoll::Drawn));
        assert_eq!(player.poll(50, &mut decoder, &mut sink), Ok(FramePoll::Waiting));
        assert_eq!(player.poll(100, &mut decoder, &mut sink), Ok(FramePoll::Drawn));
        assert_eq!(player.poll(200, &mut decoder, &mut sink), Ok(FramePoll::Finished));
        assert!(!player.is_open());
        assert_eq!(decoder.closes, 1);

        // Next pass reopens from the first frame.
        assert_eq!(player.poll(300, &mut decoder, &mut sink), Ok(FramePoll::Drawn));
        assert_eq!(decoder.opens, 2);
        assert_eq!(sink.blits.len(), 4);
        assert_eq!(sink.blits[3], (0, 0, 3));
    }

    #[test]
    fn open_failure_skips_pass_and_retries() {
        let mut player = AnimationPlayer::with_frame_delay(RowBlitter::new(Point::zero(), 128), 100);
        let mut decoder = Strip::new(true);
        let mut sink = Recorder::default();

        assert_eq!(player.poll(0, &mut decoder, &mut sink), Ok(FramePoll::OpenFailed));
        assert_eq!(player.poll(10, &mut decoder, &mut sink), Ok(FramePoll::Waiting));

        decoder.refuse = false;
        assert_eq!(player.poll(100, &mut decoder, &mut sink), Ok(FramePoll::Drawn));
        assert_eq!(decoder.opens, 2);
    }

    #[test]
    fn blit_errors_propagate() {
        let mut player = AnimationPlayer::with_frame_delay(RowBlitter::new(Point::zero(), 128), 100);
        let mut decoder = Strip::new(false);

        assert_eq!(player.poll(0, &mut decoder, &mut Failing), Err("bus"));
        assert!(player.is_open());
    }

    #[test]
    fn draw_target_sink_writes_pixels() {
        let mut display: MockDisplay<BinaryColor> = MockDisplay::new();
        let mut sink = DrawTargetSink(&mut display);
        sink.push_row(1, 2, &[BinaryColor::On, BinaryColor::Off])
            .unwrap();

        assert_eq!(display.get_pixel(Point::new(1, 2)), Some(BinaryColor::On));
        assert_eq!(display.get_pixel(Point::new(2, 2)), Some(BinaryColor::Off));
        assert_eq!(display.get_pixel(Point::new(3, 2)), None);
    }
}
