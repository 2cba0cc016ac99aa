//! Bundled paw-tap animation and the in-memory decoder that plays it.
//!
//! Frames are stored as ASCII art so the asset stays reviewable in source:
//!
//! | byte  | palette index                          |
//! |-------|----------------------------------------|
//! | `' '` | 0 - background                         |
//! | `'#'` | 1 - ink                                |
//! | `'.'` | 255 - reserved, skipped by the blitter |
//!
//! Overlay frames restore to background, so their `'.'` cells leave the
//! previous frame untouched.

use crate::config::MAX_ROW_PIXELS;
use crate::ui::animation::{Disposal, FrameDecoder, RowDraw, RESERVED_TRANSPARENT_INDEX};
use embedded_graphics::geometry::Size;

/// One frame of a [`StaticAnimation`].
#[derive(Clone, Copy, Debug)]
pub struct SpriteFrame {
    pub x: i32,
    pub y: i32,
    pub rows: &'static [&'static [u8]],
    pub transparent: Option<u8>,
    pub disposal: Disposal,
}

impl SpriteFrame {
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    fn is_well_formed(&self, canvas: Size) -> bool {
        let width = self.width();
        width <= MAX_ROW_PIXELS
            && self.rows.iter().all(|r| r.len() == width)
            && self.x >= 0
            && self.y >= 0
            && self.x as usize + width <= canvas.width as usize
            && self.y as usize + self.rows.len() <= canvas.height as usize
    }
}

/// Map an ASCII art cell to its palette index.
pub const fn cell_index(cell: u8) -> u8 {
    match cell {
        b'#' => 1,
        b'.' => RESERVED_TRANSPARENT_INDEX,
        _ => 0,
    }
}

/// Decoder over frames held in flash.
pub struct StaticAnimation<C: 'static> {
    canvas: Size,
    frames: &'static [SpriteFrame],
    palette: &'static [C],
    next: usize,
}

impl<C: 'static> StaticAnimation<C> {
    pub const fn new(canvas: Size, frames: &'static [SpriteFrame], palette: &'static [C]) -> Self {
        Self {
            canvas,
            frames,
            palette,
            next: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl<C: 'static> FrameDecoder<C> for StaticAnimation<C> {
    fn open(&mut self) -> bool {
        self.next = 0;
        !self.frames.is_empty() && self.frames.iter().all(|f| f.is_well_formed(self.canvas))
    }

    fn play_frame(&mut self, on_row: &mut dyn FnMut(&RowDraw<'_, C>)) -> bool {
        let Some(frame) = self.frames.get(self.next) else {
            return false;
        };

        let mut indices = [0u8; MAX_ROW_PIXELS];
        for (row, cells) in frame.rows.iter().enumerate() {
            let line = &mut indices[..cells.len().min(MAX_ROW_PIXELS)];
            for (dst, &cell) in line.iter_mut().zip(cells.iter()) {
                *dst = cell_index(cell);
            }
            on_row(&RowDraw {
                frame_x: frame.x,
                frame_y: frame.y,
                row: row as i32,
                palette: self.palette,
                pixels: line,
                transparent: frame.transparent,
                disposal: frame.disposal,
            });
        }

        self.next += 1;
        self.next < self.frames.len()
    }

    fn close(&mut self) {
        self.next = 0;
    }

    fn canvas_size(&self) -> Size {
        self.canvas
    }
}

// Paw-tap asset (48×20)

const BASE_ROWS: &[&[u8]] = &[
    b"                                                ",
    b"          #                   #                 ",
    b"         # #                 # #                ",
    b"        #   #################   #               ",
    b"       #                         #              ",
    b"       #     ##           ##     #              ",
    b"       #     ##     #     ##     #              ",
    b"       #          # # #          #              ",
    b"        #          # #          #               ",
    b"         #                     #                ",
    b"          #####################                 ",
    b"   ###                               ###        ",
    b"  #   #                             #   #       ",
    b"  #   #                             #   #       ",
    b"   ###                               ###        ",
    b"                                                ",
    b"                                                ",
    b"                                                ",
    b"################################################",
    b"                                                ",
];

const LEFT_PAW_DOWN_ROWS: &[&[u8]] = &[
    b"        ..........................   ###  ......",
    b"        ..........................  #   # ......",
    b"        ..........................  #   # ......",
    b"   ###  ..........................   ###  ......",
    b"  #   # ..........................        ......",
    b"  #   # ..........................        ......",
    b"  ##### ..........................        ......",
];

const RIGHT_PAW_DOWN_ROWS: &[&[u8]] = &[
    b"   ###  ..........................        ......",
    b"  #   # ..........................        ......",
    b"  #   # ..........................        ......",
    b"   ###  ..........................   ###  ......",
    b"        ..........................  #   # ......",
    b"        ..........................  #   # ......",
    b"        ..........................  ##### ......",
];

/// Paw strip starts right under the head.
const PAW_ROW: i32 = 11;

/// Frames of the bundled paw-tap loop.
pub static PAW_TAP_FRAMES: [SpriteFrame; 3] = [
    SpriteFrame {
        x: 0,
        y: 0,
        rows: BASE_ROWS,
        transparent: None,
        disposal: Disposal::Keep,
    },
    SpriteFrame {
        x: 0,
        y: PAW_ROW,
        rows: LEFT_PAW_DOWN_ROWS,
        transparent: None,
        disposal: Disposal::RestoreBackground,
    },
    SpriteFrame {
        x: 0,
        y: PAW_ROW,
        rows: RIGHT_PAW_DOWN_ROWS,
        transparent: None,
        disposal: Disposal::RestoreBackground,
    },
];
