//! # Framebuffer and Drawing Primitives
//!
//! The framebuffer is 128×128 [`Color`]s, row-major: pixel `(x, y)` lives at
//! `x + y * 128`. [`Screen`] draws into it.
//!
//! All drawing clips: pixels outside the grid are discarded, so a primitive
//! can never write past the framebuffer zone. Only the linear read
//! [`FrameBuffer::pixel`] reports out-of-range indices as errors.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use core::ops::{Index, IndexMut};
use bytemuck::{Pod, Zeroable};
use crate::address::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::color::Color;
use crate::error::{Result, VideoError};

pub type Coord = i32;

pub const FRAMEBUFFER_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct FrameBuffer([Color; FRAMEBUFFER_PIXELS]);

impl FrameBuffer {
    #[inline(always)]
    pub const fn width(&self) -> Coord {
        SCREEN_WIDTH as Coord
    }

    #[inline(always)]
    pub const fn height(&self) -> Coord {
        SCREEN_HEIGHT as Coord
    }

    pub fn pixels(&self) -> &[Color; FRAMEBUFFER_PIXELS] {
        &self.0
    }

    pub fn pixels_mut(&mut self) -> &mut [Color; FRAMEBUFFER_PIXELS] {
        &mut self.0
    }

    /// Linear read used by presentation layers.
    pub fn pixel(&self, i: usize) -> Result<Color> {
        self.0.get(i).copied().ok_or(VideoError::PixelOutOfRange {
            x: (i % SCREEN_WIDTH) as Coord,
            y: (i / SCREEN_WIDTH) as Coord,
            width: self.width(),
            height: self.height(),
        })
    }

    /// Color at `(x, y)`, or `None` off screen.
    pub fn get(&self, x: Coord, y: Coord) -> Option<Color> {
        offset(x, y).map(|i| self.0[i])
    }

    /// Writes the frame as RGBA8888 into `out`, which must hold exactly
    /// `4 * width * height` bytes.
    pub fn write_rgba8(&self, out: &mut [u8]) -> Result<()> {
        let expected = FRAMEBUFFER_PIXELS * 4;
        if out.len() != expected {
            return Err(VideoError::BadLength { expected, actual: out.len() });
        }
        self.convert_rgba8(out);
        Ok(())
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = vec![0; FRAMEBUFFER_PIXELS * 4];
        self.convert_rgba8(&mut out);
        out
    }

    fn convert_rgba8(&self, out: &mut [u8]) {
        for (dst, color) in out.chunks_exact_mut(4).zip(self.0.iter()) {
            dst.copy_from_slice(&color.to_rgba8());
        }
    }
}

impl Debug for FrameBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let opaque = self.0.iter().filter(|c| c.is_opaque()).count();
        f.debug_struct("FrameBuffer")
            .field("first", &self.0[0])
            .field("opaque_pixels", &opaque)
            .finish()
    }
}

impl Index<usize> for FrameBuffer {
    type Output = Color;

    fn index(&self, i: usize) -> &Color {
        &self.0[i]
    }
}

impl IndexMut<usize> for FrameBuffer {
    fn index_mut(&mut self, i: usize) -> &mut Color {
        &mut self.0[i]
    }
}

/// Row-major offset of an on-screen pixel.
#[inline(always)]
pub(crate) fn offset(x: Coord, y: Coord) -> Option<usize> {
    if x < 0 || y < 0 || x >= SCREEN_WIDTH as Coord || y >= SCREEN_HEIGHT as Coord {
        return None;
    }
    Some(x as usize + y as usize * SCREEN_WIDTH)
}

const OUT_LEFT: u8 = 1;
const OUT_RIGHT: u8 = 2;
const OUT_ABOVE: u8 = 4;
const OUT_BELOW: u8 = 8;

const X_MAX: i64 = SCREEN_WIDTH as i64 - 1;
const Y_MAX: i64 = SCREEN_HEIGHT as i64 - 1;

fn outcode(x: i64, y: i64) -> u8 {
    let mut code = 0;
    if x < 0 {
        code |= OUT_LEFT;
    } else if x > X_MAX {
        code |= OUT_RIGHT;
    }
    if y < 0 {
        code |= OUT_ABOVE;
    } else if y > Y_MAX {
        code |= OUT_BELOW;
    }
    code
}

/// `n / d` rounded to the nearest integer, halves away from zero.
fn div_round(n: i128, d: i128) -> i64 {
    let (n, d) = if d < 0 { (-n, -d) } else { (n, d) };
    let q = if n >= 0 { (n + d / 2) / d } else { (n - d / 2) / d };
    q as i64
}

/// Cohen-Sutherland clip against the screen rectangle. Endpoint order is
/// kept; `None` when the segment misses the screen.
fn clip_segment(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Option<(Coord, Coord, Coord, Coord)> {
    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let mut code0 = outcode(x0, y0);
    let mut code1 = outcode(x1, y1);

    loop {
        if code0 | code1 == 0 {
            return Some((x0 as Coord, y0 as Coord, x1 as Coord, y1 as Coord));
        }
        if code0 & code1 != 0 {
            return None;
        }

        // both endpoints are never outside the same edge here, so the
        // divisor below is non-zero
        let out = if code0 != 0 { code0 } else { code1 };
        let (dx, dy) = ((x1 - x0) as i128, (y1 - y0) as i128);
        let (x, y) = if out & OUT_BELOW != 0 {
            (x0 + div_round(dx * (Y_MAX - y0) as i128, dy), Y_MAX)
        } else if out & OUT_ABOVE != 0 {
            (x0 + div_round(dx * -y0 as i128, dy), 0)
        } else if out & OUT_RIGHT != 0 {
            (X_MAX, y0 + div_round(dy * (X_MAX - x0) as i128, dx))
        } else {
            (0, y0 + div_round(dy * -x0 as i128, dx))
        };

        if out == code0 {
            (x0, y0) = (x, y);
            code0 = outcode(x0, y0);
        } else {
            (x1, y1) = (x, y);
            code1 = outcode(x1, y1);
        }
    }
}

/// Drawing surface over the framebuffer.
pub struct Screen<'a> {
    framebuffer: &'a mut FrameBuffer,
}

impl<'a> Screen<'a> {
    pub fn new(framebuffer: &'a mut FrameBuffer) -> Self {
        Self { framebuffer }
    }

    #[inline(always)]
    pub const fn width(&self) -> Coord {
        SCREEN_WIDTH as Coord
    }

    #[inline(always)]
    pub const fn height(&self) -> Coord {
        SCREEN_HEIGHT as Coord
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.framebuffer
    }

    pub fn pixel(&self, i: usize) -> Result<Color> {
        self.framebuffer.pixel(i)
    }

    pub fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    pub fn fill(&mut self, color: Color) {
        self.framebuffer.0.fill(color);
    }

    #[inline(always)]
    pub fn set(&mut self, x: Coord, y: Coord, color: Color) {
        if let Some(i) = offset(x, y) {
            self.framebuffer.0[i] = color;
        }
    }

    pub fn rect(&mut self, x: Coord, y: Coord, w: Coord, h: Coord, color: Color) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width());
        let y1 = y.saturating_add(h).min(self.height());
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for j in y0..y1 {
            let start = (j * self.width() + x0) as usize;
            let end = (j * self.width() + x1) as usize;
            self.framebuffer.0[start..end].fill(color);
        }
    }

    /// Draws the segment from `(x0, y0)` to `(x1, y1)` inclusive. Any
    /// coordinates are accepted; the segment is clipped to the screen first.
    pub fn line(&mut self, x0: Coord, y0: Coord, x1: Coord, y1: Coord, color: Color) {
        let Some((mut x0, mut y0, x1, y1)) = clip_segment(x0, y0, x1, y1) else {
            return;
        };

        // horizontal
        if y0 == y1 {
            for x in x0.min(x1)..=x0.max(x1) {
                self.set(x, y0, color);
            }
        }
        // vertical
        else if x0 == x1 {
            for y in y0.min(y1)..=y0.max(y1) {
                self.set(x0, y, color);
            }
        } else {
            let dx = (x1 - x0).abs();
            let sx = if x0 < x1 { 1 } else { -1 };
            let dy = -(y1 - y0).abs();
            let sy = if y0 < y1 { 1 } else { -1 };
            let mut err = dx + dy;

            loop {
                self.set(x0, y0, color);

                if x0 == x1 && y0 == y1 {
                    break;
                }

                let err2 = 2 * err;

                if err2 >= dy {
                    err += dy;
                    x0 += sx;
                }

                if err2 <= dx {
                    err += dx;
                    y0 += sy;
                }
            }
        }
    }

    /// Moves every pixel halfway toward `color`.
    pub fn fade_toward(&mut self, color: Color) {
        for pixel in self.framebuffer.0.iter_mut() {
            *pixel = pixel.blend(color);
        }
    }
}
