//! Packed 16-bit color: `o rrrrr ggggg bbbbb`.
//!
//! Bit 15 is the opacity flag. Each channel keeps the top 5 bits of its 8-bit
//! source, so `to_rgb(rgb(r, g, b))` is `(r & !7, g & !7, b & !7)`.

use core::fmt::{Debug, Formatter};
use bit_field::BitField;
use bytemuck::{Pod, Zeroable};
use crate::address::BITS_PER_COLOR_COMPONENT;

pub const RED_SHIFT: usize = (BITS_PER_COLOR_COMPONENT * 2) as usize;
pub const GREEN_SHIFT: usize = BITS_PER_COLOR_COMPONENT as usize;
pub const BLUE_SHIFT: usize = 0;
pub const OPAQUE_BIT: usize = 15;

pub const COLOR_MASK: u16 = (1 << BITS_PER_COLOR_COMPONENT) - 1;
pub const COLOR_SHIFT: u32 = 8 - BITS_PER_COLOR_COMPONENT;

const CHANNEL_BITS: usize = BITS_PER_COLOR_COMPONENT as usize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Color = Color(0x8000);
    pub const WHITE: Color = Color(0xFFFF);
    pub const TRANSPARENT: Color = Color(0x0000);
    pub const OPAQUE_FLAG: u16 = 1 << OPAQUE_BIT;

    /// Encodes an 8-bit-per-channel triple. The result is always opaque.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(
            Self::OPAQUE_FLAG
                | (((r >> COLOR_SHIFT) as u16) << RED_SHIFT)
                | (((g >> COLOR_SHIFT) as u16) << GREEN_SHIFT)
                | (((b >> COLOR_SHIFT) as u16) << BLUE_SHIFT),
        )
    }

    pub fn to_rgb(self) -> Rgb {
        Rgb {
            r: self.channel(RED_SHIFT),
            g: self.channel(GREEN_SHIFT),
            b: self.channel(BLUE_SHIFT),
        }
    }

    #[inline(always)]
    fn channel(self, shift: usize) -> u8 {
        ((self.0.get_bits(shift..shift + CHANNEL_BITS) & COLOR_MASK) << COLOR_SHIFT) as u8
    }

    #[inline(always)]
    pub fn is_opaque(self) -> bool {
        self.0.get_bit(OPAQUE_BIT)
    }

    #[inline(always)]
    pub fn is_transparent(self) -> bool {
        !self.is_opaque()
    }

    /// Same channels with the opacity bit forced to `opaque`.
    pub fn with_opacity(self, opaque: bool) -> Self {
        let mut raw = self.0;
        raw.set_bit(OPAQUE_BIT, opaque);
        Color(raw)
    }

    /// Per-channel average of two colors, always opaque.
    pub fn blend(self, other: Color) -> Self {
        let (a, b) = (self.to_rgb(), other.to_rgb());
        let avg = |x: u8, y: u8| ((x as u16 + y as u16) / 2) as u8;
        Color::rgb(avg(a.r, b.r), avg(a.g, b.g), avg(a.b, b.b))
    }

    /// Display-native RGBA8888; alpha is always 255.
    pub fn to_rgba8(self) -> [u8; 4] {
        let Rgb { r, g, b } = self.to_rgb();
        [r, g, b, 0xFF]
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::rgb(c.r, c.g, c.b)
    }
}

impl Debug for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Color(${:04X})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors() {
        assert_eq!(Color::rgb(0, 0, 0), Color::BLACK);
        assert_eq!(Color::rgb(255, 255, 255), Color::WHITE);
        assert!(Color::BLACK.is_opaque());
        assert!(Color::TRANSPARENT.is_transparent());
    }

    #[test]
    fn channels_land_in_their_fields() {
        assert_eq!(Color::rgb(0xFF, 0, 0).0, 0x8000 | (0x1F << 10));
        assert_eq!(Color::rgb(0, 0xFF, 0).0, 0x8000 | (0x1F << 5));
        assert_eq!(Color::rgb(0, 0, 0xFF).0, 0x8000 | 0x1F);
        assert_eq!(Color::rgb(27, 89, 156).0, 0x8000 | (3 << 10) | (11 << 5) | 19);
    }

    #[test]
    fn decode_of_encode_truncates_low_bits() {
        for v in 0..=255u8 {
            let expected = (v >> 3) << 3;
            let c = Color::rgb(v, 255 - v, v.wrapping_mul(7));
            assert!(c.is_opaque());
            assert_eq!(
                c.to_rgb(),
                Rgb { r: expected, g: ((255 - v) >> 3) << 3, b: (v.wrapping_mul(7) >> 3) << 3 }
            );
        }
    }

    #[test]
    fn full_round_trip_grid() {
        for r in (0..=255u16).step_by(5) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(3) {
                    let (r, g, b) = (r as u8, g as u8, b as u8);
                    let rgb = Color::rgb(r, g, b).to_rgb();
                    assert_eq!((rgb.r, rgb.g, rgb.b), ((r >> 3) << 3, (g >> 3) << 3, (b >> 3) << 3));
                }
            }
        }
    }

    #[test]
    fn opacity_can_be_cleared_without_touching_channels() {
        let c = Color::rgb(200, 76, 12);
        let t = c.with_opacity(false);
        assert!(t.is_transparent());
        assert_eq!(t.to_rgb(), c.to_rgb());
        assert_eq!(t.with_opacity(true), c);
    }

    #[test]
    fn blend_averages_channels() {
        let c = Color::rgb(0, 0, 0).blend(Color::rgb(200, 100, 48));
        assert_eq!(c.to_rgb(), Rgb { r: 96, g: 48, b: 24 });
        assert!(c.is_opaque());
    }

    #[test]
    fn rgba_conversion_is_fully_opaque() {
        assert_eq!(Color::WHITE.to_rgba8(), [0xF8, 0xF8, 0xF8, 0xFF]);
        assert_eq!(Color::TRANSPARENT.to_rgba8(), [0, 0, 0, 0xFF]);
    }
}
