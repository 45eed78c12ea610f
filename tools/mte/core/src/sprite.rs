//! # Sprites, Palettes and Sprite Infos
//!
//! A sprite is an 8×8 bitmap of 4-bit palette indices, packed two pixels per
//! byte with the left pixel in the high nibble:
//!
//! ```text
//! byte:    7 6 5 4 3 2 1 0
//!          └─ x=0 ─┘└─ x=1 ─┘
//! ```
//!
//! The sprite map holds 256 sprites and is addressed as a grid 16 sprites
//! wide, so a 16×16 sprite starting at index `i` uses bitmaps `i`, `i+1`,
//! `i+16` and `i+17`.
//!
//! A [`SpriteInfo`] places bitmaps on screen: position, per-axis size class,
//! flip flags, first bitmap index and palette selector.

use core::fmt::{Debug, Formatter};
use bit_field::BitField;
use bitfield::bitfield;
use bytemuck::{Pod, Zeroable};
use crate::address::*;
use crate::color::Color;
use crate::error::{Result, VideoError};

pub type Palette = [Color; PALETTE_SIZE];
pub type Palettes = [Palette; PALETTE_COUNT];
pub type SpriteMap = [Sprite; SPRITE_MAP_SIZE];
pub type SpriteInfos = [SpriteInfo; SPRITE_INFO_COUNT];

const PIXELS_PER_SPRITE: usize = SPRITE_WIDTH * SPRITE_HEIGHT;
const MAX_COLOR_INDEX: u8 = (1 << BITS_PER_SPRITE_COLOR) - 1;
const PALETTE_SELECTOR_MASK: u8 = (1 << BITS_PER_SPRITE_PALETTE) - 1;

/// How text fixtures map characters to color indices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DigitMapping {
    /// Every character is `c - '0'`: `'0'..='9'` give 0-9 and `':'..='?'`
    /// give 10-15. Letters are out of alphabet.
    #[default]
    Literal,
    /// Hexadecimal digits, either case.
    Hex,
}

impl DigitMapping {
    pub fn decode(self, c: char) -> Option<u8> {
        match self {
            DigitMapping::Literal => {
                let v = (c as u32).checked_sub('0' as u32)?;
                (v <= MAX_COLOR_INDEX as u32).then_some(v as u8)
            }
            DigitMapping::Hex => c.to_digit(16).map(|d| d as u8),
        }
    }

    /// Decodes exactly `N` digits, validating everything before returning.
    fn decode_all<const N: usize>(self, text: &str) -> Result<[u8; N]> {
        let actual = text.chars().count();
        if actual != N {
            return Err(VideoError::BadLength { expected: N, actual });
        }

        let mut out = [0u8; N];
        for (position, (slot, c)) in out.iter_mut().zip(text.chars()).enumerate() {
            *slot = self.decode(c).ok_or(VideoError::BadDigit { found: c, position })?;
        }
        Ok(out)
    }
}

#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Sprite([u8; SPRITE_SIZE_IN_BYTES]);

impl Sprite {
    /// Parses a whole sprite from 64 digits, rows top to bottom.
    pub fn parse(text: &str, mapping: DigitMapping) -> Result<Self> {
        let mut sprite = Sprite::default();
        sprite.set_str_with(text, mapping)?;
        Ok(sprite)
    }

    pub fn bytes(&self) -> &[u8; SPRITE_SIZE_IN_BYTES] {
        &self.0
    }

    pub fn row(&self, y: usize) -> Result<&[u8]> {
        check_coord(0, y)?;
        let start = y * SPRITE_ROW_SIZE_IN_BYTES;
        Ok(&self.0[start..start + SPRITE_ROW_SIZE_IN_BYTES])
    }

    pub fn set_linear(&mut self, i: usize, color: u8) -> Result<()> {
        if i >= PIXELS_PER_SPRITE {
            return Err(VideoError::PixelOutOfRange {
                x: (i % SPRITE_WIDTH) as i32,
                y: (i / SPRITE_WIDTH) as i32,
                width: SPRITE_WIDTH as i32,
                height: SPRITE_HEIGHT as i32,
            });
        }
        check_color(color)?;
        self.put(i, color);
        Ok(())
    }

    pub fn set(&mut self, x: usize, y: usize, color: u8) -> Result<()> {
        check_coord(x, y)?;
        check_color(color)?;
        self.put(x + y * SPRITE_WIDTH, color);
        Ok(())
    }

    pub fn get(&self, x: usize, y: usize) -> Result<u8> {
        check_coord(x, y)?;
        Ok(self.index_at(x, y))
    }

    pub fn set_row(&mut self, y: usize, row: &[u8; SPRITE_WIDTH]) -> Result<()> {
        check_coord(0, y)?;
        row.iter().try_for_each(|&c| check_color(c))?;
        for (x, &color) in row.iter().enumerate() {
            self.put(x + y * SPRITE_WIDTH, color);
        }
        Ok(())
    }

    pub fn set_rows(&mut self, rows: &[[u8; SPRITE_WIDTH]; SPRITE_HEIGHT]) -> Result<()> {
        rows.iter().flatten().try_for_each(|&c| check_color(c))?;
        for (y, row) in rows.iter().enumerate() {
            self.set_row(y, row)?;
        }
        Ok(())
    }

    pub fn set_row_str(&mut self, y: usize, text: &str) -> Result<()> {
        self.set_row_str_with(y, text, DigitMapping::default())
    }

    pub fn set_row_str_with(&mut self, y: usize, text: &str, mapping: DigitMapping) -> Result<()> {
        check_coord(0, y)?;
        let row = mapping.decode_all::<SPRITE_WIDTH>(text)?;
        self.set_row(y, &row)
    }

    pub fn set_str(&mut self, text: &str) -> Result<()> {
        self.set_str_with(text, DigitMapping::default())
    }

    pub fn set_str_with(&mut self, text: &str, mapping: DigitMapping) -> Result<()> {
        let pixels = mapping.decode_all::<PIXELS_PER_SPRITE>(text)?;
        for (i, &color) in pixels.iter().enumerate() {
            self.put(i, color);
        }
        Ok(())
    }

    /// Unchecked read for callers that iterate the 8×8 grid themselves.
    #[inline(always)]
    pub(crate) fn index_at(&self, x: usize, y: usize) -> u8 {
        let byte = self.0[y * SPRITE_ROW_SIZE_IN_BYTES + x / 2];
        if x % 2 == 0 {
            byte.get_bits(4..8)
        } else {
            byte.get_bits(0..4)
        }
    }

    #[inline(always)]
    fn put(&mut self, i: usize, color: u8) {
        let byte = &mut self.0[i / 2];
        if i % 2 == 0 {
            byte.set_bits(4..8, color);
        } else {
            byte.set_bits(0..4, color);
        }
    }
}

impl Debug for Sprite {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Sprite[")?;
        for y in 0..SPRITE_HEIGHT {
            if y > 0 {
                write!(f, " ")?;
            }
            for x in 0..SPRITE_WIDTH {
                write!(f, "{:X}", self.index_at(x, y))?;
            }
        }
        write!(f, "]")
    }
}

#[inline(always)]
fn check_coord(x: usize, y: usize) -> Result<()> {
    if x >= SPRITE_WIDTH || y >= SPRITE_HEIGHT {
        return Err(VideoError::PixelOutOfRange {
            x: x as i32,
            y: y as i32,
            width: SPRITE_WIDTH as i32,
            height: SPRITE_HEIGHT as i32,
        });
    }
    Ok(())
}

#[inline(always)]
fn check_color(color: u8) -> Result<()> {
    if color > MAX_COLOR_INDEX {
        return Err(VideoError::ColorIndexOutOfRange(color));
    }
    Ok(())
}

/// Per-axis size class.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpriteSize {
    #[default]
    S8 = 0,
    S16 = 1,
    S24 = 2,
    S32 = 3,
    S48 = 4,
    S64 = 5,
}

impl SpriteSize {
    /// Number of 8-pixel tiles along the axis.
    pub const fn tiles(self) -> usize {
        match self {
            SpriteSize::S8 => 1,
            SpriteSize::S16 => 2,
            SpriteSize::S24 => 3,
            SpriteSize::S32 => 4,
            SpriteSize::S48 => 6,
            SpriteSize::S64 => 8,
        }
    }

    pub const fn pixels(self) -> usize {
        self.tiles() * SPRITE_WIDTH
    }
}

impl TryFrom<u8> for SpriteSize {
    type Error = VideoError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(SpriteSize::S8),
            1 => Ok(SpriteSize::S16),
            2 => Ok(SpriteSize::S24),
            3 => Ok(SpriteSize::S32),
            4 => Ok(SpriteSize::S48),
            5 => Ok(SpriteSize::S64),
            _ => Err(VideoError::BadSizeClass(raw)),
        }
    }
}

// the largest grid must fit within one row of the map and within the map itself
const _: () = assert!(SpriteSize::S64.tiles() <= SPRITE_MAP_WIDTH);
const _: () = assert!(SpriteSize::S64.tiles() * SPRITE_MAP_WIDTH <= SPRITE_MAP_SIZE);

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SpriteFlags(u8);
    impl Debug;
    pub enabled, set_enabled: 0;
    pub flip_x, set_flip_x: 1;
    pub flip_y, set_flip_y: 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SizeClasses(u8);
    impl Debug;
    pub u8, width_class, set_width_class: 3, 0;
    pub u8, height_class, set_height_class: 7, 4;
}

/// Sprite placement descriptor, 8 bytes in the sprite-info zone.
#[repr(C)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SpriteInfo {
    pub x: i16,
    pub y: i16,
    pub flags: u8,
    pub size: u8,
    pub index: u8,
    pub palette: u8,
}

const _: () = assert!(core::mem::size_of::<SpriteInfo>() == SPRITE_INFO_SIZE_IN_BYTES);
const _: () = assert!(core::mem::size_of::<Sprite>() == SPRITE_SIZE_IN_BYTES);
const _: () = assert!(core::mem::size_of::<Palettes>() == PALETTES_SIZE_IN_BYTES);
const _: () = assert!(core::mem::size_of::<SpriteMap>() == SPRITE_MAP_SIZE_IN_BYTES);

impl SpriteInfo {
    /// A disabled 8×8 descriptor at `(x, y)` using bitmap 0 and palette 0.
    pub fn at(x: i16, y: i16) -> Self {
        Self { x, y, ..Default::default() }
    }

    pub fn with_size(mut self, width: SpriteSize, height: SpriteSize) -> Self {
        self.set_size(width, height);
        self
    }

    pub fn with_bitmap(mut self, index: u8) -> Self {
        self.index = index;
        self
    }

    pub fn with_palette(mut self, palette: u8) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_flip(mut self, flip_x: bool, flip_y: bool) -> Self {
        self.update_flags(|f| {
            f.set_flip_x(flip_x);
            f.set_flip_y(flip_y);
        });
        self
    }

    pub fn enable(mut self) -> Self {
        self.set_enabled(true);
        self
    }

    #[inline(always)]
    pub fn flag_bits(&self) -> SpriteFlags {
        SpriteFlags(self.flags)
    }

    fn update_flags(&mut self, f: impl FnOnce(&mut SpriteFlags)) {
        let mut flags = self.flag_bits();
        f(&mut flags);
        self.flags = flags.0;
    }

    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        self.flag_bits().enabled()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.update_flags(|f| f.set_enabled(enabled));
    }

    #[inline(always)]
    pub fn is_flipped_x(&self) -> bool {
        self.flag_bits().flip_x()
    }

    #[inline(always)]
    pub fn is_flipped_y(&self) -> bool {
        self.flag_bits().flip_y()
    }

    pub fn set_flip_x(&mut self, flip: bool) {
        self.update_flags(|f| f.set_flip_x(flip));
    }

    pub fn set_flip_y(&mut self, flip: bool) {
        self.update_flags(|f| f.set_flip_y(flip));
    }

    pub fn toggle_flip_y(&mut self) {
        let flipped = self.is_flipped_y();
        self.set_flip_y(!flipped);
    }

    pub fn width(&self) -> Result<SpriteSize> {
        SpriteSize::try_from(SizeClasses(self.size).width_class())
    }

    pub fn height(&self) -> Result<SpriteSize> {
        SpriteSize::try_from(SizeClasses(self.size).height_class())
    }

    pub fn set_size(&mut self, width: SpriteSize, height: SpriteSize) {
        let mut classes = SizeClasses(0);
        classes.set_width_class(width as u8);
        classes.set_height_class(height as u8);
        self.size = classes.0;
    }

    /// Palette table selected by this descriptor; only the low 4 bits count.
    #[inline(always)]
    pub fn palette_index(&self) -> usize {
        (self.palette & PALETTE_SELECTOR_MASK) as usize
    }
}

impl Debug for SpriteInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpriteInfo")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("flags", &self.flag_bits())
            .field("size", &SizeClasses(self.size))
            .field("index", &self.index)
            .field("palette", &self.palette)
            .finish()
    }
}
