//! # Address Map
//!
//! The memory region is carved up from the top of the address space downward:
//!
//! ```text
//! $00000 ┌────────────────────┐
//!        │ unmapped           │
//! $15A00 ├────────────────────┤
//!        │ sprite infos       │  128 × 8 bytes
//! $15E00 ├────────────────────┤
//!        │ sprite map         │  256 × 32 bytes
//! $17E00 ├────────────────────┤
//!        │ palettes           │  16 × 16 colors
//! $18000 ├────────────────────┤
//!        │ framebuffer (VRAM) │  128 × 128 colors
//! $20000 └────────────────────┘
//! ```

use core::ops::Range;

pub type Addr = u32;

pub const KB1: usize = 1024;
pub const KB128: usize = 1 << 17;

pub const MEMORY_SIZE: usize = KB128;
pub const SCREEN_WIDTH: usize = 128;
pub const SCREEN_HEIGHT: usize = 128;

pub const BITS_PER_COLOR_COMPONENT: u32 = 5;
pub const COLOR_SIZE_IN_BYTES: usize = 2;

pub const PALETTE_SIZE: usize = 16;
pub const PALETTE_COUNT: usize = 16;

pub const SPRITE_WIDTH: usize = 8;
pub const SPRITE_HEIGHT: usize = 8;
pub const SPRITE_MAP_WIDTH: usize = 16;
pub const SPRITE_MAP_SIZE: usize = 256;

pub const SPRITE_INFO_COUNT: usize = 128;
pub const SPRITE_INFO_SIZE_IN_BYTES: usize = 8;
pub const SPRITE_INFOS_SIZE_IN_BYTES: usize = SPRITE_INFO_COUNT * SPRITE_INFO_SIZE_IN_BYTES;

pub const BITS_PER_SPRITE_COLOR: usize = 4;
pub const BITS_PER_SPRITE_PALETTE: usize = 4;

pub const FRAMEBUFFER_SIZE_IN_BYTES: usize = SCREEN_WIDTH * SCREEN_HEIGHT * COLOR_SIZE_IN_BYTES;
pub const PALETTES_SIZE_IN_BYTES: usize = PALETTE_SIZE * PALETTE_COUNT * COLOR_SIZE_IN_BYTES;
pub const SPRITE_ROW_SIZE_IN_BYTES: usize = SPRITE_WIDTH * BITS_PER_SPRITE_COLOR / 8;
pub const SPRITE_SIZE_IN_BYTES: usize = SPRITE_HEIGHT * SPRITE_ROW_SIZE_IN_BYTES;
pub const SPRITE_MAP_SIZE_IN_BYTES: usize = SPRITE_SIZE_IN_BYTES * SPRITE_MAP_SIZE;

pub const VRAM: Addr = (MEMORY_SIZE - FRAMEBUFFER_SIZE_IN_BYTES) as Addr;
pub const PALETTES: Addr = VRAM - PALETTES_SIZE_IN_BYTES as Addr;
pub const SPRITE_MAP: Addr = PALETTES - SPRITE_MAP_SIZE_IN_BYTES as Addr;
pub const SPRITE_INFOS: Addr = SPRITE_MAP - SPRITE_INFOS_SIZE_IN_BYTES as Addr;

/// Total bytes covered by the four video zones.
pub const MAPPED_SIZE_IN_BYTES: usize =
    FRAMEBUFFER_SIZE_IN_BYTES + PALETTES_SIZE_IN_BYTES + SPRITE_MAP_SIZE_IN_BYTES + SPRITE_INFOS_SIZE_IN_BYTES;

const _: () = assert!(MAPPED_SIZE_IN_BYTES <= MEMORY_SIZE);
const _: () = assert!(SPRITE_INFOS as usize == MEMORY_SIZE - MAPPED_SIZE_IN_BYTES);
const _: () = assert!(BITS_PER_COLOR_COMPONENT * 3 < (COLOR_SIZE_IN_BYTES * 8) as u32);
const _: () = assert!((SCREEN_WIDTH * SCREEN_HEIGHT) % 2 == 0);
const _: () = assert!(SPRITE_MAP_SIZE % SPRITE_MAP_WIDTH == 0);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Zone {
    Unmapped,
    SpriteInfos,
    SpriteMap,
    Palettes,
    Framebuffer,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Unmapped,
        Zone::SpriteInfos,
        Zone::SpriteMap,
        Zone::Palettes,
        Zone::Framebuffer,
    ];

    pub const fn range(self) -> Range<Addr> {
        match self {
            Zone::Unmapped => 0..SPRITE_INFOS,
            Zone::SpriteInfos => SPRITE_INFOS..SPRITE_MAP,
            Zone::SpriteMap => SPRITE_MAP..PALETTES,
            Zone::Palettes => PALETTES..VRAM,
            Zone::Framebuffer => VRAM..MEMORY_SIZE as Addr,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Zone::Unmapped => "unmapped",
            Zone::SpriteInfos => "sprite-infos",
            Zone::SpriteMap => "sprite-map",
            Zone::Palettes => "palettes",
            Zone::Framebuffer => "framebuffer",
        }
    }

    /// Zone containing `addr`, or `None` past the end of memory.
    pub fn of(addr: Addr) -> Option<Zone> {
        Zone::ALL.into_iter().find(|zone| zone.range().contains(&addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zones_are_laid_out_from_the_top_down() {
        assert_eq!(VRAM, 0x18000);
        assert_eq!(PALETTES, 0x17E00);
        assert_eq!(SPRITE_MAP, 0x15E00);
        assert_eq!(SPRITE_INFOS, 0x15A00);
    }

    #[test]
    fn zones_are_contiguous_and_cover_memory() {
        let mut next = 0;
        for zone in Zone::ALL {
            let range = zone.range();
            assert_eq!(range.start, next, "{} starts at a gap", zone.name());
            next = range.end;
        }
        assert_eq!(next as usize, MEMORY_SIZE);
    }

    #[test]
    fn zone_lookup_by_address() {
        assert_eq!(Zone::of(0), Some(Zone::Unmapped));
        assert_eq!(Zone::of(SPRITE_INFOS), Some(Zone::SpriteInfos));
        assert_eq!(Zone::of(SPRITE_MAP - 1), Some(Zone::SpriteInfos));
        assert_eq!(Zone::of(PALETTES + 3), Some(Zone::Palettes));
        assert_eq!(Zone::of(MEMORY_SIZE as Addr - 1), Some(Zone::Framebuffer));
        assert_eq!(Zone::of(MEMORY_SIZE as Addr), None);
    }
}
