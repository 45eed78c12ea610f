use alloc::boxed::Box;
use core::fmt::{Debug, Formatter};
use core::mem::size_of;
use core::ops::Range;
use bytemuck::{Pod, Zeroable};
use log::debug;
use crate::address::*;
use crate::color::Color;
use crate::error::{MemoryError, Result, VideoError};
use crate::memory::ByteDecorator::{Framebuffer, Palette as PaletteByte, SpriteInfo as SpriteInfoByte, SpriteMap as SpriteMapByte, Unmapped, Unreadable};
use crate::screen::FrameBuffer;
use crate::sprite::{Palette, Palettes, Sprite, SpriteInfo, SpriteInfos, SpriteMap};

/// The whole memory region. Field order is address order, so the byte view of
/// this struct is the machine's address space.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct MemoryLayout {
    pub unmapped: [u8; SPRITE_INFOS as usize],
    pub sprite_infos: SpriteInfos,
    pub sprite_map: SpriteMap,
    pub palettes: Palettes,
    pub framebuffer: FrameBuffer,
}

const _: () = assert!(size_of::<MemoryLayout>() == MEMORY_SIZE);
const _: () = assert!(core::mem::offset_of!(MemoryLayout, sprite_infos) == SPRITE_INFOS as usize);
const _: () = assert!(core::mem::offset_of!(MemoryLayout, sprite_map) == SPRITE_MAP as usize);
const _: () = assert!(core::mem::offset_of!(MemoryLayout, palettes) == PALETTES as usize);
const _: () = assert!(core::mem::offset_of!(MemoryLayout, framebuffer) == VRAM as usize);

/// A byte tagged with the zone it was read from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ByteDecorator {
    Unmapped(u8),
    SpriteInfo(u8),
    SpriteMap(u8),
    Palette(u8),
    Framebuffer(u8),
    Unreadable(u8),
}

/// Disjoint borrows of the video zones for one rasterizer pass: the source
/// tables are shared, the framebuffer is exclusive.
pub struct VideoTables<'a> {
    pub sprite_infos: &'a SpriteInfos,
    pub sprite_map: &'a SpriteMap,
    pub palettes: &'a Palettes,
    pub framebuffer: &'a mut FrameBuffer,
}

pub struct Memory {
    // heap allocation; 128K is too much for some stacks
    layout: Box<MemoryLayout>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.size())
            .field("non_zero_bytes", &self.bytes().iter().filter(|&&b| b != 0).count())
            .finish()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self { layout: bytemuck::allocation::zeroed_box() }
    }

    #[inline(always)]
    pub const fn size(&self) -> usize {
        MEMORY_SIZE
    }

    /// Zero-fills the entire region.
    pub fn clear(&mut self) {
        self.bytes_mut().fill(0);
        debug!("memory cleared ({} bytes)", MEMORY_SIZE);
    }

    #[inline(always)]
    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&*self.layout)
    }

    #[inline(always)]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::bytes_of_mut(&mut *self.layout)
    }

    #[inline(always)]
    fn span(addr: Addr, len: usize) -> core::result::Result<Range<usize>, MemoryError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(start..end),
            _ => Err(MemoryError::OutOfRange { addr, len: len as u32 }),
        }
    }

    pub fn read_byte(&self, addr: Addr) -> core::result::Result<u8, MemoryError> {
        self.read(addr)
    }

    pub fn write_byte(&mut self, addr: Addr, data: u8) -> core::result::Result<(), MemoryError> {
        self.write(addr, &data)
    }

    pub fn read_word(&self, addr: Addr) -> core::result::Result<u16, MemoryError> {
        self.read(addr)
    }

    pub fn write_word(&mut self, addr: Addr, data: u16) -> core::result::Result<(), MemoryError> {
        self.write(addr, &data)
    }

    pub fn read_dword(&self, addr: Addr) -> core::result::Result<u32, MemoryError> {
        self.read(addr)
    }

    pub fn write_dword(&mut self, addr: Addr, data: u32) -> core::result::Result<(), MemoryError> {
        self.write(addr, &data)
    }

    /// Reads any plain-data value at `addr`; the address need not be aligned.
    pub fn read<T: Pod>(&self, addr: Addr) -> core::result::Result<T, MemoryError> {
        let span = Self::span(addr, size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(&self.bytes()[span]))
    }

    pub fn write<T: Pod>(&mut self, addr: Addr, value: &T) -> core::result::Result<(), MemoryError> {
        let span = Self::span(addr, size_of::<T>())?;
        self.bytes_mut()[span].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    pub fn peek_decorated(&self, addr: Addr) -> ByteDecorator {
        let Ok(byte) = self.read_byte(addr) else {
            return Unreadable(0);
        };

        match Zone::of(addr) {
            Some(Zone::Unmapped) => Unmapped(byte),
            Some(Zone::SpriteInfos) => SpriteInfoByte(byte),
            Some(Zone::SpriteMap) => SpriteMapByte(byte),
            Some(Zone::Palettes) => PaletteByte(byte),
            Some(Zone::Framebuffer) => Framebuffer(byte),
            None => Unreadable(0),
        }
    }

    pub fn sprite_infos(&self) -> &SpriteInfos {
        &self.layout.sprite_infos
    }

    pub fn sprite_infos_mut(&mut self) -> &mut SpriteInfos {
        &mut self.layout.sprite_infos
    }

    pub fn sprites(&self) -> &SpriteMap {
        &self.layout.sprite_map
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteMap {
        &mut self.layout.sprite_map
    }

    pub fn palettes(&self) -> &Palettes {
        &self.layout.palettes
    }

    pub fn palettes_mut(&mut self) -> &mut Palettes {
        &mut self.layout.palettes
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.layout.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.layout.framebuffer
    }

    pub fn sprite_info(&self, slot: usize) -> Result<&SpriteInfo> {
        self.layout.sprite_infos.get(slot).ok_or(out_of_table("sprite info", slot, SPRITE_INFO_COUNT))
    }

    pub fn sprite_info_mut(&mut self, slot: usize) -> Result<&mut SpriteInfo> {
        self.layout.sprite_infos.get_mut(slot).ok_or(out_of_table("sprite info", slot, SPRITE_INFO_COUNT))
    }

    pub fn sprite(&self, index: usize) -> Result<&Sprite> {
        self.layout.sprite_map.get(index).ok_or(out_of_table("sprite", index, SPRITE_MAP_SIZE))
    }

    pub fn sprite_mut(&mut self, index: usize) -> Result<&mut Sprite> {
        self.layout.sprite_map.get_mut(index).ok_or(out_of_table("sprite", index, SPRITE_MAP_SIZE))
    }

    pub fn palette(&self, index: usize) -> Result<&Palette> {
        self.layout.palettes.get(index).ok_or(out_of_table("palette", index, PALETTE_COUNT))
    }

    pub fn palette_mut(&mut self, index: usize) -> Result<&mut Palette> {
        self.layout.palettes.get_mut(index).ok_or(out_of_table("palette", index, PALETTE_COUNT))
    }

    /// Writes one palette entry.
    pub fn set_palette_color(&mut self, palette: usize, entry: usize, color: Color) -> Result<()> {
        let table = self.palette_mut(palette)?;
        let slot = table.get_mut(entry).ok_or(out_of_table("palette entry", entry, PALETTE_SIZE))?;
        *slot = color;
        Ok(())
    }

    pub fn video_tables(&mut self) -> VideoTables<'_> {
        let MemoryLayout { sprite_infos, sprite_map, palettes, framebuffer, .. } = &mut *self.layout;
        VideoTables { sprite_infos, sprite_map, palettes, framebuffer }
    }
}

#[inline(always)]
pub(crate) fn out_of_table(table: &'static str, index: usize, capacity: usize) -> VideoError {
    VideoError::TableIndexOutOfRange { table, index, capacity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteSize;

    #[test]
    fn new_memory_is_zeroed() {
        let memory = Memory::new();
        assert_eq!(memory.bytes().len(), MEMORY_SIZE);
        assert!(memory.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn tables_alias_their_zones() {
        let mut memory = Memory::new();

        memory.write_word(VRAM, Color::WHITE.0).unwrap();
        assert_eq!(memory.framebuffer()[0], Color::WHITE);

        memory.palettes_mut()[1][2] = Color::rgb(200, 76, 12);
        let addr = PALETTES + ((16 + 2) * COLOR_SIZE_IN_BYTES) as Addr;
        assert_eq!(memory.read_word(addr).unwrap(), Color::rgb(200, 76, 12).0);

        memory.sprites_mut()[3].set(0, 0, 0xF).unwrap();
        assert_eq!(memory.read_byte(SPRITE_MAP + 3 * SPRITE_SIZE_IN_BYTES as Addr).unwrap(), 0xF0);

        let info = SpriteInfo::at(10, -3).with_size(SpriteSize::S16, SpriteSize::S8).enable();
        memory.write(SPRITE_INFOS + 5 * SPRITE_INFO_SIZE_IN_BYTES as Addr, &info).unwrap();
        assert_eq!(memory.sprite_infos()[5], info);
        assert_eq!(memory.read::<SpriteInfo>(SPRITE_INFOS + 40).unwrap(), info);
    }

    #[test]
    fn word_and_dword_round_trip_unaligned() {
        let mut memory = Memory::new();
        memory.write_dword(0x101, 0xDEAD_BEEF).unwrap();
        assert_eq!(memory.read_dword(0x101).unwrap(), 0xDEAD_BEEF);
        memory.write_word(0x333, 0x1234).unwrap();
        assert_eq!(memory.read_word(0x333).unwrap(), 0x1234);
        assert_eq!(memory.read_byte(0x100).unwrap(), 0);
        assert_eq!(memory.read_byte(0x105).unwrap(), 0);
    }

    #[test]
    fn out_of_range_access_fails_without_writing() {
        let mut memory = Memory::new();
        let last = (MEMORY_SIZE - 1) as Addr;

        assert!(memory.write_byte(last, 7).is_ok());
        assert_eq!(
            memory.write_word(last, 0xFFFF),
            Err(MemoryError::OutOfRange { addr: last, len: 2 })
        );
        assert_eq!(memory.read_byte(last).unwrap(), 7);
        assert!(memory.read_dword(last - 2).is_err());
        assert!(memory.read_byte(MEMORY_SIZE as Addr).is_err());
        assert!(memory.read_byte(Addr::MAX).is_err());
    }

    #[test]
    fn table_accessors_are_bounds_checked() {
        let mut memory = Memory::new();
        assert!(memory.sprite(255).is_ok());
        assert!(matches!(memory.sprite(256), Err(VideoError::TableIndexOutOfRange { index: 256, .. })));
        assert!(memory.sprite_info_mut(128).is_err());
        assert!(memory.palette(16).is_err());
        assert!(memory.set_palette_color(0, 16, Color::WHITE).is_err());
        memory.set_palette_color(15, 15, Color::WHITE).unwrap();
        assert_eq!(memory.palettes()[15][15], Color::WHITE);
    }

    #[test]
    fn clear_zeroes_every_table() {
        let mut memory = Memory::new();
        memory.bytes_mut().fill(0xA5);
        memory.clear();

        assert!(memory.palettes().iter().flatten().all(|&c| c == Color::TRANSPARENT));
        assert!(memory.sprites().iter().all(|s| s.bytes().iter().all(|&b| b == 0)));
        assert!(memory.sprite_infos().iter().all(|i| *i == SpriteInfo::default()));
        assert!(memory.framebuffer().pixels().iter().all(|&c| c.0 == 0));
    }

    #[test]
    fn decorated_peek_names_the_zone() {
        let mut memory = Memory::new();
        memory.write_byte(PALETTES, 0x42).unwrap();
        assert_eq!(memory.peek_decorated(0), Unmapped(0));
        assert_eq!(memory.peek_decorated(SPRITE_INFOS), SpriteInfoByte(0));
        assert_eq!(memory.peek_decorated(SPRITE_MAP), SpriteMapByte(0));
        assert_eq!(memory.peek_decorated(PALETTES), PaletteByte(0x42));
        assert_eq!(memory.peek_decorated(VRAM), Framebuffer(0));
        assert_eq!(memory.peek_decorated(MEMORY_SIZE as Addr), Unreadable(0));
    }
}
