use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Display, Formatter};
use log::{debug, info};
use crate::address::*;
use crate::color::Color;
use crate::error::Result;
use crate::memory::{out_of_table, Memory};
use crate::rasterizer::{rasterize_sprites, RasterReport};
use crate::screen::Screen;
use crate::sprite::{DigitMapping, Palettes, Sprite, SpriteInfo, SpriteInfos, SpriteMap, SpriteSize};

/// Background of the demo scene.
pub const DEMO_BACKGROUND: Color = Color::rgb(27, 89, 156);

pub struct Machine {
    memory: Memory,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Machine {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let enabled = self.sprite_infos().iter().filter(|i| i.is_enabled()).count();
        f.debug_struct("Machine")
            .field("memory", &self.memory)
            .field("enabled_sprites", &enabled)
            .finish()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self { memory: Memory::new() }
    }

    pub fn reset(&mut self) {
        self.memory.clear();
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn screen(&mut self) -> Screen<'_> {
        Screen::new(self.memory.framebuffer_mut())
    }

    pub fn palettes(&self) -> &Palettes {
        self.memory.palettes()
    }

    pub fn palettes_mut(&mut self) -> &mut Palettes {
        self.memory.palettes_mut()
    }

    pub fn sprites(&self) -> &SpriteMap {
        self.memory.sprites()
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteMap {
        self.memory.sprites_mut()
    }

    pub fn sprite_infos(&self) -> &SpriteInfos {
        self.memory.sprite_infos()
    }

    pub fn sprite_infos_mut(&mut self) -> &mut SpriteInfos {
        self.memory.sprite_infos_mut()
    }

    pub fn rasterize_sprites(&mut self) -> RasterReport {
        rasterize_sprites(self.memory.video_tables())
    }

    /// Writes a scene into memory. Everything is validated first, so a scene
    /// that fails to load leaves memory untouched.
    pub fn load_scene(&mut self, scene: &Scene<'_>) -> Result<()> {
        let mut decoded = Vec::with_capacity(scene.bitmaps.len());
        for bitmap in &scene.bitmaps {
            if bitmap.index >= SPRITE_MAP_SIZE {
                return Err(out_of_table("sprite", bitmap.index, SPRITE_MAP_SIZE));
            }
            decoded.push((bitmap.index, bitmap.decode(scene.mapping)?));
        }
        for c in &scene.colors {
            if c.palette >= PALETTE_COUNT {
                return Err(out_of_table("palette", c.palette, PALETTE_COUNT));
            }
            if c.entry >= PALETTE_SIZE {
                return Err(out_of_table("palette entry", c.entry, PALETTE_SIZE));
            }
        }
        for &(slot, _) in &scene.sprite_infos {
            if slot >= SPRITE_INFO_COUNT {
                return Err(out_of_table("sprite info", slot, SPRITE_INFO_COUNT));
            }
        }

        for c in &scene.colors {
            self.memory.palettes_mut()[c.palette][c.entry] = c.color;
        }
        for (index, sprite) in decoded {
            self.memory.sprites_mut()[index] = sprite;
        }
        for &(slot, info) in &scene.sprite_infos {
            debug!("slot {}: {:?}", slot, info);
            self.memory.sprite_infos_mut()[slot] = info;
        }

        info!("loaded scene: {} colors, {} bitmaps, {} sprite infos",
            scene.colors.len(),
            scene.bitmaps.len(),
            scene.sprite_infos.len(),
        );
        Ok(())
    }

    pub fn memory_map(&self) -> MemoryMap {
        MemoryMap::default()
    }
}

/// One palette entry of a [`Scene`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PaletteColor {
    pub palette: usize,
    pub entry: usize,
    pub color: Color,
}

/// A sprite bitmap given as eight rows of eight digits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bitmap<'a> {
    pub index: usize,
    pub rows: [&'a str; SPRITE_HEIGHT],
}

impl Bitmap<'_> {
    pub fn decode(&self, mapping: DigitMapping) -> Result<Sprite> {
        let mut sprite = Sprite::default();
        for (y, row) in self.rows.iter().enumerate() {
            sprite.set_row_str_with(y, row, mapping)?;
        }
        Ok(sprite)
    }
}

/// Initialization data for a machine: palette entries, bitmaps and sprite
/// infos by slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scene<'a> {
    pub mapping: DigitMapping,
    pub colors: Vec<PaletteColor>,
    pub bitmaps: Vec<Bitmap<'a>>,
    pub sprite_infos: Vec<(usize, SpriteInfo)>,
}

impl Scene<'static> {
    /// A 16×16 mushroom built from bitmaps 0, 1, 16 and 17, shown upside
    /// down in slot 0.
    pub fn demo() -> Self {
        Scene {
            mapping: DigitMapping::Literal,
            colors: vec![
                PaletteColor { palette: 0, entry: 1, color: Color::rgb(200, 76, 12) },
                PaletteColor { palette: 0, entry: 2, color: Color::rgb(252, 188, 176) },
                PaletteColor { palette: 0, entry: 3, color: Color::rgb(0, 0, 0) },
            ],
            bitmaps: vec![
                Bitmap { index: 0, rows: [
                    "00000011", "00000111", "00001111", "00033111",
                    "00112311", "01112311", "01112333", "11112321",
                ] },
                Bitmap { index: 1, rows: [
                    "11000000", "11100000", "11110000", "11133000",
                    "11321100", "11321110", "33321110", "12321111",
                ] },
                Bitmap { index: 16, rows: [
                    "11112221", "11111111", "01111222", "00002222",
                    "00002222", "00033222", "00033322", "00003330",
                ] },
                Bitmap { index: 17, rows: [
                    "12221111", "11111111", "22211110", "22220000",
                    "22223300", "22333330", "23333330", "03333300",
                ] },
            ],
            sprite_infos: vec![(
                0,
                SpriteInfo::at(10, 10)
                    .with_size(SpriteSize::S16, SpriteSize::S16)
                    .with_flip(false, true)
                    .enable(),
            )],
        }
    }
}

/// Sizes and addresses of the memory layout, as printed at startup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryMap {
    pub total: usize,
    pub framebuffer: usize,
    pub palettes: usize,
    pub sprite: usize,
    pub sprite_map: usize,
    pub sprite_info: usize,
    pub sprite_infos: usize,
    pub mapped: usize,
    /// Mapped zones, in reverse name order.
    pub zones: [Zone; 4],
}

impl Default for MemoryMap {
    fn default() -> Self {
        let mut zones = [Zone::SpriteInfos, Zone::SpriteMap, Zone::Palettes, Zone::Framebuffer];
        zones.sort_unstable_by(|a, b| b.name().cmp(a.name()));

        Self {
            total: MEMORY_SIZE,
            framebuffer: FRAMEBUFFER_SIZE_IN_BYTES,
            palettes: PALETTES_SIZE_IN_BYTES,
            sprite: SPRITE_SIZE_IN_BYTES,
            sprite_map: SPRITE_MAP_SIZE_IN_BYTES,
            sprite_info: SPRITE_INFO_SIZE_IN_BYTES,
            sprite_infos: SPRITE_INFOS_SIZE_IN_BYTES,
            mapped: MAPPED_SIZE_IN_BYTES,
            zones,
        }
    }
}

/// Byte count, with the KiB size appended for whole kilobytes.
struct Bytes(usize);

impl Display for Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} bytes", self.0)?;
        if self.0 >= KB1 && self.0 % KB1 == 0 {
            write!(f, " ({} KiB)", self.0 / KB1)?;
        }
        Ok(())
    }
}

impl Display for MemoryMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Total memory: {}", Bytes(self.total))?;
        writeln!(f, "Framebuffer size: {}", Bytes(self.framebuffer))?;
        writeln!(f, "Palettes size: {}", Bytes(self.palettes))?;
        writeln!(f, "Sprite size: {}", Bytes(self.sprite))?;
        writeln!(f, "Sprite map size: {}", Bytes(self.sprite_map))?;
        writeln!(f, "Sprite info size: {}", Bytes(self.sprite_info))?;
        writeln!(f, "Sprite infos size: {}", Bytes(self.sprite_infos))?;
        writeln!(f, "Mapped memory: {}", Bytes(self.mapped))?;
        for (i, zone) in self.zones.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "Address {:08x}: {}", zone.range().start, zone.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use crate::error::VideoError;

    #[test]
    fn reset_zeroes_everything() {
        let mut machine = Machine::new();
        machine.load_scene(&Scene::demo()).unwrap();
        machine.screen().fill(DEMO_BACKGROUND);
        machine.reset();
        assert!(machine.memory().bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn demo_scene_matches_its_fixture() {
        let mut machine = Machine::new();
        machine.load_scene(&Scene::demo()).unwrap();

        assert_eq!(machine.palettes()[0][1], Color::rgb(200, 76, 12));
        assert_eq!(machine.palettes()[0][3], Color::BLACK);
        assert!(machine.palettes()[0][0].is_transparent());

        let mut expected = Sprite::default();
        expected.set_rows(&[
            [0, 0, 0, 0, 0, 0, 1, 1],
            [0, 0, 0, 0, 0, 1, 1, 1],
            [0, 0, 0, 0, 1, 1, 1, 1],
            [0, 0, 0, 3, 3, 1, 1, 1],
            [0, 0, 1, 1, 2, 3, 1, 1],
            [0, 1, 1, 1, 2, 3, 1, 1],
            [0, 1, 1, 1, 2, 3, 3, 3],
            [1, 1, 1, 1, 2, 3, 2, 1],
        ]).unwrap();
        assert_eq!(machine.sprites()[0], expected);

        let info = machine.sprite_infos()[0];
        assert!(info.is_enabled());
        assert!(info.is_flipped_y());
        assert!(!info.is_flipped_x());
        assert_eq!((info.x, info.y), (10, 10));
        assert_eq!(info.width().unwrap(), SpriteSize::S16);
        assert!(machine.sprite_infos()[1..].iter().all(|i| !i.is_enabled()));
    }

    #[test]
    fn invalid_scene_leaves_memory_untouched() {
        let mut machine = Machine::new();

        let mut scene = Scene::demo();
        scene.bitmaps[3].rows[5] = "2233333x";
        assert_eq!(
            machine.load_scene(&scene),
            Err(VideoError::BadDigit { found: 'x', position: 7 })
        );

        let mut scene = Scene::demo();
        scene.sprite_infos.push((128, SpriteInfo::default()));
        assert!(matches!(
            machine.load_scene(&scene),
            Err(VideoError::TableIndexOutOfRange { index: 128, capacity: 128, .. })
        ));

        let mut scene = Scene::demo();
        scene.colors[0].entry = 16;
        assert!(machine.load_scene(&scene).is_err());

        assert!(machine.memory().bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn hex_scenes_decode_letters() {
        let mut machine = Machine::new();
        let scene = Scene {
            mapping: DigitMapping::Hex,
            bitmaps: vec![Bitmap { index: 255, rows: ["FEDCBA98"; SPRITE_HEIGHT] }],
            ..Default::default()
        };
        machine.load_scene(&scene).unwrap();
        assert_eq!(machine.sprites()[255].get(0, 7).unwrap(), 15);
        assert_eq!(machine.sprites()[255].get(5, 0).unwrap(), 10);
    }

    #[test]
    fn rasterize_through_the_machine() {
        let mut machine = Machine::new();
        machine.screen().fill(DEMO_BACKGROUND);
        machine.load_scene(&Scene::demo()).unwrap();

        let report = machine.rasterize_sprites();

        assert_eq!(report.sprites_drawn, 1);
        assert!(report.skipped.is_empty());
        // flipped on Y: bitmap 16 is on top, upside down
        let fb = machine.memory().framebuffer();
        assert_eq!(fb.get(10, 10), Some(DEMO_BACKGROUND));
        assert_eq!(fb.get(14, 10), Some(Color::BLACK));
        assert_eq!(fb.get(10, 17), Some(Color::rgb(200, 76, 12)));
    }

    #[test]
    fn memory_map_report() {
        let map = Machine::new().memory_map();
        assert_eq!(map.mapped, MEMORY_SIZE - SPRITE_INFOS as usize);
        assert_eq!(map.zones, [Zone::SpriteMap, Zone::SpriteInfos, Zone::Palettes, Zone::Framebuffer]);

        let text = map.to_string();
        assert!(text.starts_with("Total memory: 131072 bytes (128 KiB)\n"));
        assert!(text.contains("Framebuffer size: 32768 bytes (32 KiB)\n"));
        assert!(text.contains("Sprite map size: 8192 bytes (8 KiB)\n"));
        assert!(text.contains("Palettes size: 512 bytes\n"));
        assert!(text.contains("Sprite infos size: 1024 bytes (1 KiB)\n"));
        assert!(text.contains("Mapped memory: 42496 bytes\n"));
        assert!(text.contains("Address 00015e00: sprite-map\nAddress 00015a00: sprite-infos"));
        assert!(text.ends_with("Address 00018000: framebuffer"));
    }
}
