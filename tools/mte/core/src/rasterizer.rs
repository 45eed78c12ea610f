use heapless::Vec;
use log::{debug, trace, warn};
use crate::address::*;
use crate::error::VideoError;
use crate::memory::VideoTables;
use crate::screen::{offset, Coord, FrameBuffer};
use crate::sprite::{Palette, SpriteInfo, SpriteInfos, SpriteMap};

// one skip entry per slot at most, and slot numbers fit the entry's u8
const _: () = assert!(core::mem::size_of::<SpriteInfos>() / SPRITE_INFO_SIZE_IN_BYTES == SPRITE_INFO_COUNT);
const _: () = assert!(SPRITE_INFO_COUNT <= u8::MAX as usize + 1);

/// What one rasterizer pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RasterReport {
    pub sprites_drawn: usize,
    pub pixels_written: usize,
    /// Opaque pixels that fell outside the framebuffer.
    pub pixels_clipped: usize,
    /// Tiles whose bitmap index ran past the end of the sprite map.
    pub tiles_skipped: usize,
    /// Enabled slots that could not be drawn at all.
    pub skipped: Vec<(u8, VideoError), SPRITE_INFO_COUNT>,
}

/// Composites every enabled sprite info into the framebuffer, in slot order,
/// so later slots land on top of earlier ones.
pub fn rasterize_sprites(tables: VideoTables<'_>) -> RasterReport {
    let VideoTables { sprite_infos, sprite_map, palettes, framebuffer } = tables;
    let mut report = RasterReport::default();

    for (slot, info) in sprite_infos.iter().enumerate() {
        if !info.is_enabled() {
            continue;
        }

        let (tiles_w, tiles_h) = match (info.width(), info.height()) {
            (Ok(w), Ok(h)) => (w.tiles(), h.tiles()),
            (Err(e), _) | (_, Err(e)) => {
                warn!(target: "rasterizer", "skipping sprite info {}: {}", slot, e);
                if report.skipped.push((slot as u8, e)).is_err() {
                    warn!(target: "rasterizer", "skip list full, slot {} not recorded", slot);
                }
                continue;
            }
        };

        trace!(target: "rasterizer", "slot {} -> {:?}", slot, info);

        let palette = &palettes[info.palette_index()];
        draw_sprite(info, tiles_w, tiles_h, sprite_map, palette, framebuffer, &mut report);
        report.sprites_drawn += 1;
    }

    debug!(target: "rasterizer", "rasterized {} sprites, wrote {} pixels ({} clipped, {} tiles skipped)",
        report.sprites_drawn,
        report.pixels_written,
        report.pixels_clipped,
        report.tiles_skipped,
    );

    report
}

fn draw_sprite(
    info: &SpriteInfo,
    tiles_w: usize,
    tiles_h: usize,
    sprite_map: &SpriteMap,
    palette: &Palette,
    framebuffer: &mut FrameBuffer,
    report: &mut RasterReport,
) {
    let flip_x = info.is_flipped_x();
    let flip_y = info.is_flipped_y();

    for ty in 0..tiles_h {
        for tx in 0..tiles_w {
            // flipping mirrors the tile order too, not just pixels within a tile
            let src_tx = if flip_x { tiles_w - 1 - tx } else { tx };
            let src_ty = if flip_y { tiles_h - 1 - ty } else { ty };

            let bitmap = info.index as usize + src_tx + src_ty * SPRITE_MAP_WIDTH;
            let Some(sprite) = sprite_map.get(bitmap) else {
                report.tiles_skipped += 1;
                continue;
            };

            let base_x = info.x as Coord + (tx * SPRITE_WIDTH) as Coord;
            let base_y = info.y as Coord + (ty * SPRITE_HEIGHT) as Coord;

            for y in 0..SPRITE_HEIGHT {
                let src_y = if flip_y { SPRITE_HEIGHT - 1 - y } else { y };

                for x in 0..SPRITE_WIDTH {
                    let src_x = if flip_x { SPRITE_WIDTH - 1 - x } else { x };

                    let color = palette[sprite.index_at(src_x, src_y) as usize];
                    if color.is_transparent() {
                        continue;
                    }

                    match offset(base_x + x as Coord, base_y + y as Coord) {
                        Some(i) => {
                            framebuffer[i] = color;
                            report.pixels_written += 1;
                        }
                        None => report.pixels_clipped += 1,
                    }
                }
            }
        }
    }
}
