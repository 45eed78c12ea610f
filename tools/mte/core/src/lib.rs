#![no_std]
#![allow(clippy::disallowed_methods, clippy::single_match)]
extern crate alloc;

pub mod address;
pub mod color;
pub mod error;
pub mod machine;
pub mod memory;
pub mod rasterizer;
pub mod screen;
pub mod sprite;

pub use color::{Color, Rgb};
pub use error::{MemoryError, Result, VideoError};
pub use machine::{Bitmap, Machine, MemoryMap, PaletteColor, Scene, DEMO_BACKGROUND};
pub use memory::{Memory, VideoTables};
pub use rasterizer::{rasterize_sprites, RasterReport};
pub use screen::{Coord, FrameBuffer, Screen};
pub use sprite::{DigitMapping, Sprite, SpriteInfo, SpriteSize};
