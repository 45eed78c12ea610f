use thiserror::Error;

pub type Result<T> = core::result::Result<T, VideoError>;

/// Raised by the address-based accessors of [`Memory`](crate::memory::Memory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("access of {len} byte(s) at ${addr:05X} is outside the memory region")]
    OutOfRange { addr: u32, len: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VideoError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("pixel ({x}, {y}) is outside a {width}x{height} grid")]
    PixelOutOfRange { x: i32, y: i32, width: i32, height: i32 },

    #[error("color index {0} does not fit in 4 bits")]
    ColorIndexOutOfRange(u8),

    #[error("{table} index {index} is out of range (capacity {capacity})")]
    TableIndexOutOfRange { table: &'static str, index: usize, capacity: usize },

    #[error("expected {expected} digits, got {actual}")]
    BadLength { expected: usize, actual: usize },

    #[error("character {found:?} at position {position} is not a color digit")]
    BadDigit { found: char, position: usize },

    #[error("invalid sprite size class {0}")]
    BadSizeClass(u8),
}
