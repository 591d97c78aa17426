//! Rectangle and width/height/format value types.
//!
//! Both types are `Copy`: they are passed by value, combined, and returned.
//! Nothing in this module holds a reference to pipe state.

use super::format::PixelFormat;

/// A rectangle in pixel coordinates: origin `(x, y)` and size `w × h`.
///
/// Used for the source crop rectangle (in source-buffer coordinates) and for
/// the destination rectangle (in screen coordinates).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dim {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Dim {
    /// Creates a rectangle from its origin and size.
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the rightmost X coordinate (exclusive).
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.w)
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.h)
    }

    /// Returns `true` if the rectangle lies entirely inside a
    /// `width × height` area anchored at the origin.
    ///
    /// Edges are computed in 64-bit so that `x + w` cannot wrap.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= u64::from(width) && self.bottom() <= u64::from(height)
    }

    /// Returns a copy with width and height exchanged; the origin is kept.
    pub fn swapped(self) -> Self {
        Self {
            w: self.h,
            h: self.w,
            ..self
        }
    }
}

/// Width, height and pixel format of a source buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Whf {
    /// Buffer width in pixels.
    pub w: u32,
    /// Buffer height in pixels.
    pub h: u32,
    /// Pixel layout of the buffer.
    pub format: PixelFormat,
}

impl Whf {
    /// Creates a new width/height/format tuple.
    pub const fn new(w: u32, h: u32, format: PixelFormat) -> Self {
        Self { w, h, format }
    }

    /// Returns a copy with width and height exchanged; the format is kept.
    pub fn swapped(self) -> Self {
        Self {
            w: self.h,
            h: self.w,
            ..self
        }
    }
}

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two; `0` and `1` return `value` unchanged.
/// A value whose next multiple does not fit in `u32` is also returned
/// unchanged.
pub fn align_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        return value;
    }
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    match value.checked_add(align - 1) {
        Some(padded) => padded & !(align - 1),
        None => value,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
