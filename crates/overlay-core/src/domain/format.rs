//! MDP pixel formats and the format-indexed tables used when a rotator sits
//! in front of an overlay pipe.
//!
//! # Why does a rotator change the source format?
//!
//! When a rotator pre-rotates the buffer, the overlay pipe no longer reads the
//! original buffer: it reads the rotator's *output*.  Tiled layouts are
//! de-tiled on the way through, and some planar layouts are repacked, so the
//! pipe must be told the format the rotator actually writes.
//!
//! Tiled layouts also require the buffer dimensions to be padded to the tile
//! size before they reach the rotator.  Both facts are table-driven so that new
//! formats can be added without touching the controller.

/// A pixel format as encoded by the MDP kernel interface (`MDP_*` image types).
///
/// Kept as a raw newtype rather than an enum because the device reports
/// formats back verbatim on readback, including values this crate does not
/// name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    pub const RGB_565: Self = Self(0);
    pub const XRGB_8888: Self = Self(1);
    pub const Y_CBCR_H2V2: Self = Self(2);
    pub const Y_CBCR_H2V2_ADRENO: Self = Self(3);
    pub const ARGB_8888: Self = Self(4);
    pub const RGB_888: Self = Self(5);
    pub const Y_CRCB_H2V2: Self = Self(6);
    pub const YCRYCB_H2V1: Self = Self(7);
    pub const Y_CRCB_H2V1: Self = Self(8);
    pub const Y_CBCR_H2V1: Self = Self(9);
    pub const Y_CRCB_H1V2: Self = Self(10);
    pub const Y_CBCR_H1V2: Self = Self(11);
    pub const RGBA_8888: Self = Self(12);
    pub const BGRA_8888: Self = Self(13);
    pub const RGBX_8888: Self = Self(14);
    /// 4:2:0 semi-planar, Cr/Cb interleaved, 64×32 macro-tiles.
    pub const Y_CRCB_H2V2_TILE: Self = Self(15);
    /// 4:2:0 semi-planar, Cb/Cr interleaved, 64×32 macro-tiles.
    pub const Y_CBCR_H2V2_TILE: Self = Self(16);
    pub const Y_CR_CB_H2V2: Self = Self(17);
    pub const Y_CR_CB_GH2V2: Self = Self(18);
    pub const Y_CB_CR_H2V2: Self = Self(19);
    pub const Y_CRCB_H1V1: Self = Self(20);
    pub const Y_CBCR_H1V1: Self = Self(21);

    /// Returns the tile size this format must be padded to before it is fed
    /// to a rotator, or `None` if the format is linear.
    pub fn tile_alignment(self) -> Option<TileAlignment> {
        TILE_ALIGNMENT
            .iter()
            .find(|(fmt, _)| *fmt == self)
            .map(|(_, align)| *align)
    }

    /// Returns the format a rotator writes when given a buffer in this format.
    ///
    /// Formats absent from the table pass through unchanged.
    pub fn rotator_output(self) -> Self {
        ROTATOR_OUTPUT
            .iter()
            .find(|(input, _)| *input == self)
            .map_or(self, |(_, output)| *output)
    }

    /// Returns `true` for the macro-tiled layouts.
    pub fn is_tiled(self) -> bool {
        self.tile_alignment().is_some()
    }
}

/// Width and height granularity required by a tiled layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAlignment {
    /// Width must be a multiple of this many pixels.
    pub width: u32,
    /// Height must be a multiple of this many lines.
    pub height: u32,
}

/// Formats that need dimension padding when a rotator is in use.
///
/// Only the two 4:2:0 macro-tiled layouts are known to need it.  Other layouts
/// may have analogous constraints on some hardware revisions; add them here.
const TILE_ALIGNMENT: &[(PixelFormat, TileAlignment)] = &[
    (
        PixelFormat::Y_CRCB_H2V2_TILE,
        TileAlignment {
            width: 64,
            height: 32,
        },
    ),
    (
        PixelFormat::Y_CBCR_H2V2_TILE,
        TileAlignment {
            width: 64,
            height: 32,
        },
    ),
];

/// Rotator input format → rotator output format.
const ROTATOR_OUTPUT: &[(PixelFormat, PixelFormat)] = &[
    (PixelFormat::Y_CRCB_H2V2_TILE, PixelFormat::Y_CRCB_H2V2),
    (PixelFormat::Y_CBCR_H2V2_TILE, PixelFormat::Y_CBCR_H2V2),
    (PixelFormat::Y_CB_CR_H2V2, PixelFormat::Y_CBCR_H2V2),
    (PixelFormat::Y_CR_CB_GH2V2, PixelFormat::Y_CRCB_H2V2),
];

// ── Tests ─────────────────────────────────────────────────────────────────────
