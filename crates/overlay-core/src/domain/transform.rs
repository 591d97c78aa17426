//! Overlay orientations and the crop-rectangle rotation math.
//!
//! # Orientation encoding
//!
//! Callers describe orientation with the HAL transform bits
//! (`FLIP_H = 0x1`, `FLIP_V = 0x2`, `ROT_90 = 0x4`).  Only eight combinations
//! are meaningful; they decode into the closed [`Transform`] enum.  Anything
//! else is rejected at decode time with [`TransformError::Unsupported`], so
//! code that holds a `Transform` never has to handle an "unknown" case.
//!
//! # Crop rotation
//!
//! With a 90° rotation the pipe reads the source buffer sideways, so the crop
//! rectangle has to be re-expressed in the rotated buffer's coordinates:
//!
//! ```text
//!   rotate 90:   x' = (H - y) - h     y' = x      (w, h) -> (h, w)
//!   rotate 270:  y' = (W - x) - w     x' = y      (w, h) -> (h, w)
//! ```
//!
//! `W × H` is the source buffer size.  The buffer size is swapped too.

use thiserror::Error;

use super::flags::MdpFlags;
use super::geometry::{Dim, Whf};

/// Errors produced while decoding raw transform bits.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The bit pattern does not correspond to any supported orientation.
    #[error("unsupported transform bits {0:#x}")]
    Unsupported(u32),
}

/// Supported overlay orientations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Transform {
    #[default]
    Identity,
    FlipH,
    FlipV,
    Rotate180,
    Rotate90,
    Rotate90FlipH,
    Rotate90FlipV,
    Rotate270,
}

impl Transform {
    pub const HAL_FLIP_H: u32 = 0x1;
    pub const HAL_FLIP_V: u32 = 0x2;
    pub const HAL_ROT_90: u32 = 0x4;

    /// All supported orientations, in HAL bit order.
    pub const ALL: [Transform; 8] = [
        Transform::Identity,
        Transform::FlipH,
        Transform::FlipV,
        Transform::Rotate180,
        Transform::Rotate90,
        Transform::Rotate90FlipH,
        Transform::Rotate90FlipV,
        Transform::Rotate270,
    ];

    /// Returns the HAL transform bits for this orientation.
    pub fn hal_bits(self) -> u32 {
        match self {
            Transform::Identity => 0,
            Transform::FlipH => Self::HAL_FLIP_H,
            Transform::FlipV => Self::HAL_FLIP_V,
            Transform::Rotate180 => Self::HAL_FLIP_H | Self::HAL_FLIP_V,
            Transform::Rotate90 => Self::HAL_ROT_90,
            Transform::Rotate90FlipH => Self::HAL_ROT_90 | Self::HAL_FLIP_H,
            Transform::Rotate90FlipV => Self::HAL_ROT_90 | Self::HAL_FLIP_V,
            Transform::Rotate270 => Self::HAL_ROT_90 | Self::HAL_FLIP_H | Self::HAL_FLIP_V,
        }
    }

    /// Returns the MDP-native rotation encoding stored in the pipe's user data.
    pub fn mdp_orientation(self) -> u32 {
        match self {
            Transform::Identity => MdpFlags::ROT_NOP,
            Transform::FlipH => MdpFlags::FLIP_LR,
            Transform::FlipV => MdpFlags::FLIP_UD,
            Transform::Rotate180 => MdpFlags::ROT_180,
            Transform::Rotate90 => MdpFlags::ROT_90,
            Transform::Rotate90FlipH => MdpFlags::ROT_90 | MdpFlags::FLIP_LR,
            Transform::Rotate90FlipV => MdpFlags::ROT_90 | MdpFlags::FLIP_UD,
            Transform::Rotate270 => MdpFlags::ROT_270,
        }
    }

    /// Returns `true` if the orientation exchanges the buffer's axes.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Transform::Rotate90
                | Transform::Rotate90FlipH
                | Transform::Rotate90FlipV
                | Transform::Rotate270
        )
    }
}

impl TryFrom<u32> for Transform {
    type Error = TransformError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Transform::ALL
            .into_iter()
            .find(|t| t.hal_bits() == bits)
            .ok_or(TransformError::Unsupported(bits))
    }
}

/// Re-expresses `crop` for a source rotated by 90°.
///
/// Returns the swapped source geometry and the transformed crop.  Inputs that
/// lie outside the buffer saturate at zero instead of wrapping.
pub fn rotate_crop_90(src: Whf, crop: Dim) -> (Whf, Dim) {
    let rotated = Dim {
        x: src.h.saturating_sub(crop.y).saturating_sub(crop.h),
        y: crop.x,
        ..crop
    };
    (src.swapped(), rotated.swapped())
}

/// Re-expresses `crop` for a source rotated by 270°.
///
/// Mirror image of [`rotate_crop_90`], reflecting across the width instead of
/// the height.
pub fn rotate_crop_270(src: Whf, crop: Dim) -> (Whf, Dim) {
    let rotated = Dim {
        x: crop.y,
        y: src.w.saturating_sub(crop.x).saturating_sub(crop.w),
        ..crop
    };
    (src.swapped(), rotated.swapped())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
