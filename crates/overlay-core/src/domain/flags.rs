//! MDP overlay flag word.

/// The `flags` word of an MDP overlay request.
///
/// The low bits carry the native rotation encoding (`FLIP_LR`, `FLIP_UD`,
/// `ROT_90` and their combinations); the remaining bits are independent
/// pipe options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MdpFlags(pub u32);

impl MdpFlags {
    pub const ROT_NOP: u32 = 0;
    pub const FLIP_LR: u32 = 0x1;
    pub const FLIP_UD: u32 = 0x2;
    pub const ROT_90: u32 = 0x4;
    pub const ROT_180: u32 = Self::FLIP_UD | Self::FLIP_LR;
    pub const ROT_270: u32 = Self::ROT_90 | Self::FLIP_UD | Self::FLIP_LR;
    pub const DITHER: u32 = 0x8;
    pub const BLUR: u32 = 0x10;
    pub const MEMORY_ID_TYPE_FB: u32 = 0x0000_1000;
    pub const SECURE_OVERLAY_SESSION: u32 = 0x0000_8000;
    pub const BLEND_FG_PREMULT: u32 = 0x0002_0000;
    /// Set when the pipe's source has been pre-rotated by 90° (axes swapped).
    pub const SOURCE_ROTATED_90: u32 = 0x0010_0000;
    /// Return from PLAY without waiting for the next vsync.
    pub const OV_PLAY_NOWAIT: u32 = 0x0020_0000;
    pub const DEINTERLACE: u32 = 0x8000_0000;

    /// Returns `true` if every bit of `bits` is set.
    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    /// Sets `bits`.
    pub fn insert(&mut self, bits: u32) {
        self.0 |= bits;
    }

    /// Clears `bits`.
    pub fn remove(&mut self, bits: u32) {
        self.0 &= !bits;
    }

    /// Sets or clears `bits` depending on `on`.
    pub fn set(&mut self, bits: u32, on: bool) {
        if on {
            self.insert(bits);
        } else {
            self.remove(bits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rot_270_is_rot_90_plus_rot_180() {
        assert_eq!(MdpFlags::ROT_270, MdpFlags::ROT_90 | MdpFlags::ROT_180);
    }

    #[test]
    fn test_set_toggles_only_the_given_bits() {
        let mut flags = MdpFlags(MdpFlags::DITHER);
        flags.set(MdpFlags::SOURCE_ROTATED_90, true);
        assert!(flags.contains(MdpFlags::SOURCE_ROTATED_90 | MdpFlags::DITHER));

        flags.set(MdpFlags::SOURCE_ROTATED_90, false);
        assert_eq!(flags, MdpFlags(MdpFlags::DITHER));
    }
}
