//! Overlay pipe configuration state.

use super::flags::MdpFlags;
use super::geometry::{Dim, Whf};

/// Fully opaque plane alpha.
pub const ALPHA_OPAQUE: u32 = 0xff;

/// Transparency mask that matches no colour key.
pub const TRANSP_MASK_NONE: u32 = 0xffff_ffff;

/// Kernel-side identity of an overlay pipe.
///
/// A pipe is `Unassigned` until the device accepts its first configuration and
/// hands back a slot number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PipeId {
    /// No slot allocated; the next commit is a new request.
    #[default]
    Unassigned,
    /// Slot allocated by the device.
    Assigned(u32),
}

impl PipeId {
    /// Returns `true` if the device has allocated a slot.
    pub fn is_assigned(&self) -> bool {
        matches!(self, PipeId::Assigned(_))
    }
}

/// Desired source configuration, consumed by `set_source`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeArgs {
    /// Source buffer geometry.
    pub whf: Whf,
    /// Pipe flags, copied verbatim.
    pub flags: MdpFlags,
    /// Blending stage.
    pub z_order: u32,
    /// Wait for vsync when the frame is played.
    pub wait: bool,
    /// Pipe is the foreground layer.
    pub is_fg: bool,
}

/// Complete state of one overlay pipe.
///
/// A plain value: cloning it is a deep copy, so snapshotting and restoring the
/// last known good state are single assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeConfiguration {
    pub id: PipeId,
    /// Source buffer geometry (post-rotator when a rotator is in use).
    pub src: Whf,
    /// Crop rectangle within the source buffer.
    pub src_rect: Dim,
    /// Placement on screen.
    pub dst_rect: Dim,
    pub z_order: u32,
    pub alpha: u32,
    pub transp_mask: u32,
    pub flags: MdpFlags,
    pub wait: bool,
    pub is_fg: bool,
    /// MDP-native rotation encoding of the requested orientation.
    pub user_rotation: u32,
}

impl PipeConfiguration {
    /// Returns `true` if the device has accepted this pipe.
    pub fn is_active(&self) -> bool {
        self.id.is_assigned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_unassigned_and_zeroed() {
        let cfg = PipeConfiguration::default();
        assert_eq!(cfg.id, PipeId::Unassigned);
        assert!(!cfg.is_active());
        assert_eq!(cfg.src_rect, Dim::default());
        assert_eq!(cfg.flags, MdpFlags(0));
    }

    #[test]
    fn test_assigned_id_marks_configuration_active() {
        let cfg = PipeConfiguration {
            id: PipeId::Assigned(3),
            ..PipeConfiguration::default()
        };
        assert!(cfg.is_active());
    }
}
