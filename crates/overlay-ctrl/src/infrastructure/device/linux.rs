//! Linux MDP framebuffer device adapter.
//!
//! Opens `/dev/graphics/fb<N>` (path template configurable) and drives overlay
//! pipes through the `msm_fb` ioctl interface:
//!
//! | Request               | Direction | Payload                 |
//! |-----------------------|-----------|-------------------------|
//! | `MSMFB_OVERLAY_SET`   | R/W       | `struct mdp_overlay`    |
//! | `MSMFB_OVERLAY_UNSET` | W         | `unsigned int` (id)     |
//! | `MSMFB_OVERLAY_GET`   | R         | `struct mdp_overlay`    |
//! | `FBIOGET_FSCREENINFO` | R         | `fb_fix_screeninfo`     |
//! | `FBIOGET_VSCREENINFO` | R         | `fb_var_screeninfo`     |
//!
//! # Marshalling
//!
//! [`PipeConfiguration`] is converted to and from the kernel's `mdp_overlay`
//! at this boundary only:
//!
//! - `PipeId::Unassigned` ↔ `MSMFB_NEW_REQUEST` (`-1` as `u32`).
//! - `wait == false` ↔ `MDP_OV_PLAY_NOWAIT` set in `flags`.
//! - `user_rotation` ↔ `user_data[0]`.
//!
//! The `mdp_overlay` layout matches the msm_mdp.h revision without the
//! post-processing (`dpp`) block.  A kernel with a different layout encodes a
//! different size into the request number and fails the call with `ENOTTY`.

use std::fs::{File, OpenOptions};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, IntoRawFd};
use std::path::PathBuf;

use overlay_core::{Dim, MdpFlags, PipeConfiguration, PipeId, PixelFormat, Whf};
use tracing::{debug, warn};

use crate::application::overlay_device::{
    DeviceError, DeviceOpener, FixedScreenInfo, OverlayDevice, VariableScreenInfo,
};

/// Default framebuffer node template; `{}` is replaced by the device index.
pub const DEFAULT_FB_PATH_TEMPLATE: &str = "/dev/graphics/fb{}";

/// Overlay id meaning "allocate a new pipe".
const MSMFB_NEW_REQUEST: u32 = u32::MAX;

const MSMFB_IOCTL_MAGIC: u32 = b'm' as u32;

const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOGET_FSCREENINFO: u32 = 0x4602;

// ── ioctl request encoding (asm-generic) ──────────────────────────────────────

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, ty: u32, nr: u32, size: usize) -> u32 {
    (dir << 30) | ((size as u32) << 16) | (ty << 8) | nr
}

const MSMFB_OVERLAY_SET: u32 = ioc(
    IOC_READ | IOC_WRITE,
    MSMFB_IOCTL_MAGIC,
    135,
    mem::size_of::<MdpOverlay>(),
);
const MSMFB_OVERLAY_UNSET: u32 = ioc(IOC_WRITE, MSMFB_IOCTL_MAGIC, 136, mem::size_of::<u32>());
const MSMFB_OVERLAY_GET: u32 = ioc(
    IOC_READ,
    MSMFB_IOCTL_MAGIC,
    140,
    mem::size_of::<MdpOverlay>(),
);

// ── Kernel structures ─────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MsmfbImg {
    width: u32,
    height: u32,
    format: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MdpRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MdpOverlay {
    src: MsmfbImg,
    src_rect: MdpRect,
    dst_rect: MdpRect,
    z_order: u32,
    is_fg: u32,
    alpha: u32,
    transp_mask: u32,
    flags: u32,
    id: u32,
    user_data: [u32; 8],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
#[allow(dead_code)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
#[allow(dead_code)]
struct FbVarScreenInfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
#[allow(dead_code)]
struct FbFixScreenInfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

impl From<Dim> for MdpRect {
    fn from(d: Dim) -> Self {
        Self {
            x: d.x,
            y: d.y,
            w: d.w,
            h: d.h,
        }
    }
}

impl From<MdpRect> for Dim {
    fn from(r: MdpRect) -> Self {
        Dim::new(r.x, r.y, r.w, r.h)
    }
}

impl From<&PipeConfiguration> for MdpOverlay {
    fn from(cfg: &PipeConfiguration) -> Self {
        let mut flags = cfg.flags;
        flags.set(MdpFlags::OV_PLAY_NOWAIT, !cfg.wait);

        let mut user_data = [0u32; 8];
        user_data[0] = cfg.user_rotation;

        Self {
            src: MsmfbImg {
                width: cfg.src.w,
                height: cfg.src.h,
                format: cfg.src.format.0,
            },
            src_rect: cfg.src_rect.into(),
            dst_rect: cfg.dst_rect.into(),
            z_order: cfg.z_order,
            is_fg: u32::from(cfg.is_fg),
            alpha: cfg.alpha,
            transp_mask: cfg.transp_mask,
            flags: flags.0,
            id: match cfg.id {
                PipeId::Unassigned => MSMFB_NEW_REQUEST,
                PipeId::Assigned(id) => id,
            },
            user_data,
        }
    }
}

impl From<MdpOverlay> for PipeConfiguration {
    fn from(ov: MdpOverlay) -> Self {
        let mut flags = MdpFlags(ov.flags);
        let wait = !flags.contains(MdpFlags::OV_PLAY_NOWAIT);
        flags.remove(MdpFlags::OV_PLAY_NOWAIT);

        Self {
            id: if ov.id == MSMFB_NEW_REQUEST {
                PipeId::Unassigned
            } else {
                PipeId::Assigned(ov.id)
            },
            src: Whf::new(ov.src.width, ov.src.height, PixelFormat(ov.src.format)),
            src_rect: ov.src_rect.into(),
            dst_rect: ov.dst_rect.into(),
            z_order: ov.z_order,
            alpha: ov.alpha,
            transp_mask: ov.transp_mask,
            flags,
            wait,
            is_fg: ov.is_fg != 0,
            user_rotation: ov.user_data[0],
        }
    }
}

// ── Opener ────────────────────────────────────────────────────────────────────

/// Opens framebuffer nodes from a path template.
#[derive(Debug, Clone)]
pub struct FramebufferOpener {
    path_template: String,
}

impl FramebufferOpener {
    /// Creates an opener for `template`, where `{}` stands for the index.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            path_template: template.into(),
        }
    }

    /// Returns the node path for device `index`.
    pub fn path_for(&self, index: u32) -> PathBuf {
        PathBuf::from(self.path_template.replace("{}", &index.to_string()))
    }
}

impl Default for FramebufferOpener {
    fn default() -> Self {
        Self::new(DEFAULT_FB_PATH_TEMPLATE)
    }
}

impl DeviceOpener for FramebufferOpener {
    fn open(&self, index: u32) -> Result<Box<dyn OverlayDevice>, DeviceError> {
        let path = self.path_for(index);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| DeviceError::Open {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), fd = file.as_raw_fd(), "framebuffer opened");
        Ok(Box::new(FramebufferDevice {
            file: Some(file),
            path,
        }))
    }
}

// ── Device ────────────────────────────────────────────────────────────────────

/// An open framebuffer node.
#[derive(Debug)]
pub struct FramebufferDevice {
    file: Option<File>,
    path: PathBuf,
}

impl FramebufferDevice {
    /// Issues `request` with `arg` as the in/out payload.
    fn ioctl<T>(&self, name: &'static str, request: u32, arg: &mut T) -> Result<(), DeviceError> {
        let fd = self.file.as_ref().ok_or(DeviceError::NotOpen)?.as_raw_fd();

        // SAFETY: `fd` is an open descriptor owned by `self.file`, and `arg`
        // points to a live `#[repr(C)]` value whose size is the one encoded in
        // `request`.
        let rc = unsafe { libc::ioctl(fd, request as _, arg as *mut T) };
        if rc < 0 {
            return Err(DeviceError::Ioctl {
                request: name,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

impl OverlayDevice for FramebufferDevice {
    fn get_overlay(&self, id: PipeId) -> Result<PipeConfiguration, DeviceError> {
        let mut ov = MdpOverlay {
            id: match id {
                PipeId::Unassigned => MSMFB_NEW_REQUEST,
                PipeId::Assigned(id) => id,
            },
            ..MdpOverlay::default()
        };
        self.ioctl("MSMFB_OVERLAY_GET", MSMFB_OVERLAY_GET, &mut ov)?;
        Ok(ov.into())
    }

    fn set_overlay(&mut self, config: &PipeConfiguration) -> Result<u32, DeviceError> {
        let mut ov = MdpOverlay::from(config);
        self.ioctl("MSMFB_OVERLAY_SET", MSMFB_OVERLAY_SET, &mut ov)?;
        if ov.id == MSMFB_NEW_REQUEST {
            return Err(DeviceError::Ioctl {
                request: "MSMFB_OVERLAY_SET",
                source: io::Error::new(io::ErrorKind::Other, "kernel did not assign a pipe id"),
            });
        }
        Ok(ov.id)
    }

    fn unset_overlay(&mut self, id: u32) -> Result<(), DeviceError> {
        let mut id = id;
        self.ioctl("MSMFB_OVERLAY_UNSET", MSMFB_OVERLAY_UNSET, &mut id)
    }

    fn fixed_screen_info(&self) -> Result<FixedScreenInfo, DeviceError> {
        let mut finfo = FbFixScreenInfo::default();
        self.ioctl("FBIOGET_FSCREENINFO", FBIOGET_FSCREENINFO, &mut finfo)?;
        Ok(FixedScreenInfo {
            line_length: finfo.line_length,
        })
    }

    fn variable_screen_info(&self) -> Result<VariableScreenInfo, DeviceError> {
        let mut vinfo = FbVarScreenInfo::default();
        self.ioctl("FBIOGET_VSCREENINFO", FBIOGET_VSCREENINFO, &mut vinfo)?;
        Ok(VariableScreenInfo {
            xres: vinfo.xres,
            yres: vinfo.yres,
            bits_per_pixel: vinfo.bits_per_pixel,
        })
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        let Some(file) = self.file.take() else {
            warn!(path = %self.path.display(), "framebuffer already closed");
            return Ok(());
        };
        let fd = file.into_raw_fd();

        // SAFETY: `fd` was released from the `File` above, so this is the only
        // owner and it is closed exactly once.
        if unsafe { libc::close(fd) } != 0 {
            return Err(DeviceError::Close(io::Error::last_os_error()));
        }
        debug!(path = %self.path.display(), "framebuffer closed");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> PipeConfiguration {
        PipeConfiguration {
            id: PipeId::Assigned(2),
            src: Whf::new(1280, 720, PixelFormat::Y_CBCR_H2V2),
            src_rect: Dim::new(0, 0, 1280, 720),
            dst_rect: Dim::new(0, 0, 1920, 1080),
            z_order: 1,
            alpha: 0xff,
            transp_mask: 0xffff_ffff,
            flags: MdpFlags(MdpFlags::SOURCE_ROTATED_90),
            wait: false,
            is_fg: true,
            user_rotation: MdpFlags::ROT_90,
        }
    }

    #[test]
    fn test_unassigned_id_marshals_to_new_request() {
        let cfg = PipeConfiguration::default();
        assert_eq!(MdpOverlay::from(&cfg).id, MSMFB_NEW_REQUEST);
    }

    #[test]
    fn test_no_wait_is_encoded_in_flags() {
        let ov = MdpOverlay::from(&sample_config());
        assert_ne!(ov.flags & MdpFlags::OV_PLAY_NOWAIT, 0);
        assert_eq!(ov.user_data[0], MdpFlags::ROT_90);
        assert_eq!(ov.is_fg, 1);
    }

    #[test]
    fn test_kernel_overlay_converts_back_to_same_configuration() {
        let cfg = sample_config();
        let back = PipeConfiguration::from(MdpOverlay::from(&cfg));
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_overlay_ioctl_numbers_use_msmfb_magic() {
        assert_eq!((MSMFB_OVERLAY_SET >> 8) & 0xff, u32::from(b'm'));
        assert_eq!(MSMFB_OVERLAY_SET & 0xff, 135);
        assert_eq!(MSMFB_OVERLAY_UNSET, 0x4004_6d88);
        assert_eq!(MSMFB_OVERLAY_GET >> 30, IOC_READ);
    }

    #[test]
    fn test_path_for_substitutes_index() {
        let opener = FramebufferOpener::default();
        assert_eq!(opener.path_for(1), PathBuf::from("/dev/graphics/fb1"));
    }

    #[test]
    fn test_open_missing_node_fails_with_open_error() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let template = format!("{}/fb{{}}", dir.path().display());
        let opener = FramebufferOpener::new(template);

        // Act
        let result = opener.open(0);

        // Assert
        assert!(matches!(result, Err(DeviceError::Open { .. })));
    }

    #[test]
    fn test_ioctl_on_regular_file_fails_with_ioctl_error() {
        // A regular file accepts open() but not framebuffer ioctls.
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("fb0"), b"").expect("create node");
        let opener = FramebufferOpener::new(format!("{}/fb{{}}", dir.path().display()));

        let mut device = opener.open(0).expect("open");

        assert!(matches!(
            device.variable_screen_info(),
            Err(DeviceError::Ioctl {
                request: "FBIOGET_VSCREENINFO",
                ..
            })
        ));
        assert!(device.close().is_ok());
    }
}
