//! PipeController: configuration state machine for one overlay pipe.
//!
//! Callers mutate the pending configuration through setters and then call
//! [`PipeController::commit`].  The controller keeps a copy of the last
//! configuration the device accepted; if a commit is rejected, the pending
//! configuration is restored from that copy before the error is returned.
//!
//! ```text
//!   set_source / set_crop / set_transform / set_position
//!                         │
//!                         ▼
//!                   pending config ──commit()──► device
//!                         ▲                        │
//!                         │ rejected               │ accepted
//!                         └──── last known good ◄──┘
//! ```

use std::sync::Arc;

use overlay_core::{
    align_up, rotate_crop_270, rotate_crop_90, Dim, MdpFlags, PipeArgs, PipeConfiguration,
    PipeId, Transform, TransformError, Whf, ALPHA_OPAQUE, TRANSP_MASK_NONE,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::overlay_device::{DeviceError, DeviceOpener, OverlayDevice};

/// Default maximum upscale factor per axis.
pub const DEFAULT_MAGNIFICATION_LIMIT: u32 = 20;

/// Error type for pipe controller operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A device open, close, query or unset call failed.
    #[error("device I/O error during {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: DeviceError,
    },

    /// The device refused the configuration; the pipe was rolled back.
    #[error("device rejected overlay configuration: {source}")]
    DeviceRejectedConfig {
        #[source]
        source: DeviceError,
    },

    /// The requested orientation is not one the pipe supports.
    #[error(transparent)]
    UnsupportedTransform(#[from] TransformError),

    /// The destination rectangle does not fit on the screen.
    #[error("destination {dim:?} exceeds screen {screen_width}x{screen_height}")]
    OutOfBounds {
        dim: Dim,
        screen_width: u32,
        screen_height: u32,
    },
}

/// Framebuffer geometry reported by [`PipeController::screen_info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Row length in bytes.
    pub stride: u32,
}

/// Controller for a single overlay pipe.
///
/// Not internally synchronised: every method takes `&mut self` or `&self` and
/// completes its device call before returning.
pub struct PipeController {
    opener: Arc<dyn DeviceOpener>,
    device: Option<Box<dyn OverlayDevice>>,
    /// Pending configuration.
    ov: PipeConfiguration,
    /// Last configuration the device accepted.
    lkgo: PipeConfiguration,
    magnification_limit: u32,
}

impl PipeController {
    /// Creates an uninitialised controller in the reset state.
    ///
    /// A `magnification_limit` of zero is raised to 1 (no upscaling).
    pub fn new(opener: Arc<dyn DeviceOpener>, magnification_limit: u32) -> Self {
        if magnification_limit == 0 {
            warn!("magnification limit 0 is unusable, using 1");
        }
        Self {
            opener,
            device: None,
            ov: PipeConfiguration::default(),
            lkgo: PipeConfiguration::default(),
            magnification_limit: magnification_limit.max(1),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Opens display device `index`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Io`] with [`DeviceError::AlreadyOpen`] if a
    /// handle is already open, without any device call.  Returns
    /// [`OverlayError::Io`] if the device cannot be opened.
    pub fn init(&mut self, index: u32) -> Result<(), OverlayError> {
        if self.device.is_some() {
            error!(index, id = ?self.ov.id, "overlay control device already open");
            return Err(OverlayError::Io {
                op: "open",
                source: DeviceError::AlreadyOpen,
            });
        }
        match self.opener.open(index) {
            Ok(device) => {
                info!(index, "overlay control device opened");
                self.device = Some(device);
                Ok(())
            }
            Err(source) => {
                error!(index, %source, "failed to init overlay control device");
                Err(OverlayError::Io { op: "open", source })
            }
        }
    }

    /// Zero-fills the pending and last known good configurations.
    pub fn reset(&mut self) {
        self.ov = PipeConfiguration::default();
        self.lkgo = PipeConfiguration::default();
    }

    /// Releases the pipe and closes the device.
    ///
    /// A pipe that was never committed is already closed and no device call
    /// is made.  Otherwise the overlay is unset first; if that fails the
    /// handle stays open so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Io`] if the unset or the close fails.
    pub fn close(&mut self) -> Result<(), OverlayError> {
        let PipeId::Assigned(id) = self.ov.id else {
            return Ok(());
        };

        let device = self.device_mut("unset")?;
        if let Err(source) = device.unset_overlay(id) {
            error!(id, %source, "failed to unset overlay on close");
            return Err(OverlayError::Io { op: "unset", source });
        }

        self.reset();

        let mut device = self.device.take().ok_or(OverlayError::Io {
            op: "close",
            source: DeviceError::NotOpen,
        })?;
        device
            .close()
            .map_err(|source| OverlayError::Io { op: "close", source })?;
        info!(id, "overlay pipe closed");
        Ok(())
    }

    // ── Device queries ────────────────────────────────────────────────────────

    /// Queries the framebuffer geometry.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Io`] if either screen-info query fails.
    pub fn screen_info(&self) -> Result<ScreenInfo, OverlayError> {
        let device = self.device_ref("screen info")?;
        let fixed = device.fixed_screen_info().map_err(|source| OverlayError::Io {
            op: "fixed screen info",
            source,
        })?;
        let var = device
            .variable_screen_info()
            .map_err(|source| OverlayError::Io {
                op: "variable screen info",
                source,
            })?;

        Ok(ScreenInfo {
            width: var.xres,
            height: var.yres,
            bits_per_pixel: var.bits_per_pixel,
            stride: fixed.line_length,
        })
    }

    /// Replaces the pending configuration with the device's view of this pipe.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Io`] if the read fails; the pending
    /// configuration is left untouched.
    pub fn get(&mut self) -> Result<(), OverlayError> {
        let device = self.device_ref("get")?;
        match device.get_overlay(self.ov.id) {
            Ok(ov) => {
                self.ov = ov;
                Ok(())
            }
            Err(source) => {
                error!(id = ?self.ov.id, %source, "failed to read back overlay");
                Err(OverlayError::Io { op: "get", source })
            }
        }
    }

    /// Submits the pending configuration.
    ///
    /// On success the device-assigned id is recorded and the configuration
    /// becomes the new last known good.  On rejection the pending
    /// configuration is restored from the last known good.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::DeviceRejectedConfig`] after rolling back, or
    /// [`OverlayError::Io`] without touching state if no device is open.
    pub fn commit(&mut self) -> Result<(), OverlayError> {
        let Some(device) = self.device.as_mut() else {
            return Err(OverlayError::Io {
                op: "set",
                source: DeviceError::NotOpen,
            });
        };

        match device.set_overlay(&self.ov) {
            Ok(id) => {
                self.ov.id = PipeId::Assigned(id);
                self.lkgo = self.ov.clone();
                debug!(id, "overlay configuration committed");
                Ok(())
            }
            Err(source) => {
                error!(%source, "failed to set overlay, restoring last known good configuration");
                error!(rejected = ?self.ov, "bad overlay configuration");
                error!(last_known_good = ?self.lkgo, "last known good overlay configuration");
                self.ov = self.lkgo.clone();
                Err(OverlayError::DeviceRejectedConfig { source })
            }
        }
    }

    // ── Setters ───────────────────────────────────────────────────────────────

    /// Loads source geometry and pipe parameters from `args`.
    ///
    /// Alpha is forced opaque and the transparency mask disabled.
    pub fn set_source(&mut self, args: PipeArgs) {
        self.ov.src = args.whf;
        self.ov.alpha = ALPHA_OPAQUE;
        self.ov.transp_mask = TRANSP_MASK_NONE;
        self.set_flags(args.flags);
        self.set_z(args.z_order);
        self.set_wait(args.wait);
        self.set_is_fg(args.is_fg);
    }

    /// Sets the source crop rectangle.  Bounds are checked by the device.
    pub fn set_crop(&mut self, dim: Dim) {
        self.ov.src_rect = dim;
    }

    pub fn set_flags(&mut self, flags: MdpFlags) {
        self.ov.flags = flags;
    }

    pub fn set_z(&mut self, z_order: u32) {
        self.ov.z_order = z_order;
    }

    pub fn set_wait(&mut self, wait: bool) {
        self.ov.wait = wait;
    }

    pub fn set_is_fg(&mut self, is_fg: bool) {
        self.ov.is_fg = is_fg;
    }

    /// Applies `transform` to the pending configuration.
    ///
    /// When `rotator_in_use` is set the source geometry is first replaced by
    /// what the rotator will output: tiled formats are padded to their tile
    /// size and converted to the rotator's output format.  Quarter-turn
    /// orientations then re-express the crop rectangle in rotated
    /// coordinates; flips and 180° are handled by the device flags alone.
    ///
    /// [`MdpFlags::SOURCE_ROTATED_90`] is owned by this method: it is set for
    /// orientations that swap the axes and cleared for all others, including
    /// when the caller passed it in through [`set_source`].
    ///
    /// [`set_source`]: PipeController::set_source
    pub fn set_transform(&mut self, transform: Transform, rotator_in_use: bool) {
        self.ov.user_rotation = transform.mdp_orientation();
        self.adjust_src_whf(rotator_in_use);
        self.ov
            .flags
            .set(MdpFlags::SOURCE_ROTATED_90, transform.swaps_axes());

        match transform {
            Transform::Identity | Transform::FlipH | Transform::FlipV | Transform::Rotate180 => {}
            Transform::Rotate90 | Transform::Rotate90FlipH | Transform::Rotate90FlipV => {
                let (src, crop) = rotate_crop_90(self.ov.src, self.ov.src_rect);
                self.ov.src = src;
                self.ov.src_rect = crop;
            }
            Transform::Rotate270 => {
                let (src, crop) = rotate_crop_270(self.ov.src, self.ov.src_rect);
                self.ov.src = src;
                self.ov.src_rect = crop;
            }
        }
    }

    /// Decodes raw HAL transform bits and applies them.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::UnsupportedTransform`] without touching state if
    /// `bits` is not a supported orientation.
    pub fn set_transform_bits(
        &mut self,
        bits: u32,
        rotator_in_use: bool,
    ) -> Result<(), OverlayError> {
        let transform = Transform::try_from(bits).map_err(|e| {
            error!(bits, "unknown rotation value");
            e
        })?;
        self.set_transform(transform, rotator_in_use);
        Ok(())
    }

    /// Places the pipe on screen.
    ///
    /// The destination is clamped on each axis to at most
    /// `magnification_limit` times the crop size; a clamped axis is re-centred
    /// on the screen.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::OutOfBounds`] without touching state if `dim`
    /// does not fit inside `screen_width × screen_height`.
    pub fn set_position(
        &mut self,
        dim: Dim,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<(), OverlayError> {
        if !dim.fits_within(screen_width, screen_height) {
            error!(?dim, screen_width, screen_height, "destination violates screen limits");
            return Err(OverlayError::OutOfBounds {
                dim,
                screen_width,
                screen_height,
            });
        }

        let crop = self.ov.src_rect;
        let max_w = crop.w.saturating_mul(self.magnification_limit);
        let max_h = crop.h.saturating_mul(self.magnification_limit);

        let mut dst = dim;
        if dst.w > max_w {
            dst.w = max_w;
            dst.x = (screen_width - dst.w) / 2;
        }
        if dst.h > max_h {
            dst.h = max_h;
            dst.y = (screen_height - dst.h) / 2;
        }

        self.ov.dst_rect = dst;
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> PipeId {
        self.ov.id
    }

    pub fn is_active(&self) -> bool {
        self.ov.is_active()
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn src_whf(&self) -> Whf {
        self.ov.src
    }

    pub fn src_rect(&self) -> Dim {
        self.ov.src_rect
    }

    pub fn dst_rect(&self) -> Dim {
        self.ov.dst_rect
    }

    pub fn flags(&self) -> MdpFlags {
        self.ov.flags
    }

    pub fn user_rotation(&self) -> u32 {
        self.ov.user_rotation
    }

    pub fn magnification_limit(&self) -> u32 {
        self.magnification_limit
    }

    /// The pending configuration.
    pub fn config(&self) -> &PipeConfiguration {
        &self.ov
    }

    /// The last configuration the device accepted.
    pub fn last_known_good(&self) -> &PipeConfiguration {
        &self.lkgo
    }

    /// Logs the controller state.
    pub fn dump(&self) {
        info!("== Dump PipeController start ==");
        info!(
            open = self.is_open(),
            magnification_limit = self.magnification_limit,
            "device state"
        );
        info!(config = ?self.ov, "pending overlay configuration");
        info!("== Dump PipeController end ==");
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn adjust_src_whf(&mut self, rotator_in_use: bool) {
        if !rotator_in_use {
            return;
        }
        let mut whf = self.ov.src;
        if let Some(align) = whf.format.tile_alignment() {
            whf.w = align_up(whf.w, align.width);
            whf.h = align_up(whf.h, align.height);
        }
        whf.format = whf.format.rotator_output();
        self.ov.src = whf;
    }

    fn device_ref(&self, op: &'static str) -> Result<&dyn OverlayDevice, OverlayError> {
        self.device.as_deref().ok_or(OverlayError::Io {
            op,
            source: DeviceError::NotOpen,
        })
    }

    fn device_mut(
        &mut self,
        op: &'static str,
    ) -> Result<&mut (dyn OverlayDevice + 'static), OverlayError> {
        self.device.as_deref_mut().ok_or(OverlayError::Io {
            op,
            source: DeviceError::NotOpen,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
