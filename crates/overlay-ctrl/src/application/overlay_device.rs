//! Device port: the narrow interface the pipe controller uses to reach the
//! display-processing device.
//!
//! The controller never touches file descriptors or ioctls directly.  It talks
//! to an [`OverlayDevice`] handle obtained from a [`DeviceOpener`]; the real
//! framebuffer adapter and the in-memory test double both live in
//! `infrastructure::device`.
//!
//! # Ownership
//!
//! A handle is exclusively owned by one controller.  Neither trait requires
//! `Clone`, and `OverlayDevice` handles are moved out of the opener as a
//! `Box`, so the same device node cannot be shared by two controllers through
//! this interface.

use std::path::PathBuf;

use overlay_core::{PipeConfiguration, PipeId};
use thiserror::Error;

/// Error type for device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device node could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An ioctl request returned an error.
    #[error("{request} failed: {source}")]
    Ioctl {
        request: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Closing the device node failed.
    #[error("failed to close device: {0}")]
    Close(#[source] std::io::Error),

    /// No handle is open.
    #[error("device is not open")]
    NotOpen,

    /// A handle is already open; it must be closed before opening another.
    #[error("device is already open")]
    AlreadyOpen,

    /// Any other backend failure (used by test doubles).
    #[error("device error: {0}")]
    Platform(String),
}

/// Fixed framebuffer properties (`fb_fix_screeninfo` subset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedScreenInfo {
    /// Length of one framebuffer row in bytes.
    pub line_length: u32,
}

/// Variable framebuffer properties (`fb_var_screeninfo` subset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableScreenInfo {
    /// Visible horizontal resolution.
    pub xres: u32,
    /// Visible vertical resolution.
    pub yres: u32,
    pub bits_per_pixel: u32,
}

/// Opens numbered display devices.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceOpener: Send + Sync {
    /// Opens display device `index` for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Open`] if the device node cannot be opened.
    fn open(&self, index: u32) -> Result<Box<dyn OverlayDevice>, DeviceError>;
}

/// An open handle to a display device that accepts overlay requests.
#[cfg_attr(test, mockall::automock)]
pub trait OverlayDevice: Send {
    /// Reads back the overlay identified by `id`.
    fn get_overlay(&self, id: PipeId) -> Result<PipeConfiguration, DeviceError>;

    /// Submits `config` and returns the slot id the device assigned to it.
    ///
    /// An `Unassigned` id asks the device to allocate a new slot; an assigned
    /// id reconfigures the existing one.
    fn set_overlay(&mut self, config: &PipeConfiguration) -> Result<u32, DeviceError>;

    /// Releases overlay slot `id`.
    fn unset_overlay(&mut self, id: u32) -> Result<(), DeviceError>;

    fn fixed_screen_info(&self) -> Result<FixedScreenInfo, DeviceError>;

    fn variable_screen_info(&self) -> Result<VariableScreenInfo, DeviceError>;

    /// Closes the handle.  The handle must not be used afterwards.
    fn close(&mut self) -> Result<(), DeviceError>;
}
