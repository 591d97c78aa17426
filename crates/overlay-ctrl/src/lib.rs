//! overlay-ctrl library entry point.
//!
//! Drives a single hardware overlay pipe on an MDP display device.
//!
//! # What does the controller do?
//!
//! An overlay pipe scans a source buffer out on top of the framebuffer with its
//! own crop, rotation, scaling and z-order.  The controller:
//!
//! 1. Opens the numbered framebuffer device (`init`).
//! 2. Collects the desired source geometry, crop, orientation and destination
//!    through setters, adjusting the source for a rotator stage and clamping
//!    the destination to the hardware's upscale limit.
//! 3. Submits the whole configuration in one request (`commit`).  If the
//!    device refuses it, the controller rolls back to the last configuration
//!    the device accepted.
//! 4. Releases the pipe and the device (`close`).

/// Application layer: the pipe controller and its device port.
pub mod application;

/// Infrastructure layer: device adapters, configuration and logging.
pub mod infrastructure;

pub use application::overlay_device::{
    DeviceError, DeviceOpener, FixedScreenInfo, OverlayDevice, VariableScreenInfo,
};
pub use application::pipe_control::{
    OverlayError, PipeController, ScreenInfo, DEFAULT_MAGNIFICATION_LIMIT,
};
