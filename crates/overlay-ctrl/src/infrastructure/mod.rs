//! Infrastructure layer for the overlay controller.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `overlay_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`device`** – [`DeviceOpener`](crate::application::overlay_device::DeviceOpener)
//!   implementations.  On Linux the framebuffer adapter issues MDP overlay
//!   ioctls; a `MockDisplay` is always compiled for tests.
//!
//! - **`storage`** – TOML configuration (device path, magnification limit,
//!   log level).
//!
//! - **`logging`** – `tracing` subscriber installation.

pub mod device;
pub mod logging;
pub mod storage;

use std::sync::Arc;

use crate::application::overlay_device::DeviceOpener;
use crate::application::pipe_control::PipeController;
use storage::config::OverlayConfig;

/// Builds an uninitialised controller over `opener` using the limits in
/// `config`.
pub fn controller_with_opener(
    opener: Arc<dyn DeviceOpener>,
    config: &OverlayConfig,
) -> PipeController {
    PipeController::new(opener, config.limits.magnification_limit)
}

/// Builds an uninitialised controller over the platform framebuffer device.
#[cfg(target_os = "linux")]
pub fn native_controller(config: &OverlayConfig) -> PipeController {
    let opener = device::NativeDeviceOpener::new(config.device.path_template.clone());
    controller_with_opener(Arc::new(opener), config)
}
