//! Display device adapters.
//!
//! Each platform that exposes MDP overlays implements
//! [`DeviceOpener`](crate::application::overlay_device::DeviceOpener); the
//! correct one is selected at compile time and re-exported as
//! `NativeDeviceOpener`:
//!
//! | Module  | OS    | Interface                                          |
//! |---------|-------|----------------------------------------------------|
//! | `linux` | Linux | `/dev/graphics/fbN` + `MSMFB_OVERLAY_*` ioctls     |
//!
//! A [`MockDisplay`] is always compiled (not guarded by `#[cfg]`) so tests on
//! any platform can drive a controller without hardware.

pub mod mock;

pub use mock::{DeviceCall, MockDisplay};

// ── Linux implementation ──────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
pub mod linux;

/// Re-export the framebuffer opener as `NativeDeviceOpener` on Linux.
#[cfg(target_os = "linux")]
pub use linux::FramebufferOpener as NativeDeviceOpener;
