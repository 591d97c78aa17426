//! # overlay-core
//!
//! Value layer for MDP overlay pipes: geometry, pixel formats, orientations
//! and the pipe configuration record.
//!
//! This crate is shared by the controller and by anything that builds pipe
//! arguments.  It has zero dependencies on OS APIs or device handles.
//!
//! # Overview
//!
//! An *overlay pipe* composites one source buffer onto the display.  Its
//! state is described by:
//!
//! - **`Whf`** – width, height and pixel format of the source buffer.
//! - **`Dim`** – a rectangle; used for the source crop and the on-screen
//!   destination.
//! - **`Transform`** – one of the eight supported orientations.  Quarter-turn
//!   orientations re-express the crop rectangle in rotated coordinates (see
//!   [`domain::transform`]).
//! - **`PipeConfiguration`** – the whole pipe as the device sees it, tagged
//!   with a [`PipeId`] that is `Unassigned` until the device accepts it.

pub mod domain;

pub use domain::flags::MdpFlags;
pub use domain::format::{PixelFormat, TileAlignment};
pub use domain::geometry::{align_up, Dim, Whf};
pub use domain::pipe::{PipeArgs, PipeConfiguration, PipeId, ALPHA_OPAQUE, TRANSP_MASK_NONE};
pub use domain::transform::{rotate_crop_270, rotate_crop_90, Transform, TransformError};
