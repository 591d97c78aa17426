//! Application layer of the overlay controller.
//!
//! - **`pipe_control`** – The pipe configuration state machine: setters,
//!   transform and position math, and commit with last-known-good rollback.
//!
//! - **`overlay_device`** – The device port the controller calls through.
//!   Concrete devices are injected at construction time from the
//!   infrastructure layer.

pub mod overlay_device;
pub mod pipe_control;
