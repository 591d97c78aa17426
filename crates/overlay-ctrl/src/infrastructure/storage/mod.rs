//! Configuration persistence for the overlay controller.
//!
//! - **`config`** – TOML-backed [`OverlayConfig`](config::OverlayConfig): the
//!   framebuffer path template, default device index, magnification limit and
//!   log level.

pub mod config;
