//! Domain value types for overlay pipes.
//!
//! Pure data and pure functions: no device access, no logging.  Everything
//! here can be unit-tested without hardware.

/// Pipe flag word (`MDP_*` flags).
pub mod flags;

/// MDP pixel formats and rotator format tables.
pub mod format;

/// `Dim` rectangles and `Whf` geometry.
pub mod geometry;

/// Pipe identity, arguments and configuration.
pub mod pipe;

/// Orientations and crop rotation math.
pub mod transform;
