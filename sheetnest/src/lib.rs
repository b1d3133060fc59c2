//! Deterministic sheet-nesting engine for 2D flat-pattern outlines.
//!
//! Converts a set of closed polygons-with-holes into multi-sheet cut
//! layouts via Bottom-Left-Fill placement with optional 90° rotation,
//! spacing enforcement and collision avoidance. All coordinates are
//! millimeters.

/// Bottom-Left-Fill placement engine.
pub mod blf;

/// Entities describing a nesting job and its result.
pub mod entities;

/// Error types shared across the engine.
pub mod error;

/// Geometric primitives, kept behind a narrow interface.
pub mod geometry;

#[doc(inline)]
pub use error::{ErrorKind, NestError, Result};
