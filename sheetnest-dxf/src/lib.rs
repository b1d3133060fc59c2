//! DXF input/output for the sheetnest engine.
//!
//! [`extract`] turns 2D DXF drawings into closed [`Outline`]s ready for
//! nesting; [`export`] renders packed sheets back out as layered DXF
//! drawings, and [`manifest`] carries the structured per-job summary.
//!
//! [`Outline`]: sheetnest::geometry::Outline

/// Layered DXF rendering of packed sheets.
pub mod export;

/// Outline extraction from DXF drawings.
pub mod extract;

/// Per-job layout manifest.
pub mod manifest;

mod tessellate;
