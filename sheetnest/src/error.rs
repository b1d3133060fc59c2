//! Error types for the nesting engine.

use thiserror::Error;

/// The four failure classes a nesting job can report.
///
/// Every [`NestError`] variant maps onto exactly one kind via
/// [`NestError::kind`]. All four abort the job they occur in; none are
/// downgraded to warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input drawing cannot be decoded into any closed ring, or the
    /// job descriptor itself is invalid.
    Parse,
    /// A ring exists but degenerates to non-positive area, self-intersects,
    /// or its holes escape the outer boundary.
    Geometry,
    /// An item cannot fit on an empty sheet in any allowed orientation.
    Placement,
    /// Input download or output upload failed.
    Storage,
}

/// Main error type for the nesting engine.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("cannot decode drawing '{source_ref}': {message}")]
    DrawingDecode { source_ref: String, message: String },

    #[error(
        "no closed ring could be formed from '{source_ref}' ({open_chains} open chains left over)"
    )]
    NoClosedRing {
        source_ref: String,
        open_chains: usize,
    },

    #[error("invalid job descriptor: {message}")]
    InvalidJob { message: String },

    #[error("ring from '{source_ref}' has fewer than 3 distinct vertices")]
    TooFewVertices { source_ref: String },

    #[error("ring from '{source_ref}' degenerates to non-positive area")]
    NonPositiveArea { source_ref: String },

    #[error("outer ring from '{source_ref}' is self-intersecting")]
    SelfIntersecting { source_ref: String },

    #[error("hole ring from '{source_ref}' lies outside its outer boundary")]
    HoleOutsideBoundary { source_ref: String },

    #[error("offsetting outline from '{source_ref}' by {distance} mm produced no polygon")]
    OffsetFailed { source_ref: String, distance: f64 },

    #[error(
        "item '{ref_id}' ({width:.1} x {height:.1} mm) exceeds the sheet \
         ({sheet_width:.1} x {sheet_height:.1} mm) in every allowed orientation"
    )]
    ItemExceedsSheet {
        ref_id: String,
        width: f64,
        height: f64,
        sheet_width: f64,
        sheet_height: f64,
    },

    #[error("download of '{key}' failed: {message}")]
    Download { key: String, message: String },

    #[error("upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    #[error("encoding output drawing failed: {message}")]
    DrawingEncode { message: String },
}

impl NestError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NestError::DrawingDecode { .. } => ErrorKind::Parse,
            NestError::NoClosedRing { .. } => ErrorKind::Parse,
            NestError::InvalidJob { .. } => ErrorKind::Parse,
            NestError::TooFewVertices { .. } => ErrorKind::Geometry,
            NestError::NonPositiveArea { .. } => ErrorKind::Geometry,
            NestError::SelfIntersecting { .. } => ErrorKind::Geometry,
            NestError::HoleOutsideBoundary { .. } => ErrorKind::Geometry,
            NestError::OffsetFailed { .. } => ErrorKind::Geometry,
            NestError::ItemExceedsSheet { .. } => ErrorKind::Placement,
            NestError::Download { .. } => ErrorKind::Storage,
            NestError::Upload { .. } => ErrorKind::Storage,
            NestError::DrawingEncode { .. } => ErrorKind::Storage,
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, NestError>;
