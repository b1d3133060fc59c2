use crate::error::{NestError, Result};
use crate::geometry::Outline;

/// A part to be nested: a source reference id, its outline and the requested
/// quantity. Immutable once constructed; the placement engine expands it into
/// `quantity` independent candidates before packing.
#[derive(Clone, Debug)]
pub struct NestableItem {
    /// Source part identifier, used for labeling.
    pub ref_id: String,
    pub outline: Outline,
    /// Number of copies to place, at least 1.
    pub quantity: usize,
}

impl NestableItem {
    pub fn new(ref_id: String, outline: Outline, quantity: usize) -> Result<Self> {
        if quantity == 0 {
            return Err(NestError::InvalidJob {
                message: format!("item '{ref_id}' has quantity 0"),
            });
        }
        Ok(NestableItem {
            ref_id,
            outline,
            quantity,
        })
    }
}
