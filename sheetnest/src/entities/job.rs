use crate::entities::{NestableItem, Sheet};
use crate::error::{NestError, Result};

/// One request to nest a set of items with specific sheet, spacing and
/// rotation parameters. Validated once at intake and consumed by a single
/// packing pass.
#[derive(Clone, Debug)]
pub struct NestJob {
    /// Sheet width in mm.
    pub sheet_width: f64,
    /// Sheet height in mm.
    pub sheet_height: f64,
    /// Minimum gap between parts (and between parts and the sheet edge), mm.
    pub spacing: f64,
    /// Whether items may be rotated by 90°.
    pub allow_rotation: bool,
    pub items: Vec<NestableItem>,
}

impl NestJob {
    pub fn new(
        sheet_width: f64,
        sheet_height: f64,
        spacing: f64,
        allow_rotation: bool,
        items: Vec<NestableItem>,
    ) -> Result<Self> {
        if !(sheet_width > 0.0 && sheet_height > 0.0) {
            return Err(NestError::InvalidJob {
                message: format!("sheet dimensions must be positive, got {sheet_width} x {sheet_height}"),
            });
        }
        if !(spacing >= 0.0) {
            return Err(NestError::InvalidJob {
                message: format!("spacing must be non-negative, got {spacing}"),
            });
        }
        if items.is_empty() {
            return Err(NestError::InvalidJob {
                message: "job contains no items".to_string(),
            });
        }
        Ok(NestJob {
            sheet_width,
            sheet_height,
            spacing,
            allow_rotation,
            items,
        })
    }

    /// Total number of placement candidates after quantity expansion.
    pub fn total_instances(&self) -> usize {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// The finished layout produced by packing a [`NestJob`]: an ordered list of
/// sheets, each carrying its placements.
#[derive(Clone, Debug)]
pub struct NestSolution {
    pub sheets: Vec<Sheet>,
}

impl NestSolution {
    /// Area-weighted utilization across all sheets, as a percentage.
    pub fn utilization(&self) -> f64 {
        let total_sheet_area: f64 = self.sheets.iter().map(Sheet::area).sum();
        match total_sheet_area {
            a if a > 0.0 => {
                let placed: f64 = self.sheets.iter().map(Sheet::placed_area).sum();
                placed / a * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn total_placements(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }
}
