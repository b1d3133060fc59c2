//! Per-job manifest summarizing the produced layout.

use serde::{Deserialize, Serialize};
use sheetnest::entities::NestSolution;

/// Summary record persisted alongside the per-sheet drawings.
/// This is the structured result the surrounding system reads; the drawings
/// themselves are opaque artifacts to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestManifest {
    /// Identifier of the job that produced this layout.
    pub job_id: String,
    /// Number of sheets in the layout.
    pub total_sheets: usize,
    /// Area-weighted utilization across all sheets, as a percentage.
    pub utilization: f64,
    /// One entry per produced sheet, in production order.
    pub sheets: Vec<ManifestSheet>,
}

/// Summary of a single sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSheet {
    /// 1-based sheet number, matching the drawing filename.
    pub index: usize,
    /// Storage reference of the sheet's drawing.
    pub file: String,
    /// Placed-area / sheet-area, as a percentage.
    pub utilization: f64,
    /// Number of parts placed on this sheet.
    pub placements: usize,
}

impl NestManifest {
    /// Composes the manifest for a finished solution. `files` holds one
    /// storage reference per sheet, in the same order.
    pub fn new(job_id: &str, solution: &NestSolution, files: &[String]) -> Self {
        debug_assert_eq!(solution.sheets.len(), files.len());
        let sheets = solution
            .sheets
            .iter()
            .zip(files)
            .enumerate()
            .map(|(i, (sheet, file))| ManifestSheet {
                index: i + 1,
                file: file.clone(),
                utilization: sheet.utilization(),
                placements: sheet.placements.len(),
            })
            .collect();

        NestManifest {
            job_id: job_id.to_string(),
            total_sheets: solution.sheets.len(),
            utilization: solution.utilization(),
            sheets,
        }
    }
}
