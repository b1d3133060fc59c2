use crate::geometry::Outline;

/// Orientation of a placed item. Only axis-aligned rotations are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    R0,
    R90,
}

/// A single placed copy of an item on a sheet.
///
/// The buffered counterpart of `shape` does not intersect any other
/// placement's buffered shape on the same sheet, nor the sheet's inner
/// margin boundary; the placement engine guarantees both.
#[derive(Clone, Debug)]
pub struct Placement {
    /// Index of the item in the job's item list.
    pub item_index: usize,
    /// 0-based copy number within the item's quantity, giving every placed
    /// instance an explicit identity beyond its label text.
    pub instance: usize,
    pub orientation: Orientation,
    /// Position of the oriented outline's origin on the sheet.
    pub translation: (f64, f64),
    /// World-space outline (holes included) in sheet coordinates.
    pub shape: Outline,
}
