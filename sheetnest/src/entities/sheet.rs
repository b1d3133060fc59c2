use crate::entities::Placement;

/// One instance of stock material with fixed dimensions onto which parts are
/// nested. Created on demand as capacity is exhausted; once the engine stops
/// targeting a sheet it is never mutated again.
#[derive(Clone, Debug)]
pub struct Sheet {
    /// Width in mm.
    pub width: f64,
    /// Height in mm.
    pub height: f64,
    /// Placements in the order they were made.
    pub placements: Vec<Placement>,
}

impl Sheet {
    pub fn new(width: f64, height: f64) -> Self {
        Sheet {
            width,
            height,
            placements: Vec::new(),
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Sum of the placed parts' net (unbuffered) areas.
    pub fn placed_area(&self) -> f64 {
        self.placements.iter().map(|p| p.shape.area()).sum()
    }

    /// Placed-area / sheet-area, as a percentage.
    pub fn utilization(&self) -> f64 {
        match self.area() {
            a if a > 0.0 => self.placed_area() / a * 100.0,
            _ => 0.0,
        }
    }
}
