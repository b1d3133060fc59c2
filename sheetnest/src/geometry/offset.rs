use geo::Area;
use geo_buffer::buffer_polygon;
use geo_types::Polygon;
use ordered_float::OrderedFloat;

use crate::error::{NestError, Result};
use crate::geometry::Outline;

/// Inflates the outer ring of an outline outward by `distance` mm.
///
/// Holes are dropped: the result is only used for spacing/collision tests,
/// where material inside the part is irrelevant. A non-positive distance
/// returns the outer ring as-is.
pub fn inflate_outer(outline: &Outline, distance: f64, source_ref: &str) -> Result<Outline> {
    let shell = Polygon::new(outline.polygon().exterior().clone(), vec![]);
    if distance <= 0.0 {
        return Ok(Outline::from_polygon(shell));
    }

    let buffered = buffer_polygon(&shell, distance);
    let largest = buffered
        .into_iter()
        .max_by_key(|p| OrderedFloat(p.unsigned_area()))
        .ok_or_else(|| NestError::OffsetFailed {
            source_ref: source_ref.to_string(),
            distance,
        })?;

    // offsetting outward cannot introduce holes worth keeping
    let shell_only = Polygon::new(largest.exterior().clone(), vec![]);
    Ok(Outline::from_polygon(shell_only))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn inflating_a_rect_grows_its_bbox_by_the_distance() {
        let o = Outline::try_new(
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            vec![],
            "t",
        )
        .unwrap();
        let inflated = inflate_outer(&o, 2.5, "t").unwrap();
        assert!(approx_eq!(f64, inflated.width(), 15.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, inflated.height(), 15.0, epsilon = 1e-6));
        assert!(inflated.area() >= o.area());
    }

    #[test]
    fn zero_distance_returns_the_outer_ring() {
        let o = Outline::try_new(
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            vec![],
            "t",
        )
        .unwrap();
        let same = inflate_outer(&o, 0.0, "t").unwrap();
        assert!(approx_eq!(f64, same.area(), 100.0, epsilon = 1e-9));
    }
}
