use geo::{Centroid, Contains, Intersects};
use geo_types::{Coord, Line, LineString, Point, Polygon, Rect};

use crate::error::{NestError, Result};

/// Two points closer than this are considered coincident when cleaning rings.
const COINCIDENT_TOLERANCE: f64 = 1e-9;

/// A closed 2D boundary with optional holes, in millimeter coordinates.
///
/// Thin wrapper around [`geo_types::Polygon`] exposing only the operations the
/// placement engine needs ([`intersects`](Outline::intersects),
/// [`area`](Outline::area), [`translate`](Outline::translate),
/// [`rotate90`](Outline::rotate90)), so the geometry backend stays swappable.
///
/// Invariants, enforced at construction:
/// - the outer ring has at least 3 distinct vertices and positive area,
/// - the outer ring is not self-intersecting,
/// - every hole lies strictly inside the outer ring.
///
/// The outer ring is normalized counterclockwise, holes clockwise.
#[derive(Clone, Debug)]
pub struct Outline {
    poly: Polygon<f64>,
    bbox: Rect<f64>,
    area: f64,
}

impl Outline {
    /// Builds an outline from an outer ring and zero or more hole rings.
    ///
    /// `source_ref` names the originating entity/file and is carried into any
    /// [`NestError`] raised here.
    pub fn try_new(
        outer: Vec<(f64, f64)>,
        holes: Vec<Vec<(f64, f64)>>,
        source_ref: &str,
    ) -> Result<Self> {
        let mut outer = clean_ring(outer);
        if outer.len() < 3 {
            return Err(NestError::TooFewVertices {
                source_ref: source_ref.to_string(),
            });
        }

        let outer_area = signed_area(&outer);
        if outer_area.abs() <= COINCIDENT_TOLERANCE {
            return Err(NestError::NonPositiveArea {
                source_ref: source_ref.to_string(),
            });
        }
        if outer_area < 0.0 {
            outer.reverse();
        }

        if ring_self_intersects(&outer) {
            return Err(NestError::SelfIntersecting {
                source_ref: source_ref.to_string(),
            });
        }

        let outer_ls = ring_to_line_string(&outer);
        let shell = Polygon::new(outer_ls.clone(), vec![]);

        let mut hole_rings = Vec::with_capacity(holes.len());
        let mut holes_area = 0.0;
        for hole in holes {
            let mut hole = clean_ring(hole);
            if hole.len() < 3 {
                return Err(NestError::TooFewVertices {
                    source_ref: source_ref.to_string(),
                });
            }
            let hole_area = signed_area(&hole);
            if hole_area.abs() <= COINCIDENT_TOLERANCE {
                return Err(NestError::NonPositiveArea {
                    source_ref: source_ref.to_string(),
                });
            }
            // holes run clockwise, opposite to the outer ring
            if hole_area > 0.0 {
                hole.reverse();
            }
            let inside = hole
                .iter()
                .all(|&(x, y)| shell.contains(&Point::new(x, y)));
            if !inside {
                return Err(NestError::HoleOutsideBoundary {
                    source_ref: source_ref.to_string(),
                });
            }
            holes_area += hole_area.abs();
            hole_rings.push(ring_to_line_string(&hole));
        }

        let poly = Polygon::new(outer_ls, hole_rings);
        let bbox = bounding_box(&outer);

        Ok(Outline {
            poly,
            bbox,
            area: outer_area.abs() - holes_area,
        })
    }

    /// Wraps an already-valid polygon, recomputing the derived attributes.
    /// Used for shapes produced by trusted operations (offsetting, transforms).
    pub(crate) fn from_polygon(poly: Polygon<f64>) -> Self {
        let outer: Vec<(f64, f64)> = ring_points(poly.exterior());
        let holes_area: f64 = poly
            .interiors()
            .iter()
            .map(|h| signed_area(&ring_points(h)).abs())
            .sum();
        let bbox = bounding_box(&outer);
        let area = signed_area(&outer).abs() - holes_area;
        Outline { poly, bbox, area }
    }

    /// Net area in mm²: outer ring area minus hole areas.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Axis-aligned bounding box of the outer ring.
    pub fn bbox(&self) -> Rect<f64> {
        self.bbox
    }

    pub fn width(&self) -> f64 {
        self.bbox.width()
    }

    pub fn height(&self) -> f64 {
        self.bbox.height()
    }

    /// Area centroid of the polygon, holes accounted for.
    pub fn centroid(&self) -> (f64, f64) {
        match self.poly.centroid() {
            Some(c) => (c.x(), c.y()),
            None => {
                let c = self.bbox.center();
                (c.x, c.y)
            }
        }
    }

    /// Returns a copy shifted by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        use geo::Translate;
        Outline {
            poly: self.poly.translate(dx, dy),
            bbox: Rect::new(
                Coord {
                    x: self.bbox.min().x + dx,
                    y: self.bbox.min().y + dy,
                },
                Coord {
                    x: self.bbox.max().x + dx,
                    y: self.bbox.max().y + dy,
                },
            ),
            area: self.area,
        }
    }

    /// Returns a copy rotated 90° counterclockwise about the origin.
    /// The bounding box swaps width and height; area is unchanged.
    pub fn rotate90(&self) -> Self {
        use geo::MapCoords;
        let poly = self.poly.map_coords(|c| Coord { x: -c.y, y: c.x });
        Outline::from_polygon(poly)
    }

    /// True if the two outlines share any point (boundary contact included).
    pub fn intersects(&self, other: &Outline) -> bool {
        // cheap bbox reject before the full polygon test
        if self.bbox.max().x < other.bbox.min().x
            || other.bbox.max().x < self.bbox.min().x
            || self.bbox.max().y < other.bbox.min().y
            || other.bbox.max().y < self.bbox.min().y
        {
            return false;
        }
        self.poly.intersects(&other.poly)
    }

    /// True if `(x, y)` lies strictly inside the outline.
    pub fn contains_point(&self, (x, y): (f64, f64)) -> bool {
        self.poly.contains(&Point::new(x, y))
    }

    /// Vertices of the outer ring, without the closing duplicate.
    pub fn exterior_points(&self) -> Vec<(f64, f64)> {
        ring_points(self.poly.exterior())
    }

    /// Vertices of each hole ring, without the closing duplicates.
    pub fn hole_points(&self) -> Vec<Vec<(f64, f64)>> {
        self.poly.interiors().iter().map(ring_points).collect()
    }

    pub(crate) fn polygon(&self) -> &Polygon<f64> {
        &self.poly
    }
}

/// Shoelace formula: counterclockwise rings yield positive area.
fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let mut sigma = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        let (x_i, y_i) = ring[i];
        let (x_j, y_j) = ring[j];
        sigma += x_i * y_j - x_j * y_i;
    }
    0.5 * sigma
}

/// Drops consecutive duplicate points and a trailing point equal to the first.
fn clean_ring(ring: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut cleaned: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for p in ring {
        match cleaned.last() {
            Some(&last) if coincident(last, p) => {}
            _ => cleaned.push(p),
        }
    }
    if cleaned.len() > 1 && coincident(cleaned[0], cleaned[cleaned.len() - 1]) {
        cleaned.pop();
    }
    cleaned
}

fn coincident(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() <= COINCIDENT_TOLERANCE && (a.1 - b.1).abs() <= COINCIDENT_TOLERANCE
}

/// Checks every pair of non-adjacent edges for intersection.
fn ring_self_intersects(ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    let edge = |i: usize| {
        let j = (i + 1) % n;
        Line::new(
            Coord {
                x: ring[i].0,
                y: ring[i].1,
            },
            Coord {
                x: ring[j].0,
                y: ring[j].1,
            },
        )
    };
    for i in 0..n {
        for j in (i + 1)..n {
            // skip edges sharing a vertex
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            if edge(i).intersects(&edge(j)) {
                return true;
            }
        }
    }
    false
}

fn ring_to_line_string(ring: &[(f64, f64)]) -> LineString<f64> {
    LineString::from(ring.to_vec())
}

/// Ring vertices without the closing duplicate `geo` appends.
fn ring_points(ls: &LineString<f64>) -> Vec<(f64, f64)> {
    let mut pts: Vec<(f64, f64)> = ls.coords().map(|c| (c.x, c.y)).collect();
    if pts.len() > 1 && coincident(pts[0], pts[pts.len() - 1]) {
        pts.pop();
    }
    pts
}

fn bounding_box(ring: &[(f64, f64)]) -> Rect<f64> {
    let (mut x_min, mut y_min) = (f64::MAX, f64::MAX);
    let (mut x_max, mut y_max) = (f64::MIN, f64::MIN);
    for &(x, y) in ring {
        x_min = x_min.min(x);
        y_min = y_min.min(y);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }
    Rect::new(
        Coord { x: x_min, y: y_min },
        Coord { x: x_max, y: y_max },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use float_cmp::approx_eq;

    fn rect(w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
    }

    #[test]
    fn winding_is_normalized() {
        let ccw = Outline::try_new(rect(10.0, 5.0), vec![], "t").unwrap();
        let mut cw_ring = rect(10.0, 5.0);
        cw_ring.reverse();
        let cw = Outline::try_new(cw_ring, vec![], "t").unwrap();
        assert!(approx_eq!(f64, ccw.area(), 50.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, cw.area(), 50.0, epsilon = 1e-9));
    }

    #[test]
    fn holes_subtract_from_area() {
        let hole = vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)];
        let o = Outline::try_new(rect(10.0, 10.0), vec![hole], "t").unwrap();
        assert!(approx_eq!(f64, o.area(), 96.0, epsilon = 1e-9));
    }

    #[test]
    fn hole_outside_boundary_is_rejected() {
        let hole = vec![(20.0, 20.0), (22.0, 20.0), (22.0, 22.0), (20.0, 22.0)];
        let err = Outline::try_new(rect(10.0, 10.0), vec![hole], "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Geometry);
    }

    #[test]
    fn bowtie_is_rejected_as_self_intersecting() {
        let bowtie = vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)];
        let err = Outline::try_new(bowtie, vec![], "t").unwrap_err();
        assert!(matches!(err, NestError::SelfIntersecting { .. }));
    }

    #[test]
    fn degenerate_ring_is_rejected() {
        let line = vec![(0.0, 0.0), (10.0, 0.0), (5.0, 0.0)];
        let err = Outline::try_new(line, vec![], "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Geometry);
    }

    #[test]
    fn rotate90_swaps_bbox_dimensions() {
        let o = Outline::try_new(rect(10.0, 4.0), vec![], "t").unwrap();
        let r = o.rotate90();
        assert!(approx_eq!(f64, r.width(), 4.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, r.height(), 10.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, r.area(), o.area(), epsilon = 1e-9));
    }

    #[test]
    fn centroid_of_rect_is_center() {
        let o = Outline::try_new(rect(10.0, 4.0), vec![], "t").unwrap();
        let (cx, cy) = o.centroid();
        assert!(approx_eq!(f64, cx, 5.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, cy, 2.0, epsilon = 1e-9));
    }

    #[test]
    fn disjoint_outlines_do_not_intersect() {
        let a = Outline::try_new(rect(10.0, 10.0), vec![], "t").unwrap();
        let b = a.translate(20.0, 0.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&a.translate(5.0, 5.0)));
    }
}
