//! Arc tessellation.
//!
//! Arcs are flattened into short straight segments at extraction time; exact
//! arc geometry is not preserved past this stage. This trades a bounded area
//! error for simple, uniform polygon handling downstream.

use std::f64::consts::TAU;

/// Number of straight segments substituted for a circular arc.
pub(crate) const ARC_SEGMENTS: usize = 16;

/// Number of straight segments substituted for a full circle.
pub(crate) const CIRCLE_SEGMENTS: usize = 2 * ARC_SEGMENTS;

/// Points along the arc from `start` to `end` described by a polyline bulge
/// value (`bulge = tan(sweep / 4)`, sign gives direction). The start point is
/// excluded, the exact end point is included.
pub(crate) fn bulge_points(
    start: (f64, f64),
    end: (f64, f64),
    bulge: f64,
    n: usize,
) -> Vec<(f64, f64)> {
    if bulge.abs() < 1e-12 {
        return vec![end];
    }
    let (sx, sy) = start;
    let (ex, ey) = end;
    let (dx, dy) = (ex - sx, ey - sy);
    let chord = (dx * dx + dy * dy).sqrt();
    if chord < 1e-12 {
        return vec![end];
    }

    // arc midpoint: chord midpoint offset by the sagitta, on the right-hand
    // perpendicular for a positive (counterclockwise) bulge
    let sagitta = bulge * chord / 2.0;
    let mid = (
        (sx + ex) / 2.0 + dy / chord * sagitta,
        (sy + ey) / 2.0 - dx / chord * sagitta,
    );

    arc_through_points(start, mid, end, n)
}

/// Tessellates the arc passing through three points into `n` segments,
/// returning the points after `a` (with `c` exact as the last point).
/// Falls back to the straight chord when the points are collinear.
pub(crate) fn arc_through_points(
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    n: usize,
) -> Vec<(f64, f64)> {
    let (ax, ay) = a;
    let (bx, by) = b;
    let (cx, cy) = c;

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-9 {
        return vec![c];
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let uy = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;
    let radius = ((ax - ux).powi(2) + (ay - uy).powi(2)).sqrt();

    let ang_a = (ay - uy).atan2(ax - ux);
    let mut ang_c = (cy - uy).atan2(cx - ux);

    // sweep direction from the orientation of the three points
    let ccw = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax) > 0.0;
    if ccw {
        while ang_c <= ang_a {
            ang_c += TAU;
        }
    } else {
        while ang_c >= ang_a {
            ang_c -= TAU;
        }
    }

    let mut points = Vec::with_capacity(n);
    for i in 1..n {
        let angle = ang_a + (ang_c - ang_a) * (i as f64) / (n as f64);
        points.push((ux + radius * angle.cos(), uy + radius * angle.sin()));
    }
    points.push(c);
    points
}

/// A full circle as a closed ring of `n` points, counterclockwise.
pub(crate) fn circle_points(center: (f64, f64), radius: f64, n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let angle = TAU * (i as f64) / (n as f64);
            (center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
        })
        .collect()
}

/// A DXF ARC entity (angles in degrees, counterclockwise) as an open chain
/// of `n + 1` points, start to end.
pub(crate) fn arc_entity_points(
    center: (f64, f64),
    radius: f64,
    start_deg: f64,
    end_deg: f64,
    n: usize,
) -> Vec<(f64, f64)> {
    let start = start_deg.to_radians();
    let mut end = end_deg.to_radians();
    while end <= start {
        end += TAU;
    }
    (0..=n)
        .map(|i| {
            let angle = start + (end - start) * (i as f64) / (n as f64);
            (center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn zero_bulge_is_a_straight_segment() {
        let pts = bulge_points((0.0, 0.0), (10.0, 0.0), 0.0, ARC_SEGMENTS);
        assert_eq!(pts, vec![(10.0, 0.0)]);
    }

    #[test]
    fn unit_bulge_traces_a_semicircle() {
        // bulge 1.0 = 180° counterclockwise sweep; chord (0,0)-(10,0),
        // radius 5, apex below the chord at (5,-5)
        let pts = bulge_points((0.0, 0.0), (10.0, 0.0), 1.0, ARC_SEGMENTS);
        assert_eq!(pts.len(), ARC_SEGMENTS);
        let last = *pts.last().unwrap();
        assert!(approx_eq!(f64, last.0, 10.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, last.1, 0.0, epsilon = 1e-9));
        // every sampled point sits on the radius-5 circle around (5, 0)
        for &(x, y) in &pts {
            let r = ((x - 5.0).powi(2) + y.powi(2)).sqrt();
            assert!(approx_eq!(f64, r, 5.0, epsilon = 1e-6), "({x}, {y}) off arc");
        }
        let apex = pts[ARC_SEGMENTS / 2 - 1];
        assert!(approx_eq!(f64, apex.0, 5.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, apex.1, -5.0, epsilon = 1e-6));
    }

    #[test]
    fn circle_ring_is_closed_and_on_radius() {
        let pts = circle_points((3.0, 4.0), 2.0, CIRCLE_SEGMENTS);
        assert_eq!(pts.len(), CIRCLE_SEGMENTS);
        for (x, y) in pts {
            let r = ((x - 3.0).powi(2) + (y - 4.0).powi(2)).sqrt();
            assert!(approx_eq!(f64, r, 2.0, epsilon = 1e-9));
        }
    }

    #[test]
    fn arc_entity_spans_start_to_end() {
        let pts = arc_entity_points((0.0, 0.0), 10.0, 0.0, 90.0, ARC_SEGMENTS);
        assert_eq!(pts.len(), ARC_SEGMENTS + 1);
        let first = pts[0];
        let last = *pts.last().unwrap();
        assert!(approx_eq!(f64, first.0, 10.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, first.1, 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, last.0, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, last.1, 10.0, epsilon = 1e-6));
    }
}
