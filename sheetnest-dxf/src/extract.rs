//! Extracts closed outlines from 2D DXF drawings.
//!
//! Straight segments, circular arcs (standalone or encoded as bulge values
//! on polyline vertices) and full circles are supported. Segments sharing
//! endpoints are stitched into closed rings; the largest ring of each group
//! becomes an outer boundary and enclosed rings become its holes.
//!
//! Coordinates are consumed as-is in millimeters. No unit inference or
//! scaling happens here; that responsibility belongs to the upstream
//! CAD-export pipeline.

use std::path::Path;

use dxf::entities::EntityType;
use dxf::Drawing;
use log::{debug, warn};
use sheetnest::geometry::Outline;
use sheetnest::{NestError, Result};

use crate::tessellate::{
    arc_entity_points, bulge_points, circle_points, ARC_SEGMENTS, CIRCLE_SEGMENTS,
};

/// Endpoint tolerance when stitching segments into rings, in mm.
const STITCH_TOLERANCE: f64 = 0.01;

/// Loads a DXF file and extracts its outlines.
pub fn load_outlines(path: &Path) -> Result<Vec<Outline>> {
    let source_ref = path.display().to_string();
    let drawing = Drawing::load_file(path).map_err(|e| NestError::DrawingDecode {
        source_ref: source_ref.clone(),
        message: e.to_string(),
    })?;
    extract_outlines(&drawing, &source_ref)
}

/// Decodes DXF bytes and extracts their outlines. `source_ref` names the
/// origin (file key, path) for error reporting.
pub fn read_outlines(bytes: &[u8], source_ref: &str) -> Result<Vec<Outline>> {
    let mut reader = bytes;
    let drawing = Drawing::load(&mut reader).map_err(|e| NestError::DrawingDecode {
        source_ref: source_ref.to_string(),
        message: e.to_string(),
    })?;
    extract_outlines(&drawing, source_ref)
}

/// Walks a drawing's entities and produces one outline per closed ring group.
pub fn extract_outlines(drawing: &Drawing, source_ref: &str) -> Result<Vec<Outline>> {
    let mut chains: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut rings: Vec<Vec<(f64, f64)>> = Vec::new();

    for entity in drawing.entities() {
        match &entity.specific {
            EntityType::Line(line) => {
                chains.push(vec![(line.p1.x, line.p1.y), (line.p2.x, line.p2.y)]);
            }
            EntityType::Arc(arc) => {
                chains.push(arc_entity_points(
                    (arc.center.x, arc.center.y),
                    arc.radius,
                    arc.start_angle,
                    arc.end_angle,
                    ARC_SEGMENTS,
                ));
            }
            EntityType::Circle(circle) => {
                rings.push(circle_points(
                    (circle.center.x, circle.center.y),
                    circle.radius,
                    CIRCLE_SEGMENTS,
                ));
            }
            EntityType::LwPolyline(polyline) => {
                let vertices: Vec<((f64, f64), f64)> = polyline
                    .vertices
                    .iter()
                    .map(|v| ((v.x, v.y), v.bulge))
                    .collect();
                push_polyline(
                    vertices,
                    polyline.get_is_closed(),
                    &mut chains,
                    &mut rings,
                );
            }
            EntityType::Polyline(polyline) => {
                let vertices: Vec<((f64, f64), f64)> = polyline
                    .vertices()
                    .map(|v| ((v.location.x, v.location.y), v.bulge))
                    .collect();
                push_polyline(
                    vertices,
                    polyline.get_is_closed(),
                    &mut chains,
                    &mut rings,
                );
            }
            other => {
                debug!("ignoring unsupported {} in '{source_ref}'", entity_label(other));
            }
        }
    }

    let open_chains = stitch_chains(chains, &mut rings);

    if rings.is_empty() {
        return Err(NestError::NoClosedRing {
            source_ref: source_ref.to_string(),
            open_chains,
        });
    }
    if open_chains > 0 {
        warn!("'{source_ref}': {open_chains} open chain(s) could not be closed and were dropped");
    }

    group_rings(rings, source_ref)
}

/// Picks the outline to nest when a drawing contains several: the one with
/// the largest area. Everything else is logged and ignored.
pub fn primary_outline(outlines: Vec<Outline>, source_ref: &str) -> Result<Outline> {
    if outlines.len() > 1 {
        warn!(
            "'{source_ref}' contains {} outlines, nesting the largest",
            outlines.len()
        );
    }
    outlines
        .into_iter()
        .max_by(|a, b| {
            a.area()
                .partial_cmp(&b.area())
                .expect("outline area is NaN")
        })
        .ok_or_else(|| NestError::NoClosedRing {
            source_ref: source_ref.to_string(),
            open_chains: 0,
        })
}

/// Flattens a polyline's bulge segments and files it as a ring or open chain.
fn push_polyline(
    vertices: Vec<((f64, f64), f64)>,
    is_closed: bool,
    chains: &mut Vec<Vec<(f64, f64)>>,
    rings: &mut Vec<Vec<(f64, f64)>>,
) {
    if vertices.len() < 2 {
        return;
    }

    let mut points = vec![vertices[0].0];
    for window in vertices.windows(2) {
        let (start, bulge) = window[0];
        let (end, _) = window[1];
        points.extend(bulge_points(start, end, bulge, ARC_SEGMENTS));
    }
    if is_closed {
        // the last vertex's bulge describes the closing segment back to the start
        let (last, bulge) = *vertices.last().expect("polyline has vertices");
        let first = vertices[0].0;
        let mut closing = bulge_points(last, first, bulge, ARC_SEGMENTS);
        closing.pop(); // the ring closes implicitly
        points.extend(closing);
        rings.push(points);
    } else {
        chains.push(points);
    }
}

/// Connects open chains sharing endpoints (within [`STITCH_TOLERANCE`]) into
/// closed rings, appending them to `rings`. Returns the number of chains that
/// could not be closed.
fn stitch_chains(mut chains: Vec<Vec<(f64, f64)>>, rings: &mut Vec<Vec<(f64, f64)>>) -> usize {
    let mut open = 0;

    while !chains.is_empty() {
        let mut chain = chains.remove(0);

        loop {
            let tail = *chain.last().expect("chain is non-empty");
            if chain.len() > 2 && near(chain[0], tail) {
                chain.pop();
                rings.push(chain);
                break;
            }

            // find another chain connecting to either end of this one
            let next = chains.iter().position(|c| {
                near(tail, c[0])
                    || near(tail, *c.last().expect("chain is non-empty"))
                    || near(chain[0], c[0])
                    || near(chain[0], *c.last().expect("chain is non-empty"))
            });

            match next {
                Some(idx) => {
                    let mut other = chains.remove(idx);
                    if near(tail, other[0]) {
                        chain.extend(other.drain(1..));
                    } else if near(tail, *other.last().expect("chain is non-empty")) {
                        other.reverse();
                        chain.extend(other.drain(1..));
                    } else if near(chain[0], *other.last().expect("chain is non-empty")) {
                        other.pop();
                        other.extend(chain);
                        chain = other;
                    } else {
                        other.reverse();
                        other.pop();
                        other.extend(chain);
                        chain = other;
                    }
                }
                None => {
                    open += 1;
                    break;
                }
            }
        }
    }

    open
}

fn near(a: (f64, f64), b: (f64, f64)) -> bool {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    dx * dx + dy * dy <= STITCH_TOLERANCE * STITCH_TOLERANCE
}

/// Groups rings into outlines: largest-area rings become outer boundaries,
/// rings contained in an outer boundary become its holes.
fn group_rings(rings: Vec<Vec<(f64, f64)>>, source_ref: &str) -> Result<Vec<Outline>> {
    let mut indexed: Vec<Vec<(f64, f64)>> = rings;
    indexed.sort_by(|a, b| {
        ring_area(b)
            .partial_cmp(&ring_area(a))
            .expect("ring area is NaN")
    });

    // probe outlines (outer ring only) decide containment for later rings
    let mut groups: Vec<(Vec<(f64, f64)>, Vec<Vec<(f64, f64)>>, Outline)> = Vec::new();
    for ring in indexed {
        match groups
            .iter_mut()
            .find(|(_, _, probe)| probe.contains_point(ring[0]))
        {
            Some((_, holes, _)) => holes.push(ring),
            None => {
                let probe = Outline::try_new(ring.clone(), vec![], source_ref)?;
                groups.push((ring, Vec::new(), probe));
            }
        }
    }

    groups
        .into_iter()
        .map(|(outer, holes, _)| Outline::try_new(outer, holes, source_ref))
        .collect()
}

fn ring_area(ring: &[(f64, f64)]) -> f64 {
    let mut sigma = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        sigma += ring[i].0 * ring[j].1 - ring[j].0 * ring[i].1;
    }
    (0.5 * sigma).abs()
}

fn entity_label(entity: &EntityType) -> &'static str {
    match entity {
        EntityType::Text(_) => "TEXT",
        EntityType::Insert(_) => "INSERT",
        EntityType::Spline(_) => "SPLINE",
        _ => "entity",
    }
}
