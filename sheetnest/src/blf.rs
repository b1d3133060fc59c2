//! Bottom-Left-Fill placement engine.
//!
//! Greedy, single pass, no backtracking: candidates are sorted by bounding
//! box area (descending, stable) and each is placed at the lowest-`y`,
//! then lowest-`x` collision-free anchor on the most recently opened sheet.
//! The scan is fully deterministic: identical input yields identical output.
//!
//! Every placement is tested against all prior placements on its sheet, so
//! the cost is O(n²) per sheet in the number of candidates. Jobs with
//! hundreds of parts are expected to take single-digit seconds.

use std::cmp::Reverse;

use itertools::Itertools;
use log::{debug, info};
use ordered_float::OrderedFloat;

use crate::entities::{NestJob, NestSolution, NestableItem, Orientation, Placement, Sheet};
use crate::error::{NestError, Result};
use crate::geometry::{inflate_outer, Outline};

/// Nudge applied to anchors derived from placed parts, so that buffered
/// polygons of adjacent placements stay strictly disjoint.
const ANCHOR_EPS: f64 = 1e-3;

/// Slack for the containment test against the sheet's inner margin boundary.
const CONTAIN_TOL: f64 = 1e-9;

/// An item outline prepared for one orientation: part and buffered shape
/// share a frame in which the buffered bounding box's min corner is the
/// origin, so an anchor position is also the placement translation.
struct OrientedShape {
    orientation: Orientation,
    part: Outline,
    buffered: Outline,
}

/// A sheet that is still accepting placements, along with the buffered
/// world-space shapes of everything placed on it so far.
struct SheetState {
    sheet: Sheet,
    buffered: Vec<Outline>,
}

impl SheetState {
    fn new(width: f64, height: f64) -> Self {
        SheetState {
            sheet: Sheet::new(width, height),
            buffered: Vec::new(),
        }
    }

    fn place(
        &mut self,
        item_index: usize,
        instance: usize,
        shape: &OrientedShape,
        (ax, ay): (f64, f64),
    ) {
        self.sheet.placements.push(Placement {
            item_index,
            instance,
            orientation: shape.orientation,
            translation: (ax, ay),
            shape: shape.part.translate(ax, ay),
        });
        self.buffered.push(shape.buffered.translate(ax, ay));
    }
}

/// Packs all items of `job` onto as many sheets as needed.
///
/// Fails with a [`Placement`](crate::ErrorKind::Placement)-kind error if any
/// candidate does not fit on an empty sheet in any allowed orientation;
/// no candidate is ever silently dropped from the layout.
pub fn pack(job: &NestJob) -> Result<NestSolution> {
    let margin = job.spacing / 2.0;

    let shape_table: Vec<Vec<OrientedShape>> = job
        .items
        .iter()
        .map(|item| oriented_shapes(item, margin, job.allow_rotation))
        .collect::<Result<_>>()?;

    // expand quantities into independent candidates
    let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(job.total_instances());
    for (item_index, item) in job.items.iter().enumerate() {
        for instance in 0..item.quantity {
            candidates.push((item_index, instance));
        }
    }
    // biggest bounding boxes first; the sort is stable, so ties keep input order
    candidates.sort_by_key(|&(item_index, _)| {
        let bbox = job.items[item_index].outline.bbox();
        Reverse(OrderedFloat(bbox.width() * bbox.height()))
    });

    let mut sheets: Vec<SheetState> = vec![SheetState::new(job.sheet_width, job.sheet_height)];

    for &(item_index, instance) in &candidates {
        let shapes = &shape_table[item_index];
        let found = {
            let current = sheets.last().expect("at least one open sheet");
            find_position(shapes, &current.buffered, margin, job.sheet_width, job.sheet_height)
        };

        match found {
            Some((shape_idx, anchor)) => {
                debug!(
                    "[BLF] placing '{}' #{} at ({:.2}, {:.2}) on sheet {}",
                    job.items[item_index].ref_id,
                    instance,
                    anchor.0,
                    anchor.1,
                    sheets.len()
                );
                let current = sheets.last_mut().expect("at least one open sheet");
                current.place(item_index, instance, &shapes[shape_idx], anchor);
            }
            None => {
                // current sheet is exhausted for this candidate, retry on a fresh one
                let mut fresh = SheetState::new(job.sheet_width, job.sheet_height);
                match find_position(shapes, &fresh.buffered, margin, job.sheet_width, job.sheet_height)
                {
                    Some((shape_idx, anchor)) => {
                        fresh.place(item_index, instance, &shapes[shape_idx], anchor);
                        sheets.push(fresh);
                        debug!("[BLF] opened sheet {}", sheets.len());
                    }
                    None => {
                        let item = &job.items[item_index];
                        return Err(NestError::ItemExceedsSheet {
                            ref_id: item.ref_id.clone(),
                            width: item.outline.width(),
                            height: item.outline.height(),
                            sheet_width: job.sheet_width,
                            sheet_height: job.sheet_height,
                        });
                    }
                }
            }
        }
    }

    let solution = NestSolution {
        sheets: sheets.into_iter().map(|s| s.sheet).collect_vec(),
    };

    info!(
        "[BLF] placed {} candidates on {} sheet(s), {:.2}% utilization",
        solution.total_placements(),
        solution.sheets.len(),
        solution.utilization()
    );

    Ok(solution)
}

fn oriented_shapes(
    item: &NestableItem,
    margin: f64,
    allow_rotation: bool,
) -> Result<Vec<OrientedShape>> {
    let mut shapes = vec![normalized(
        item.outline.clone(),
        Orientation::R0,
        margin,
        &item.ref_id,
    )?];
    if allow_rotation {
        shapes.push(normalized(
            item.outline.rotate90(),
            Orientation::R90,
            margin,
            &item.ref_id,
        )?);
    }
    Ok(shapes)
}

fn normalized(
    outline: Outline,
    orientation: Orientation,
    margin: f64,
    source_ref: &str,
) -> Result<OrientedShape> {
    let buffered = inflate_outer(&outline, margin, source_ref)?;
    let min = buffered.bbox().min();
    Ok(OrientedShape {
        orientation,
        part: outline.translate(-min.x, -min.y),
        buffered: buffered.translate(-min.x, -min.y),
    })
}

/// Scans candidate anchors in (y, x) order and returns the first orientation
/// and position whose buffered shape fits inside the margin-deflated sheet
/// without intersecting any already-placed buffered shape. Orientations are
/// tried 0° first, so exact (y, x) ties resolve to the unrotated placement.
fn find_position(
    shapes: &[OrientedShape],
    placed: &[Outline],
    margin: f64,
    sheet_width: f64,
    sheet_height: f64,
) -> Option<(usize, (f64, f64))> {
    let x_limit = sheet_width - margin;
    let y_limit = sheet_height - margin;

    let mut xs: Vec<f64> = std::iter::once(margin)
        .chain(placed.iter().map(|b| b.bbox().max().x + ANCHOR_EPS))
        .collect();
    let mut ys: Vec<f64> = std::iter::once(margin)
        .chain(placed.iter().map(|b| b.bbox().max().y + ANCHOR_EPS))
        .collect();
    xs.sort_by_key(|&v| OrderedFloat(v));
    xs.dedup();
    ys.sort_by_key(|&v| OrderedFloat(v));
    ys.dedup();

    for &ay in &ys {
        for &ax in &xs {
            for (shape_idx, shape) in shapes.iter().enumerate() {
                let bbox = shape.buffered.bbox();
                if ax + bbox.width() > x_limit + CONTAIN_TOL
                    || ay + bbox.height() > y_limit + CONTAIN_TOL
                {
                    continue;
                }
                let world = shape.buffered.translate(ax, ay);
                if placed.iter().all(|other| !world.intersects(other)) {
                    return Some((shape_idx, (ax, ay)));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn rect_item(id: &str, w: f64, h: f64, qty: usize) -> NestableItem {
        let outline = Outline::try_new(
            vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)],
            vec![],
            id,
        )
        .unwrap();
        NestableItem::new(id.to_string(), outline, qty).unwrap()
    }

    #[test]
    fn second_item_lands_right_of_the_first() {
        let job = NestJob::new(
            100.0,
            100.0,
            4.0,
            false,
            vec![rect_item("a", 20.0, 20.0, 2)],
        )
        .unwrap();
        let solution = pack(&job).unwrap();
        let placements = &solution.sheets[0].placements;
        assert_eq!(placements.len(), 2);
        // same row, second shifted right
        assert!(approx_eq!(
            f64,
            placements[0].translation.1,
            placements[1].translation.1,
            epsilon = 1e-9
        ));
        assert!(placements[1].translation.0 > placements[0].translation.0);
    }

    #[test]
    fn rotation_allows_a_tall_item_onto_a_wide_sheet() {
        let items = vec![rect_item("tall", 40.0, 180.0, 1)];
        let no_rot = NestJob::new(200.0, 60.0, 5.0, false, items.clone()).unwrap();
        assert!(matches!(
            pack(&no_rot).unwrap_err(),
            NestError::ItemExceedsSheet { .. }
        ));

        let with_rot = NestJob::new(200.0, 60.0, 5.0, true, items).unwrap();
        let solution = pack(&with_rot).unwrap();
        assert_eq!(solution.total_placements(), 1);
        assert_eq!(
            solution.sheets[0].placements[0].orientation,
            Orientation::R90
        );
    }

    #[test]
    fn larger_items_are_placed_first() {
        let job = NestJob::new(
            500.0,
            500.0,
            5.0,
            false,
            vec![rect_item("small", 10.0, 10.0, 1), rect_item("big", 50.0, 50.0, 1)],
        )
        .unwrap();
        let solution = pack(&job).unwrap();
        let first = &solution.sheets[0].placements[0];
        assert_eq!(first.item_index, 1);
    }
}
