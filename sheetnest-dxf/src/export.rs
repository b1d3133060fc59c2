//! Renders packed sheets as layered DXF drawings.
//!
//! Each sheet becomes one drawing with three layers: the sheet boundary,
//! the placed part outlines in sheet coordinates, and a text label per
//! placement. The exporter trusts the placement engine's invariants and
//! performs no geometric validation of its own.

use dxf::entities::{Entity, EntityType, LwPolyline, Text};
use dxf::enums::AcadVersion;
use dxf::tables::Layer;
use dxf::{Color, Drawing, LwPolylineVertex, Point};
use sheetnest::entities::{NestableItem, Placement, Sheet};
use sheetnest::{NestError, Result};

/// Layer carrying the sheet boundary rectangle.
pub const LAYER_SHEET: &str = "SHEET";
/// Layer carrying the placed part outlines.
pub const LAYER_PARTS: &str = "PARTS";
/// Layer carrying the per-placement labels.
pub const LAYER_LABELS: &str = "LABELS";

/// Text height for placement labels, in mm.
pub const LABEL_TEXT_HEIGHT: f64 = 10.0;

// AutoCAD color indices per layer
const COLOR_SHEET: u8 = 5; // blue
const COLOR_PARTS: u8 = 7; // white/black
const COLOR_LABELS: u8 = 3; // green

/// Builds the layered drawing for one sheet. `items` is the job's item list,
/// used to resolve labels from each placement's item index.
pub fn sheet_to_drawing(sheet: &Sheet, items: &[NestableItem]) -> Drawing {
    let mut drawing = Drawing::new();
    // LWPOLYLINE needs at least R14; older target versions would silently
    // drop the outlines on save
    drawing.header.version = AcadVersion::R2000;

    for (name, color) in [
        (LAYER_SHEET, COLOR_SHEET),
        (LAYER_PARTS, COLOR_PARTS),
        (LAYER_LABELS, COLOR_LABELS),
    ] {
        drawing.add_layer(Layer {
            name: name.to_string(),
            color: Color::from_index(color),
            ..Default::default()
        });
    }

    // sheet boundary
    let boundary = closed_polyline(&[
        (0.0, 0.0),
        (sheet.width, 0.0),
        (sheet.width, sheet.height),
        (0.0, sheet.height),
    ]);
    add_on_layer(&mut drawing, EntityType::LwPolyline(boundary), LAYER_SHEET);

    // part outlines, already in sheet coordinates
    for placement in &sheet.placements {
        let exterior = closed_polyline(&placement.shape.exterior_points());
        add_on_layer(&mut drawing, EntityType::LwPolyline(exterior), LAYER_PARTS);
        for hole in placement.shape.hole_points() {
            let ring = closed_polyline(&hole);
            add_on_layer(&mut drawing, EntityType::LwPolyline(ring), LAYER_PARTS);
        }
    }

    // labels at each placement's centroid; these never affect collisions
    for placement in &sheet.placements {
        let (cx, cy) = placement.shape.centroid();
        let mut text = Text::default();
        text.value = label_for(items, placement);
        text.location = Point::new(cx, cy, 0.0);
        text.text_height = LABEL_TEXT_HEIGHT;
        add_on_layer(&mut drawing, EntityType::Text(text), LAYER_LABELS);
    }

    drawing
}

/// Serializes a drawing to DXF bytes.
pub fn drawing_to_bytes(drawing: &Drawing) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = Vec::new();
    drawing
        .save(&mut buffer)
        .map_err(|e| NestError::DrawingEncode {
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Label text: source item id plus an instance/quantity marker.
pub fn label_for(items: &[NestableItem], placement: &Placement) -> String {
    let item = &items[placement.item_index];
    format!("{} {}/{}", item.ref_id, placement.instance + 1, item.quantity)
}

fn closed_polyline(points: &[(f64, f64)]) -> LwPolyline {
    let mut polyline = LwPolyline::default();
    polyline.vertices = points
        .iter()
        .map(|&(x, y)| LwPolylineVertex {
            x,
            y,
            ..Default::default()
        })
        .collect();
    polyline.set_is_closed(true);
    polyline
}

fn add_on_layer(drawing: &mut Drawing, specific: EntityType, layer: &str) {
    let mut entity = Entity::new(specific);
    entity.common.layer = layer.to_string();
    drawing.add_entity(entity);
}
