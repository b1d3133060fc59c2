use dxf::entities::EntityType;
use dxf::Drawing;
use float_cmp::approx_eq;
use sheetnest::blf;
use sheetnest::entities::{NestJob, NestableItem};
use sheetnest::geometry::Outline;
use sheetnest_dxf::export::{
    drawing_to_bytes, label_for, sheet_to_drawing, LABEL_TEXT_HEIGHT, LAYER_LABELS, LAYER_PARTS,
    LAYER_SHEET,
};
use sheetnest_dxf::manifest::NestManifest;

fn rect_item(id: &str, w: f64, h: f64, qty: usize) -> NestableItem {
    let outline = Outline::try_new(
        vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)],
        vec![],
        id,
    )
    .unwrap();
    NestableItem::new(id.to_string(), outline, qty).unwrap()
}

fn packed_job() -> (NestJob, sheetnest::entities::NestSolution) {
    let job = NestJob::new(
        500.0,
        500.0,
        5.0,
        true,
        vec![rect_item("bracket", 100.0, 50.0, 2), rect_item("plate", 80.0, 60.0, 1)],
    )
    .unwrap();
    let solution = blf::pack(&job).unwrap();
    (job, solution)
}

#[test]
fn drawing_carries_three_layers_of_entities() {
    let (job, solution) = packed_job();
    let sheet = &solution.sheets[0];
    let drawing = sheet_to_drawing(sheet, &job.items);

    let mut sheet_polylines = 0;
    let mut part_polylines = 0;
    let mut labels = 0;
    for entity in drawing.entities() {
        match (&entity.specific, entity.common.layer.as_str()) {
            (EntityType::LwPolyline(_), LAYER_SHEET) => sheet_polylines += 1,
            (EntityType::LwPolyline(_), LAYER_PARTS) => part_polylines += 1,
            (EntityType::Text(text), LAYER_LABELS) => {
                assert!(approx_eq!(f64, text.text_height, LABEL_TEXT_HEIGHT, epsilon = 1e-9));
                labels += 1;
            }
            other => panic!("unexpected entity/layer combination: {:?}", other.1),
        }
    }

    assert_eq!(sheet_polylines, 1);
    assert_eq!(part_polylines, sheet.placements.len());
    assert_eq!(labels, sheet.placements.len());
}

#[test]
fn drawing_bytes_reload_with_the_same_entities() {
    let (job, solution) = packed_job();
    let sheet = &solution.sheets[0];
    let drawing = sheet_to_drawing(sheet, &job.items);

    let bytes = drawing_to_bytes(&drawing).unwrap();
    assert!(!bytes.is_empty());

    let mut reader = bytes.as_slice();
    let reloaded = Drawing::load(&mut reader).unwrap();
    assert_eq!(reloaded.entities().count(), drawing.entities().count());
}

#[test]
fn labels_carry_id_and_quantity_marker() {
    let (job, solution) = packed_job();
    let placements = &solution.sheets[0].placements;

    let labels: Vec<String> = placements.iter().map(|p| label_for(&job.items, p)).collect();
    assert!(labels.contains(&"bracket 1/2".to_string()));
    assert!(labels.contains(&"bracket 2/2".to_string()));
    assert!(labels.contains(&"plate 1/1".to_string()));
}

#[test]
fn manifest_summarizes_all_sheets() {
    let (_, solution) = packed_job();
    let files = vec!["proj/nests/j1/sheet_1.dxf".to_string()];
    let manifest = NestManifest::new("j1", &solution, &files);

    assert_eq!(manifest.job_id, "j1");
    assert_eq!(manifest.total_sheets, 1);
    assert_eq!(manifest.sheets.len(), 1);
    assert_eq!(manifest.sheets[0].index, 1);
    assert_eq!(manifest.sheets[0].file, files[0]);
    assert_eq!(manifest.sheets[0].placements, 3);
    assert!(manifest.utilization > 0.0 && manifest.utilization <= 100.0);

    // wire format is camelCase
    let json = serde_json::to_string(&manifest).unwrap();
    assert!(json.contains("\"jobId\":\"j1\""));
    assert!(json.contains("\"totalSheets\":1"));
}
