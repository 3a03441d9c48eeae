//! Model document checks

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::model::{Model, Triangle};

use super::ValidationReport;

/// Individual index problems reported per object before summarizing
const MAX_REPORTED_PER_OBJECT: usize = 5;

/// Check geometry, references and tagging of a parsed model
pub(super) fn validate_model(model: &Model, report: &mut ValidationReport) {
    let geometry = &mut report.geometry;
    geometry.objects = model.resources.objects.len();
    geometry.vertices = model.vertex_count();
    geometry.triangles = model.triangle_count();
    geometry.build_items = model.build.items.len();
    geometry.base_materials = model
        .resources
        .base_material_groups
        .iter()
        .map(|g| g.materials.len())
        .sum();

    if model.triangle_count() == 0 {
        report.error("model document contains no triangles");
    }
    if model.build.items.is_empty() {
        report.error("model document has no build items");
    }

    validate_mesh_geometry(model, report);
    validate_build_references(model, report);
    validate_material_references(model, report);
    validate_triangle_tags(model, report);
}

/// Vertex index bounds and degeneracy
fn validate_mesh_geometry(model: &Model, report: &mut ValidationReport) {
    for object in &model.resources.objects {
        let Some(mesh) = object.mesh.as_ref() else {
            report.error(format!("object {} has no mesh", object.id));
            continue;
        };

        let num_vertices = mesh.vertices.len();
        let mut out_of_range = 0usize;
        let mut degenerate = 0usize;

        for (tri_idx, triangle) in mesh.triangles.iter().enumerate() {
            let max_index = triangle.v1.max(triangle.v2).max(triangle.v3);
            if max_index >= num_vertices {
                out_of_range += 1;
                if out_of_range <= MAX_REPORTED_PER_OBJECT {
                    report.error(format!(
                        "object {}: triangle {} references vertex {} but the mesh has {} vertices",
                        object.id, tri_idx, max_index, num_vertices
                    ));
                }
            }
            if triangle.is_degenerate() {
                degenerate += 1;
            }
        }

        if out_of_range > MAX_REPORTED_PER_OBJECT {
            report.error(format!(
                "object {}: {} more triangles reference missing vertices",
                object.id,
                out_of_range - MAX_REPORTED_PER_OBJECT
            ));
        }
        if degenerate > 0 {
            report.geometry.degenerate_triangles += degenerate;
            report.warning(format!(
                "object {}: {} degenerate triangle(s) with a repeated vertex index",
                object.id, degenerate
            ));
        }
    }
}

fn validate_build_references(model: &Model, report: &mut ValidationReport) {
    for item in &model.build.items {
        if model.object(item.objectid).is_none() {
            report.error(format!(
                "build item references object {} which does not exist",
                item.objectid
            ));
        }
    }
}

/// Object and triangle `pid` references, plus unused groups
fn validate_material_references(model: &Model, report: &mut ValidationReport) {
    let mut referenced = HashSet::new();

    for object in &model.resources.objects {
        if let Some(pid) = object.pid {
            referenced.insert(pid);
            match model.base_material_group(pid) {
                None => report.error(format!(
                    "object {} references base material group {} which does not exist",
                    object.id, pid
                )),
                Some(group) => {
                    let pindex = object.pindex.unwrap_or(0);
                    if pindex >= group.materials.len() {
                        report.error(format!(
                            "object {} uses pindex {} but base material group {} has {} entries",
                            object.id,
                            pindex,
                            pid,
                            group.materials.len()
                        ));
                    }
                }
            }
        }

        let Some(mesh) = object.mesh.as_ref() else {
            continue;
        };
        let mut bad = 0usize;
        for (tri_idx, triangle) in mesh.triangles.iter().enumerate() {
            let Some(pid) = triangle.pid.or(object.pid) else {
                if triangle.p1.is_some() {
                    bad += 1;
                    if bad <= MAX_REPORTED_PER_OBJECT {
                        report.error(format!(
                            "object {}: triangle {} has p1 without a pid",
                            object.id, tri_idx
                        ));
                    }
                }
                continue;
            };
            referenced.insert(pid);
            let Some(group) = model.base_material_group(pid) else {
                if triangle.pid.is_some() {
                    bad += 1;
                    if bad <= MAX_REPORTED_PER_OBJECT {
                        report.error(format!(
                            "object {}: triangle {} references base material group {} which does not exist",
                            object.id, tri_idx, pid
                        ));
                    }
                }
                continue;
            };
            if let Some(p1) = triangle.p1 {
                if p1 >= group.materials.len() {
                    bad += 1;
                    if bad <= MAX_REPORTED_PER_OBJECT {
                        report.error(format!(
                            "object {}: triangle {} uses p1 {} but base material group {} has {} entries",
                            object.id,
                            tri_idx,
                            p1,
                            pid,
                            group.materials.len()
                        ));
                    }
                }
            }
        }
        if bad > MAX_REPORTED_PER_OBJECT {
            report.error(format!(
                "object {}: {} more triangles have invalid material references",
                object.id,
                bad - MAX_REPORTED_PER_OBJECT
            ));
        }
    }

    for group in &model.resources.base_material_groups {
        if !referenced.contains(&group.id) {
            report.warning(format!(
                "base material group {} is not referenced by any object or triangle",
                group.id
            ));
        }
    }
}

/// A tag attribute must be on every triangle or on none
fn validate_triangle_tags(model: &Model, report: &mut ValidationReport) {
    type Tag = fn(&Triangle) -> bool;
    let tags: [(&str, Tag); 2] = [
        ("slic3rpe:mmu_segmentation", |t| {
            t.mmu_segmentation.as_deref().is_some_and(|v| !v.is_empty())
        }),
        ("paint_color", |t| {
            t.paint_color.as_deref().is_some_and(|v| !v.is_empty())
        }),
    ];

    let triangles: Vec<&Triangle> = model
        .resources
        .objects
        .iter()
        .filter_map(|o| o.mesh.as_ref())
        .flat_map(|m| m.triangles.iter())
        .collect();

    for (attribute, has_tag) in tags {
        let tagged = triangles.iter().filter(|t| has_tag(t)).count();
        if tagged > 0 && tagged < triangles.len() {
            report.error(format!(
                "{} of {} triangles carry {}; per-triangle tags must be on every triangle",
                tagged,
                triangles.len(),
                attribute
            ));
        }
    }
}

/// `displaycolor` values must share one letter case
pub(super) fn validate_color_style(xml: &str, report: &mut ValidationReport) {
    let colors = displaycolor_values(xml);
    let has_letters = |f: fn(&char) -> bool| colors.iter().any(|c| c.chars().any(|ch| f(&ch)));
    let upper = has_letters(|c| c.is_ascii_uppercase());
    let lower = has_letters(|c| c.is_ascii_lowercase());
    if upper && lower {
        report.error("base material display colors mix uppercase and lowercase hex digits");
    }
}

fn displaycolor_values(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut values = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"displaycolor" {
                        if let Ok(value) = std::str::from_utf8(&attr.value) {
                            values.push(value.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::model::*;

    fn model_with(triangles: Vec<Triangle>, vertices: usize) -> Model {
        let mut model = Model::new();
        let mut group = BaseMaterialGroup::new(1);
        group
            .materials
            .push(BaseMaterial::new("Color 1", Rgb::new(255, 0, 0)));
        group
            .materials
            .push(BaseMaterial::new("Color 2", Rgb::new(0, 0, 255)));
        model.resources.base_material_groups.push(group);

        let mut mesh = Mesh::new();
        for i in 0..vertices {
            mesh.vertices.push(Vertex::new(i as f32, 0.0, 0.0));
        }
        mesh.triangles = triangles;
        let mut object = Object::new(2);
        object.pid = Some(1);
        object.pindex = Some(0);
        object.mesh = Some(mesh);
        model.resources.objects.push(object);
        model.build.items.push(BuildItem::new(2));
        model
    }

    fn tagged(v: [usize; 3], tag: &str) -> Triangle {
        let mut t = Triangle::new(v[0], v[1], v[2]);
        t.mmu_segmentation = Some(tag.to_string());
        t
    }

    fn check(model: &Model) -> ValidationReport {
        let mut report = ValidationReport::default();
        validate_model(model, &mut report);
        report
    }

    #[test]
    fn test_valid_model() {
        let report = check(&model_with(vec![Triangle::new(0, 1, 2)], 3));
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.geometry.triangles, 1);
        assert_eq!(report.geometry.base_materials, 2);
    }

    #[test]
    fn test_out_of_range_vertex() {
        let report = check(&model_with(vec![Triangle::new(0, 1, 3)], 3));
        assert!(report.errors.iter().any(|e| e.contains("references vertex 3")));
    }

    #[test]
    fn test_degenerate_triangle_is_a_warning() {
        let report = check(&model_with(vec![Triangle::new(0, 1, 1)], 3));
        assert!(report.errors.is_empty());
        assert_eq!(report.geometry.degenerate_triangles, 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_partial_tagging_is_an_error() {
        let report = check(&model_with(
            vec![tagged([0, 1, 2], "4"), Triangle::new(0, 2, 1)],
            3,
        ));
        assert!(report.errors.iter().any(|e| e.contains("1 of 2 triangles")));

        let report = check(&model_with(
            vec![tagged([0, 1, 2], "4"), tagged([0, 2, 1], "8")],
            3,
        ));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_material_index_range() {
        let mut triangle = Triangle::new(0, 1, 2);
        triangle.pid = Some(1);
        triangle.p1 = Some(2);
        let report = check(&model_with(vec![triangle], 3));
        assert!(report.errors.iter().any(|e| e.contains("uses p1 2")));
    }

    #[test]
    fn test_dangling_references() {
        let mut model = model_with(vec![Triangle::new(0, 1, 2)], 3);
        model.build.items.push(BuildItem::new(9));
        model.resources.objects[0].pid = Some(7);
        let report = check(&model);
        assert!(report.errors.iter().any(|e| e.contains("object 9")));
        assert!(report.errors.iter().any(|e| e.contains("group 7")));
        assert!(report.warnings.iter().any(|w| w.contains("group 1 is not referenced")));
    }

    #[test]
    fn test_empty_model() {
        let report = check(&Model::new());
        assert!(report.errors.iter().any(|e| e.contains("no triangles")));
        assert!(report.errors.iter().any(|e| e.contains("no build items")));
    }

    #[test]
    fn test_mixed_case_colors() {
        let mut report = ValidationReport::default();
        validate_color_style(
            "<basematerials id=\"1\"><base displaycolor=\"#FF0000\"/><base displaycolor=\"#00ff00\"/></basematerials>",
            &mut report,
        );
        assert_eq!(report.errors.len(), 1);

        let mut report = ValidationReport::default();
        validate_color_style(
            "<basematerials id=\"1\"><base displaycolor=\"#FF0000\"/><base displaycolor=\"#000000\"/></basematerials>",
            &mut report,
        );
        assert!(report.errors.is_empty());
    }
}
