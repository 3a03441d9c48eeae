//! Core 3MF element parsing
//!
//! Objects, vertices, triangles and build items.

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;

use super::{get_local_name, parse_attributes};

/// Parse object element attributes
pub fn parse_object(e: &BytesStart) -> Result<Object> {
    let attrs = parse_attributes(e)?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::InvalidXml("Object missing id attribute".to_string()))?
        .parse::<usize>()?;

    let mut object = Object::new(id);
    object.name = attrs.get("name").cloned();

    match attrs.get("type").map(String::as_str) {
        None | Some("model") => {}
        Some(other) => {
            return Err(Error::InvalidXml(format!(
                "Object {} has type '{}'; only 'model' objects are produced",
                id, other
            )));
        }
    }

    if let Some(pid) = attrs.get("pid") {
        object.pid = Some(pid.parse::<usize>()?);
    }
    if let Some(pindex) = attrs.get("pindex") {
        object.pindex = Some(pindex.parse::<usize>()?);
    }

    Ok(object)
}

/// Parse vertex element attributes
pub fn parse_vertex(e: &BytesStart) -> Result<Vertex> {
    let mut x_opt: Option<f32> = None;
    let mut y_opt: Option<f32> = None;
    let mut z_opt: Option<f32> = None;

    let parse_f32 = |value: &[u8]| -> Result<f32> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        Ok(value_str.parse::<f32>()?)
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => x_opt = Some(parse_f32(&attr.value)?),
            b"y" => y_opt = Some(parse_f32(&attr.value)?),
            b"z" => z_opt = Some(parse_f32(&attr.value)?),
            _ => {}
        }
    }

    let x = x_opt.ok_or_else(|| Error::InvalidXml("Vertex missing x attribute".to_string()))?;
    let y = y_opt.ok_or_else(|| Error::InvalidXml("Vertex missing y attribute".to_string()))?;
    let z = z_opt.ok_or_else(|| Error::InvalidXml("Vertex missing z attribute".to_string()))?;

    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return Err(Error::InvalidXml(format!(
            "Vertex coordinates must be finite (got {}, {}, {})",
            x, y, z
        )));
    }

    Ok(Vertex::new(x, y, z))
}

/// Parse triangle element attributes
///
/// Slicer tags are matched by local name, so any prefix bound to the
/// slic3rpe namespace is accepted.
pub fn parse_triangle(e: &BytesStart) -> Result<Triangle> {
    let mut v1_opt: Option<usize> = None;
    let mut v2_opt: Option<usize> = None;
    let mut v3_opt: Option<usize> = None;
    let mut pid: Option<usize> = None;
    let mut p1: Option<usize> = None;
    let mut mmu_segmentation: Option<String> = None;
    let mut paint_color: Option<String> = None;

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;

        match get_local_name(key) {
            "v1" => v1_opt = Some(value.parse::<usize>()?),
            "v2" => v2_opt = Some(value.parse::<usize>()?),
            "v3" => v3_opt = Some(value.parse::<usize>()?),
            "pid" => pid = Some(value.parse::<usize>()?),
            "p1" => p1 = Some(value.parse::<usize>()?),
            "mmu_segmentation" => mmu_segmentation = Some(value.to_string()),
            "paint_color" => paint_color = Some(value.to_string()),
            _ => {}
        }
    }

    let v1 =
        v1_opt.ok_or_else(|| Error::InvalidXml("Triangle missing v1 attribute".to_string()))?;
    let v2 =
        v2_opt.ok_or_else(|| Error::InvalidXml("Triangle missing v2 attribute".to_string()))?;
    let v3 =
        v3_opt.ok_or_else(|| Error::InvalidXml("Triangle missing v3 attribute".to_string()))?;

    let mut triangle = Triangle::new(v1, v2, v3);
    triangle.pid = pid;
    triangle.p1 = p1;
    triangle.mmu_segmentation = mmu_segmentation;
    triangle.paint_color = paint_color;

    Ok(triangle)
}

/// Parse build item element attributes
pub fn parse_build_item(e: &BytesStart) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::InvalidXml("Build item missing objectid attribute".to_string()))?
        .parse::<usize>()?;

    Ok(BuildItem::new(objectid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(xml: &str) -> BytesStart<'static> {
        let mut reader = quick_xml::Reader::from_str(xml);
        match reader.read_event() {
            Ok(quick_xml::events::Event::Empty(e)) => e.into_owned(),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_tagged_triangle() {
        let triangle =
            parse_triangle(&element("<triangle v1=\"0\" v2=\"1\" v3=\"2\" slic3rpe:mmu_segmentation=\"8\"/>"))
                .unwrap();
        assert_eq!((triangle.v1, triangle.v2, triangle.v3), (0, 1, 2));
        assert_eq!(triangle.mmu_segmentation.as_deref(), Some("8"));
        assert!(triangle.paint_color.is_none());
    }

    #[test]
    fn test_parse_triangle_material_pair() {
        let triangle =
            parse_triangle(&element("<triangle v1=\"3\" v2=\"4\" v3=\"5\" pid=\"1\" p1=\"2\"/>"))
                .unwrap();
        assert_eq!(triangle.pid, Some(1));
        assert_eq!(triangle.p1, Some(2));
    }

    #[test]
    fn test_triangle_missing_index_is_an_error() {
        assert!(parse_triangle(&element("<triangle v1=\"0\" v2=\"1\"/>")).is_err());
        assert!(parse_triangle(&element("<triangle v1=\"0\" v2=\"1\" v3=\"-1\"/>")).is_err());
    }

    #[test]
    fn test_parse_vertex_rejects_non_finite() {
        let vertex = parse_vertex(&element("<vertex x=\"1.5\" y=\"0\" z=\"-2\"/>")).unwrap();
        assert_eq!(vertex, Vertex::new(1.5, 0.0, -2.0));
        assert!(parse_vertex(&element("<vertex x=\"NaN\" y=\"0\" z=\"0\"/>")).is_err());
    }
}
