//! XML parsing for 3MF model files
//!
//! Reads a model document back into [`Model`] so a finished package can be
//! checked. Only the subset of the core and materials vocabulary that the
//! serializer produces is understood; other elements are skipped.

mod core;
mod material;

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

pub use self::core::{parse_build_item, parse_object, parse_triangle, parse_vertex};
use self::material::{parse_base_element, parse_basematerials_start};

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Local element or attribute name without its namespace prefix
///
/// `"slic3rpe:mmu_segmentation"` returns `"mmu_segmentation"`.
pub(crate) fn get_local_name(name_str: &str) -> &str {
    match name_str.rfind(':') {
        Some(pos) => &name_str[pos + 1..],
        None => name_str,
    }
}

/// Parse attributes from an XML element
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;

        attrs.insert(key.to_string(), value.to_string());
    }

    Ok(attrs)
}

/// Parse the 3D model XML content
///
/// DTD declarations are rejected.
///
/// # Example
///
/// ```
/// let xml = r#"<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
///   <resources>
///     <object id="2" type="model">
///       <mesh>
///         <vertices>
///           <vertex x="0" y="0" z="0"/><vertex x="1" y="0" z="0"/><vertex x="0" y="1" z="0"/>
///         </vertices>
///         <triangles><triangle v1="0" v2="1" v3="2"/></triangles>
///       </mesh>
///     </object>
///   </resources>
///   <build><item objectid="2"/></build>
/// </model>"#;
///
/// let model = paint3mf::parser::parse_model_xml(xml).unwrap();
/// assert_eq!(model.triangle_count(), 1);
/// assert_eq!(model.build.items.len(), 1);
/// ```
pub fn parse_model_xml(xml: &str) -> Result<Model> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::new();
    model.namespaces.clear();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut seen_model = false;
    let mut in_resources = false;
    let mut in_build = false;
    let mut current_object: Option<Object> = None;
    let mut current_mesh: Option<Mesh> = None;
    let mut current_basematerialgroup: Option<BaseMaterialGroup> = None;
    let mut current_metadata: Option<MetadataEntry> = None;

    loop {
        let event_result = reader.read_event_into(&mut buf);
        let is_empty_element = matches!(&event_result, Ok(Event::Empty(_)));

        match event_result {
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in 3MF files for security reasons"
                        .to_string(),
                ));
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "model" => {
                        seen_model = true;
                        for (key, value) in parse_attributes(e)? {
                            match key.as_str() {
                                "unit" => model.unit = value,
                                "xmlns" => model.xmlns = value,
                                _ => {
                                    if let Some(prefix) = key.strip_prefix("xmlns:") {
                                        model.declare_namespace(prefix, value);
                                    }
                                }
                            }
                        }
                    }
                    "metadata" if !in_resources && current_object.is_none() => {
                        let attrs = parse_attributes(e)?;
                        let name = attrs.get("name").cloned().ok_or_else(|| {
                            Error::InvalidXml("Metadata missing name attribute".to_string())
                        })?;
                        let entry = MetadataEntry::new(name, "");
                        if is_empty_element {
                            model.metadata.push(entry);
                        } else {
                            current_metadata = Some(entry);
                        }
                    }
                    "resources" => in_resources = true,
                    "build" => in_build = true,
                    "basematerials" if in_resources => {
                        let group = parse_basematerials_start(e)?;
                        if is_empty_element {
                            model.resources.base_material_groups.push(group);
                        } else {
                            current_basematerialgroup = Some(group);
                        }
                    }
                    "base" => {
                        let group = current_basematerialgroup.as_mut().ok_or_else(|| {
                            Error::InvalidXml("base element outside basematerials".to_string())
                        })?;
                        group.materials.push(parse_base_element(e)?);
                    }
                    "object" if in_resources => {
                        let object = parse_object(e)?;
                        if is_empty_element {
                            model.resources.objects.push(object);
                        } else {
                            current_object = Some(object);
                        }
                    }
                    "mesh" => {
                        if current_object.is_none() {
                            return Err(Error::InvalidXml(
                                "mesh element outside an object".to_string(),
                            ));
                        }
                        if is_empty_element {
                            if let Some(object) = current_object.as_mut() {
                                object.mesh = Some(Mesh::new());
                            }
                        } else {
                            current_mesh = Some(Mesh::new());
                        }
                    }
                    "vertex" => {
                        let mesh = current_mesh.as_mut().ok_or_else(|| {
                            Error::InvalidXml("vertex element outside a mesh".to_string())
                        })?;
                        mesh.vertices.push(parse_vertex(e)?);
                    }
                    "triangle" => {
                        let mesh = current_mesh.as_mut().ok_or_else(|| {
                            Error::InvalidXml("triangle element outside a mesh".to_string())
                        })?;
                        mesh.triangles.push(parse_triangle(e)?);
                    }
                    "item" if in_build => {
                        model.build.items.push(parse_build_item(e)?);
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some(entry) = current_metadata.as_mut() {
                    let text =
                        std::str::from_utf8(t).map_err(|e| Error::InvalidXml(e.to_string()))?;
                    entry.value.push_str(text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "metadata" => {
                        if let Some(entry) = current_metadata.take() {
                            model.metadata.push(entry);
                        }
                    }
                    "resources" => in_resources = false,
                    "build" => in_build = false,
                    "basematerials" => {
                        if let Some(group) = current_basematerialgroup.take() {
                            model.resources.base_material_groups.push(group);
                        }
                    }
                    "mesh" => {
                        if let (Some(object), Some(mesh)) =
                            (current_object.as_mut(), current_mesh.take())
                        {
                            object.mesh = Some(mesh);
                        }
                    }
                    "object" => {
                        if let Some(object) = current_object.take() {
                            model.resources.objects.push(object);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !seen_model {
        return Err(Error::InvalidFormat(
            "Model document has no <model> root element".to_string(),
        ));
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::writer::model_to_string;

    #[test]
    fn test_round_trip_through_writer() {
        let mut model = Model::new();
        model.declare_namespace("slic3rpe", SLIC3RPE_NAMESPACE);
        model.metadata.push(MetadataEntry::new("Title", "Cube"));

        let mut group = BaseMaterialGroup::new(1);
        group
            .materials
            .push(BaseMaterial::new("Color 1 #FF0000", Rgb::new(255, 0, 0)));
        model.resources.base_material_groups.push(group);

        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(0.0, 1.0, 0.0));
        let mut triangle = Triangle::new(0, 1, 2);
        triangle.mmu_segmentation = Some("4".to_string());
        mesh.triangles.push(triangle);
        let mut object = Object::new(2);
        object.pid = Some(1);
        object.pindex = Some(0);
        object.mesh = Some(mesh);
        model.resources.objects.push(object);
        model.build.items.push(BuildItem::new(2));

        let xml = model_to_string(&model).unwrap();
        let parsed = parse_model_xml(&xml).unwrap();

        assert_eq!(parsed.metadata_value("Title"), Some("Cube"));
        assert_eq!(parsed.triangle_count(), 1);
        assert_eq!(parsed.vertex_count(), 3);
        assert_eq!(parsed.build.items, vec![BuildItem::new(2)]);
        let base = &parsed.resources.base_material_groups[0];
        assert_eq!(base.materials[0].displaycolor, Rgb::new(255, 0, 0));
        let object = parsed.object(2).unwrap();
        assert_eq!(object.pindex, Some(0));
        let triangle = &object.mesh.as_ref().unwrap().triangles[0];
        assert_eq!(triangle.mmu_segmentation.as_deref(), Some("4"));
        assert!(
            parsed
                .namespaces
                .iter()
                .any(|(prefix, uri)| prefix == "slic3rpe" && uri == SLIC3RPE_NAMESPACE)
        );
    }

    #[test]
    fn test_rejects_dtd() {
        let xml = "<?xml version=\"1.0\"?><!DOCTYPE model [<!ENTITY x \"y\">]><model/>";
        let err = parse_model_xml(xml).unwrap_err();
        assert!(err.to_string().contains("DTD"));
    }

    #[test]
    fn test_requires_model_root() {
        assert!(matches!(
            parse_model_xml("<other/>"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_vertex_outside_mesh_is_an_error() {
        let xml = "<model><resources><vertex x=\"0\" y=\"0\" z=\"0\"/></resources></model>";
        assert!(parse_model_xml(xml).is_err());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(get_local_name("slic3rpe:mmu_segmentation"), "mmu_segmentation");
        assert_eq!(get_local_name("object"), "object");
    }
}
