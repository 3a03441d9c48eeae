//! Relationship part writing and parsing

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use urlencoding::decode;

use super::normalize_path;

/// Relationships namespace
pub const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of the 3D model part
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID
    pub id: String,
    /// Target part name, possibly percent-encoded
    pub target: String,
    /// Relationship type URI
    pub rel_type: String,
}

impl Relationship {
    /// Create a relationship
    pub fn new(id: &str, target: &str, rel_type: &str) -> Self {
        Self {
            id: id.to_string(),
            target: target.to_string(),
            rel_type: rel_type.to_string(),
        }
    }

    /// Package path the target resolves to
    ///
    /// Targets are percent-decoded; UTF-8 written directly is accepted too.
    pub fn target_path(&self) -> String {
        let decoded = decode(&self.target)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| self.target.clone());
        normalize_path(&decoded).to_string()
    }
}

/// Render a relationships part
pub fn write_relationships(relationships: &[Relationship]) -> Result<String> {
    let mut buffer = Vec::new();
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", RELATIONSHIPS_NAMESPACE));
    writer
        .write_event(Event::Start(root))
        .map_err(|e| Error::xml_write(format!("Failed to write Relationships element: {}", e)))?;

    for rel in relationships {
        let mut elem = BytesStart::new("Relationship");
        elem.push_attribute(("Target", rel.target.as_str()));
        elem.push_attribute(("Id", rel.id.as_str()));
        elem.push_attribute(("Type", rel.rel_type.as_str()));
        writer
            .write_event(Event::Empty(elem))
            .map_err(|e| Error::xml_write(format!("Failed to write Relationship: {}", e)))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Relationships")))
        .map_err(|e| Error::xml_write(format!("Failed to close Relationships element: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| Error::xml_write(format!("Relationships are not valid UTF-8: {}", e)))
}

/// Parse a relationships part
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                if name_str.ends_with("Relationship") {
                    let mut id = String::new();
                    let mut target = None;
                    let mut rel_type = String::new();

                    for attr in e.attributes() {
                        let attr = attr?;
                        let key = std::str::from_utf8(attr.key.as_ref())
                            .map_err(|e| Error::InvalidXml(e.to_string()))?;
                        let value = std::str::from_utf8(&attr.value)
                            .map_err(|e| Error::InvalidXml(e.to_string()))?;

                        match key {
                            "Id" => id = value.to_string(),
                            "Target" => target = Some(value.to_string()),
                            "Type" => rel_type = value.to_string(),
                            _ => {}
                        }
                    }

                    let target = target.ok_or_else(|| {
                        Error::InvalidXml(format!("Relationship '{}' missing Target attribute", id))
                    })?;
                    relationships.push(Relationship {
                        id,
                        target,
                        rel_type,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}
