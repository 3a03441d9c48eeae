//! `[Content_Types].xml` writing and parsing

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::normalize_path;

/// Content types namespace
pub const CONTENT_TYPES_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";

/// Content type of relationship parts
pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Content type of 3D model parts
pub const MODEL_CONTENT_TYPE: &str = "application/vnd.ms-package.3dmanufacturing-3dmodel+xml";

/// Parsed or to-be-written content type manifest
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentTypes {
    /// `(extension, content type)` pairs
    pub defaults: Vec<(String, String)>,
    /// `(part name, content type)` pairs
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Manifest with the `rels` and `model` defaults every 3MF package needs
    pub fn new() -> Self {
        Self {
            defaults: vec![
                ("rels".to_string(), RELS_CONTENT_TYPE.to_string()),
                ("model".to_string(), MODEL_CONTENT_TYPE.to_string()),
            ],
            overrides: Vec::new(),
        }
    }

    /// Add an override for a single part
    pub fn with_override(mut self, part: &str, content_type: &str) -> Self {
        self.overrides
            .push((format!("/{}", normalize_path(part)), content_type.to_string()));
        self
    }

    /// Content type that applies to `path`, overrides first
    pub fn content_type_for(&self, path: &str) -> Option<&str> {
        let path = normalize_path(path);
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(part, _)| normalize_path(part) == path)
        {
            return Some(ct);
        }
        let extension = path.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, ct)| ct.as_str())
    }

    /// Whether a default maps `extension` to `content_type`
    pub fn has_default(&self, extension: &str, content_type: &str) -> bool {
        self.defaults
            .iter()
            .any(|(ext, ct)| ext.eq_ignore_ascii_case(extension) && ct == content_type)
    }

    /// Render as XML
    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

        let mut types = BytesStart::new("Types");
        types.push_attribute(("xmlns", CONTENT_TYPES_NAMESPACE));
        writer
            .write_event(Event::Start(types))
            .map_err(|e| Error::xml_write(format!("Failed to write Types element: {}", e)))?;

        for (extension, content_type) in &self.defaults {
            let mut elem = BytesStart::new("Default");
            elem.push_attribute(("Extension", extension.as_str()));
            elem.push_attribute(("ContentType", content_type.as_str()));
            writer
                .write_event(Event::Empty(elem))
                .map_err(|e| Error::xml_write(format!("Failed to write Default: {}", e)))?;
        }

        for (part, content_type) in &self.overrides {
            let mut elem = BytesStart::new("Override");
            elem.push_attribute(("PartName", part.as_str()));
            elem.push_attribute(("ContentType", content_type.as_str()));
            writer
                .write_event(Event::Empty(elem))
                .map_err(|e| Error::xml_write(format!("Failed to write Override: {}", e)))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("Types")))
            .map_err(|e| Error::xml_write(format!("Failed to close Types element: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| Error::xml_write(format!("Content types are not valid UTF-8: {}", e)))
    }

    /// Parse a `[Content_Types].xml` document
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut content_types = ContentTypes::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref())
                        .map_err(|e| Error::InvalidXml(e.to_string()))?;

                    let is_default = name_str.ends_with("Default");
                    let is_override = name_str.ends_with("Override");

                    let mut key_value = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        let key = std::str::from_utf8(attr.key.as_ref())
                            .map_err(|e| Error::InvalidXml(e.to_string()))?;
                        let value = std::str::from_utf8(&attr.value)
                            .map_err(|e| Error::InvalidXml(e.to_string()))?;

                        match key {
                            "Extension" | "PartName" => key_value = Some(value.to_string()),
                            "ContentType" => content_type = Some(value.to_string()),
                            _ => {}
                        }
                    }

                    if let (Some(k), Some(ct)) = (key_value, content_type) {
                        if is_default {
                            content_types.defaults.push((k, ct));
                        } else if is_override {
                            content_types.overrides.push((k, ct));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(content_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_xml() {
        let content_types = ContentTypes::new().with_override("Metadata/a.config", "text/plain");
        let xml = content_types.to_xml().unwrap();
        assert!(xml.contains("<Default Extension=\"rels\""));
        assert!(xml.contains("PartName=\"/Metadata/a.config\""));

        let parsed = ContentTypes::parse(&xml).unwrap();
        assert_eq!(parsed, content_types);
    }

    #[test]
    fn test_content_type_lookup() {
        let content_types = ContentTypes::new().with_override("/Metadata/a.config", "text/plain");
        assert_eq!(
            content_types.content_type_for("3D/3dmodel.model"),
            Some(MODEL_CONTENT_TYPE)
        );
        assert_eq!(
            content_types.content_type_for("_rels/.rels"),
            Some(RELS_CONTENT_TYPE)
        );
        assert_eq!(
            content_types.content_type_for("Metadata/a.config"),
            Some("text/plain")
        );
        assert_eq!(content_types.content_type_for("Metadata/b.config"), None);
        assert!(content_types.has_default("MODEL", MODEL_CONTENT_TYPE));
    }
}
