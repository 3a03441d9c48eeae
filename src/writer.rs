//! XML writing for 3MF model files
//!
//! This module serializes [`Model`] structures into 3MF-compliant XML and
//! renders the slicer sidecar documents.

mod core;
mod encoding;
mod material;
mod metadata;

pub use encoding::{
    BASE_MATERIALS_ID, EncodingMode, FIRST_OBJECT_ID, TagDialect, material_name, paint_hex_code,
};
pub use metadata::{
    SLIC3R_CONFIG_PATH, SLIC3R_MODEL_CONFIG_PATH, slic3r_config, write_model_config,
};

pub(crate) use encoding::build_model;

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fmt::Display;
use std::io::Write as IoWrite;

/// Serialize `model` as a `3dmodel.model` document
///
/// Extra namespace prefixes registered on the model are declared on the
/// root element so tag attributes such as `slic3rpe:mmu_segmentation`
/// resolve.
pub fn write_model_xml<W: IoWrite>(model: &Model, writer: W) -> Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    declaration(&mut xml)?;

    let mut root = BytesStart::new("model");
    root.push_attribute(("unit", model.unit.as_str()));
    root.push_attribute(("xml:lang", "en-US"));
    root.push_attribute(("xmlns", model.xmlns.as_str()));
    for (prefix, uri) in &model.namespaces {
        let name = format!("xmlns:{}", prefix);
        root.push_attribute((name.as_str(), uri.as_str()));
    }
    open(&mut xml, &root)?;

    for entry in &model.metadata {
        let mut elem = BytesStart::new("metadata");
        elem.push_attribute(("name", entry.name.as_str()));
        open(&mut xml, &elem)?;
        xml.write_event(Event::Text(BytesText::new(&entry.value)))
            .map_err(|e| failed("write text of", b"metadata", e))?;
        close(&mut xml, "metadata")?;
    }

    open(&mut xml, &BytesStart::new("resources"))?;
    for group in &model.resources.base_material_groups {
        material::write_base_material_group(&mut xml, group)?;
    }
    for object in &model.resources.objects {
        core::write_object(&mut xml, object, model.coordinate_precision)?;
    }
    close(&mut xml, "resources")?;

    core::write_build(&mut xml, &model.build)?;
    close(&mut xml, "model")
}

/// Serialize `model` into an in-memory string
pub fn model_to_string(model: &Model) -> Result<String> {
    let mut buffer = Vec::new();
    write_model_xml(model, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::xml_write(format!("Model XML is not valid UTF-8: {}", e)))
}

fn failed(action: &str, element: &[u8], err: impl Display) -> Error {
    Error::xml_write(format!(
        "Failed to {} <{}>: {}",
        action,
        String::from_utf8_lossy(element),
        err
    ))
}

fn declaration<W: IoWrite>(writer: &mut Writer<W>) -> Result<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))
}

fn open<W: IoWrite>(writer: &mut Writer<W>, elem: &BytesStart<'_>) -> Result<()> {
    writer
        .write_event(Event::Start(elem.borrow()))
        .map_err(|e| failed("open", elem.name().into_inner(), e))
}

fn empty<W: IoWrite>(writer: &mut Writer<W>, elem: &BytesStart<'_>) -> Result<()> {
    writer
        .write_event(Event::Empty(elem.borrow()))
        .map_err(|e| failed("write", elem.name().into_inner(), e))
}

fn close<W: IoWrite>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| failed("close", name.as_bytes(), e))
}
