//! Base material parsing

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;

use super::parse_attributes;

/// Parse a display color in `#RRGGBB` or `#RRGGBBAA` form; alpha is dropped
pub(super) fn parse_color(color_str: &str) -> Option<Rgb> {
    let hex = color_str.strip_prefix('#')?;
    match hex.len() {
        6 => Rgb::from_hex(hex),
        8 if hex.is_ascii() => Rgb::from_hex(&hex[..6]),
        _ => None,
    }
}

/// Parse basematerials element start
pub(super) fn parse_basematerials_start(e: &BytesStart) -> Result<BaseMaterialGroup> {
    let attrs = parse_attributes(e)?;
    let id = attrs
        .get("id")
        .ok_or_else(|| Error::InvalidXml("basematerials missing id attribute".to_string()))?
        .parse::<usize>()?;
    Ok(BaseMaterialGroup::new(id))
}

/// Parse base element within basematerials
pub(super) fn parse_base_element(e: &BytesStart) -> Result<BaseMaterial> {
    let attrs = parse_attributes(e)?;

    let name = attrs.get("name").cloned().unwrap_or_default();
    let color_str = attrs
        .get("displaycolor")
        .ok_or_else(|| Error::InvalidXml(format!("Base material '{}' missing displaycolor", name)))?;
    let displaycolor = parse_color(color_str).ok_or_else(|| {
        Error::InvalidXml(format!(
            "Base material '{}' has invalid displaycolor '{}'",
            name, color_str
        ))
    })?;

    Ok(BaseMaterial::new(name, displaycolor))
}
