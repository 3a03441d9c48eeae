//! Slicer sidecar documents
//!
//! PrusaSlicer and its forks read filament colors from a plain
//! `; key = value` config and per-volume extruder assignments from an
//! auxiliary XML document. Both are written for every encoding mode.

use super::{close, declaration, empty, open};
use crate::color::Rgb;
use crate::error::Result;
use crate::model::Model;
use quick_xml::Writer;
use quick_xml::events::BytesStart;
use std::io::Write as IoWrite;

/// Path of the key/value filament config
pub const SLIC3R_CONFIG_PATH: &str = "Metadata/Slic3r_PE.config";

/// Path of the per-object/per-volume XML config
pub const SLIC3R_MODEL_CONFIG_PATH: &str = "Metadata/Slic3r_PE_model.config";

/// Render the filament color list
///
/// # Example
/// ```
/// use paint3mf::{Rgb, writer::slic3r_config};
///
/// let text = slic3r_config(&[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
/// assert!(text.contains("; extruder_colour = #FF0000;#0000FF"));
/// ```
pub fn slic3r_config(palette: &[Rgb]) -> String {
    let colors = palette
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(";");
    format!(
        "; generated by paint3mf {}\n; extruder_colour = {}\n; filament_colour = {}\n",
        env!("CARGO_PKG_VERSION"),
        colors,
        colors
    )
}

/// Write the per-object/per-volume config for `model`
///
/// Each object gets one volume spanning all its triangles. Objects with a
/// default base material are assigned extruder `pindex + 1`.
pub fn write_model_config<W: IoWrite>(model: &Model, writer: W) -> Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 1);
    declaration(&mut xml)?;
    open(&mut xml, &BytesStart::new("config"))?;

    for object in &model.resources.objects {
        let triangles = object.mesh.as_ref().map_or(0, |m| m.triangles.len());
        let name = object.name.as_deref().unwrap_or("");
        let extruder = (object.pindex.unwrap_or(0) + 1).to_string();

        let mut elem = BytesStart::new("object");
        elem.push_attribute(("id", object.id.to_string().as_str()));
        elem.push_attribute(("instances_count", "1"));
        open(&mut xml, &elem)?;
        write_entry(&mut xml, "object", "name", name)?;
        write_entry(&mut xml, "object", "extruder", &extruder)?;

        let last_id = triangles.saturating_sub(1).to_string();
        let mut volume = BytesStart::new("volume");
        volume.push_attribute(("firstid", "0"));
        volume.push_attribute(("lastid", last_id.as_str()));
        open(&mut xml, &volume)?;
        write_entry(&mut xml, "volume", "name", name)?;
        write_entry(&mut xml, "volume", "extruder", &extruder)?;
        close(&mut xml, "volume")?;

        close(&mut xml, "object")?;
    }

    close(&mut xml, "config")
}

fn write_entry<W: IoWrite>(
    writer: &mut Writer<W>,
    kind: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let mut elem = BytesStart::new("metadata");
    elem.push_attribute(("type", kind));
    elem.push_attribute(("key", key));
    elem.push_attribute(("value", value));
    empty(writer, &elem)
}
