//! Base material groups

use super::{close, empty, open};
use crate::error::Result;
use crate::model::BaseMaterialGroup;
use quick_xml::Writer;
use quick_xml::events::BytesStart;
use std::io::Write as IoWrite;

/// Write a `<basematerials>` group, display colors as uppercase `#RRGGBB`
pub(super) fn write_base_material_group<W: IoWrite>(
    writer: &mut Writer<W>,
    group: &BaseMaterialGroup,
) -> Result<()> {
    let mut elem = BytesStart::new("basematerials");
    elem.push_attribute(("id", group.id.to_string().as_str()));
    open(writer, &elem)?;

    for material in &group.materials {
        let color = material.displaycolor.to_string();
        let mut base = BytesStart::new("base");
        base.push_attribute(("name", material.name.as_str()));
        base.push_attribute(("displaycolor", color.as_str()));
        empty(writer, &base)?;
    }

    close(writer, "basematerials")
}
