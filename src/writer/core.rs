//! Objects, meshes and the build section

use super::{close, empty, open};
use crate::error::Result;
use crate::model::{Build, Mesh, Object, Triangle};
use crate::segment::format_coordinate;
use quick_xml::Writer;
use quick_xml::events::BytesStart;
use std::io::Write as IoWrite;

/// Write an object and its mesh
pub(super) fn write_object<W: IoWrite>(
    writer: &mut Writer<W>,
    object: &Object,
    precision: usize,
) -> Result<()> {
    let mut elem = BytesStart::new("object");
    elem.push_attribute(("id", object.id.to_string().as_str()));
    elem.push_attribute(("type", "model"));
    if let Some(ref name) = object.name {
        elem.push_attribute(("name", name.as_str()));
    }
    if let Some(pid) = object.pid {
        elem.push_attribute(("pid", pid.to_string().as_str()));
    }
    if let Some(pindex) = object.pindex {
        elem.push_attribute(("pindex", pindex.to_string().as_str()));
    }
    open(writer, &elem)?;

    if let Some(ref mesh) = object.mesh {
        write_mesh(writer, mesh, precision)?;
    }

    close(writer, "object")
}

/// Write a mesh with coordinates at `precision` decimals
pub(super) fn write_mesh<W: IoWrite>(
    writer: &mut Writer<W>,
    mesh: &Mesh,
    precision: usize,
) -> Result<()> {
    open(writer, &BytesStart::new("mesh"))?;

    open(writer, &BytesStart::new("vertices"))?;
    for vertex in &mesh.vertices {
        let mut elem = BytesStart::new("vertex");
        for (axis, value) in [("x", vertex.x), ("y", vertex.y), ("z", vertex.z)] {
            elem.push_attribute((axis, format_coordinate(value, precision).as_str()));
        }
        empty(writer, &elem)?;
    }
    close(writer, "vertices")?;

    open(writer, &BytesStart::new("triangles"))?;
    for triangle in &mesh.triangles {
        empty(writer, &triangle_element(triangle))?;
    }
    close(writer, "triangles")?;

    close(writer, "mesh")
}

fn triangle_element(triangle: &Triangle) -> BytesStart<'static> {
    let mut elem = BytesStart::new("triangle");
    elem.push_attribute(("v1", triangle.v1.to_string().as_str()));
    elem.push_attribute(("v2", triangle.v2.to_string().as_str()));
    elem.push_attribute(("v3", triangle.v3.to_string().as_str()));

    if let Some(pid) = triangle.pid {
        elem.push_attribute(("pid", pid.to_string().as_str()));
    }
    if let Some(p1) = triangle.p1 {
        elem.push_attribute(("p1", p1.to_string().as_str()));
    }
    // Slicer paint tags
    if let Some(ref code) = triangle.mmu_segmentation {
        elem.push_attribute(("slic3rpe:mmu_segmentation", code.as_str()));
    }
    if let Some(ref extruder) = triangle.paint_color {
        elem.push_attribute(("paint_color", extruder.as_str()));
    }
    elem
}

/// Write the build section
pub(super) fn write_build<W: IoWrite>(writer: &mut Writer<W>, build: &Build) -> Result<()> {
    open(writer, &BytesStart::new("build"))?;
    for item in &build.items {
        let mut elem = BytesStart::new("item");
        elem.push_attribute(("objectid", item.objectid.to_string().as_str()));
        empty(writer, &elem)?;
    }
    close(writer, "build")
}
