//! Color encoding strategies
//!
//! Slicers disagree on how a triangle's filament is expressed in a 3MF
//! document. Each [`EncodingMode`] turns the same color groups into a
//! different [`Model`] layout.

use crate::color::Rgb;
use crate::model::*;
use crate::segment::{ColorGroup, TaggedMesh};

/// Resource ID of the palette `<basematerials>` group
pub const BASE_MATERIALS_ID: usize = 1;

/// ID of the first object; objects are numbered upward from here
pub const FIRST_OBJECT_ID: usize = 2;

/// Per-triangle tag attribute flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagDialect {
    /// `slic3rpe:mmu_segmentation` holding a painted-triangle code
    ///
    /// The code is the PrusaSlicer triangle selector serialization of an
    /// unsplit triangle painted with 1-based extruder `n`, written as hex
    /// nibbles in reverse order:
    /// - `n` = 1 or 2: a single nibble `n << 2`, so `"4"` and `"8"`
    /// - `n` >= 3: nibble `0xC` followed by the nibbles of `n - 3`, least
    ///   significant first, then the whole string reversed, so 3 is `"0C"`,
    ///   4 is `"1C"` and 18 is `"FC"`
    PaintHex,
    /// `paint_color` holding the plain 1-based extruder index
    ExtruderIndex,
}

impl TagDialect {
    /// Attribute name written on each triangle
    pub fn attribute(self) -> &'static str {
        match self {
            TagDialect::PaintHex => "slic3rpe:mmu_segmentation",
            TagDialect::ExtruderIndex => "paint_color",
        }
    }

    /// Attribute value for 1-based `extruder`
    pub fn encode(self, extruder: usize) -> String {
        match self {
            TagDialect::PaintHex => paint_hex_code(extruder),
            TagDialect::ExtruderIndex => extruder.to_string(),
        }
    }
}

/// 3MF attribute encoding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncodingMode {
    /// One object per color group, each referencing its base material
    #[default]
    PerObject,
    /// One object whose triangles each carry a slicer tag
    TriangleTag(TagDialect),
    /// One object whose triangles each carry `pid`/`p1`
    MaterialIndex,
}

impl EncodingMode {
    /// Decimals used for coordinates, both when deduplicating and writing
    pub fn coordinate_precision(self) -> usize {
        match self {
            EncodingMode::PerObject | EncodingMode::MaterialIndex => 6,
            EncodingMode::TriangleTag(_) => 4,
        }
    }

    /// Short name for logs and reports
    pub fn name(self) -> &'static str {
        match self {
            EncodingMode::PerObject => "per-object",
            EncodingMode::TriangleTag(TagDialect::PaintHex) => "triangle-tag-paint-hex",
            EncodingMode::TriangleTag(TagDialect::ExtruderIndex) => "triangle-tag-extruder",
            EncodingMode::MaterialIndex => "material-index",
        }
    }

    /// Whether the whole mesh goes into a single object
    pub fn is_single_object(self) -> bool {
        !matches!(self, EncodingMode::PerObject)
    }
}

/// PrusaSlicer painted-triangle code for 1-based `extruder`
///
/// See [`TagDialect::PaintHex`] for the layout. Extruder 0 means unpainted
/// and yields an empty string.
pub fn paint_hex_code(extruder: usize) -> String {
    let nibbles = match extruder {
        0 => return String::new(),
        1 | 2 => vec![extruder << 2],
        _ => {
            let mut nibbles = vec![0xC];
            let mut rest = extruder - 3;
            loop {
                nibbles.push(rest & 0xF);
                rest >>= 4;
                if rest == 0 {
                    break;
                }
            }
            nibbles
        }
    };
    nibbles
        .iter()
        .rev()
        .filter_map(|&n| char::from_digit(n as u32, 16))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Base material name for palette entry `index`
pub fn material_name(index: usize, color: Rgb) -> String {
    format!("Color {} {}", index + 1, color)
}

/// Lay out `groups` as a 3MF model in the given mode
pub(crate) fn build_model(
    groups: &[ColorGroup],
    palette: &[Rgb],
    mode: EncodingMode,
    name: &str,
) -> Model {
    let mut model = Model::new();
    model.coordinate_precision = mode.coordinate_precision();
    model.metadata.push(MetadataEntry::new("Title", name));
    model.metadata.push(MetadataEntry::new(
        "Application",
        format!("paint3mf {}", env!("CARGO_PKG_VERSION")),
    ));

    let mut materials = BaseMaterialGroup::new(BASE_MATERIALS_ID);
    for (index, &color) in palette.iter().enumerate() {
        materials
            .materials
            .push(BaseMaterial::new(material_name(index, color), color));
    }
    model.resources.base_material_groups.push(materials);

    match mode {
        EncodingMode::PerObject => {
            for (n, group) in groups.iter().enumerate() {
                let mut object = Object::new(FIRST_OBJECT_ID + n);
                object.name = Some(format!("{}_{}", name, group.color.to_hex()));
                object.pid = Some(BASE_MATERIALS_ID);
                object.pindex = Some(group.palette_index);
                object.mesh = Some(to_mesh(&group.mesh.vertices, &group.mesh.triangles));
                model.build.items.push(BuildItem::new(object.id));
                model.resources.objects.push(object);
            }
        }
        EncodingMode::TriangleTag(dialect) => {
            if dialect == TagDialect::PaintHex {
                model.declare_namespace("slic3rpe", SLIC3RPE_NAMESPACE);
                model
                    .metadata
                    .push(MetadataEntry::new("slic3rpe:Version3mf", "1"));
                model
                    .metadata
                    .push(MetadataEntry::new("slic3rpe:MmPaintingVersion", "1"));
            }
            let tagged = TaggedMesh::from_groups(groups, mode.coordinate_precision());
            let mut object = single_object(&tagged, name);
            if let Some(mesh) = object.mesh.as_mut() {
                for (triangle, &index) in mesh.triangles.iter_mut().zip(&tagged.palette_indices) {
                    let value = dialect.encode(index + 1);
                    match dialect {
                        TagDialect::PaintHex => triangle.mmu_segmentation = Some(value),
                        TagDialect::ExtruderIndex => triangle.paint_color = Some(value),
                    }
                }
            }
            model.build.items.push(BuildItem::new(object.id));
            model.resources.objects.push(object);
        }
        EncodingMode::MaterialIndex => {
            let tagged = TaggedMesh::from_groups(groups, mode.coordinate_precision());
            let mut object = single_object(&tagged, name);
            if let Some(mesh) = object.mesh.as_mut() {
                for (triangle, &index) in mesh.triangles.iter_mut().zip(&tagged.palette_indices) {
                    triangle.pid = Some(BASE_MATERIALS_ID);
                    triangle.p1 = Some(index);
                }
            }
            model.build.items.push(BuildItem::new(object.id));
            model.resources.objects.push(object);
        }
    }

    model
}

fn single_object(tagged: &TaggedMesh, name: &str) -> Object {
    let mut object = Object::new(FIRST_OBJECT_ID);
    object.name = Some(name.to_string());
    object.pid = Some(BASE_MATERIALS_ID);
    object.pindex = Some(tagged.palette_indices.first().copied().unwrap_or(0));
    object.mesh = Some(to_mesh(&tagged.mesh.vertices, &tagged.mesh.triangles));
    object
}

fn to_mesh(vertices: &[[f32; 3]], triangles: &[[u32; 3]]) -> Mesh {
    let mut mesh = Mesh::with_capacity(vertices.len(), triangles.len());
    mesh.vertices.extend(vertices.iter().copied().map(Vertex::from));
    mesh.triangles.extend(
        triangles
            .iter()
            .map(|t| Triangle::new(t[0] as usize, t[1] as usize, t[2] as usize)),
    );
    mesh
}
