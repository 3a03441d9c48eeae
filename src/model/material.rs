//! Base material types

use crate::color::Rgb;

/// Named color slot inside a `<basematerials>` group
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterial {
    /// Material name
    pub name: String,
    /// Display color
    pub displaycolor: Rgb,
}

impl BaseMaterial {
    /// Create a new base material
    pub fn new(name: impl Into<String>, displaycolor: Rgb) -> Self {
        Self {
            name: name.into(),
            displaycolor,
        }
    }
}

/// A `<basematerials>` resource
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterialGroup {
    /// Resource ID
    pub id: usize,
    /// Materials, addressed by position
    pub materials: Vec<BaseMaterial>,
}

impl BaseMaterialGroup {
    /// Create an empty group
    pub fn new(id: usize) -> Self {
        Self {
            id,
            materials: Vec::new(),
        }
    }
}
