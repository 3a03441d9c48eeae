//! Run configuration

use crate::error::{Error, Result};
use crate::writer::EncodingMode;

/// Default hard triangle ceiling
pub const DEFAULT_MAX_TRIANGLES: usize = 500_000;

/// Default advisory triangle threshold
pub const DEFAULT_WARN_TRIANGLES: usize = 250_000;

/// Default number of palette colors
pub const DEFAULT_PALETTE_SIZE: usize = 4;

/// Default cap on colors fed to median-cut
pub const DEFAULT_SAMPLE_CAP: usize = 20_000;

/// Target error passed to the decimation collaborator
pub const DEFAULT_TARGET_ERROR: f32 = 0.01;

/// Highest supported subdivision level (x64 triangles)
pub const MAX_SUBDIVISION_LEVEL: u32 = 3;

/// Parameters of one conversion run
///
/// Built like a parser configuration: start from [`ConvertConfig::new`] and
/// chain `with_*` calls.
///
/// # Example
///
/// ```
/// use paint3mf::{ConvertConfig, EncodingMode, TagDialect};
///
/// let config = ConvertConfig::new()
///     .with_palette_size(3)
///     .with_subdivision_level(1)
///     .with_encoding(EncodingMode::TriangleTag(TagDialect::PaintHex));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvertConfig {
    /// Hard triangle ceiling; meshes above it are simplified
    pub max_triangles: usize,
    /// Advisory threshold; final counts above it are logged as warnings
    pub warn_triangles: usize,
    /// Desired palette size (K)
    pub palette_size: usize,
    /// Uniform subdivision level, 0..=3 (x1, x4, x16, x64)
    pub subdivision_level: u32,
    /// 3MF attribute encoding strategy
    pub encoding: EncodingMode,
    /// Colors above this count are stride-sampled before clustering
    pub sample_cap: usize,
    /// Flip the V texture coordinate before sampling
    pub flip_v: bool,
    /// Target error handed to the decimator
    pub target_error: f32,
    /// Document and object base name
    pub name: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_triangles: DEFAULT_MAX_TRIANGLES,
            warn_triangles: DEFAULT_WARN_TRIANGLES,
            palette_size: DEFAULT_PALETTE_SIZE,
            subdivision_level: 0,
            encoding: EncodingMode::default(),
            sample_cap: DEFAULT_SAMPLE_CAP,
            flip_v: false,
            target_error: DEFAULT_TARGET_ERROR,
            name: "Model".to_string(),
        }
    }
}

impl ConvertConfig {
    /// Configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hard triangle ceiling
    pub fn with_max_triangles(mut self, max_triangles: usize) -> Self {
        self.max_triangles = max_triangles;
        self
    }

    /// Set the advisory triangle threshold
    pub fn with_warn_triangles(mut self, warn_triangles: usize) -> Self {
        self.warn_triangles = warn_triangles;
        self
    }

    /// Set the palette size
    pub fn with_palette_size(mut self, palette_size: usize) -> Self {
        self.palette_size = palette_size;
        self
    }

    /// Set the subdivision level
    pub fn with_subdivision_level(mut self, level: u32) -> Self {
        self.subdivision_level = level;
        self
    }

    /// Set the encoding mode
    pub fn with_encoding(mut self, encoding: EncodingMode) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the quantizer sample cap
    pub fn with_sample_cap(mut self, sample_cap: usize) -> Self {
        self.sample_cap = sample_cap;
        self
    }

    /// Flip V when sampling textures
    pub fn with_flip_v(mut self, flip_v: bool) -> Self {
        self.flip_v = flip_v;
        self
    }

    /// Set the decimation target error
    pub fn with_target_error(mut self, target_error: f32) -> Self {
        self.target_error = target_error;
        self
    }

    /// Set the document name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reject parameters outside their allowed ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_triangles == 0 {
            return Err(Error::invalid_input("max_triangles must be at least 1"));
        }
        if self.palette_size == 0 {
            return Err(Error::invalid_input("palette_size must be at least 1"));
        }
        if self.subdivision_level > MAX_SUBDIVISION_LEVEL {
            return Err(Error::invalid_input(format!(
                "subdivision_level {} exceeds maximum of {}",
                self.subdivision_level, MAX_SUBDIVISION_LEVEL
            )));
        }
        if self.sample_cap == 0 {
            return Err(Error::invalid_input("sample_cap must be at least 1"));
        }
        if !self.target_error.is_finite() || self.target_error < 0.0 {
            return Err(Error::invalid_input("target_error must be a finite value >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConvertConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_triangles, 500_000);
        assert_eq!(config.encoding, EncodingMode::PerObject);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(ConvertConfig::new().with_palette_size(0).validate().is_err());
        assert!(ConvertConfig::new().with_max_triangles(0).validate().is_err());
        assert!(ConvertConfig::new().with_subdivision_level(4).validate().is_err());
        assert!(ConvertConfig::new().with_sample_cap(0).validate().is_err());
        assert!(
            ConvertConfig::new()
                .with_target_error(f32::NAN)
                .validate()
                .is_err()
        );
    }
}
