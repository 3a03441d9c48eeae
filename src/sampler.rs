//! Per-triangle color derivation
//!
//! Every triangle of every source gets exactly one observed color, taken from
//! the first available source in priority order:
//!
//! 1. per-vertex colors (mean of the three corners)
//! 2. material texture at the centroid UV, multiplied by the base color factor
//! 3. material base color
//! 4. [`FALLBACK_GRAY`]
//!
//! Decoded textures are cached per [`TextureId`] inside the sampler, so two
//! samplers never share decode state.

use std::collections::HashMap;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::color::{FALLBACK_GRAY, Rgb};
use crate::progress::{ProgressSink, Stage};
use crate::source::{Material, SourceDescriptor, Texture, TextureData, TextureId};

/// Counts of triangles per color source, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleStats {
    /// Triangles colored from vertex colors
    pub vertex_color: usize,
    /// Triangles colored from a texture
    pub texture: usize,
    /// Triangles colored from a flat base color
    pub base_color: usize,
    /// Triangles that fell back to neutral gray
    pub fallback: usize,
    /// Triangles whose material index did not exist
    pub invalid_material: usize,
    /// Distinct textures that failed to decode
    pub texture_decode_failures: usize,
}

impl SampleStats {
    /// Total triangles sampled
    pub fn total(&self) -> usize {
        self.vertex_color + self.texture + self.base_color + self.fallback
    }
}

/// Decoded textures keyed by identity, owned by one run
#[derive(Debug, Default)]
pub struct TextureCache {
    images: HashMap<TextureId, Option<RgbaImage>>,
}

impl TextureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of textures seen, decoded or failed
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no texture has been seen
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Decode `texture` unless already cached; returns true on a new failure
    fn ensure(&mut self, texture: &Texture) -> bool {
        if self.images.contains_key(&texture.id) {
            return false;
        }
        let decoded = decode_texture(texture);
        let failed = decoded.is_none();
        self.images.insert(texture.id, decoded);
        failed
    }

    /// Decoded image for `id`, `None` if missing or failed
    pub fn get(&self, id: TextureId) -> Option<&RgbaImage> {
        self.images.get(&id).and_then(Option::as_ref)
    }
}

fn decode_texture(texture: &Texture) -> Option<RgbaImage> {
    match &texture.data {
        TextureData::Encoded(bytes) => match image::load_from_memory(bytes) {
            Ok(image) => {
                let rgba = image.to_rgba8();
                debug!(
                    texture = texture.id,
                    width = rgba.width(),
                    height = rgba.height(),
                    "Decoded texture"
                );
                Some(rgba)
            }
            Err(e) => {
                warn!(texture = texture.id, "Texture decode failed: {}", e);
                None
            }
        },
        TextureData::Rgba8 {
            width,
            height,
            pixels,
        } => {
            let image = RgbaImage::from_raw(*width, *height, pixels.clone());
            if image.is_none() {
                warn!(
                    texture = texture.id,
                    "Raster of {} bytes does not match {}x{} RGBA",
                    pixels.len(),
                    width,
                    height
                );
            }
            image.filter(|img| img.width() > 0 && img.height() > 0)
        }
    }
}

/// Where a triangle's color comes from
enum ColorSource<'a> {
    VertexColors(&'a [[f32; 3]]),
    Texture {
        image: &'a RgbaImage,
        uvs: &'a [[f32; 2]],
        factor: [f32; 4],
    },
    BaseColor([f32; 4]),
    Fallback,
}

/// Derives one color per triangle from heterogeneous sources
#[derive(Debug, Default)]
pub struct ColorSampler {
    flip_v: bool,
    cache: TextureCache,
}

impl ColorSampler {
    /// Sampler with V not flipped
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip V before sampling (for sources with bottom-left UV origin)
    pub fn with_flip_v(mut self, flip_v: bool) -> Self {
        self.flip_v = flip_v;
        self
    }

    /// Texture cache of this sampler
    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Sample every triangle of every source, in merge order
    ///
    /// Sources must already pass [`MeshBuffer::validate`](crate::MeshBuffer::validate);
    /// [`merge_sources`](crate::merge_sources) checks this.
    pub fn sample(&mut self, sources: &[SourceDescriptor]) -> (Vec<Rgb>, SampleStats) {
        self.sample_with_progress(sources, &mut ProgressSink::none())
    }

    /// Sample with batch progress reports
    pub fn sample_with_progress(
        &mut self,
        sources: &[SourceDescriptor],
        progress: &mut ProgressSink<'_>,
    ) -> (Vec<Rgb>, SampleStats) {
        let total: usize = sources.iter().map(|s| s.mesh.triangle_count()).sum();
        let mut colors = Vec::with_capacity(total);
        let mut stats = SampleStats::default();

        for (source_index, source) in sources.iter().enumerate() {
            for texture in source.materials.iter().filter_map(|m| m.texture.as_ref()) {
                if self.cache.ensure(texture) {
                    stats.texture_decode_failures += 1;
                }
            }

            let mut warned_material = false;
            for triangle in 0..source.mesh.triangle_count() {
                let material = match source.material_index(triangle) {
                    Some(index) => match source.materials.get(index) {
                        Some(material) => Some(material),
                        None => {
                            stats.invalid_material += 1;
                            if !warned_material {
                                warn!(
                                    source = source_index,
                                    material = index,
                                    "Material index out of range, using fallback color"
                                );
                                warned_material = true;
                            }
                            None
                        }
                    },
                    None => None,
                };

                let color_source = self.resolve(source, material);
                let color = match color_source {
                    ColorSource::VertexColors(vertex_colors) => {
                        stats.vertex_color += 1;
                        average_vertex_colors(vertex_colors, source.mesh.triangle(triangle))
                    }
                    ColorSource::Texture { image, uvs, factor } => {
                        stats.texture += 1;
                        let uv = centroid_uv(uvs, source.mesh.triangle(triangle));
                        sample_texture(image, uv, factor, self.flip_v)
                    }
                    ColorSource::BaseColor(factor) => {
                        stats.base_color += 1;
                        Rgb::from_unit(factor[0], factor[1], factor[2])
                    }
                    ColorSource::Fallback => {
                        stats.fallback += 1;
                        FALLBACK_GRAY
                    }
                };
                colors.push(color);
                progress.batch(Stage::Sampling, colors.len(), total);
            }
        }

        info!(
            triangles = colors.len(),
            vertex_color = stats.vertex_color,
            texture = stats.texture,
            base_color = stats.base_color,
            fallback = stats.fallback,
            "Sampled face colors"
        );

        (colors, stats)
    }

    fn resolve<'a>(
        &'a self,
        source: &'a SourceDescriptor,
        material: Option<&'a Material>,
    ) -> ColorSource<'a> {
        if let Some(vertex_colors) = source.mesh.colors.as_deref() {
            return ColorSource::VertexColors(vertex_colors);
        }

        let Some(material) = material else {
            return ColorSource::Fallback;
        };

        if let (Some(texture), Some(uvs)) = (&material.texture, source.mesh.uvs.as_deref()) {
            if let Some(image) = self.cache.get(texture.id) {
                return ColorSource::Texture {
                    image,
                    uvs,
                    factor: material.base_color.unwrap_or([1.0; 4]),
                };
            }
        }

        match material.base_color {
            Some(factor) => ColorSource::BaseColor(factor),
            None => ColorSource::Fallback,
        }
    }
}

fn average_vertex_colors(colors: &[[f32; 3]], corners: [usize; 3]) -> Rgb {
    let mut sum = [0.0f32; 3];
    for corner in corners {
        for (acc, value) in sum.iter_mut().zip(colors[corner]) {
            *acc += clamp_unit(value);
        }
    }
    Rgb::from_unit(sum[0] / 3.0, sum[1] / 3.0, sum[2] / 3.0)
}

fn centroid_uv(uvs: &[[f32; 2]], corners: [usize; 3]) -> [f32; 2] {
    let [a, b, c] = corners.map(|i| uvs[i]);
    [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0]
}

/// Wrap a texture coordinate into [0, 1)
#[inline]
pub(crate) fn wrap_unit(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = ((value % 1.0) + 1.0) % 1.0;
    // (x % 1 + 1) % 1 can round up to exactly 1.0 for tiny negative x
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Nearest-pixel sample multiplied channel-wise by the base color factor
fn sample_texture(image: &RgbaImage, uv: [f32; 2], factor: [f32; 4], flip_v: bool) -> Rgb {
    let u = wrap_unit(uv[0]);
    let v = wrap_unit(uv[1]);
    let v = if flip_v { 1.0 - v } else { v };

    let (width, height) = image.dimensions();
    let x = ((u * width as f32).floor() as u32).min(width - 1);
    let y = ((v * height as f32).floor() as u32).min(height - 1);
    let pixel = image.get_pixel(x, y).0;

    Rgb::from_unit(
        pixel[0] as f32 / 255.0 * clamp_unit(factor[0]),
        pixel[1] as f32 / 255.0 * clamp_unit(factor[1]),
        pixel[2] as f32 / 255.0 * clamp_unit(factor[2]),
    )
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuffer;
    use crate::source::MaterialGroup;
    use std::sync::Arc;

    fn triangle_mesh() -> MeshBuffer {
        MeshBuffer::indexed(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        )
    }

    /// 2x2 texture: red, green / blue, white
    fn checker() -> Arc<Texture> {
        Arc::new(Texture::rgba8(
            7,
            2,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, //
                0, 0, 255, 255, 255, 255, 255, 255,
            ],
        ))
    }

    fn textured_source(uv: [f32; 2]) -> SourceDescriptor {
        let mut mesh = triangle_mesh();
        mesh.uvs = Some(vec![uv; 3]);
        SourceDescriptor::new(mesh).with_material(Material::with_texture(checker()))
    }

    #[test]
    fn test_vertex_colors_take_priority() {
        let mut mesh = triangle_mesh();
        mesh.colors = Some(vec![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 3.0]]);
        let source =
            SourceDescriptor::new(mesh).with_material(Material::with_base_color(0.0, 1.0, 0.0));

        let (colors, stats) = ColorSampler::new().sample(&[source]);
        // Blue channel clamps to 1.0 before averaging: (0 + 0 + 1) / 3
        assert_eq!(colors, vec![Rgb::new(255, 0, 85)]);
        assert_eq!(stats.vertex_color, 1);
    }

    #[test]
    fn test_texture_sampling_at_centroid() {
        let (colors, stats) = ColorSampler::new().sample(&[textured_source([0.75, 0.25])]);
        assert_eq!(colors, vec![Rgb::new(0, 255, 0)]);
        assert_eq!(stats.texture, 1);

        let (colors, _) = ColorSampler::new().sample(&[textured_source([0.25, 0.75])]);
        assert_eq!(colors, vec![Rgb::new(0, 0, 255)]);
    }

    #[test]
    fn test_texture_uv_wraps_and_flips() {
        let (colors, _) = ColorSampler::new().sample(&[textured_source([-0.25, 1.25])]);
        // (-0.25 wraps to 0.75, 1.25 wraps to 0.25)
        assert_eq!(colors, vec![Rgb::new(0, 255, 0)]);

        let (colors, _) = ColorSampler::new()
            .with_flip_v(true)
            .sample(&[textured_source([0.75, 0.25])]);
        assert_eq!(colors, vec![Rgb::new(255, 255, 255)]);
    }

    #[test]
    fn test_texture_multiplied_by_base_color() {
        let mut source = textured_source([0.75, 0.75]);
        source.materials[0].base_color = Some([0.5, 1.0, 0.0, 1.0]);
        let (colors, _) = ColorSampler::new().sample(&[source]);
        assert_eq!(colors, vec![Rgb::new(128, 255, 0)]);
    }

    #[test]
    fn test_texture_without_uvs_uses_base_color() {
        let mut source = textured_source([0.0, 0.0]);
        source.mesh.uvs = None;
        source.materials[0].base_color = Some([0.0, 0.0, 1.0, 1.0]);
        let (colors, stats) = ColorSampler::new().sample(&[source]);
        assert_eq!(colors, vec![Rgb::new(0, 0, 255)]);
        assert_eq!(stats.base_color, 1);
    }

    #[test]
    fn test_undecodable_texture_falls_back() {
        let mut mesh = triangle_mesh();
        mesh.uvs = Some(vec![[0.0, 0.0]; 3]);
        let broken = Arc::new(Texture::encoded(1, b"not an image".to_vec()));
        let mut material = Material::with_texture(broken);
        material.base_color = Some([1.0, 0.0, 0.0, 1.0]);
        let bare = Material::with_texture(Arc::new(Texture::encoded(1, Vec::new())));
        let source = SourceDescriptor::new(mesh.clone()).with_material(material);
        let bare_source = SourceDescriptor::new(mesh).with_material(bare);

        let mut sampler = ColorSampler::new();
        let (colors, stats) = sampler.sample(&[source, bare_source]);
        assert_eq!(colors, vec![Rgb::new(255, 0, 0), FALLBACK_GRAY]);
        assert_eq!(stats.texture_decode_failures, 1);
        assert_eq!(stats.base_color, 1);
        assert_eq!(stats.fallback, 1);
        assert_eq!(sampler.cache().len(), 1);
    }

    #[test]
    fn test_out_of_range_material_uses_fallback() {
        let source = SourceDescriptor::new(triangle_mesh())
            .with_material(Material::with_base_color(1.0, 0.0, 0.0))
            .with_group(MaterialGroup::new(0, 1, 4));
        let (colors, stats) = ColorSampler::new().sample(&[source]);
        assert_eq!(colors, vec![FALLBACK_GRAY]);
        assert_eq!(stats.invalid_material, 1);
        assert_eq!(stats.fallback, 1);
    }

    #[test]
    fn test_no_material_uses_fallback() {
        let (colors, stats) = ColorSampler::new().sample(&[SourceDescriptor::new(triangle_mesh())]);
        assert_eq!(colors, vec![FALLBACK_GRAY]);
        assert_eq!(stats.total(), 1);
    }

    #[test]
    fn test_wrap_unit() {
        assert_eq!(wrap_unit(0.25), 0.25);
        assert_eq!(wrap_unit(1.0), 0.0);
        assert_eq!(wrap_unit(-0.25), 0.75);
        assert!(wrap_unit(-1e-9) < 1.0);
        assert_eq!(wrap_unit(f32::NAN), 0.0);
    }
}
