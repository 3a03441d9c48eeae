//! Median-cut palette quantization
//!
//! Builds a palette of at most K representative colors from a list of face
//! colors, then maps every face color to its nearest palette entry.

use tracing::{debug, info_span};

use crate::color::Rgb;
use crate::config::DEFAULT_SAMPLE_CAP;
use crate::progress::{ProgressSink, Stage};

/// Ordered list of representative colors
pub type Palette = Vec<Rgb>;

/// Median-cut quantizer with a per-run sample cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteQuantizer {
    sample_cap: usize,
}

impl Default for PaletteQuantizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAP)
    }
}

impl PaletteQuantizer {
    /// Quantizer that stride-samples inputs longer than `sample_cap`
    pub fn new(sample_cap: usize) -> Self {
        Self {
            sample_cap: sample_cap.max(1),
        }
    }

    /// Configured sample cap
    pub fn sample_cap(&self) -> usize {
        self.sample_cap
    }

    /// Build a palette of at most `k` colors
    ///
    /// # Example
    /// ```
    /// use paint3mf::{PaletteQuantizer, Rgb};
    ///
    /// let red = Rgb::new(255, 0, 0);
    /// let blue = Rgb::new(0, 0, 255);
    /// let palette = PaletteQuantizer::default().quantize(&[red, blue, red], 2);
    /// assert_eq!(palette.len(), 2);
    /// assert!(palette.contains(&red) && palette.contains(&blue));
    /// ```
    pub fn quantize(&self, colors: &[Rgb], k: usize) -> Palette {
        let _span = info_span!("quantize", colors = colors.len(), k).entered();
        if colors.len() > self.sample_cap {
            let sampled = stride_sample(colors, self.sample_cap);
            debug!(
                from = colors.len(),
                to = sampled.len(),
                "Stride-sampled colors before clustering"
            );
            median_cut(&sampled, k)
        } else {
            median_cut(colors, k)
        }
    }

    /// Build a palette and assign every color to it
    pub fn quantize_and_assign(
        &self,
        colors: &[Rgb],
        k: usize,
        progress: &mut ProgressSink<'_>,
    ) -> (Palette, Vec<usize>) {
        let palette = self.quantize(colors, k);
        let indices = assign_with_progress(colors, &palette, progress);
        (palette, indices)
    }
}

/// Evenly spaced subset of `cap` colors, first element always kept
fn stride_sample(colors: &[Rgb], cap: usize) -> Vec<Rgb> {
    let len = colors.len();
    (0..cap).map(|i| colors[i * len / cap]).collect()
}

/// Median-cut over the full list, without sampling
///
/// Repeatedly splits the bucket with the widest single-channel range at its
/// median until `k` buckets exist or every splittable bucket is a single
/// color. Channel ties prefer red, then green, then blue; bucket ties prefer
/// the earliest bucket.
pub fn median_cut(colors: &[Rgb], k: usize) -> Palette {
    if colors.is_empty() {
        return Vec::new();
    }
    if k <= 1 {
        return vec![average(colors)];
    }

    let mut buckets: Vec<Vec<Rgb>> = vec![colors.to_vec()];
    while buckets.len() < k {
        let mut chosen: Option<(usize, usize, u8)> = None;
        for (i, bucket) in buckets.iter().enumerate() {
            if bucket.len() < 2 {
                continue;
            }
            let (channel, range) = widest_channel(bucket);
            if chosen.is_none_or(|(_, _, best)| range > best) {
                chosen = Some((i, channel, range));
            }
        }

        let Some((index, channel, range)) = chosen else {
            break;
        };
        if range == 0 {
            break;
        }

        let mut bucket = std::mem::take(&mut buckets[index]);
        bucket.sort_by_key(|c| c.channel(channel));
        let upper = bucket.split_off(bucket.len().div_ceil(2));
        buckets[index] = bucket;
        buckets.insert(index + 1, upper);
    }

    buckets.iter().map(|bucket| average(bucket)).collect()
}

/// Channel with the largest max-min spread, and that spread
fn widest_channel(bucket: &[Rgb]) -> (usize, u8) {
    let mut best = (0, 0u8);
    for channel in 0..3 {
        let (lo, hi) = bucket.iter().fold((u8::MAX, u8::MIN), |(lo, hi), c| {
            let v = c.channel(channel);
            (lo.min(v), hi.max(v))
        });
        let range = hi - lo;
        if range > best.1 {
            best = (channel, range);
        }
    }
    best
}

/// Channel-wise rounded mean
fn average(colors: &[Rgb]) -> Rgb {
    let n = colors.len() as f64;
    let (r, g, b) = colors.iter().fold((0u64, 0u64, 0u64), |(r, g, b), c| {
        (r + c.r as u64, g + c.g as u64, b + c.b as u64)
    });
    Rgb::new(
        (r as f64 / n).round() as u8,
        (g as f64 / n).round() as u8,
        (b as f64 / n).round() as u8,
    )
}

/// Index of the closest palette entry by squared RGB distance
///
/// Ties go to the lowest index. Returns `None` for an empty palette.
pub fn nearest_index(color: Rgb, palette: &[Rgb]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, entry) in palette.iter().enumerate() {
        let distance = color.distance_squared(*entry);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}

/// Nearest palette index for every color
///
/// An empty palette maps every color to index 0.
pub fn assign(colors: &[Rgb], palette: &[Rgb]) -> Vec<usize> {
    assign_with_progress(colors, palette, &mut ProgressSink::none())
}

fn assign_with_progress(
    colors: &[Rgb],
    palette: &[Rgb],
    progress: &mut ProgressSink<'_>,
) -> Vec<usize> {
    let total = colors.len();
    colors
        .iter()
        .enumerate()
        .map(|(i, &color)| {
            progress.batch(Stage::Quantizing, i + 1, total);
            nearest_index(color, palette).unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    #[test]
    fn test_empty_input() {
        assert!(median_cut(&[], 4).is_empty());
        assert!(PaletteQuantizer::default().quantize(&[], 4).is_empty());
    }

    #[test]
    fn test_single_color_palette_is_average() {
        let palette = median_cut(&[Rgb::new(10, 20, 30), Rgb::new(20, 30, 41)], 1);
        assert_eq!(palette, vec![Rgb::new(15, 25, 36)]);
        assert_eq!(median_cut(&[RED], 0), vec![RED]);
    }

    #[test]
    fn test_monochrome_stops_early() {
        let palette = median_cut(&[GREEN; 10], 4);
        assert_eq!(palette, vec![GREEN]);
    }

    #[test]
    fn test_split_order_lower_half_first() {
        // Red range is widest; sorted ascending, lower half holds the extra element
        let colors = [
            Rgb::new(200, 0, 0),
            Rgb::new(0, 0, 0),
            Rgb::new(100, 0, 0),
        ];
        let palette = median_cut(&colors, 2);
        assert_eq!(palette, vec![Rgb::new(50, 0, 0), Rgb::new(200, 0, 0)]);
    }

    #[test]
    fn test_channel_tie_prefers_red() {
        let colors = [Rgb::new(0, 0, 0), Rgb::new(100, 100, 0), Rgb::new(0, 100, 0)];
        assert_eq!(widest_channel(&colors), (0, 100));
    }

    #[test]
    fn test_three_primaries() {
        let palette = median_cut(&[RED, GREEN, BLUE], 3);
        assert_eq!(palette.len(), 3);
        for color in [RED, GREEN, BLUE] {
            assert!(palette.contains(&color));
        }
    }

    #[test]
    fn test_existing_palette_is_idempotent() {
        let input = [RED, BLUE, RED, BLUE, GREEN];
        let palette = median_cut(&input, 3);
        let mut sorted = palette.clone();
        sorted.sort_by_key(|c| (c.r, c.g, c.b));
        assert_eq!(sorted, vec![BLUE, GREEN, RED]);
    }

    #[test]
    fn test_nearest_index_ties_go_low() {
        let palette = [Rgb::new(0, 0, 0), Rgb::new(20, 0, 0)];
        assert_eq!(nearest_index(Rgb::new(10, 0, 0), &palette), Some(0));
        assert_eq!(nearest_index(Rgb::new(11, 0, 0), &palette), Some(1));
        assert_eq!(nearest_index(RED, &[]), None);
    }

    #[test]
    fn test_assign() {
        let palette = [RED, BLUE];
        let colors = [Rgb::new(250, 5, 5), Rgb::new(5, 5, 250), RED];
        assert_eq!(assign(&colors, &palette), vec![0, 1, 0]);
        assert_eq!(assign(&colors, &[]), vec![0, 0, 0]);
    }

    #[test]
    fn test_sample_cap_limits_input() {
        let colors: Vec<Rgb> = (0..1000).map(|i| Rgb::new((i % 256) as u8, 0, 0)).collect();
        let sampled = stride_sample(&colors, 10);
        assert_eq!(sampled.len(), 10);
        assert_eq!(sampled[0], colors[0]);
        assert_eq!(sampled[1], colors[100]);

        let palette = PaletteQuantizer::new(10).quantize(&colors, 4);
        assert!(palette.len() <= 4);
    }
}
