use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use paint3mf::{
    ClusterDecimator, ConvertConfig, Decimator, EncodingMode, MeshBuffer, PaletteQuantizer, Rgb,
    SourceDescriptor, TagDialect, assign, convert, median_cut, segment,
};

/// `n` x `n` grid of quads with a wavy height field
fn generate_grid(n: usize) -> MeshBuffer {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for y in 0..=n {
        for x in 0..=n {
            let z = ((x as f32) * 0.3).sin() * ((y as f32) * 0.2).cos();
            positions.push([x as f32, y as f32, z]);
        }
    }
    let stride = (n + 1) as u32;
    let mut triangles = Vec::with_capacity(n * n * 2);
    for y in 0..n as u32 {
        for x in 0..n as u32 {
            let a = y * stride + x;
            triangles.push([a, a + 1, a + stride]);
            triangles.push([a + 1, a + stride + 1, a + stride]);
        }
    }
    MeshBuffer::indexed(positions, &triangles)
}

/// Deterministic pseudo-random colors
fn generate_colors(count: usize) -> Vec<Rgb> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            Rgb::new(state as u8, (state >> 8) as u8, (state >> 16) as u8)
        })
        .collect()
}

fn bench_median_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("median_cut");

    for &(count, k) in &[(1_000, 4), (10_000, 8), (50_000, 16)] {
        let colors = generate_colors(count);
        group.bench_with_input(
            BenchmarkId::new("colors_k", format!("{}c_{}k", count, k)),
            &colors,
            |b, colors| b.iter(|| black_box(median_cut(colors, k))),
        );
    }

    group.finish();
}

fn bench_quantize_and_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize_assign");

    let colors = generate_colors(200_000);
    let quantizer = PaletteQuantizer::default();
    group.bench_function("200000c_8k", |b| {
        b.iter(|| {
            let palette = quantizer.quantize(&colors, 8);
            black_box(assign(&colors, &palette))
        })
    });

    group.finish();
}

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    for &n in &[50usize, 200] {
        let mesh = generate_grid(n);
        let palette = generate_colors(6);
        let face_index: Vec<usize> = (0..mesh.triangle_count()).map(|t| (t / 7) % 6).collect();

        group.bench_with_input(
            BenchmarkId::new("triangles", mesh.triangle_count()),
            &mesh,
            |b, mesh| b.iter(|| black_box(segment(mesh, &face_index, &palette, 6).unwrap())),
        );
    }

    group.finish();
}

fn bench_decimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("decimate");
    group.sample_size(10); // Large meshes

    let mesh = generate_grid(400);
    let target = mesh.triangle_count() / 4;
    group.bench_function(format!("{}t_to_{}t", mesh.triangle_count(), target), |b| {
        b.iter(|| {
            let mut decimator = ClusterDecimator::new();
            black_box(decimator.simplify(&mesh, target, 0.0).unwrap())
        })
    });

    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    group.sample_size(10);

    let mut mesh = generate_grid(100);
    mesh.colors = Some(
        mesh.positions
            .iter()
            .map(|p| [p[0] / 100.0, p[1] / 100.0, 0.5])
            .collect(),
    );
    let sources = [SourceDescriptor::new(mesh)];

    for mode in [
        EncodingMode::PerObject,
        EncodingMode::TriangleTag(TagDialect::PaintHex),
        EncodingMode::MaterialIndex,
    ] {
        let config = ConvertConfig::new().with_palette_size(6).with_encoding(mode);
        group.bench_with_input(BenchmarkId::new("mode", mode.name()), &config, |b, config| {
            b.iter(|| black_box(convert(&sources, config).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_median_cut,
    bench_quantize_and_assign,
    bench_segment,
    bench_decimate,
    bench_convert
);
criterion_main!(benches);
