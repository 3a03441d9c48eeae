//! End-to-end conversion scenarios

mod common;

use common::{BLUE, KeepFirst, RED, grid, red_blue_source, single_triangle_source};
use paint3mf::parser::parse_model_xml;
use paint3mf::{
    ConvertConfig, EncodingMode, FitParams, ProgressSink, Rgb, Stage, TagDialect, convert,
    convert_with, fit,
};

#[test]
fn test_two_colors_per_object() {
    let config = ConvertConfig::new().with_palette_size(2).with_name("Pair");
    let package = convert(&[red_blue_source()], &config).unwrap();

    let mut palette = package.report.palette.clone();
    palette.sort();
    assert_eq!(palette, vec!["#0000FF", "#FF0000"]);
    assert_eq!(package.report.colors.len(), 2);
    assert!(package.report.colors.iter().all(|c| c.triangles == 1));

    let model = parse_model_xml(package.model_xml().unwrap()).unwrap();
    assert_eq!(model.resources.objects.len(), 2);
    assert_eq!(model.build.items.len(), 2);

    let validation = package.report.validation.as_ref().unwrap();
    assert!(validation.valid);
    assert_eq!(validation.geometry.objects, 2);
    assert_eq!(validation.geometry.triangles, 2);
}

#[test]
fn test_two_colors_per_triangle_tags() {
    for dialect in [TagDialect::PaintHex, TagDialect::ExtruderIndex] {
        let config = ConvertConfig::new()
            .with_palette_size(2)
            .with_encoding(EncodingMode::TriangleTag(dialect));
        let package = convert(&[red_blue_source()], &config).unwrap();

        let model = parse_model_xml(package.model_xml().unwrap()).unwrap();
        assert_eq!(model.resources.objects.len(), 1);
        let mesh = model.resources.objects[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.triangles.len(), 2);

        let tags: Vec<Option<String>> = mesh
            .triangles
            .iter()
            .map(|t| match dialect {
                TagDialect::PaintHex => t.mmu_segmentation.clone(),
                TagDialect::ExtruderIndex => t.paint_color.clone(),
            })
            .collect();
        assert!(tags.iter().all(Option::is_some));
        assert_ne!(tags[0], tags[1]);
    }
}

#[test]
fn test_two_colors_material_index() {
    let config = ConvertConfig::new()
        .with_palette_size(2)
        .with_encoding(EncodingMode::MaterialIndex);
    let package = convert(&[red_blue_source()], &config).unwrap();

    let model = parse_model_xml(package.model_xml().unwrap()).unwrap();
    let mesh = model.resources.objects[0].mesh.as_ref().unwrap();
    let mut p1: Vec<_> = mesh.triangles.iter().map(|t| t.p1).collect();
    p1.sort();
    assert_eq!(p1, vec![Some(0), Some(1)]);
    assert!(mesh.triangles.iter().all(|t| t.pid == Some(1)));
}

#[test]
fn test_single_flat_triangle() {
    let config = ConvertConfig::new().with_palette_size(1);
    let package = convert(&[single_triangle_source([0.0, 0.5, 0.0])], &config).unwrap();

    assert_eq!(package.report.palette.len(), 1);
    let model = parse_model_xml(package.model_xml().unwrap()).unwrap();
    assert_eq!(model.resources.base_material_groups.len(), 1);
    assert_eq!(model.resources.base_material_groups[0].materials.len(), 1);
    assert_eq!(model.resources.objects.len(), 1);
    assert_eq!(
        model.resources.base_material_groups[0].materials[0].displaycolor,
        Rgb::from_unit(0.0, 0.5, 0.0)
    );
}

#[test]
fn test_large_mesh_fits_under_ceiling() {
    // 600 x 500 quads = 600,000 triangles
    let mut mesh = grid(1);
    let rows = 600u32;
    let cols = 500u32;
    mesh.positions = (0..=rows)
        .flat_map(|y| (0..=cols).map(move |x| [x as f32, y as f32, 0.0]))
        .collect();
    let stride = cols + 1;
    let mut indices = Vec::with_capacity((rows * cols * 6) as usize);
    for y in 0..rows {
        for x in 0..cols {
            let a = y * stride + x;
            indices.extend_from_slice(&[a, a + 1, a + stride, a + 1, a + stride + 1, a + stride]);
        }
    }
    mesh.indices = Some(indices);
    assert_eq!(mesh.triangle_count(), 600_000);

    let colors = vec![Rgb::new(10, 20, 30); 600_000];
    let params = FitParams::new(500_000, 0);
    let fitted = fit(mesh, colors, &params, &mut KeepFirst, &mut ProgressSink::none()).unwrap();

    assert!(fitted.mesh.triangle_count() <= 500_000);
    assert_eq!(fitted.face_colors.len(), fitted.mesh.triangle_count());
    assert!(fitted.report.simplified());
}

#[test]
fn test_progress_reaches_every_stage() {
    let mut stages = Vec::new();
    let mut callback = |p: &paint3mf::Progress| {
        if stages.last() != Some(&p.stage) {
            stages.push(p.stage);
        }
    };
    let mut sink = ProgressSink::new(&mut callback);
    let config = ConvertConfig::new().with_palette_size(2).with_subdivision_level(1);
    convert_with(
        &[red_blue_source()],
        &config,
        &mut paint3mf::ClusterDecimator::new(),
        &mut sink,
    )
    .unwrap();
    drop(sink);

    for stage in [
        Stage::Sampling,
        Stage::Fitting,
        Stage::Quantizing,
        Stage::Segmenting,
        Stage::Serializing,
        Stage::Validating,
    ] {
        assert!(stages.contains(&stage), "missing {:?} in {:?}", stage, stages);
    }
}

#[test]
fn test_subdivision_multiplies_triangles() {
    let config = ConvertConfig::new().with_palette_size(2).with_subdivision_level(2);
    let package = convert(&[red_blue_source()], &config).unwrap();
    assert_eq!(package.report.total_triangles, 2 * 16);
    let fit = package.report.fit.as_ref().unwrap();
    assert_eq!(fit.applied_level, 2);
    assert_eq!(fit.final_triangles, 32);
}

#[test]
fn test_invalid_input_is_fatal() {
    let err = convert(&[], &ConvertConfig::new()).unwrap_err();
    assert!(err.is_fatal_input());

    let err = convert(
        &[single_triangle_source(RED)],
        &ConvertConfig::new().with_palette_size(0),
    )
    .unwrap_err();
    assert!(err.is_fatal_input());

    let empty = paint3mf::SourceDescriptor::new(paint3mf::MeshBuffer::new());
    assert!(convert(&[empty], &ConvertConfig::new()).is_err());
}

#[test]
fn test_merged_sources_keep_both_colors() {
    let config = ConvertConfig::new().with_palette_size(4);
    let package = convert(
        &[single_triangle_source(RED), single_triangle_source(BLUE)],
        &config,
    )
    .unwrap();
    assert_eq!(package.report.palette.len(), 2);
    assert_eq!(package.report.total_triangles, 2);
}
