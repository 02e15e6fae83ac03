//! End-to-end placement scenarios on a real compute device.
//!
//! Every test acquires a headless device and skips with a note when the
//! machine has no usable adapter.
use glam::{Vec2, Vec3};
use map_placement::prelude::*;

fn gpu() -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn texture_view(
    ctx: &GpuContext,
    width: u32,
    height: u32,
    pixels: &[[f32; 4]],
) -> wgpu::TextureView {
    assert_eq!(pixels.len(), (width * height) as usize);
    let data: Vec<u8> = pixels
        .iter()
        .flat_map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        .collect();

    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("test-texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue().write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn solid(ctx: &GpuContext, value: f32) -> wgpu::TextureView {
    texture_view(ctx, 1, 1, &[[value, value, value, 1.0]])
}

fn read_device_buffer(ctx: &GpuContext, buffer: &wgpu::Buffer, size: u64) -> Vec<u8> {
    let staging = ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("test-staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = ctx
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    ctx.queue().submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device().poll(wgpu::Maintain::Wait);
    rx.recv().expect("map callback").expect("map succeeds");

    let data = slice.get_mapped_range().to_vec();
    staging.unmap();
    data
}

fn xz_distance(a: &PlacedElement, b: &PlacedElement) -> f32 {
    let dx = a.position.x - b.position.x;
    let dz = a.position.z - b.position.z;
    (dx * dx + dz * dz).sqrt()
}

fn assert_separation(elements: &[PlacedElement], footprint: f32) {
    let tolerance = footprint * (1.0 - 1e-4);
    for i in 0..elements.len() {
        for j in (i + 1)..elements.len() {
            let d = xz_distance(&elements[i], &elements[j]);
            assert!(
                d >= tolerance,
                "elements {i} and {j} are {d} apart, footprint {footprint}"
            );
        }
    }
}

#[test]
fn single_object_region() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(1.0))
        .unwrap()
        .read_result()
        .unwrap();
    assert_eq!(result.element_array_length(), 1);
    let element = result.elements()[0];
    assert_eq!(element.class_index, 0);
    assert!(element.position.x >= 0.0 && element.position.x < 1.0);
    assert!(element.position.z >= 0.0 && element.position.z < 1.0);
    assert_eq!(element.position.y, 0.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::splat(1.5), Vec2::splat(2.5))
        .unwrap()
        .read_result()
        .unwrap();
    assert_eq!(result.element_array_length(), 1);
}

#[test]
fn full_area_placement() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let footprint = 0.5;
    let layer = LayerData::new(footprint).with_densitymap(&density, 1.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(10.5))
        .unwrap()
        .read_result()
        .unwrap();

    // A 10x10 square of cells of side 2 * footprint.
    assert_eq!(result.element_array_length(), 100);
    assert_separation(result.elements(), footprint);
    for element in result.elements() {
        assert!(element.position.x >= 0.0 && element.position.x < 10.5);
        assert!(element.position.z >= 0.0 && element.position.z < 10.5);
    }
}

#[test]
fn inverted_regions_are_empty() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let layer = LayerData::new(1.0).with_densitymap(&density, 1.0);

    // Any inverted axis yields an empty result, never an error.
    for upper in [
        Vec2::new(-1.0, -1.0),
        Vec2::new(10.0, -1.0),
        Vec2::new(-1.0, 10.0),
    ] {
        let result = pipeline
            .compute_placement(&world, &layer, Vec2::ZERO, upper)
            .unwrap()
            .read_result()
            .unwrap();
        assert_eq!(result.element_array_length(), 0);
        assert_eq!(result.num_classes(), 1);
        assert_eq!(result.class_element_count(0), 0);
    }
}

#[test]
fn multiclass_partition() {
    let Some(ctx) = gpu() else { return };
    let heightmap = texture_view(
        &ctx,
        2,
        2,
        &[
            [0.0, 0.0, 0.0, 1.0],
            [0.25, 0.25, 0.25, 1.0],
            [0.5, 0.5, 0.5, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ],
    );
    let maps: Vec<wgpu::TextureView> = (0..5).map(|_| solid(&ctx, 1.0)).collect();

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::ONE, &heightmap);
    let footprint = 0.01;
    let mut layer = LayerData::new(footprint);
    for map in &maps {
        layer = layer.with_densitymap(map, 0.2);
    }

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(1.0))
        .unwrap()
        .read_result()
        .unwrap();

    assert_eq!(result.num_classes(), 5);

    let total: usize = (0..5).map(|k| result.class_element_count(k)).sum();
    assert_eq!(total, result.element_array_length());
    // 50x50 slots; the few candidates flush with the upper edge may round out.
    assert!((2400..=2500).contains(&total), "total {total}");

    for k in 0..5 {
        let class = result.class_elements(k);
        assert_eq!(class.len(), result.class_element_count(k));
        assert!(!class.is_empty(), "class {k} placed nothing");
        for element in class {
            assert_eq!(element.class_index, k);
            assert!(element.position.y >= 0.0 && element.position.y <= 1.0);
        }
    }

    // Separation binds across all classes together.
    assert_separation(result.elements(), footprint);
}

#[test]
fn determinism_across_calls() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.5);
    let grass = solid(&ctx, 0.8);
    let rocks = solid(&ctx, 0.4);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(20.0, 5.0, 20.0), &heightmap);
    let layer = LayerData::new(0.25)
        .with_densitymap(&grass, 0.6)
        .with_densitymap(&rocks, 0.9);

    let key = |result: &PlacementResult| {
        let mut keys: Vec<(u32, [u32; 3])> = result
            .elements()
            .iter()
            .map(|e| {
                (
                    e.class_index,
                    [
                        e.position.x.to_bits(),
                        e.position.y.to_bits(),
                        e.position.z.to_bits(),
                    ],
                )
            })
            .collect();
        keys.sort_unstable();
        keys
    };

    let mut runs = Vec::new();
    for _ in 0..3 {
        let result = pipeline
            .compute_placement(&world, &layer, Vec2::new(3.0, 4.0), Vec2::new(15.0, 17.0))
            .unwrap()
            .read_result()
            .unwrap();
        runs.push(key(&result));
    }

    assert!(!runs[0].is_empty());
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

#[test]
fn boundedness_inside_offset_region() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let footprint = 0.25;
    let layer = LayerData::new(footprint).with_densitymap(&density, 1.0);

    let lower = Vec2::new(2.0, 3.0);
    let upper = Vec2::new(9.0, 7.0);
    let result = pipeline
        .compute_placement(&world, &layer, lower, upper)
        .unwrap()
        .read_result()
        .unwrap();

    assert!(result.element_array_length() > 0);
    for element in result.elements() {
        assert!(element.position.x >= lower.x && element.position.x < upper.x);
        assert!(element.position.z >= lower.y && element.position.z < upper.y);
    }
    assert_separation(result.elements(), footprint);
}

#[test]
fn black_density_places_nothing() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 0.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(10.0))
        .unwrap()
        .read_result()
        .unwrap();
    assert_eq!(result.element_array_length(), 0);
    assert_eq!(result.num_classes(), 1);
}

#[test]
fn height_follows_world_scale() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 1.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 3.0, 10.0), &heightmap);
    let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(10.0))
        .unwrap()
        .read_result()
        .unwrap();
    assert!(result.element_array_length() > 0);
    for element in result.elements() {
        assert_eq!(element.position.y, 3.0);
    }
}

#[test]
fn results_are_idempotent_snapshots() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(10.0))
        .unwrap()
        .read_result()
        .unwrap();
    let first_read = result.copy_all_to_host();
    assert_eq!(first_read.len(), result.element_array_length());

    // A later dispatch reuses the scratch; the snapshot must not move.
    let _ = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(4.0))
        .unwrap()
        .read_result()
        .unwrap();

    assert_eq!(result.copy_all_to_host(), first_read);
    assert_eq!(result.elements(), first_read.as_slice());
}

#[test]
fn device_copy_matches_host_view() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);
    let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(10.0))
        .unwrap()
        .read_result()
        .unwrap();
    let byte_len = (result.element_array_length() * 16) as u64;
    assert!(byte_len > 0);

    let destination = ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("test-destination"),
        size: byte_len,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    result.copy_all_to(&destination).unwrap();

    let bytes = read_device_buffer(&ctx, &destination, byte_len);
    let elements: &[PlacedElement] = bytemuck::cast_slice(&bytes);
    assert_eq!(elements, result.elements());

    // Undersized destinations are rejected before any copy.
    let small = ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("test-too-small"),
        size: 16,
        usage: wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    assert!(result.copy_all_to(&small).is_err());
}

#[test]
fn invalid_configuration_is_rejected() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let mut pipeline = PlacementPipeline::new(ctx.clone());
    let world = WorldData::new(Vec3::new(10.0, 1.0, 10.0), &heightmap);

    let no_classes = LayerData::new(0.5);
    assert!(pipeline
        .compute_placement(&world, &no_classes, Vec2::ZERO, Vec2::ONE)
        .is_err());

    let bad_footprint = LayerData::new(0.0).with_densitymap(&density, 1.0);
    assert!(pipeline
        .compute_placement(&world, &bad_footprint, Vec2::ZERO, Vec2::ONE)
        .is_err());

    let bad_weight = LayerData::new(0.5).with_densitymap(&density, 1.5);
    assert!(pipeline
        .compute_placement(&world, &bad_weight, Vec2::ZERO, Vec2::ONE)
        .is_err());

    let flat_world = WorldData::new(Vec3::new(0.0, 1.0, 10.0), &heightmap);
    let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);
    assert!(pipeline
        .compute_placement(&flat_world, &layer, Vec2::ZERO, Vec2::ONE)
        .is_err());
}

#[test]
fn seeds_change_the_pattern_deterministically() {
    let Some(ctx) = gpu() else { return };
    let heightmap = solid(&ctx, 0.0);
    let density = solid(&ctx, 1.0);

    let world_scale = Vec3::new(10.0, 1.0, 10.0);
    let positions_for = |seed: u32| {
        let mut pipeline = PlacementPipeline::new(ctx.clone()).with_seed(seed);
        let world = WorldData::new(world_scale, &heightmap);
        let layer = LayerData::new(0.5).with_densitymap(&density, 1.0);
        let result = pipeline
            .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(10.0))
            .unwrap()
            .read_result()
            .unwrap();
        let mut keys: Vec<[u32; 2]> = result
            .elements()
            .iter()
            .map(|e| [e.position.x.to_bits(), e.position.z.to_bits()])
            .collect();
        keys.sort_unstable();
        keys
    };

    assert_eq!(positions_for(3), positions_for(3));
    assert_ne!(positions_for(3), positions_for(4));
}
