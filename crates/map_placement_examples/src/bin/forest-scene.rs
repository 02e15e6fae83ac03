//! Scatter trees, rocks and grass over a procedurally shaped world and
//! print the class partition.
use glam::{Vec2, Vec3};
use map_placement::prelude::*;
use map_placement_examples::{
    init_tracing, radial_gradient, solid_texture, texture_from_values, value_noise,
};
use tracing::info;

const CLASS_NAMES: [&str; 3] = ["tree", "rock", "grass"];

fn main() -> anyhow::Result<()> {
    init_tracing();

    let ctx = GpuContext::headless()?;

    let heightmap = texture_from_values(&ctx, 64, 64, &value_noise(64, 64, 7));
    let forest = radial_gradient(64, 64);
    let clearing: Vec<f32> = forest.iter().map(|v| 1.0 - v).collect();
    let trees = texture_from_values(&ctx, 64, 64, &forest);
    let rocks = texture_from_values(&ctx, 64, 64, &clearing);
    let grass = solid_texture(&ctx, 0.9);

    let mut pipeline = PlacementPipeline::new(ctx);
    let world = WorldData::new(Vec3::new(100.0, 12.0, 100.0), &heightmap);
    let layer = LayerData::new(0.75)
        .with_densitymap(&trees, 0.6)
        .with_densitymap(&rocks, 0.2)
        .with_densitymap(&grass, 0.5);

    let result = pipeline
        .compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(100.0))?
        .read_result()?;

    info!(
        "Placed {} objects across {} classes.",
        result.element_array_length(),
        result.num_classes()
    );

    for (class_index, name) in CLASS_NAMES.iter().enumerate() {
        let elements = result.class_elements(class_index as u32);
        info!("{name}: {} instances", elements.len());
        for element in elements.iter().take(3) {
            info!(
                "  {name} at ({:.2}, {:.2}, {:.2})",
                element.position.x, element.position.y, element.position.z
            );
        }
    }

    Ok(())
}
