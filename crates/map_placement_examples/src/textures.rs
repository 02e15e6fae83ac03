//! Procedural grayscale textures for the example binaries.
use map_placement::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upload grayscale values as an `Rgba8Unorm` texture and return its view.
pub fn texture_from_values(
    ctx: &GpuContext,
    width: u32,
    height: u32,
    values: &[f32],
) -> wgpu::TextureView {
    assert_eq!(values.len(), (width * height) as usize);
    let data: Vec<u8> = values
        .iter()
        .flat_map(|&v| {
            let byte = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            [byte, byte, byte, 255]
        })
        .collect();

    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("example-texture"),
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

/// A single-pixel texture of constant value.
pub fn solid_texture(ctx: &GpuContext, value: f32) -> wgpu::TextureView {
    texture_from_values(ctx, 1, 1, &[value])
}

/// Smooth value noise in `[0, 1]`, bilinearly upsampled from a coarse
/// seeded lattice.
pub fn value_noise(width: u32, height: u32, seed: u64) -> Vec<f32> {
    const LATTICE: usize = 9;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lattice = [[0.0f32; LATTICE]; LATTICE];
    for row in lattice.iter_mut() {
        for value in row.iter_mut() {
            *value = rng.gen_range(0.0..1.0);
        }
    }

    let mut values = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / width as f32 * (LATTICE - 1) as f32;
            let v = y as f32 / height as f32 * (LATTICE - 1) as f32;
            let (x0, y0) = (u as usize, v as usize);
            let (fx, fy) = (u - x0 as f32, v - y0 as f32);
            let x1 = (x0 + 1).min(LATTICE - 1);
            let y1 = (y0 + 1).min(LATTICE - 1);

            let top = lattice[y0][x0] * (1.0 - fx) + lattice[y0][x1] * fx;
            let bottom = lattice[y1][x0] * (1.0 - fx) + lattice[y1][x1] * fx;
            values.push(top * (1.0 - fy) + bottom * fy);
        }
    }
    values
}

/// Radial falloff from the texture center, 1 in the middle and 0 at the
/// corners.
pub fn radial_gradient(width: u32, height: u32) -> Vec<f32> {
    let center = (width as f32 / 2.0, height as f32 / 2.0);
    let max_dist = (center.0 * center.0 + center.1 * center.1).sqrt();

    let mut values = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 + 0.5 - center.0;
            let dy = y as f32 + 0.5 - center.1;
            let dist = (dx * dx + dy * dy).sqrt();
            values.push(1.0 - (dist / max_dist).min(1.0));
        }
    }
    values
}
