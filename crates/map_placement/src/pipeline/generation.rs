//! Candidate generation stage.
use bytemuck::{Pod, Zeroable};

use crate::pipeline::kernel::{self, SampledTexture};
use crate::pipeline::scratch::ScratchLayout;

/// Uniform block of `shaders/generation.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct GenerationParams {
    pub world_scale: [f32; 3],
    pub cell_size: f32,
    pub base_cell: [i32; 2],
    pub grid_size: [u32; 2],
}

/// Wrapper for the candidate generation compute shader.
///
/// Emits one candidate per stencil slot: world XZ from the tiled stencil,
/// world Y from the heightmap, class initially invalid, density budget 1.
pub(crate) struct GenerationKernel {
    pipeline: wgpu::ComputePipeline,
    data_layout: wgpu::BindGroupLayout,
    heightmap: SampledTexture,
}

impl GenerationKernel {
    pub fn new(device: &wgpu::Device) -> Self {
        let data_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("generation-data"),
            entries: &[
                kernel::uniform_entry(0),
                kernel::storage_entry(1, true),
                kernel::storage_entry(2, false),
                kernel::storage_entry(3, false),
                kernel::storage_entry(4, false),
            ],
        });
        let heightmap = SampledTexture::new(device, "generation-heightmap");
        let pipeline = kernel::compute_pipeline(
            device,
            "placement-generation",
            include_str!("../shaders/generation.wgsl"),
            &[&data_layout, &heightmap.layout],
        );

        Self {
            pipeline,
            data_layout,
            heightmap,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        params: GenerationParams,
        stencil: &wgpu::Buffer,
        scratch: &wgpu::Buffer,
        layout: &ScratchLayout,
        heightmap: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        work_groups: (u32, u32),
    ) {
        let uniforms = kernel::uniform_buffer(device, "generation-params", &params);
        let data = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("generation-data"),
            layout: &self.data_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: stencil.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Buffer(layout.candidates.binding(scratch)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Buffer(layout.world_uv.binding(scratch)),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Buffer(layout.density.binding(scratch)),
                },
            ],
        });
        let textures = self
            .heightmap
            .bind(device, "generation-heightmap", heightmap, sampler);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("placement-generation"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &data, &[]);
        pass.set_bind_group(1, &textures, &[]);
        pass.dispatch_workgroups(work_groups.0, work_groups.1, 1);
    }
}
