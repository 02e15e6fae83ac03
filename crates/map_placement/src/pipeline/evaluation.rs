//! Per-class candidate evaluation stage.
use bytemuck::{Pod, Zeroable};

use crate::pipeline::kernel::{self, SampledTexture};
use crate::pipeline::scratch::ScratchLayout;

/// Uniform block of `shaders/evaluation.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct EvaluationParams {
    pub lower: [f32; 2],
    pub upper: [f32; 2],
    pub base_cell: [i32; 2],
    pub grid_size: [u32; 2],
    pub class_index: u32,
    pub weight: f32,
    pub _pad: [u32; 2],
}

/// Wrapper for the candidate evaluation compute shader.
///
/// Dispatched once per class in class order; each dispatch only writes
/// candidates that are still unclaimed, so the first class whose cumulative
/// weighted density crosses the candidate's threshold wins.
pub(crate) struct EvaluationKernel {
    pipeline: wgpu::ComputePipeline,
    data_layout: wgpu::BindGroupLayout,
    densitymap: SampledTexture,
}

impl EvaluationKernel {
    pub fn new(device: &wgpu::Device) -> Self {
        let data_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("evaluation-data"),
            entries: &[
                kernel::uniform_entry(0),
                kernel::storage_entry(1, false),
                kernel::storage_entry(2, true),
                kernel::storage_entry(3, false),
            ],
        });
        let densitymap = SampledTexture::new(device, "evaluation-densitymap");
        let pipeline = kernel::compute_pipeline(
            device,
            "placement-evaluation",
            include_str!("../shaders/evaluation.wgsl"),
            &[&data_layout, &densitymap.layout],
        );

        Self {
            pipeline,
            data_layout,
            densitymap,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        params: EvaluationParams,
        scratch: &wgpu::Buffer,
        layout: &ScratchLayout,
        densitymap: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        work_groups: (u32, u32),
    ) {
        let uniforms = kernel::uniform_buffer(device, "evaluation-params", &params);
        let data = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("evaluation-data"),
            layout: &self.data_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(layout.candidates.binding(scratch)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Buffer(layout.world_uv.binding(scratch)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Buffer(layout.density.binding(scratch)),
                },
            ],
        });
        let textures = self
            .densitymap
            .bind(device, "evaluation-densitymap", densitymap, sampler);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("placement-evaluation"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &data, &[]);
        pass.set_bind_group(1, &textures, &[]);
        pass.dispatch_workgroups(work_groups.0, work_groups.1, 1);
    }
}
