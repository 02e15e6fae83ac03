//! Scatter stage: move valid candidates into their class partitions.
use crate::pipeline::kernel::{self, CompactParams};
use crate::pipeline::scratch::ScratchLayout;

pub(crate) struct CopyKernel {
    pipeline: wgpu::ComputePipeline,
    data_layout: wgpu::BindGroupLayout,
}

impl CopyKernel {
    pub fn new(device: &wgpu::Device) -> Self {
        let data_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("copy-data"),
            entries: &[
                kernel::uniform_entry(0),
                kernel::storage_entry(1, true),
                kernel::storage_entry(2, true),
                kernel::storage_entry(3, true),
                kernel::storage_entry(4, false),
            ],
        });
        let pipeline = kernel::compute_pipeline(
            device,
            "placement-copy",
            include_str!("../shaders/copy.wgsl"),
            &[&data_layout],
        );

        Self {
            pipeline,
            data_layout,
        }
    }

    pub fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        params: CompactParams,
        scratch: &wgpu::Buffer,
        layout: &ScratchLayout,
        work_groups: u32,
    ) {
        let uniforms = kernel::uniform_buffer(device, "copy-params", &params);
        let data = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("copy-data"),
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
                    resource: wgpu::BindingResource::Buffer(layout.indices.binding(scratch)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Buffer(layout.class_counters.binding(scratch)),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Buffer(layout.output.binding(scratch)),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("placement-copy"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &data, &[]);
        pass.dispatch_workgroups(work_groups, 1, 1);
    }
}
