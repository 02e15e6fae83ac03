//! The four-stage placement pipeline and its orchestrator.
//!
//! [`PlacementPipeline`] owns the compute kernels, the tileable stencil and
//! the scratch buffer, and sequences the stages of one placement dispatch:
//! generation, per-class evaluation, indexation, copy. Ordering between the
//! stages rides on wgpu's storage-buffer usage tracking, which places the
//! required barriers between the compute passes.
use glam::{UVec2, Vec2};
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::pipeline::copy::CopyKernel;
use crate::pipeline::evaluation::{EvaluationKernel, EvaluationParams};
use crate::pipeline::generation::{GenerationKernel, GenerationParams};
use crate::pipeline::indexation::IndexationKernel;
use crate::pipeline::kernel::{linear_work_groups, CompactParams, WORK_GROUP_DIMS};
use crate::pipeline::scratch::{ScratchBuffer, ScratchLayout};
use crate::stencil::Stencil;

pub mod layer;
pub mod result;

mod copy;
mod evaluation;
mod generation;
mod indexation;
mod kernel;
mod scratch;

pub use layer::{DensityMap, LayerData, WorldData};
pub use result::{FutureResult, PlacedElement, PlacementResult};

struct StencilUpload {
    buffer: wgpu::Buffer,
}

/// Orchestrator for GPU-driven procedural placement.
///
/// One pipeline serves any number of worlds and layers; the stencil is
/// rebuilt only when the seed changes and the scratch buffer is grown
/// geometrically and reused across dispatches.
pub struct PlacementPipeline {
    ctx: GpuContext,
    generation: GenerationKernel,
    evaluation: EvaluationKernel,
    indexation: IndexationKernel,
    copy: CopyKernel,
    sampler: wgpu::Sampler,
    scratch: ScratchBuffer,
    stencil: Option<StencilUpload>,
    stencil_seed: u32,
}

impl PlacementPipeline {
    pub fn new(ctx: GpuContext) -> Self {
        let device = ctx.device();
        let generation = GenerationKernel::new(device);
        let evaluation = EvaluationKernel::new(device);
        let indexation = IndexationKernel::new(device);
        let copy = CopyKernel::new(device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("map_placement-bilinear"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            ctx,
            generation,
            evaluation,
            indexation,
            copy,
            sampler,
            scratch: ScratchBuffer::new(),
            stencil: None,
            stencil_seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.set_seed(seed);
        self
    }

    /// Change the stencil seed; the stencil is rebuilt on the next dispatch.
    pub fn set_seed(&mut self, seed: u32) {
        if seed != self.stencil_seed {
            self.stencil_seed = seed;
            self.stencil = None;
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Issue all dispatches for one placement region and return immediately.
    ///
    /// An empty or inverted region is not an error: the returned future
    /// reads back as an empty result carrying the layer's class count. The
    /// caller's texture views are only borrowed for encoding; the resources
    /// behind them stay alive through the submission.
    pub fn compute_placement(
        &mut self,
        world: &WorldData<'_>,
        layer: &LayerData<'_>,
        lower: Vec2,
        upper: Vec2,
    ) -> Result<FutureResult> {
        world.validate()?;
        layer.validate()?;
        if !lower.is_finite() || !upper.is_finite() {
            return Err(Error::InvalidConfig(
                "placement region must be finite".into(),
            ));
        }

        let num_classes = layer.num_classes();
        if upper.x <= lower.x || upper.y <= lower.y {
            debug!("Placement region is empty; returning an empty result.");
            return Ok(FutureResult::empty(self.ctx.clone(), num_classes));
        }

        // One slot per stencil entry, two generator cells wide: candidates
        // jittered within the upper half of their slot keep the footprint
        // separation on and across tile boundaries.
        let cell_size = 2.0 * layer.footprint;
        let base_cell = (lower / cell_size).floor().as_ivec2();
        let span = upper / cell_size - base_cell.as_vec2();
        let cells = span.ceil().as_uvec2().max(UVec2::ONE);

        let (wx, wy) = WORK_GROUP_DIMS;
        let work_groups = UVec2::new(cells.x.div_ceil(wx), cells.y.div_ceil(wy));
        let grid = work_groups * UVec2::new(wx, wy);
        let candidate_count = grid.x as u64 * grid.y as u64;

        let limit = self
            .ctx
            .device()
            .limits()
            .max_compute_workgroups_per_dimension;
        let linear = linear_work_groups(candidate_count);
        if work_groups.x > limit || work_groups.y > limit || linear > limit {
            return Err(Error::InvalidConfig(format!(
                "region needs {}x{} work groups (device limit {limit}); \
                 tile the region into smaller dispatches",
                work_groups.x, work_groups.y
            )));
        }

        self.ensure_stencil()?;

        let layout = ScratchLayout::compute(candidate_count, num_classes as u64);
        layout.validate(self.ctx.storage_alignment())?;
        let device = self.ctx.device();
        let stencil = self.stencil.as_ref().expect("stencil ensured above");
        let scratch = self.scratch.ensure(device, layout.total_size);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("map_placement-dispatch"),
        });
        encoder.clear_buffer(
            &scratch,
            layout.class_counters.offset,
            Some(layout.class_counters.size),
        );

        self.generation.encode(
            device,
            &mut encoder,
            GenerationParams {
                world_scale: world.scale.to_array(),
                cell_size,
                base_cell: base_cell.to_array(),
                grid_size: grid.to_array(),
            },
            &stencil.buffer,
            &scratch,
            &layout,
            world.heightmap,
            &self.sampler,
            (work_groups.x, work_groups.y),
        );

        for (class_index, map) in layer.densitymaps.iter().enumerate() {
            self.evaluation.encode(
                device,
                &mut encoder,
                EvaluationParams {
                    lower: lower.to_array(),
                    upper: upper.to_array(),
                    base_cell: base_cell.to_array(),
                    grid_size: grid.to_array(),
                    class_index: class_index as u32,
                    weight: map.weight,
                    _pad: [0; 2],
                },
                &scratch,
                &layout,
                map.texture,
                &self.sampler,
                (work_groups.x, work_groups.y),
            );
        }

        let compact = CompactParams {
            candidate_count: candidate_count as u32,
            class_count: num_classes,
            _pad: [0; 2],
        };
        self.indexation
            .encode(device, &mut encoder, compact, &scratch, &layout, linear);
        self.copy
            .encode(device, &mut encoder, compact, &scratch, &layout, linear);

        let counters_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("map_placement-counters-staging"),
            size: layout.class_counters.size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        encoder.copy_buffer_to_buffer(
            &scratch,
            layout.class_counters.offset,
            &counters_staging,
            0,
            layout.class_counters.size,
        );

        self.ctx.queue().submit(std::iter::once(encoder.finish()));
        debug!(
            "Dispatched placement: {candidate_count} candidates, {num_classes} classes."
        );

        Ok(FutureResult::pending(
            self.ctx.clone(),
            num_classes,
            scratch,
            layout.output,
            counters_staging,
        ))
    }

    fn ensure_stencil(&mut self) -> Result<()> {
        if self.stencil.is_some() {
            return Ok(());
        }

        let stencil = Stencil::generate([WORK_GROUP_DIMS.0, WORK_GROUP_DIMS.1], self.stencil_seed)?;
        info!(
            "Generated placement stencil: {}x{} slots, seed {}.",
            stencil.dims().x,
            stencil.dims().y,
            self.stencil_seed
        );

        let buffer = self
            .ctx
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("map_placement-stencil"),
                contents: stencil.as_bytes(),
                usage: wgpu::BufferUsages::STORAGE,
            });

        self.stencil = Some(StencilUpload { buffer });
        Ok(())
    }
}
