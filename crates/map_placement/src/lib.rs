#![forbid(unsafe_code)]
//! map_placement: GPU-driven procedural object placement.
//!
//! Scatters discrete objects (trees, rocks, grass, ...) across a 2D world
//! region on the compute device, honoring per-class density maps, a
//! heightmap for the vertical coordinate and a global footprint: no two
//! placed objects end up closer than the footprint, even across independent
//! dispatches sharing world, footprint and stencil.
//!
//! Modules:
//! - gpu: compute-device handle and readback helpers
//! - stencil: host-side disk distribution and the tileable stencil
//! - pipeline: the four-stage compute pipeline, configuration and results
//!
//! ```no_run
//! use glam::{Vec2, Vec3};
//! use map_placement::prelude::*;
//!
//! # fn demo(heightmap: &wgpu::TextureView, grass: &wgpu::TextureView) -> map_placement::Result<()> {
//! let ctx = GpuContext::headless()?;
//! let mut pipeline = PlacementPipeline::new(ctx);
//!
//! let world = WorldData::new(Vec3::new(100.0, 10.0, 100.0), heightmap);
//! let layer = LayerData::new(0.5).with_densitymap(grass, 1.0);
//!
//! let future = pipeline.compute_placement(&world, &layer, Vec2::ZERO, Vec2::splat(100.0))?;
//! let result = future.read_result()?;
//! for element in result.elements() {
//!     let _ = (element.position, element.class_index);
//! }
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod gpu;
pub mod pipeline;
pub mod stencil;

pub use crate::error::{Error, Result};

/// Convenient re-exports for common types. Import with `use map_placement::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::gpu::GpuContext;
    pub use crate::pipeline::{
        DensityMap, FutureResult, LayerData, PlacedElement, PlacementPipeline, PlacementResult,
        WorldData,
    };
    pub use crate::stencil::disk_distribution::DiskDistribution;
    pub use crate::stencil::Stencil;
}
