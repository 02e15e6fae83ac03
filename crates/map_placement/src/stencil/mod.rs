//! Periodic, collision-free placement stencils.
//!
//! A [`Stencil`] is the small 2D pattern the generation kernel tiles across
//! the placement region: one entry per work-group slot, each entry confined
//! to the upper half-open sub-cell of its slot. Entries are stored in slot
//! units, so the same stencil serves every footprint; the kernel applies the
//! world pitch.
use glam::{UVec2, Vec2};
use mint::Vector2;

use crate::error::{Error, Result};
use crate::stencil::disk_distribution::DiskDistribution;

pub mod disk_distribution;

/// A `W×H` array of jittered slot positions.
///
/// Entry `t` belongs to slot `(t mod W, t div W)` and lies in
/// `[slot + 1/2, slot + 1)` on both axes. With a world pitch of twice the
/// footprint per slot, the half-cell confinement alone bounds the distance
/// of any two tiled entries from below by the footprint, on and across tile
/// boundaries.
#[derive(Debug, Clone)]
pub struct Stencil {
    dims: UVec2,
    entries: Vec<Vec2>,
}

impl Stencil {
    /// Build the stencil for `dims` slots from a seeded [`DiskDistribution`].
    ///
    /// The distribution runs with unit footprint over `2·dims` cells, so its
    /// domain spans exactly one work-group tile. Exactly `W·H` points are
    /// drawn; running out earlier means the distribution saturated below the
    /// required count, which is a configuration bug surfaced as
    /// [`Error::Saturated`].
    pub fn generate(dims: impl Into<Vector2<u32>>, seed: u32) -> Result<Self> {
        let dims = UVec2::from(dims.into());
        if dims.x == 0 || dims.y == 0 {
            return Err(Error::InvalidConfig(
                "stencil dims must be > 0 on both axes".into(),
            ));
        }

        let mut distribution = DiskDistribution::new(1.0, [dims.x * 2, dims.y * 2])?;
        distribution.set_seed(seed);

        let needed = (dims.x * dims.y) as usize;
        let bounds = distribution.bounds();
        let mut entries = Vec::with_capacity(needed);

        for t in 0..needed as u32 {
            let point = distribution.generate()?;
            let slot = Vec2::new((t % dims.x) as f32, (t / dims.x) as f32);
            // Division may round up to 1.0 for points flush with the domain
            // edge; keep the entry strictly inside its half-cell.
            let normalized = (point / bounds).min(Vec2::splat(1.0 - f32::EPSILON));
            entries.push(slot + 0.5 + 0.5 * normalized);
        }

        Ok(Self { dims, entries })
    }

    pub fn dims(&self) -> UVec2 {
        self.dims
    }

    /// Entries in slot order, row-major.
    pub fn entries(&self) -> &[Vec2] {
        &self.entries
    }

    /// Raw bytes for the GPU upload, `vec2<f32>` per entry.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }
}
