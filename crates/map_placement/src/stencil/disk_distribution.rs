//! Incremental Poisson-disk distribution over a toroidal domain.
use glam::Vec2;
use mint::Vector2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{Error, Result};

const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Grid-accelerated Bridson sampler producing points whose pairwise distance,
/// measured on the torus spanned by [`bounds`](Self::bounds), never falls
/// below the footprint.
///
/// Unlike a one-shot sampler this one is incremental: every call to
/// [`generate`](Self::generate) yields exactly one new point, until the
/// domain saturates.
#[derive(Debug, Clone)]
pub struct DiskDistribution {
    footprint: f32,
    cell_size: f32,
    grid_dims: (usize, usize),
    bounds: Vec2,
    grid: Vec<Option<u32>>,
    positions: Vec<Vec2>,
    active: Vec<usize>,
    rng: StdRng,
    max_attempts: u32,
}

impl DiskDistribution {
    /// Create a distribution over `grid_dims` cells of side `footprint / √2`.
    ///
    /// The cell side guarantees at most one point per cell, so the collision
    /// test only has to inspect the wrapped 5×5 neighborhood of a candidate.
    pub fn new(footprint: f32, grid_dims: impl Into<Vector2<u32>>) -> Result<Self> {
        let grid_dims = grid_dims.into();
        if !footprint.is_finite() || footprint <= 0.0 {
            return Err(Error::InvalidConfig(
                "footprint must be finite and > 0".into(),
            ));
        }
        if grid_dims.x == 0 || grid_dims.y == 0 {
            return Err(Error::InvalidConfig(
                "grid_dims must be > 0 on both axes".into(),
            ));
        }

        let cell_size = footprint / std::f32::consts::SQRT_2;
        let (gx, gy) = (grid_dims.x as usize, grid_dims.y as usize);

        Ok(Self {
            footprint,
            cell_size,
            grid_dims: (gx, gy),
            bounds: Vec2::new(gx as f32, gy as f32) * cell_size,
            grid: vec![None; gx * gy],
            positions: Vec::new(),
            active: Vec::new(),
            rng: StdRng::seed_from_u64(0),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Deterministically reseed the sampling stream.
    pub fn set_seed(&mut self, seed: u32) {
        self.rng = StdRng::seed_from_u64(seed as u64);
    }

    /// Number of annulus samples tried per active point before it retires.
    /// Governs how eagerly saturation is detected.
    pub fn set_max_attempts(&mut self, max_attempts: u32) {
        self.max_attempts = max_attempts;
    }

    /// All accepted points in insertion order.
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// The rectangular domain; also the period of the torus.
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Produce the next point, or fail with [`Error::Saturated`] once no
    /// active point admits a new neighbor.
    pub fn generate(&mut self) -> Result<Vec2> {
        if self.positions.is_empty() {
            let seed_point = Vec2::new(
                rand01(&mut self.rng) * self.bounds.x,
                rand01(&mut self.rng) * self.bounds.y,
            );
            self.insert(seed_point);
            return Ok(seed_point);
        }

        while !self.active.is_empty() {
            let slot = (self.rng.next_u32() as usize) % self.active.len();
            let anchor = self.positions[self.active[slot]];

            for _ in 0..self.max_attempts {
                let candidate = self.sample_annulus(anchor);
                if self.is_valid(candidate) {
                    self.insert(candidate);
                    return Ok(candidate);
                }
            }

            self.active.swap_remove(slot);
        }

        Err(Error::Saturated {
            placed: self.positions.len(),
        })
    }

    /// Sample a point in the annulus `[footprint, 2·footprint)` around
    /// `anchor`, wrapped into the domain.
    fn sample_annulus(&mut self, anchor: Vec2) -> Vec2 {
        let angle = rand01(&mut self.rng) * std::f32::consts::TAU;
        let distance = self.footprint * (1.0 + rand01(&mut self.rng));
        let p = anchor + Vec2::new(angle.cos(), angle.sin()) * distance;
        self.wrap(p)
    }

    fn wrap(&self, p: Vec2) -> Vec2 {
        let mut w = Vec2::new(p.x.rem_euclid(self.bounds.x), p.y.rem_euclid(self.bounds.y));
        // rem_euclid can round up to the modulus for tiny negative inputs.
        if w.x >= self.bounds.x {
            w.x = 0.0;
        }
        if w.y >= self.bounds.y {
            w.y = 0.0;
        }
        w
    }

    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let x = ((p.x / self.cell_size) as usize).min(self.grid_dims.0 - 1);
        let y = ((p.y / self.cell_size) as usize).min(self.grid_dims.1 - 1);
        (x, y)
    }

    fn toroidal_dist2(&self, a: Vec2, b: Vec2) -> f32 {
        let mut d = (a - b).abs();
        d.x = d.x.min(self.bounds.x - d.x);
        d.y = d.y.min(self.bounds.y - d.y);
        d.length_squared()
    }

    fn is_valid(&self, p: Vec2) -> bool {
        let (gx, gy) = self.grid_dims;
        let (cx, cy) = self.cell_of(p);
        let min_dist2 = self.footprint * self.footprint;

        for dy in -2i64..=2 {
            for dx in -2i64..=2 {
                let nx = (cx as i64 + dx).rem_euclid(gx as i64) as usize;
                let ny = (cy as i64 + dy).rem_euclid(gy as i64) as usize;
                if let Some(index) = self.grid[ny * gx + nx] {
                    if self.toroidal_dist2(p, self.positions[index as usize]) < min_dist2 {
                        return false;
                    }
                }
            }
        }

        true
    }

    fn insert(&mut self, p: Vec2) {
        let (cx, cy) = self.cell_of(p);
        let index = self.positions.len();
        self.grid[cy * self.grid_dims.0 + cx] = Some(index as u32);
        self.positions.push(p);
        self.active.push(index);
    }
}

/// Random float in `[0, 1)`.
#[inline]
fn rand01(rng: &mut impl RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}
