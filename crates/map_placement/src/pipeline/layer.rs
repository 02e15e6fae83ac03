//! World and layer configuration consumed by the placement pipeline.
use glam::Vec3;

use crate::error::{Error, Result};

/// The world a placement run projects into.
///
/// The horizontal extent is `(scale.x, scale.z)`: a texture coordinate
/// `(u, v)` corresponds to the world position `(u · scale.x, v · scale.z)`,
/// and heightmap samples are multiplied by `scale.y`.
pub struct WorldData<'a> {
    pub scale: Vec3,
    pub heightmap: &'a wgpu::TextureView,
}

impl<'a> WorldData<'a> {
    pub fn new(scale: Vec3, heightmap: &'a wgpu::TextureView) -> Self {
        Self { scale, heightmap }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() {
            return Err(Error::InvalidConfig("world scale must be finite".into()));
        }
        if self.scale.x <= 0.0 || self.scale.z <= 0.0 {
            return Err(Error::InvalidConfig(
                "world scale must be > 0 on the horizontal axes".into(),
            ));
        }
        Ok(())
    }
}

/// One class's density map: sampled values scale the probability that a
/// candidate is claimed for the class.
pub struct DensityMap<'a> {
    pub texture: &'a wgpu::TextureView,
    pub weight: f32,
}

impl<'a> DensityMap<'a> {
    pub fn new(texture: &'a wgpu::TextureView, weight: f32) -> Self {
        Self { texture, weight }
    }
}

/// A placement layer: the shared footprint plus one density map per class.
///
/// Classes contend for each candidate in density-map order; the number of
/// density maps is the number of classes.
#[non_exhaustive]
pub struct LayerData<'a> {
    pub footprint: f32,
    pub densitymaps: Vec<DensityMap<'a>>,
}

impl<'a> LayerData<'a> {
    pub fn new(footprint: f32) -> Self {
        Self {
            footprint,
            densitymaps: Vec::new(),
        }
    }

    /// Append a class with the given density texture and weight.
    pub fn with_densitymap(mut self, texture: &'a wgpu::TextureView, weight: f32) -> Self {
        self.densitymaps.push(DensityMap::new(texture, weight));
        self
    }

    pub fn with_densitymaps(mut self, densitymaps: Vec<DensityMap<'a>>) -> Self {
        self.densitymaps.extend(densitymaps);
        self
    }

    pub fn num_classes(&self) -> u32 {
        self.densitymaps.len() as u32
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.footprint.is_finite() || self.footprint <= 0.0 {
            return Err(Error::InvalidConfig(
                "footprint must be finite and > 0".into(),
            ));
        }
        if self.densitymaps.is_empty() {
            return Err(Error::InvalidConfig(
                "layer needs at least one density map".into(),
            ));
        }
        for (index, map) in self.densitymaps.iter().enumerate() {
            if !map.weight.is_finite() || !(0.0..=1.0).contains(&map.weight) {
                return Err(Error::InvalidConfig(format!(
                    "density map {index} weight must be within [0, 1]"
                )));
            }
        }
        Ok(())
    }
}
