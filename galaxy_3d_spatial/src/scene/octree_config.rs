/// Octree configuration (world volume and subdivision depth).

use glam::Vec3;
use crate::error::Result;
use crate::engine_bail;
use super::aabb::AABB;

/// Deepest subdivision accepted. Cells at this depth are 1/65536 of the world.
pub const MAX_SUPPORTED_DEPTH: u32 = 16;

/// World volume and depth of a `SpatialIndex`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// Center of the root cell
    pub world_center: Vec3,
    /// Edge length of the root cell
    pub world_size: f32,
    /// Number of subdivision levels below the root (0 = root only)
    pub max_depth: u32,
}

impl OctreeConfig {
    /// Cube of edge `world_size` centered on the origin.
    pub fn new(world_size: f32, max_depth: u32) -> Self {
        Self {
            world_center: Vec3::ZERO,
            world_size,
            max_depth,
        }
    }

    /// Same world, different center.
    pub fn with_center(mut self, world_center: Vec3) -> Self {
        self.world_center = world_center;
        self
    }

    /// Box covered by the root cell.
    pub fn world_bounds(&self) -> AABB {
        AABB::cube(self.world_center, self.world_size)
    }

    /// Edge length of the smallest (deepest) cells.
    pub fn leaf_size(&self) -> f32 {
        self.world_size / (1u32 << self.max_depth.min(MAX_SUPPORTED_DEPTH)) as f32
    }

    /// Check that the configuration describes a usable octree.
    pub fn validate(&self) -> Result<()> {
        if !self.world_center.is_finite() {
            engine_bail!("galaxy3d::OctreeConfig", InvalidConfig,
                "World center must be finite, got {:?}", self.world_center);
        }
        if !(self.world_size.is_finite() && self.world_size > 0.0) {
            engine_bail!("galaxy3d::OctreeConfig", InvalidConfig,
                "World size must be finite and positive, got {}", self.world_size);
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            engine_bail!("galaxy3d::OctreeConfig", InvalidConfig,
                "Max depth {} exceeds the supported maximum {}", self.max_depth, MAX_SUPPORTED_DEPTH);
        }
        Ok(())
    }
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self::new(1024.0, 6)
    }
}
