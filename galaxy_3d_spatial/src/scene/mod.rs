//! Scene spatial indexing module
//!
//! Provides the dynamic octree (cells, placement, cleanup), the entry
//! contract the scene layer implements, light propagation and the
//! frustum visibility query.

mod aabb;
mod entry;
mod octree_cell;
mod octree_config;
mod light_propagation;
mod visibility;
mod spatial_index;

pub use aabb::{AABB, BoundingSphere};
pub use entry::{
    EntryKey, EntryMap, EntryLinks, LightMethod, LightParams,
    OctreeEntry, SceneEntity,
};
pub use octree_cell::{CellKey, OctreeCell, OctantMask};
pub use octree_config::{OctreeConfig, MAX_SUPPORTED_DEPTH};
pub use spatial_index::{SpatialIndex, OctreeStats};
pub use visibility::FrustumHits;
