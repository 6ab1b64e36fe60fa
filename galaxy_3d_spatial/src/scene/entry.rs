/// Entries — what the octree indexes.
///
/// The scene layer owns its objects and lights in a `SlotMap` keyed by
/// `EntryKey`. The index only stores keys and talks to entries through the
/// `OctreeEntry` capability trait: a bounding box, optional light
/// parameters, and an embedded `EntryLinks` record the index keeps up to
/// date (cells holding the entry, common root, light lists, culling state).

use glam::{Mat4, Vec3};
use slotmap::{new_key_type, SlotMap};
use super::aabb::{AABB, BoundingSphere};
use super::octree_cell::CellKey;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for an object or light owned by the scene layer.
    pub struct EntryKey;
}

/// Storage the scene layer keeps its entries in.
pub type EntryMap<E> = SlotMap<EntryKey, E>;

// ===== LIGHTS =====

/// How a light is propagated through the octree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightMethod {
    /// Bypasses the tree, applies to everything
    Global,
    /// Cached in the subtree of its common root, order independent
    Static,
    /// Stored like an object, matched against objects on every query
    Dynamic,
}

/// Light parameters reported by light entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Propagation class
    pub method: LightMethod,
    /// World-space position
    pub position: Vec3,
    /// Effective radius
    pub distance: f32,
}

impl LightParams {
    /// Global light (position and distance are informative only).
    pub fn global(position: Vec3) -> Self {
        Self { method: LightMethod::Global, position, distance: 0.0 }
    }

    /// Static light with the given influence radius.
    pub fn fixed(position: Vec3, distance: f32) -> Self {
        Self { method: LightMethod::Static, position, distance }
    }

    /// Dynamic light with the given influence radius.
    pub fn dynamic(position: Vec3, distance: f32) -> Self {
        Self { method: LightMethod::Dynamic, position, distance }
    }

    /// Box enclosing the influence sphere (`position ± distance`).
    pub fn aabb(&self) -> AABB {
        AABB::from_center_half_extents(self.position, Vec3::splat(self.distance))
    }

    /// Sphere of influence.
    pub fn influence(&self) -> BoundingSphere {
        BoundingSphere::new(self.position, self.distance)
    }

    /// Whether the influence sphere touches a box.
    pub fn reaches(&self, aabb: &AABB) -> bool {
        aabb.intersects_sphere(self.position, self.distance)
    }
}

// ===== LINKS =====

/// Per-entry bookkeeping maintained by the spatial index.
///
/// `visible` is owned by the caller (hidden entries are never reported).
/// Everything else is written by the index.
#[derive(Debug, Clone)]
pub struct EntryLinks {
    /// Caller-controlled visibility switch
    pub visible: bool,
    /// Cleared by the last query that reported this entry
    pub culled: bool,
    /// Dynamic lights touching this object, rebuilt by every query
    pub dynamic_lights: Vec<EntryKey>,
    /// Static lights whose subtree holds this object
    pub static_lights: Vec<EntryKey>,
    pub(crate) octree_leaves: Vec<CellKey>,
    pub(crate) common_root: Option<CellKey>,
    pub(crate) cached_aabb: Option<AABB>,
}

impl EntryLinks {
    /// Every cell currently holding the entry.
    pub fn octree_leaves(&self) -> &[CellKey] {
        &self.octree_leaves
    }

    /// Shallowest cell that sees the whole entry.
    pub fn common_root(&self) -> Option<CellKey> {
        self.common_root
    }

    /// Bounds the entry had when it was last inserted.
    pub fn cached_aabb(&self) -> Option<&AABB> {
        self.cached_aabb.as_ref()
    }

    /// Forget everything the index wrote (keeps `visible`).
    pub(crate) fn detach(&mut self) {
        self.culled = true;
        self.dynamic_lights.clear();
        self.static_lights.clear();
        self.octree_leaves.clear();
        self.common_root = None;
        self.cached_aabb = None;
    }
}

impl Default for EntryLinks {
    fn default() -> Self {
        Self {
            visible: true,
            culled: true,
            dynamic_lights: Vec::new(),
            static_lights: Vec::new(),
            octree_leaves: Vec::new(),
            common_root: None,
            cached_aabb: None,
        }
    }
}

// ===== CAPABILITY TRAIT =====

/// Capability contract for anything insertable into the octree.
pub trait OctreeEntry {
    /// World-space bounding box.
    fn aabb(&self) -> AABB;

    /// Light parameters, `None` for plain objects.
    fn light(&self) -> Option<LightParams> {
        None
    }

    /// Index bookkeeping (read).
    fn links(&self) -> &EntryLinks;

    /// Index bookkeeping (write).
    fn links_mut(&mut self) -> &mut EntryLinks;

    /// Whether this entry is a light.
    fn is_light(&self) -> bool {
        self.light().is_some()
    }
}

// ===== SCENE ENTITY =====

/// Ready-made entry: an object with local bounds and a world matrix, or a light.
#[derive(Debug, Clone)]
pub struct SceneEntity {
    local_bounds: AABB,
    world_matrix: Mat4,
    light: Option<LightParams>,
    links: EntryLinks,
}

impl SceneEntity {
    /// Object whose bounds are already in world space.
    pub fn object(bounds: AABB) -> Self {
        Self::object_with_transform(bounds, Mat4::IDENTITY)
    }

    /// Object with local-space bounds placed by a world matrix.
    pub fn object_with_transform(local_bounds: AABB, world_matrix: Mat4) -> Self {
        Self {
            local_bounds,
            world_matrix,
            light: None,
            links: EntryLinks::default(),
        }
    }

    /// Light entry.
    pub fn light(params: LightParams) -> Self {
        Self {
            local_bounds: params.aabb(),
            world_matrix: Mat4::IDENTITY,
            light: Some(params),
            links: EntryLinks::default(),
        }
    }

    /// Local-space bounds.
    pub fn local_bounds(&self) -> &AABB {
        &self.local_bounds
    }

    /// World matrix (identity for lights).
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Move an object. Call `SpatialIndex::update` afterwards.
    pub fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world_matrix = matrix;
    }

    /// Move a light. No-op for objects.
    pub fn set_light_position(&mut self, position: Vec3) {
        if let Some(light) = &mut self.light {
            light.position = position;
        }
    }
}

impl OctreeEntry for SceneEntity {
    fn aabb(&self) -> AABB {
        match &self.light {
            Some(light) => light.aabb(),
            None => self.local_bounds.transformed(&self.world_matrix),
        }
    }

    fn light(&self) -> Option<LightParams> {
        self.light
    }

    fn links(&self) -> &EntryLinks {
        &self.links
    }

    fn links_mut(&mut self) -> &mut EntryLinks {
        &mut self.links
    }
}
