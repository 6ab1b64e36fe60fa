/// Visibility query — walks the octree against a camera frustum.
///
/// Per cell:
/// - Testing enabled: reject the cell if its bounding sphere misses the
///   frustum's enclosing sphere or lies outside the planes. When the eye is
///   not inside the cell, classify the cell box: `Outside` → skip,
///   `Inside` → stop testing for the whole subtree, `Partial` → keep testing.
/// - Collect the cell's visible objects, attaching the dynamic lights of
///   this cell and its ancestors that reach them.
/// - Collect the cell's visible dynamic and static lights.
/// - Recurse into children; results are deduplicated by key.

use glam::Vec3;
use rustc_hash::FxHashSet;
use crate::camera::{Frustum, FrustumTest};
use super::entry::{EntryKey, EntryMap, OctreeEntry};
use super::light_propagation::reaching_dynamic_lights;
use super::octree_cell::{push_unique, CellKey, CellTree};

/// Result of a frustum query. Ephemeral — lives for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrustumHits {
    objects: Vec<EntryKey>,
    lights: Vec<EntryKey>,
}

impl FrustumHits {
    /// Visible objects, each reported once, in traversal order.
    pub fn objects(&self) -> &[EntryKey] {
        &self.objects
    }

    /// Visible lights (dynamic, static and global), each reported once.
    pub fn lights(&self) -> &[EntryKey] {
        &self.lights
    }

    /// Number of visible objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of visible lights.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Nothing visible.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.lights.is_empty()
    }

    /// Whether `key` was reported as a visible object.
    pub fn contains_object(&self, key: EntryKey) -> bool {
        self.objects.contains(&key)
    }

    /// Whether `key` was reported as a visible light.
    pub fn contains_light(&self, key: EntryKey) -> bool {
        self.lights.contains(&key)
    }

    /// Split into (objects, lights).
    pub fn into_parts(self) -> (Vec<EntryKey>, Vec<EntryKey>) {
        (self.objects, self.lights)
    }
}

/// Traversal state shared by the recursive walk.
pub(crate) struct FrustumQuery<'a> {
    frustum: &'a Frustum,
    eye: Vec3,
    seen_objects: FxHashSet<EntryKey>,
    seen_lights: FxHashSet<EntryKey>,
    /// Dynamic lights of the cells on the current root-to-cell path
    inherited_lights: Vec<EntryKey>,
    scratch: Vec<EntryKey>,
    hits: FrustumHits,
    pub cells_visited: usize,
}

impl<'a> FrustumQuery<'a> {
    pub fn new(frustum: &'a Frustum, eye: Vec3) -> Self {
        Self {
            frustum,
            eye,
            seen_objects: FxHashSet::default(),
            seen_lights: FxHashSet::default(),
            inherited_lights: Vec::new(),
            scratch: Vec::new(),
            hits: FrustumHits::default(),
            cells_visited: 0,
        }
    }

    /// Report a light outside the tree (global lights).
    pub fn add_light<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, key: EntryKey) {
        let Some(entry) = entries.get_mut(key) else { return };
        let links = entry.links_mut();
        if links.visible && self.seen_lights.insert(key) {
            links.culled = false;
            self.hits.lights.push(key);
        }
    }

    pub fn finish(self) -> FrustumHits {
        self.hits
    }
}

impl CellTree {
    /// Collect the frustum hits of the subtree rooted at `cell_key`.
    ///
    /// `test_self` runs the frustum tests on this cell; `test_children`
    /// is what the children receive unless this cell turns out to be
    /// fully inside.
    pub(crate) fn collect_frustum_hits<E: OctreeEntry>(
        &self,
        entries: &mut EntryMap<E>,
        cell_key: CellKey,
        query: &mut FrustumQuery<'_>,
        test_self: bool,
        mut test_children: bool,
    ) {
        let Some(cell) = self.cells.get(cell_key) else { return };
        query.cells_visited += 1;

        if test_self {
            let sphere = cell.bounding_sphere();
            if !query.frustum.may_intersect_sphere(&sphere)
                || query.frustum.contains_sphere(&sphere) == FrustumTest::Outside
            {
                return;
            }

            if !cell.contains_point(query.eye) {
                match query.frustum.contains_box(&cell.bounds()) {
                    FrustumTest::Outside => return,
                    FrustumTest::Inside => test_children = false,
                    FrustumTest::Partial => {}
                }
            }
        }

        let inherited_len = query.inherited_lights.len();
        query.inherited_lights.extend_from_slice(&cell.dynamic_lights);

        for &key in &cell.entries {
            let Some(object) = entries.get(key) else { continue };
            if !object.links().visible {
                continue;
            }
            reaching_dynamic_lights(entries, &query.inherited_lights, object, &mut query.scratch);

            let Some(object) = entries.get_mut(key) else { continue };
            let links = object.links_mut();
            if query.seen_objects.insert(key) {
                links.culled = false;
                links.dynamic_lights.clear();
                query.hits.objects.push(key);
            }
            for &light in &query.scratch {
                push_unique(&mut links.dynamic_lights, light);
            }
        }

        for &key in cell.dynamic_lights.iter().chain(&cell.static_lights) {
            query.add_light(entries, key);
        }

        for child in cell.children().iter().flatten() {
            self.collect_frustum_hits(entries, *child, query, test_children, test_children);
        }

        query.inherited_lights.truncate(inherited_len);
    }
}
