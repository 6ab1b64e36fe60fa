/// SpatialIndex — dynamic octree over scene objects and lights.
///
/// Owns the cell arena and the root cell. Entries stay owned by the scene
/// layer (`EntryMap`) and are referenced by key; every operation that reads
/// or writes entry bookkeeping takes the map as a parameter.
///
/// Per frame, the renderer calls `reset_node_visibility`, `cleanup` and
/// `get_frustum_hits` in that order (or `frame_cull`, which does all three).
/// Scene binding calls `insert` / `insert_light` / `remove` / `update`
/// outside the render step. All of it is synchronous: `&mut` access on the
/// entry map enforces a single owner during both mutation and query.

use crate::camera::Camera;
use crate::error::Result;
use crate::{engine_bail, engine_debug, engine_info, engine_trace};
use super::aabb::AABB;
use super::entry::{EntryKey, EntryMap, LightMethod, OctreeEntry};
use super::octree_cell::{CellKey, CellTree, OctreeCell, Placement};
use super::octree_config::OctreeConfig;
use super::visibility::{FrustumHits, FrustumQuery};

const SOURCE: &str = "galaxy3d::SpatialIndex";

/// Snapshot of the tree shape, for debug overlays and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    /// Live cells, root included
    pub cell_count: usize,
    /// Object slots across all cells (an object split over N cells counts N)
    pub stored_entries: usize,
    /// Static light slots across all cells
    pub static_lights: usize,
    /// Dynamic light slots across all cells
    pub dynamic_lights: usize,
    /// Lights kept outside the tree
    pub global_lights: usize,
    /// Depth of the deepest live cell (root = 0)
    pub deepest_level: u32,
}

/// Dynamic octree spatial index.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: CellTree,
    root: CellKey,
    config: OctreeConfig,
    global_lights: Vec<EntryKey>,
}

impl SpatialIndex {
    /// Create an index over a cube of edge `world_size` centered on the origin.
    ///
    /// # Arguments
    ///
    /// * `world_size` - Edge length of the root cell
    /// * `max_depth` - Subdivision levels below the root (0 = root only)
    pub fn new(world_size: f32, max_depth: u32) -> Result<Self> {
        Self::with_config(OctreeConfig::new(world_size, max_depth))
    }

    /// Create an index from a full configuration.
    pub fn with_config(config: OctreeConfig) -> Result<Self> {
        config.validate()?;

        let mut tree = CellTree::default();
        let root = tree.create_root(config.world_center, config.world_size, config.max_depth);

        engine_info!(SOURCE, "Created octree: world size {}, max depth {}, center {:?}",
            config.world_size, config.max_depth, config.world_center);

        Ok(Self {
            tree,
            root,
            config,
            global_lights: Vec::new(),
        })
    }

    // ===== ACCESSORS =====

    /// Configuration the index was built with.
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Key of the root cell.
    pub fn root(&self) -> CellKey {
        self.root
    }

    /// Look up a cell.
    pub fn cell(&self, key: CellKey) -> Option<&OctreeCell> {
        self.tree.cells.get(key)
    }

    /// Number of live cells (root included).
    pub fn cell_count(&self) -> usize {
        self.tree.cells.len()
    }

    /// Depth of a cell below the root.
    pub fn cell_depth(&self, key: CellKey) -> u32 {
        self.tree.depth_of(key)
    }

    /// Lights kept outside the tree.
    pub fn global_lights(&self) -> &[EntryKey] {
        &self.global_lights
    }

    /// Whether the entry is currently indexed (in the tree or the global list).
    pub fn contains<E: OctreeEntry>(&self, entries: &EntryMap<E>, key: EntryKey) -> bool {
        let in_tree = entries
            .get(key)
            .is_some_and(|entry| !entry.links().octree_leaves().is_empty());
        in_tree || self.global_lights.contains(&key)
    }

    /// Counters describing the current tree shape.
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            global_lights: self.global_lights.len(),
            ..OctreeStats::default()
        };
        for (key, cell) in &self.tree.cells {
            stats.cell_count += 1;
            stats.stored_entries += cell.entries().len();
            stats.static_lights += cell.static_lights().len();
            stats.dynamic_lights += cell.dynamic_lights().len();
            stats.deepest_level = stats.deepest_level.max(self.tree.depth_of(key));
        }
        stats
    }

    // ===== INSERTION =====

    /// Insert an entry. Lights are forwarded to `insert_light`.
    ///
    /// Re-inserting an indexed entry removes it first. Entries whose box is
    /// not contained in the world volume are stored at the root.
    ///
    /// # Errors
    ///
    /// - `InvalidEntry` if `key` is not in `entries`
    /// - `InvalidBounds` if the box is inverted or not finite
    pub fn insert<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, key: EntryKey) -> Result<()> {
        let Some(entry) = entries.get(key) else {
            engine_bail!(SOURCE, InvalidEntry, "Cannot insert unknown entry {:?}", key);
        };
        if entry.is_light() {
            return self.insert_light(entries, key);
        }

        let aabb = Self::checked_aabb(entry, key)?;
        self.detach_if_indexed(entries, key);

        let placement = self.place(entries, &aabb);
        for &cell in &placement.terminals {
            self.tree.cells[cell].entries.push(key);
        }

        if let Some(entry) = entries.get_mut(key) {
            let links = entry.links_mut();
            links.octree_leaves = placement.terminals;
            links.common_root = placement.common_root;
            links.static_lights = placement.static_lights;
            links.dynamic_lights.clear();
            links.cached_aabb = Some(aabb);
        }

        engine_trace!(SOURCE, "Inserted object {:?} into {} cell(s)",
            key, entries.get(key).map_or(0, |e| e.links().octree_leaves().len()));
        Ok(())
    }

    /// Insert a light according to its propagation method.
    ///
    /// # Errors
    ///
    /// - `InvalidEntry` if `key` is unknown or not a light
    /// - `InvalidBounds` if the light's distance or box is not usable
    pub fn insert_light<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, key: EntryKey) -> Result<()> {
        let Some(entry) = entries.get(key) else {
            engine_bail!(SOURCE, InvalidEntry, "Cannot insert unknown light {:?}", key);
        };
        let Some(light) = entry.light() else {
            engine_bail!(SOURCE, InvalidEntry, "Entry {:?} is not a light", key);
        };
        if !(light.distance.is_finite() && light.distance >= 0.0) {
            engine_bail!(SOURCE, InvalidBounds,
                "Light {:?} has unusable distance {}", key, light.distance);
        }
        let aabb = Self::checked_aabb(entry, key)?;
        self.detach_if_indexed(entries, key);

        match light.method {
            LightMethod::Global => {
                self.global_lights.push(key);
                if let Some(entry) = entries.get_mut(key) {
                    entry.links_mut().cached_aabb = Some(aabb);
                }
                engine_trace!(SOURCE, "Registered global light {:?}", key);
            }
            LightMethod::Dynamic => {
                let placement = self.place(entries, &aabb);
                for &cell in &placement.terminals {
                    self.tree.cells[cell].dynamic_lights.push(key);
                }
                if let Some(entry) = entries.get_mut(key) {
                    let links = entry.links_mut();
                    links.octree_leaves = placement.terminals;
                    links.common_root = placement.common_root;
                    links.cached_aabb = Some(aabb);
                }
                engine_trace!(SOURCE, "Inserted dynamic light {:?}", key);
            }
            LightMethod::Static => {
                let placement = self.place(entries, &aabb);
                let common_root = placement.common_root.unwrap_or(self.root);
                let cached = self.tree.propagate_static_light(entries, key, common_root);
                if let Some(entry) = entries.get_mut(key) {
                    entry.links_mut().cached_aabb = Some(aabb);
                }
                engine_trace!(SOURCE, "Inserted static light {:?}, cached in {} cell(s)", key, cached);
            }
        }

        Ok(())
    }

    /// Validated world box of an entry.
    fn checked_aabb<E: OctreeEntry>(entry: &E, key: EntryKey) -> Result<AABB> {
        let aabb = entry.aabb();
        if !aabb.is_finite() {
            engine_bail!(SOURCE, InvalidBounds,
                "Entry {:?} has a non-finite AABB {:?}", key, aabb);
        }
        if !aabb.is_valid() {
            engine_bail!(SOURCE, InvalidBounds,
                "Entry {:?} has an inverted AABB (min {:?} > max {:?})", key, aabb.min, aabb.max);
        }
        Ok(aabb)
    }

    /// Descend from the root, or stop at the root when the box leaves the world.
    fn place<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, aabb: &AABB) -> Placement {
        let mut placement = Placement::default();
        if self.config.world_bounds().contains(aabb) {
            self.tree.place(entries, self.root, aabb, &mut placement);
        } else {
            engine_debug!(SOURCE, "AABB {:?} leaves the world volume, stored at root", aabb);
            placement.static_lights = self.tree.cells[self.root].static_lights.clone();
            self.tree.stop_at(self.root, &mut placement);
        }
        placement
    }

    fn detach_if_indexed<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, key: EntryKey) {
        if self.contains(entries, key) {
            self.remove(entries, key);
        }
    }

    // ===== REMOVAL / UPDATE =====

    /// Remove an entry from every cell holding it.
    ///
    /// No-op for unknown or non-indexed entries. Removing a static or dynamic
    /// light also withdraws it from every object that may list it. Emptied
    /// cells are pruned by the next `cleanup()`.
    pub fn remove<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, key: EntryKey) {
        let Some(entry) = entries.get_mut(key) else {
            engine_trace!(SOURCE, "Remove of unknown entry {:?} ignored", key);
            return;
        };

        let method = entry.light().map(|light| light.method);
        let leaves = std::mem::take(&mut entry.links_mut().octree_leaves);

        if let Some(pos) = self.global_lights.iter().position(|&k| k == key) {
            self.global_lights.swap_remove(pos);
        }

        match method {
            Some(LightMethod::Static) => self.tree.withdraw_static_light(entries, key, &leaves),
            Some(LightMethod::Dynamic) => self.tree.withdraw_dynamic_light(entries, key, &leaves),
            _ => {
                for &cell in &leaves {
                    self.tree.remove_from_cell(cell, key);
                }
            }
        }

        if let Some(entry) = entries.get_mut(key) {
            entry.links_mut().detach();
        }

        engine_trace!(SOURCE, "Removed {:?} from {} cell(s)", key, leaves.len());
    }

    /// Reinsert an entry whose box moved outside the bounds cached at insertion.
    ///
    /// Inserts entries that are not indexed yet. Returns `true` when the
    /// entry was (re)inserted, `false` when its cached placement still holds.
    pub fn update<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, key: EntryKey) -> Result<bool> {
        let Some(entry) = entries.get(key) else {
            engine_bail!(SOURCE, InvalidEntry, "Cannot update unknown entry {:?}", key);
        };

        if self.contains(entries, key) {
            let current = Self::checked_aabb(entry, key)?;
            if entry.links().cached_aabb().is_some_and(|cached| cached.contains(&current)) {
                return Ok(false);
            }
        }

        self.insert(entries, key)?;
        Ok(true)
    }

    /// Remove every entry and collapse the tree to its root.
    pub fn clear<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>) {
        for cell in self.tree.cells.values() {
            for &key in cell.entries.iter().chain(&cell.dynamic_lights).chain(&cell.static_lights) {
                if let Some(entry) = entries.get_mut(key) {
                    entry.links_mut().detach();
                }
            }
        }
        for &key in &self.global_lights {
            if let Some(entry) = entries.get_mut(key) {
                entry.links_mut().detach();
            }
        }

        self.global_lights.clear();
        self.tree.cells.clear();
        self.root = self.tree.create_root(
            self.config.world_center,
            self.config.world_size,
            self.config.max_depth,
        );

        engine_info!(SOURCE, "Octree cleared");
    }

    // ===== PER-FRAME =====

    /// Mark every indexed entry and light as culled, and forget the dynamic
    /// lights matched by the previous query.
    pub fn reset_node_visibility<E: OctreeEntry>(&self, entries: &mut EntryMap<E>) {
        self.tree.reset_visibility(entries, self.root);
        for &key in &self.global_lights {
            if let Some(entry) = entries.get_mut(key) {
                entry.links_mut().culled = true;
            }
        }
    }

    /// Prune cells left empty by removals. Returns the number of cells dropped.
    ///
    /// The root is never pruned.
    pub fn cleanup(&mut self) -> usize {
        let mut pruned = 0;
        self.tree.cleanup(self.root, &mut pruned);
        if pruned > 0 {
            engine_debug!(SOURCE, "Cleanup pruned {} cell(s), {} remaining",
                pruned, self.tree.cells.len());
        }
        pruned
    }

    /// Visible objects and lights for a camera.
    ///
    /// Marks reported entries `culled = false` and rebuilds each visible
    /// object's `dynamic_lights`. When the eye is inside the world volume and
    /// the frustum is finite, the root-level frustum test is skipped. Global
    /// lights are always reported.
    pub fn get_frustum_hits<E: OctreeEntry>(
        &self,
        entries: &mut EntryMap<E>,
        camera: &Camera,
    ) -> FrustumHits {
        let eye = camera.position();
        // NaN planes must still reach the root test, which rejects everything
        let eye_in_root = camera.frustum().is_finite()
            && self.tree.cells[self.root].contains_point(eye);

        let mut query = FrustumQuery::new(camera.frustum(), eye);
        self.tree.collect_frustum_hits(entries, self.root, &mut query, !eye_in_root, true);
        for &key in &self.global_lights {
            query.add_light(entries, key);
        }

        let cells_visited = query.cells_visited;
        let hits = query.finish();
        engine_debug!(SOURCE, "Frustum query: {} object(s), {} light(s), {} cell(s) visited",
            hits.object_count(), hits.light_count(), cells_visited);
        hits
    }

    /// Full per-frame sequence: reset visibility, cleanup, query.
    pub fn frame_cull<E: OctreeEntry>(&mut self, entries: &mut EntryMap<E>, camera: &Camera) -> FrustumHits {
        self.reset_node_visibility(entries);
        self.cleanup();
        self.get_frustum_hits(entries, camera)
    }
}

#[cfg(test)]
#[path = "spatial_index_tests.rs"]
mod tests;
