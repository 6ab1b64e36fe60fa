/// OctreeCell — the recursive node of the dynamic octree.
///
/// Unlike a pre-allocated static octree, cells are created lazily when an
/// entry descends into them and pruned by `cleanup()` once they hold
/// nothing. An entry straddling a split plane is pushed into every child
/// it overlaps (multi-cell placement), so every entry records the cells
/// holding it in its `octree_leaves`.
///
/// Cells live in a `SlotMap` arena (`CellTree`). Child slots are the
/// owning links; `parent` is a plain back-reference used only to propagate
/// the `dirty` flag upward.

use bitflags::bitflags;
use glam::Vec3;
use slotmap::{new_key_type, SlotMap};
use super::aabb::{AABB, BoundingSphere};
use super::entry::{EntryKey, EntryMap, OctreeEntry};

new_key_type! {
    /// Stable key of a cell inside a `SpatialIndex`.
    pub struct CellKey;
}

// ===== OCTANTS =====

bitflags! {
    /// Set of octants an AABB overlaps, relative to a cell center.
    ///
    /// Bit `i` is octant `i`, whose index encodes the half per axis:
    /// bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OctantMask: u8 {
        const LOW_X_LOW_Y_LOW_Z    = 1 << 0;
        const HIGH_X_LOW_Y_LOW_Z   = 1 << 1;
        const LOW_X_HIGH_Y_LOW_Z   = 1 << 2;
        const HIGH_X_HIGH_Y_LOW_Z  = 1 << 3;
        const LOW_X_LOW_Y_HIGH_Z   = 1 << 4;
        const HIGH_X_LOW_Y_HIGH_Z  = 1 << 5;
        const LOW_X_HIGH_Y_HIGH_Z  = 1 << 6;
        const HIGH_X_HIGH_Y_HIGH_Z = 1 << 7;
    }
}

impl OctantMask {
    /// Octants overlapped by `aabb` around `center`.
    ///
    /// Three independent axis tests: the low half is touched when
    /// `min < center`, the high half when `max > center`. A box lying
    /// exactly on the split plane goes to the high half only.
    pub fn from_overlap(aabb: &AABB, center: Vec3) -> Self {
        let halves = |min: f32, max: f32, c: f32| {
            let low = min < c;
            let high = max > c || !low;
            [low, high]
        };
        let x = halves(aabb.min.x, aabb.max.x, center.x);
        let y = halves(aabb.min.y, aabb.max.y, center.y);
        let z = halves(aabb.min.z, aabb.max.z, center.z);

        let mut bits = 0u8;
        for octant in 0..8u8 {
            let hx = (octant & 1) as usize;
            let hy = ((octant >> 1) & 1) as usize;
            let hz = ((octant >> 2) & 1) as usize;
            if x[hx] && y[hy] && z[hz] {
                bits |= 1 << octant;
            }
        }
        Self::from_bits_truncate(bits)
    }

    /// Octant indices contained in the mask, ascending.
    pub fn octants(self) -> impl Iterator<Item = u8> {
        (0..8u8).filter(move |octant| self.bits() & (1 << octant) != 0)
    }
}

// ===== CELL =====

/// A single node of the octree.
#[derive(Debug, Clone)]
pub struct OctreeCell {
    center: Vec3,
    size: f32,
    remaining_depth: u32,
    children: [Option<CellKey>; 8],
    parent: Option<CellKey>,
    pub(crate) entries: Vec<EntryKey>,
    pub(crate) dynamic_lights: Vec<EntryKey>,
    pub(crate) static_lights: Vec<EntryKey>,
    dirty: bool,
}

impl OctreeCell {
    fn new(center: Vec3, size: f32, remaining_depth: u32, parent: Option<CellKey>) -> Self {
        Self {
            center,
            size,
            remaining_depth,
            children: [None; 8],
            parent,
            entries: Vec::new(),
            dynamic_lights: Vec::new(),
            static_lights: Vec::new(),
            dirty: true,
        }
    }

    /// Cell center.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Edge length.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Subdivision levels still available below this cell.
    pub fn remaining_depth(&self) -> u32 {
        self.remaining_depth
    }

    /// Child slots indexed by octant (see `OctantMask`).
    pub fn children(&self) -> &[Option<CellKey>; 8] {
        &self.children
    }

    /// Parent cell, `None` for the root.
    pub fn parent(&self) -> Option<CellKey> {
        self.parent
    }

    /// Objects stored directly in this cell.
    pub fn entries(&self) -> &[EntryKey] {
        &self.entries
    }

    /// Dynamic lights stored directly in this cell.
    pub fn dynamic_lights(&self) -> &[EntryKey] {
        &self.dynamic_lights
    }

    /// Static lights cached in this cell.
    pub fn static_lights(&self) -> &[EntryKey] {
        &self.static_lights
    }

    /// Whether a structural change happened since the last cleanup.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Box covered by this cell.
    pub fn bounds(&self) -> AABB {
        AABB::cube(self.center, self.size)
    }

    /// Sphere circumscribing this cell.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.size * 0.5 * 3f32.sqrt())
    }

    /// Test if a point lies inside this cell (boundary included).
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.bounds().contains_point(point)
    }

    /// Center of the child in `octant`: a quarter-size step along each axis.
    pub fn child_center(&self, octant: u8) -> Vec3 {
        let quarter = self.size * 0.25;
        self.center + Vec3::new(
            if octant & 1 == 0 { -quarter } else { quarter },
            if octant & 2 == 0 { -quarter } else { quarter },
            if octant & 4 == 0 { -quarter } else { quarter },
        )
    }

    /// No entries, no lights, no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.dynamic_lights.is_empty()
            && self.static_lights.is_empty()
            && self.children.iter().all(Option::is_none)
    }

    /// Identity-based swap-remove from whichever list holds `key`.
    fn remove_key(&mut self, key: EntryKey) -> bool {
        let mut removed = false;
        for list in [&mut self.entries, &mut self.dynamic_lights, &mut self.static_lights] {
            if let Some(pos) = list.iter().position(|&k| k == key) {
                list.swap_remove(pos);
                removed = true;
            }
        }
        removed
    }
}

// ===== PLACEMENT =====

/// Outcome of descending an AABB through the tree.
#[derive(Debug, Default)]
pub(crate) struct Placement {
    /// Cells where the AABB stops (one per branch)
    pub terminals: Vec<CellKey>,
    /// Shallowest cell that split the AABB, or its only terminal cell
    pub common_root: Option<CellKey>,
    /// Static lights cached along every visited cell
    pub static_lights: Vec<EntryKey>,
}

pub(crate) fn push_unique<T: PartialEq + Copy>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

// ===== CELL ARENA =====

/// Arena owning every cell of one octree.
#[derive(Debug, Default)]
pub(crate) struct CellTree {
    pub cells: SlotMap<CellKey, OctreeCell>,
}

impl CellTree {
    /// Allocate a parentless cell.
    pub fn create_root(&mut self, center: Vec3, size: f32, depth: u32) -> CellKey {
        self.cells.insert(OctreeCell::new(center, size, depth, None))
    }

    /// Descend `aabb` from `cell_key`, creating children on demand.
    ///
    /// Stops in a cell when no depth remains or when the box overlaps all
    /// eight octants (subdividing would not reduce it). A cell that pushes
    /// the box into more than one child becomes the common root,
    /// overwriting whatever a deeper cell proposed.
    pub fn place<E: OctreeEntry>(
        &mut self,
        entries: &mut EntryMap<E>,
        cell_key: CellKey,
        aabb: &AABB,
        placement: &mut Placement,
    ) {
        let cell = &self.cells[cell_key];
        for &light in &cell.static_lights {
            push_unique(&mut placement.static_lights, light);
        }

        let mask = OctantMask::from_overlap(aabb, cell.center);
        if cell.remaining_depth == 0 || mask == OctantMask::all() {
            self.stop_at(cell_key, placement);
            return;
        }

        let mut children_used = 0;
        for octant in mask.octants() {
            let child = self.child_or_create(entries, cell_key, octant);
            self.place(entries, child, aabb, placement);
            children_used += 1;
        }

        if children_used > 1 {
            placement.common_root = Some(cell_key);
        }
    }

    /// Terminate a placement in `cell_key` without descending.
    pub fn stop_at(&self, cell_key: CellKey, placement: &mut Placement) {
        placement.terminals.push(cell_key);
        placement.common_root.get_or_insert(cell_key);
    }

    /// Child in `octant`, created if absent.
    ///
    /// A new child inherits the static lights cached in its parent, and is
    /// registered in each of those lights' `octree_leaves`.
    fn child_or_create<E: OctreeEntry>(
        &mut self,
        entries: &mut EntryMap<E>,
        parent_key: CellKey,
        octant: u8,
    ) -> CellKey {
        let parent = &self.cells[parent_key];
        if let Some(child) = parent.children[octant as usize] {
            return child;
        }

        let mut child = OctreeCell::new(
            parent.child_center(octant),
            parent.size * 0.5,
            parent.remaining_depth - 1,
            Some(parent_key),
        );
        child.static_lights = parent.static_lights.clone();
        let inherited = child.static_lights.clone();

        let child_key = self.cells.insert(child);
        self.cells[parent_key].children[octant as usize] = Some(child_key);
        self.mark_dirty(parent_key);

        for light in inherited {
            if let Some(entry) = entries.get_mut(light) {
                entry.links_mut().octree_leaves.push(child_key);
            }
        }

        child_key
    }

    /// Remove `key` from one cell. No-op if the cell does not hold it.
    pub fn remove_from_cell(&mut self, cell_key: CellKey, key: EntryKey) -> bool {
        let removed = match self.cells.get_mut(cell_key) {
            Some(cell) => cell.remove_key(key),
            None => false,
        };
        if removed {
            self.mark_dirty(cell_key);
        }
        removed
    }

    /// Flag a cell and all its ancestors for the next cleanup.
    ///
    /// A dirty cell always has dirty ancestors, so the walk stops at the
    /// first cell already flagged.
    pub fn mark_dirty(&mut self, cell_key: CellKey) {
        let mut current = Some(cell_key);
        while let Some(key) = current {
            let Some(cell) = self.cells.get_mut(key) else { break };
            if cell.dirty && key != cell_key {
                break;
            }
            cell.dirty = true;
            current = cell.parent;
        }
    }

    /// Post-order pruning of empty cells below `cell_key`.
    ///
    /// Returns `false` iff the cell holds nothing and no child survived,
    /// i.e. the caller may drop it. Clean subtrees are skipped. `pruned`
    /// counts the cells dropped.
    pub fn cleanup(&mut self, cell_key: CellKey, pruned: &mut usize) -> bool {
        let Some(cell) = self.cells.get(cell_key) else { return false };
        if !cell.dirty {
            return true;
        }

        let children = cell.children;
        for (octant, child) in children.iter().enumerate() {
            let Some(child_key) = *child else { continue };
            if !self.cleanup(child_key, pruned) {
                self.cells.remove(child_key);
                self.cells[cell_key].children[octant] = None;
                *pruned += 1;
            }
        }

        let cell = &mut self.cells[cell_key];
        cell.dirty = false;
        !cell.is_empty()
    }

    /// Set `culled` on everything held below `cell_key` and drop the
    /// objects' per-frame `dynamic_lights`.
    pub fn reset_visibility<E: OctreeEntry>(&self, entries: &mut EntryMap<E>, cell_key: CellKey) {
        let Some(cell) = self.cells.get(cell_key) else { return };

        for &key in &cell.entries {
            if let Some(entry) = entries.get_mut(key) {
                let links = entry.links_mut();
                links.culled = true;
                links.dynamic_lights.clear();
            }
        }
        for &key in cell.dynamic_lights.iter().chain(&cell.static_lights) {
            if let Some(entry) = entries.get_mut(key) {
                entry.links_mut().culled = true;
            }
        }

        for child in cell.children.iter().flatten() {
            self.reset_visibility(entries, *child);
        }
    }

    /// Keys of every cell in the subtree rooted at `cell_key` (pre-order).
    pub fn subtree(&self, cell_key: CellKey) -> Vec<CellKey> {
        let mut out = Vec::new();
        let mut stack = vec![cell_key];
        while let Some(key) = stack.pop() {
            let Some(cell) = self.cells.get(key) else { continue };
            out.push(key);
            stack.extend(cell.children.iter().rev().flatten());
        }
        out
    }

    /// Depth of a cell below the root (root = 0).
    pub fn depth_of(&self, cell_key: CellKey) -> u32 {
        let mut depth = 0;
        let mut current = self.cells.get(cell_key).and_then(OctreeCell::parent);
        while let Some(key) = current {
            depth += 1;
            current = self.cells.get(key).and_then(OctreeCell::parent);
        }
        depth
    }
}

#[cfg(test)]
#[path = "octree_cell_tests.rs"]
mod tests;
