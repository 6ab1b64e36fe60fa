/// Light propagation rules layered on top of the cell arena.
///
/// - GLOBAL lights never enter the tree (see `SpatialIndex`).
/// - STATIC lights are cached in every cell of the subtree rooted at their
///   common root. Objects already stored in that subtree receive the light
///   at insertion time; objects inserted later pick it up from the cells
///   they descend through (`CellTree::place`), and cells created later
///   inherit it from their parent. Membership depends only on geometry,
///   never on insertion order.
/// - DYNAMIC lights are stored like objects and matched against objects
///   on every query (`visibility`). Removing one strips it from the objects
///   that matched it last frame.

use super::entry::{EntryKey, EntryMap, LightParams, OctreeEntry};
use super::octree_cell::{push_unique, CellKey, CellTree};

impl CellTree {
    /// Cache a static light in the subtree of `common_root`.
    ///
    /// Every cell of the subtree lists the light and appears in the
    /// light's `octree_leaves`; every object stored there lists the light
    /// in its `static_lights`.
    pub(crate) fn propagate_static_light<E: OctreeEntry>(
        &mut self,
        entries: &mut EntryMap<E>,
        light_key: EntryKey,
        common_root: CellKey,
    ) -> usize {
        let subtree = self.subtree(common_root);

        for &cell_key in &subtree {
            let cell = &mut self.cells[cell_key];
            push_unique(&mut cell.static_lights, light_key);

            for &object in &cell.entries {
                if let Some(entry) = entries.get_mut(object) {
                    push_unique(&mut entry.links_mut().static_lights, light_key);
                }
            }
        }

        if let Some(light) = entries.get_mut(light_key) {
            let links = light.links_mut();
            links.octree_leaves = subtree.clone();
            links.common_root = Some(common_root);
        }

        subtree.len()
    }

    /// Undo `propagate_static_light` for every cell in `leaves`.
    pub(crate) fn withdraw_static_light<E: OctreeEntry>(
        &mut self,
        entries: &mut EntryMap<E>,
        light_key: EntryKey,
        leaves: &[CellKey],
    ) {
        for &cell_key in leaves {
            let Some(cell) = self.cells.get(cell_key) else { continue };

            for &object in &cell.entries {
                if let Some(entry) = entries.get_mut(object) {
                    entry.links_mut().static_lights.retain(|&k| k != light_key);
                }
            }

            self.remove_from_cell(cell_key, light_key);
        }
    }

    /// Drop a dynamic light from its cells and from the objects below them.
    ///
    /// Matching only looks at a cell and its ancestors, so any object that
    /// can list the light is stored in the subtree of one of `leaves`.
    pub(crate) fn withdraw_dynamic_light<E: OctreeEntry>(
        &mut self,
        entries: &mut EntryMap<E>,
        light_key: EntryKey,
        leaves: &[CellKey],
    ) {
        for &leaf in leaves {
            for cell_key in self.subtree(leaf) {
                for &object in &self.cells[cell_key].entries {
                    if let Some(entry) = entries.get_mut(object) {
                        entry.links_mut().dynamic_lights.retain(|&k| k != light_key);
                    }
                }
            }

            self.remove_from_cell(leaf, light_key);
        }
    }
}

/// Dynamic lights from `candidates` that should be attached to an object.
///
/// A candidate qualifies when it is still a visible light and its sphere
/// of influence touches the object's box.
pub(crate) fn reaching_dynamic_lights<E: OctreeEntry>(
    entries: &EntryMap<E>,
    candidates: &[EntryKey],
    object: &E,
    out: &mut Vec<EntryKey>,
) {
    out.clear();
    let bounds = object.aabb();

    for &key in candidates {
        let Some(light) = entries.get(key) else { continue };
        if !light.links().visible {
            continue;
        }
        if light.light().is_some_and(|params: LightParams| params.reaches(&bounds)) {
            out.push(key);
        }
    }
}
