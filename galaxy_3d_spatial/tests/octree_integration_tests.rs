//! Integration tests for the octree spatial index
//!
//! These tests drive the index the way a scene layer does: a custom entry
//! type implementing `OctreeEntry`, a grid of props with lights, and the
//! per-frame reset / cleanup / query sequence.
//!
//! Run with: cargo test --test octree_integration_tests

use galaxy_3d_spatial::galaxy3d::camera::Camera;
use galaxy_3d_spatial::galaxy3d::scene::{
    AABB, EntryKey, EntryLinks, EntryMap, LightParams, OctreeConfig, OctreeEntry, SpatialIndex,
};
use galaxy_3d_spatial::glam::{Mat4, Vec3};

// ============================================================================
// SCENE ENTRY IMPLEMENTATION
// ============================================================================

/// Minimal scene node: a prop with world bounds, or a lamp.
enum Node {
    Prop { bounds: AABB, links: EntryLinks },
    Lamp { params: LightParams, links: EntryLinks },
}

impl Node {
    fn prop(center: Vec3) -> Self {
        Node::Prop { bounds: AABB::cube(center, 2.0), links: EntryLinks::default() }
    }

    fn lamp(params: LightParams) -> Self {
        Node::Lamp { params, links: EntryLinks::default() }
    }

    fn center(&self) -> Vec3 {
        self.aabb().center()
    }

    fn move_lamp(&mut self, position: Vec3) {
        if let Node::Lamp { params, .. } = self {
            params.position = position;
        }
    }
}

impl OctreeEntry for Node {
    fn aabb(&self) -> AABB {
        match self {
            Node::Prop { bounds, .. } => *bounds,
            Node::Lamp { params, .. } => params.aabb(),
        }
    }

    fn light(&self) -> Option<LightParams> {
        match self {
            Node::Prop { .. } => None,
            Node::Lamp { params, .. } => Some(*params),
        }
    }

    fn links(&self) -> &EntryLinks {
        match self {
            Node::Prop { links, .. } | Node::Lamp { links, .. } => links,
        }
    }

    fn links_mut(&mut self) -> &mut EntryLinks {
        match self {
            Node::Prop { links, .. } | Node::Lamp { links, .. } => links,
        }
    }
}

// ============================================================================
// FIXTURE
// ============================================================================

struct World {
    entries: EntryMap<Node>,
    index: SpatialIndex,
    props: Vec<EntryKey>,
    torch: EntryKey,
    lamp: EntryKey,
    sun: EntryKey,
}

/// 10x10 props on the ground (spacing 20, centers at ±10..±90), one
/// static lamp over the prop at (50, 0, -50), one torch on the prop at
/// (-10, 0, -30) and a sun.
fn build_world() -> World {
    let mut entries = EntryMap::with_key();
    let mut index = SpatialIndex::with_config(OctreeConfig::default()).unwrap();

    let mut props = Vec::new();
    for i in 0..10 {
        for j in 0..10 {
            let center = Vec3::new(-90.0 + 20.0 * i as f32, 0.0, -90.0 + 20.0 * j as f32);
            let key = entries.insert(Node::prop(center));
            index.insert(&mut entries, key).unwrap();
            props.push(key);
        }
    }

    let torch = entries.insert(Node::lamp(LightParams::dynamic(Vec3::new(-10.0, 3.0, -30.0), 5.0)));
    let lamp = entries.insert(Node::lamp(LightParams::fixed(Vec3::new(50.0, 8.0, -50.0), 6.0)));
    let sun = entries.insert(Node::lamp(LightParams::global(Vec3::new(0.0, 500.0, 0.0))));
    for key in [torch, lamp, sun] {
        index.insert_light(&mut entries, key).unwrap();
    }

    World { entries, index, props, torch, lamp, sun }
}

/// Eye above the ground at the origin, looking down -Z.
fn forward_camera() -> Camera {
    Camera::from_matrices(
        Mat4::look_at_rh(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 10.0, -1.0), Vec3::Y),
        Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 1000.0),
    )
}

fn prop_at(world: &World, x: f32, z: f32) -> EntryKey {
    world
        .props
        .iter()
        .copied()
        .find(|&key| world.entries[key].center() == Vec3::new(x, 0.0, z))
        .unwrap()
}

// ============================================================================
// FRAME TESTS
// ============================================================================

#[test]
fn test_integration_frame_reports_props_in_view() {
    let mut world = build_world();
    let hits = world.index.frame_cull(&mut world.entries, &forward_camera());

    for &key in &world.props {
        let center = world.entries[key].center();
        let depth = -center.z;
        let clearly_inside = depth >= 30.0 && center.x.abs() + 1.0 < 0.5 * (depth - 1.0);
        let clearly_behind = center.z >= 30.0;

        if clearly_inside {
            assert!(hits.contains_object(key), "prop at {:?} should be visible", center);
            assert!(!world.entries[key].links().culled);
        }
        if clearly_behind {
            assert!(!hits.contains_object(key), "prop at {:?} is behind the eye", center);
            assert!(world.entries[key].links().culled);
        }
    }

    // Each visible prop appears once
    let (objects, lights) = hits.into_parts();
    let mut unique = objects.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), objects.len());

    assert!(lights.contains(&world.sun));
    assert!(lights.contains(&world.torch));
}

#[test]
fn test_integration_lights_attach_to_props() {
    let mut world = build_world();
    world.index.frame_cull(&mut world.entries, &forward_camera());

    let lit_by_torch = prop_at(&world, -10.0, -30.0);
    let lit_by_lamp = prop_at(&world, 50.0, -50.0);

    for &key in &world.props {
        let links = world.entries[key].links();
        if key == lit_by_torch {
            assert_eq!(links.dynamic_lights, vec![world.torch]);
        } else {
            assert!(!links.dynamic_lights.contains(&world.torch));
        }
        if key == lit_by_lamp {
            assert_eq!(links.static_lights, vec![world.lamp]);
        } else {
            assert!(links.static_lights.is_empty());
        }
    }
}

#[test]
fn test_integration_moving_and_hiding_between_frames() {
    let mut world = build_world();
    let camera = forward_camera();
    world.index.frame_cull(&mut world.entries, &camera);

    let lit_by_torch = prop_at(&world, -10.0, -30.0);
    let hidden = prop_at(&world, 10.0, -50.0);
    assert_eq!(world.entries[lit_by_torch].links().dynamic_lights, vec![world.torch]);

    // Torch walks far away, one prop is hidden
    world.entries[world.torch].move_lamp(Vec3::new(-300.0, 3.0, -300.0));
    assert!(world.index.update(&mut world.entries, world.torch).unwrap());
    world.entries[hidden].links_mut().visible = false;

    let hits = world.index.frame_cull(&mut world.entries, &camera);

    assert!(hits.contains_object(lit_by_torch));
    assert!(world.entries[lit_by_torch].links().dynamic_lights.is_empty());
    assert!(!hits.contains_object(hidden));
    assert!(world.entries[hidden].links().culled);
    // Static membership is untouched by queries
    let lit_by_lamp = prop_at(&world, 50.0, -50.0);
    assert_eq!(world.entries[lit_by_lamp].links().static_lights, vec![world.lamp]);
}

#[test]
fn test_integration_removing_everything_collapses_tree() {
    let mut world = build_world();
    assert!(world.index.cell_count() > 1);

    let keys: Vec<EntryKey> = world.entries.keys().collect();
    for key in keys {
        world.index.remove(&mut world.entries, key);
    }
    let pruned = world.index.cleanup();

    assert!(pruned > 0);
    assert_eq!(world.index.cell_count(), 1);
    let stats = world.index.stats();
    assert_eq!(stats.stored_entries, 0);
    assert_eq!(stats.static_lights, 0);
    assert_eq!(stats.dynamic_lights, 0);
    assert_eq!(stats.global_lights, 0);

    let hits = world.index.frame_cull(&mut world.entries, &forward_camera());
    assert!(hits.is_empty());
}
