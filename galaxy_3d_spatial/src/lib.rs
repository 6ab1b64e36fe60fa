/*!
# Galaxy 3D Spatial

Dynamic octree spatial index for the Galaxy 3D engine.

This crate answers "what is visible from this camera, and which lights
touch it" for a scene of bounding-boxed objects and lights. The scene
layer owns its entries in a `SlotMap`; the index stores keys only.

## Architecture

- **SpatialIndex**: Octree root, insertion, removal, cleanup and queries
- **OctreeCell**: Lazily created node, pruned when empty
- **OctreeEntry**: Capability trait implemented by indexable entries
- **Frustum**: Six-plane frustum with sphere/box classification
- **Camera**: View, projection, frustum and eye position for one query

Lights come in three propagation classes: GLOBAL (outside the tree),
STATIC (cached in a subtree) and DYNAMIC (matched on every query).
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod scene;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
