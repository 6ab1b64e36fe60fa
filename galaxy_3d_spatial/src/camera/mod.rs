//! Camera module — low-level camera and frustum.
//!
//! Provides passive data containers for the visibility query.
//! The spatial index does NOT store or manage cameras — they are
//! owned and driven by the caller and passed in once per frame.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
