/// Camera — low-level passive data container.
///
/// Holds the view matrix, projection matrix, frustum and eye position
/// used by `SpatialIndex::get_frustum_hits`. Setters store and compute
/// nothing; `from_matrices` is the one convenience that derives the
/// frustum and eye position from the two matrices.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

/// Low-level camera. A passive data container.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
    position: Vec3,
}

impl Camera {
    /// Create a camera from fully computed parameters.
    pub fn new(view: Mat4, projection: Mat4, frustum: Frustum, position: Vec3) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            frustum,
            position,
        }
    }

    /// Create a camera, deriving the frustum and the eye position.
    ///
    /// The eye is the translation of the inverse view matrix. A singular
    /// view matrix yields a non-finite eye, which the query treats as
    /// "not inside any cell".
    pub fn from_matrices(view: Mat4, projection: Mat4) -> Self {
        let frustum = Frustum::extract(&view, &projection);
        let position = view.inverse().w_axis.truncate();
        Self::new(view, projection, frustum, position)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes and bounding sphere for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    // ===== SETTERS — store, compute nothing =====

    /// Set the view matrix.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    /// Set the projection matrix.
    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    /// Set the frustum.
    pub fn set_frustum(&mut self, frustum: Frustum) {
        self.frustum = frustum;
    }

    /// Set the eye position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
