/// Frustum — six clipping planes plus an enclosing sphere for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// All classification tests are written as positive comparisons, so a
/// frustum built from a non-finite matrix (NaN planes) classifies every
/// volume as `Outside`: nothing is visible, nothing panics.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::{AABB, BoundingSphere};

/// Result of a 3-way frustum classification.
///
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect the subtree without further testing
/// - `Partial` → keep testing children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// Volume is entirely outside the frustum
    Outside,
    /// Volume is entirely inside the frustum
    Inside,
    /// Volume partially overlaps the frustum
    Partial,
}

impl FrustumTest {
    /// Signed encoding: -1 outside, 0 partial, 1 inside.
    pub fn as_sign(self) -> i32 {
        match self {
            FrustumTest::Outside => -1,
            FrustumTest::Partial => 0,
            FrustumTest::Inside => 1,
        }
    }
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes and an enclosing sphere.
///
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
    /// Sphere enclosing the frustum volume, `None` when it is not finite
    /// (singular or infinite-far projection)
    bounds: Option<BoundingSphere>,
}

impl Frustum {
    /// Extract the frustum of a camera from its view and projection matrices.
    pub fn extract(view: &Mat4, projection: &Mat4) -> Self {
        Self::from_view_projection(&(*projection * *view))
    }

    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method, then derives the bounding sphere
    /// from the unprojected clip-space corners.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        // Gribb & Hartmann: planes are sums/differences of the VP rows
        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            Vec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self {
            planes,
            bounds: Self::enclosing_sphere(vp),
        }
    }

    /// Sphere centered on the view axis at mid-depth, reaching the far corners.
    ///
    /// The clip volume bounded by the extracted planes is the NDC cube
    /// [-1, 1]^3, so its corners are unprojected through the inverse VP.
    fn enclosing_sphere(vp: &Mat4) -> Option<BoundingSphere> {
        let inverse = vp.inverse();
        if !inverse.is_finite() {
            return None;
        }

        let near_center = inverse.project_point3(Vec3::new(0.0, 0.0, -1.0));
        let far_center = inverse.project_point3(Vec3::new(0.0, 0.0, 1.0));
        let center = (near_center + far_center) * 0.5;

        let mut radius = 0.0f32;
        for corner in 0..8u8 {
            let ndc = Vec3::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            radius = radius.max(inverse.project_point3(ndc).distance(center));
        }

        let sphere = BoundingSphere::new(center, radius);
        if sphere.center.is_finite() && sphere.radius.is_finite() {
            Some(sphere)
        } else {
            None
        }
    }

    /// Sphere enclosing the frustum, if finite.
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.bounds.as_ref()
    }

    /// All plane coefficients are finite.
    pub fn is_finite(&self) -> bool {
        self.planes.iter().all(|plane| plane.is_finite())
    }

    /// Signed distance from a point to one of the planes.
    pub fn plane_distance(&self, plane: usize, point: Vec3) -> f32 {
        let p = self.planes[plane];
        p.truncate().dot(point) + p.w
    }

    /// Cheap pre-test: does a sphere overlap the frustum's enclosing sphere?
    ///
    /// Returns `true` when no enclosing sphere is available.
    pub fn may_intersect_sphere(&self, sphere: &BoundingSphere) -> bool {
        match &self.bounds {
            Some(bounds) => bounds.intersects(sphere),
            None => true,
        }
    }

    /// Classify a sphere against the six planes.
    ///
    /// - any plane distance below `-radius` → `Outside` (early out)
    /// - every plane distance at least `radius` → `Inside`
    /// - otherwise → `Partial`
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let distance = plane.truncate().dot(sphere.center) + plane.w;

            // Negated so that NaN distances count as outside
            if !(distance >= -sphere.radius) {
                return FrustumTest::Outside;
            }
            if distance < sphere.radius {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }

    /// Classify an AABB against the six planes.
    ///
    /// Equivalent to testing all 8 corners against every plane, using the
    /// positive vertex (p-vertex) and negative vertex (n-vertex) per plane:
    /// - p-vertex outside any plane → all 8 corners are → `Outside`
    /// - n-vertex inside every plane → all 8 corners are → `Inside`
    /// - otherwise → `Partial`
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn contains_box(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            // Positive vertex: corner most in the direction of the normal
            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            if !(normal.dot(p_vertex) + plane.w >= 0.0) {
                return FrustumTest::Outside;
            }

            // Negative vertex: corner least in the direction of the normal
            let n_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );

            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }

    /// Test if an AABB is (potentially) visible: inside or intersecting.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.contains_box(aabb) != FrustumTest::Outside
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
