//! View-frustum planes and containment tests.
//!
//! Planes are pulled straight out of a combined view-projection matrix
//! (Gribb/Hartmann extraction) and face inward: a point is inside a plane
//! when `dot(plane.xyz, p) + plane.w > 0`.
//!
//! The projection is expected to map depth to `[-w, w]` as
//! [`Mat4::perspective_rh_gl`] does; the camera builds its matrices that way.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::Aabb;

/// Index of each plane inside [`Frustum::planes`].
pub mod plane {
    pub const RIGHT: usize = 0;
    pub const LEFT: usize = 1;
    pub const TOP: usize = 2;
    pub const BOTTOM: usize = 3;
    pub const FAR: usize = 4;
    pub const NEAR: usize = 5;
}

/// Six clip planes, each stored as `(a, b, c, d)` with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_proj(&Mat4::IDENTITY)
    }
}

impl Frustum {
    pub fn from_view_proj(view_proj: &Mat4) -> Self {
        let mut frustum = Self {
            planes: [Vec4::ZERO; 6],
        };
        frustum.update_planes(view_proj);
        frustum
    }

    /// Re-derives all six planes from `view_proj`.
    pub fn update_planes(&mut self, view_proj: &Mat4) {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        self.planes[plane::RIGHT] = r3 - r0;
        self.planes[plane::LEFT] = r3 + r0;
        self.planes[plane::TOP] = r3 + r1;
        self.planes[plane::BOTTOM] = r3 - r1;
        self.planes[plane::FAR] = r3 - r2;
        self.planes[plane::NEAR] = r3 + r2;

        for plane in &mut self.planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }
    }

    /// Returns true only if `point` is strictly inside all six planes.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| distance(*plane, point) > 0.0)
    }

    /// Conservative box test.
    ///
    /// A box is rejected only when all eight of its corners lie outside one
    /// single plane. Large boxes straddling a frustum corner may be accepted
    /// even though they are not visible.
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        let corners = aabb.corners();
        !self
            .planes
            .iter()
            .any(|plane| corners.iter().all(|c| distance(*plane, *c) <= 0.0))
    }
}

#[inline]
fn distance(plane: Vec4, point: Vec3) -> f32 {
    plane.truncate().dot(point) + plane.w
}
