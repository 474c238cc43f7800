//! Position, Euler rotation and scale with a memoized 4×4 matrix.
//!
//! The matrix is composed as **translate → rotate → scale**, with the rotation
//! applied as yaw (Y), then pitch (X), then roll (Z):
//!
//! ```text
//! M = T(position) · Ry(yaw) · Rx(pitch) · Rz(roll) · S(scale)
//! ```
//!
//! Basis vectors are always read back out of that matrix, so `forward()`,
//! `right()` and `up()` agree with what the renderer sees.
//!
//! # Example
//!
//! ```
//! use stardrift::{Transform, Vec3};
//!
//! let mut transform = Transform::new();
//! transform.set_position(0.0, 2.0, -5.0);
//! transform.set_rotation(0.0, std::f32::consts::FRAC_PI_2, 0.0);
//!
//! let forward = transform.forward();
//! assert!(forward.abs_diff_eq(Vec3::NEG_X, 1e-5));
//! ```

use std::cell::Cell;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Placement of an entity or model in world space.
///
/// Setters always mark the cached matrix stale. The fields are public so
/// gameplay code can integrate positions in place; after writing a field
/// directly, call [`Transform::force_update`].
#[derive(Clone, Debug)]
pub struct Transform {
    /// World-space translation.
    pub position: Vec3,
    /// Per-axis scale factors.
    pub scale: Vec3,
    /// Euler angles in radians, stored as `(pitch, yaw, roll)`.
    pub rotation: Vec3,
    matrix: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(true),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform positioned at the given location.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
        self.dirty.set(true);
    }

    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vec3::new(x, y, z);
        self.dirty.set(true);
    }

    /// Sets the Euler angles in radians.
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.rotation = Vec3::new(pitch, yaw, roll);
        self.dirty.set(true);
    }

    /// Sets the rotation from an axis and an angle in radians, converting it
    /// into the `(pitch, yaw, roll)` angles this transform stores.
    pub fn set_rotation_from_axis_angle(&mut self, axis: Vec3, angle: f32) {
        let quat = Quat::from_axis_angle(axis.normalize_or_zero(), angle);
        let (yaw, pitch, roll) = quat.to_euler(EulerRot::YXZ);
        self.set_rotation(pitch, yaw, roll);
    }

    /// Marks the cached matrix stale without changing any value.
    ///
    /// Needed after mutating `position`, `scale` or `rotation` directly.
    pub fn force_update(&mut self) {
        self.dirty.set(true);
    }

    /// Returns true if the next [`Transform::matrix`] call will recompute.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Returns the model matrix, recomputing it only if a value changed.
    pub fn matrix(&self) -> Mat4 {
        if self.dirty.get() {
            let rotation = Quat::from_euler(
                EulerRot::YXZ,
                self.rotation.y,
                self.rotation.x,
                self.rotation.z,
            );
            self.matrix.set(Mat4::from_scale_rotation_translation(
                self.scale,
                rotation,
                self.position,
            ));
            self.dirty.set(false);
        }
        self.matrix.get()
    }

    /// Facing direction: the negated third basis column.
    pub fn forward(&self) -> Vec3 {
        (-self.matrix().z_axis.truncate()).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.matrix().x_axis.truncate().normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.matrix().y_axis.truncate().normalize_or_zero()
    }
}
