//! Perspective camera with a scripted mode and a free-fly debug mode.
//!
//! - **Scripted**: gameplay code writes `position` and `target` (a follow cam,
//!   a cutscene); the camera only rebuilds its matrices.
//! - **FreeFly**: left-drag turns the view, W/S/A/D move across the ground
//!   plane, Space/Left Shift move up and down.
//!
//! Either way, one [`Camera::frame`] call per tick recomputes
//! `view_proj = proj * view` and the frustum planes that follow from it.
//!
//! # Example
//!
//! ```
//! use stardrift::{Camera, Vec2, Vec3};
//!
//! let mut camera = Camera::new(Vec3::new(0.0, 10.0, 30.0));
//! camera.target = Vec3::ZERO;
//! camera.update(Vec2::new(1280.0, 720.0));
//! assert!(camera.frustum().contains_point(Vec3::ZERO));
//! ```

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::frustum::Frustum;
use crate::input::InputState;
use crate::render::{ShaderProgram, uniforms};

/// Pitch stays this far away from straight up/down.
const PITCH_MARGIN: f32 = 0.01;

/// Which controller owns the camera this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraMode {
    /// Position and target are set from outside.
    #[default]
    Scripted,
    /// Driven by mouse drag and keyboard.
    FreeFly,
}

/// Lens and controller settings.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Radians of turn per pixel of drag.
    pub sensitivity: f32,
    /// Free-fly ground speed in units per second.
    pub move_speed: f32,
    /// Free-fly climb/descend speed in units per second.
    pub vertical_speed: f32,
    /// Initial yaw in radians. 0 looks toward +X, π/2 toward +Z.
    pub yaw: f32,
    /// Initial pitch in radians, positive looks up.
    pub pitch: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 90f32.to_radians(),
            near: 1.0,
            far: 1000.0,
            sensitivity: 1.0 / 500.0,
            move_speed: 120.0,
            vertical_speed: 120.0,
            yaw: 270f32.to_radians(),
            pitch: (-35f32).to_radians(),
        }
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Set near and far clipping planes.
    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Set ground and vertical free-fly speeds (units per second).
    pub fn speed(mut self, move_speed: f32, vertical_speed: f32) -> Self {
        self.move_speed = move_speed;
        self.vertical_speed = vertical_speed;
        self
    }

    /// Set the initial look angles in radians.
    pub fn angles(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }
}

/// A perspective camera producing view, projection and frustum each frame.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Unit look direction derived from yaw/pitch in free-fly mode.
    pub forward: Vec3,
    pub up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Width over height of the last viewport passed to [`Camera::update`].
    pub aspect: f32,
    pub mode: CameraMode,
    pub sensitivity: f32,
    pub move_speed: f32,
    pub vertical_speed: f32,
    view: Mat4,
    proj: Mat4,
    view_proj: Mat4,
    frustum: Frustum,
    dragging: bool,
    drag_origin: Vec2,
}

impl Camera {
    /// Creates a camera at `position` with default settings.
    pub fn new(position: Vec3) -> Self {
        Self::with_config(position, CameraConfig::default())
    }

    pub fn with_config(position: Vec3, config: CameraConfig) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            yaw: config.yaw,
            pitch: clamp_pitch(config.pitch),
            fov: config.fov,
            near: config.near,
            far: config.far,
            aspect: 1.0,
            mode: CameraMode::Scripted,
            sensitivity: config.sensitivity,
            move_speed: config.move_speed,
            vertical_speed: config.vertical_speed,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            frustum: Frustum::default(),
            dragging: false,
            drag_origin: Vec2::ZERO,
        }
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.proj
    }

    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Points a scripted camera from `position` at `target`.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    /// Rebuilds projection, view and frustum for a `viewport` in pixels.
    ///
    /// A zero-height viewport keeps the previous aspect ratio.
    pub fn update(&mut self, viewport: Vec2) {
        if viewport.y > 0.0 {
            self.aspect = viewport.x / viewport.y;
        }

        self.proj = Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far);
        self.view = Mat4::look_at_rh(self.position, self.target, self.up);
        self.view_proj = self.proj * self.view;
        self.frustum.update_planes(&self.view_proj);
    }

    /// Runs the controller selected by `mode`, then [`Camera::update`].
    pub fn frame(&mut self, input: &(impl InputState + ?Sized), dt: f32, viewport: Vec2) {
        match self.mode {
            CameraMode::Scripted => self.update(viewport),
            CameraMode::FreeFly => self.update_free_view(input, dt, viewport),
        }
    }

    /// Turns the view by a pointer delta in pixels.
    pub fn relative_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = clamp_pitch(self.pitch - dy * self.sensitivity);
    }

    /// Moves across the ground plane relative to the current yaw.
    ///
    /// `forward` and `left` are axis values in `[-1, 1]`; `step` is the
    /// distance covered this call.
    pub fn go_forward(&mut self, forward: f32, left: f32, step: f32) {
        if forward == 0.0 && left == 0.0 {
            return;
        }
        let heading = self.yaw + forward.atan2(left);
        self.position.x += heading.sin() * step;
        self.position.z -= heading.cos() * step;
    }

    /// One free-fly tick: drag-look, movement, then matrix rebuild.
    pub fn update_free_view(&mut self, input: &(impl InputState + ?Sized), dt: f32, viewport: Vec2) {
        self.update_drag(input);

        self.go_forward(
            input.key_delta(KeyCode::KeyW, KeyCode::KeyS),
            input.key_delta(KeyCode::KeyA, KeyCode::KeyD),
            self.move_speed * dt,
        );

        let climb = input.key_delta(KeyCode::Space, KeyCode::ShiftLeft);
        self.position.y += climb * self.vertical_speed * dt;

        self.forward = self.forward_direction();
        self.target = self.position + self.forward;

        self.update(viewport);
    }

    /// Look direction from yaw and pitch.
    pub fn forward_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw)
    }

    /// Uploads position, view and projection to `shader`.
    pub fn bind<S: ShaderProgram>(&self, shader: &mut S) {
        shader.use_program();
        shader.upload_vec3(uniforms::VIEW_POS, self.position);
        shader.upload_mat4(uniforms::VIEW_MATRIX, &self.view);
        shader.upload_mat4(uniforms::PROJECTION_MATRIX, &self.proj);
    }

    fn update_drag(&mut self, input: &(impl InputState + ?Sized)) {
        let pressed = input.mouse_down(MouseButton::Left);
        let mouse = input.mouse_position();

        if self.dragging && pressed {
            let delta = mouse - self.drag_origin;
            self.relative_mouse(delta.x, delta.y);
        }
        if pressed {
            self.drag_origin = mouse;
        }
        self.dragging = pressed;
    }
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-FRAC_PI_2 + PITCH_MARGIN, FRAC_PI_2 - PITCH_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::render::fakes::{RecordingShader, Uniform};
    use approx::assert_relative_eq;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn free_fly(yaw: f32, pitch: f32) -> Camera {
        let mut camera =
            Camera::with_config(Vec3::ZERO, CameraConfig::new().angles(yaw, pitch).speed(10.0, 5.0));
        camera.mode = CameraMode::FreeFly;
        camera
    }

    #[test]
    fn update_composes_view_proj() {
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 20.0));
        camera.update(VIEWPORT);

        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
        assert!(
            camera
                .view_proj()
                .abs_diff_eq(camera.projection() * camera.view(), 1e-6)
        );
        assert!(camera.frustum().contains_point(camera.target));
        assert!(!camera.frustum().contains_point(Vec3::new(0.0, 5.0, 40.0)));
    }

    #[test]
    fn zero_height_viewport_keeps_aspect() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0));
        camera.update(VIEWPORT);
        camera.update(Vec2::new(800.0, 0.0));
        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = free_fly(0.0, 0.0);
        camera.relative_mouse(0.0, -100_000.0);
        assert_relative_eq!(camera.pitch, FRAC_PI_2 - PITCH_MARGIN);
        camera.relative_mouse(0.0, 100_000.0);
        assert_relative_eq!(camera.pitch, -FRAC_PI_2 + PITCH_MARGIN);
    }

    #[test]
    fn mouse_delta_scaled_by_sensitivity() {
        let mut camera = free_fly(0.0, 0.0);
        camera.relative_mouse(500.0, 250.0);
        assert_relative_eq!(camera.yaw, 1.0);
        assert_relative_eq!(camera.pitch, -0.5);
    }

    #[test]
    fn forward_key_moves_along_yaw() {
        let mut camera = free_fly(0.0, 0.0);
        camera.go_forward(1.0, 0.0, 2.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));

        // Strafing left while facing +X heads toward -Z.
        let mut camera = free_fly(0.0, 0.0);
        camera.go_forward(0.0, 1.0, 2.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn movement_scales_with_elapsed_time() {
        let mut input = Input::new();
        input.set_key(KeyCode::KeyW, true);
        input.set_key(KeyCode::Space, true);

        let mut camera = free_fly(0.0, 0.0);
        camera.frame(&input, 0.5, VIEWPORT);
        assert!(camera.position.abs_diff_eq(Vec3::new(5.0, 2.5, 0.0), 1e-5));

        camera.frame(&input, 0.25, VIEWPORT);
        assert!(camera.position.abs_diff_eq(Vec3::new(7.5, 3.75, 0.0), 1e-5));
    }

    #[test]
    fn free_fly_targets_one_unit_ahead() {
        let input = Input::new();
        let mut camera = free_fly(270f32.to_radians(), 0.0);
        camera.position = Vec3::new(3.0, 1.0, 2.0);
        camera.frame(&input, 1.0 / 60.0, VIEWPORT);

        assert!(camera.forward.abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(camera.target.abs_diff_eq(Vec3::new(3.0, 1.0, 1.0), 1e-5));
        assert!(camera.frustum().contains_point(Vec3::new(3.0, 1.0, -20.0)));
    }

    #[test]
    fn drag_turns_only_after_first_frame() {
        let mut input = Input::new();
        let mut camera = free_fly(0.0, 0.0);

        input.set_mouse_position(Vec2::new(100.0, 100.0));
        input.set_mouse_button(MouseButton::Left, true);
        camera.frame(&input, 0.0, VIEWPORT);
        assert_eq!(camera.yaw, 0.0);

        input.set_mouse_position(Vec2::new(600.0, 100.0));
        camera.frame(&input, 0.0, VIEWPORT);
        assert_relative_eq!(camera.yaw, 1.0);

        input.set_mouse_button(MouseButton::Left, false);
        input.set_mouse_position(Vec2::new(0.0, 0.0));
        camera.frame(&input, 0.0, VIEWPORT);
        assert_relative_eq!(camera.yaw, 1.0);
    }

    #[test]
    fn scripted_mode_ignores_input() {
        let mut input = Input::new();
        input.set_key(KeyCode::KeyW, true);

        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0));
        camera.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 0.0, 0.0));
        camera.frame(&input, 1.0, VIEWPORT);

        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(camera.target, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn bind_uploads_camera_uniforms() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        camera.update(VIEWPORT);

        let mut shader = RecordingShader::declaring(&[
            uniforms::VIEW_POS,
            uniforms::VIEW_MATRIX,
            uniforms::PROJECTION_MATRIX,
        ]);
        camera.bind(&mut shader);

        assert_eq!(shader.use_count, 1);
        assert_eq!(
            shader.last(uniforms::VIEW_POS),
            Some(&Uniform::Vec3(Vec3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(
            shader.last(uniforms::VIEW_MATRIX),
            Some(&Uniform::Mat4(camera.view()))
        );
        assert_eq!(
            shader.last(uniforms::PROJECTION_MATRIX),
            Some(&Uniform::Mat4(camera.projection()))
        );
    }
}
