//! Frame loop: entities, the camera and the render pass.
//!
//! Each [`Stage::tick`] runs strictly in this order:
//!
//! 1. every entity's [`Entity::update`] (entities may move the camera),
//! 2. dead entities are dropped,
//! 3. the camera runs its controller (free-fly in debug mode, scripted
//!    otherwise) and rebuilds its matrices,
//! 4. the camera and elapsed time are bound to the shader,
//! 5. every entity's [`Entity::render`].
//!
//! Rendering never observes a half-updated frame.

use glam::Vec2;

use crate::camera::{Camera, CameraMode};
use crate::input::InputState;
use crate::render::{RenderBackend, ShaderProgram, uniforms};

/// What an entity may touch while updating.
pub struct UpdateContext<'a> {
    pub camera: &'a mut Camera,
    pub input: &'a dyn InputState,
    pub debug_mode: bool,
    /// Seconds since the stage started.
    pub time: f32,
}

/// What an entity may touch while rendering.
pub struct RenderContext<'a, S, B> {
    pub shader: &'a mut S,
    pub backend: &'a mut B,
    pub camera: &'a Camera,
}

/// A thing living on the stage.
pub trait Entity<S, B> {
    /// Called once when the entity is added.
    fn wakeup(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Advances the entity by `dt` seconds.
    fn update(&mut self, _ctx: &mut UpdateContext<'_>, _dt: f32) {}

    fn render(&self, _ctx: &mut RenderContext<'_, S, B>) {}

    /// Entities returning false are removed after the update phase.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Owns the entities, the camera and the rendering capabilities.
pub struct Stage<S, B> {
    pub camera: Camera,
    pub shader: S,
    pub backend: B,
    /// Free-fly camera; entities can read this to pause their own controls.
    pub debug_mode: bool,
    entities: Vec<Box<dyn Entity<S, B>>>,
    time: f32,
}

impl<S: ShaderProgram, B: RenderBackend> Stage<S, B> {
    pub fn new(camera: Camera, shader: S, backend: B) -> Self {
        Self {
            camera,
            shader,
            backend,
            debug_mode: false,
            entities: Vec::new(),
            time: 0.0,
        }
    }

    /// Adds an entity and wakes it up.
    pub fn add_entity(&mut self, mut entity: Box<dyn Entity<S, B>>, input: &dyn InputState) {
        let mut ctx = UpdateContext {
            camera: &mut self.camera,
            input,
            debug_mode: self.debug_mode,
            time: self.time,
        };
        entity.wakeup(&mut ctx);
        self.entities.push(entity);
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Seconds accumulated over all ticks.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn toggle_debug_mode(&mut self) {
        self.debug_mode = !self.debug_mode;
        log::info!(
            "[stage] debug camera {}",
            if self.debug_mode { "on" } else { "off" }
        );
    }

    /// Runs one frame: update phase, camera, then render phase.
    pub fn tick(&mut self, input: &dyn InputState, dt: f32, viewport: Vec2) {
        self.time += dt;

        let mut ctx = UpdateContext {
            camera: &mut self.camera,
            input,
            debug_mode: self.debug_mode,
            time: self.time,
        };
        for entity in &mut self.entities {
            entity.update(&mut ctx, dt);
        }
        self.entities.retain(|entity| entity.is_alive());

        self.camera.mode = if self.debug_mode {
            CameraMode::FreeFly
        } else {
            CameraMode::Scripted
        };
        self.camera.frame(input, dt, viewport);

        self.camera.bind(&mut self.shader);
        self.shader.upload_f32(uniforms::TIME, self.time);

        let mut ctx = RenderContext {
            shader: &mut self.shader,
            backend: &mut self.backend,
            camera: &self.camera,
        };
        for entity in &self.entities {
            entity.render(&mut ctx);
        }
    }
}
