//! Capabilities the core consumes from a rendering backend.
//!
//! Nothing in this crate talks to a graphics API directly. A host wires a
//! concrete backend (WebGL, wgpu, a recorder in tests) in through these two
//! traits and passes it explicitly to the calls that need it.

use glam::{Mat4, Vec3};

use crate::texture::Texture;

/// Uniform names shared with the scene shaders.
pub mod uniforms {
    pub const VIEW_POS: &str = "viewPos";
    pub const VIEW_MATRIX: &str = "viewMatrix";
    pub const PROJECTION_MATRIX: &str = "projectionMatrix";
    pub const MODEL_MATRIX: &str = "modelMatrix";
    pub const TIME: &str = "time";
    pub const BASE_COLOR: &str = "material.baseColor";
    pub const EMISSIVE: &str = "material.emissive";
    pub const ROUGHNESS: &str = "material.roughness";
    pub const METALLIC: &str = "material.metallic";
}

/// Handle to vertex/index buffers living on the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Handle to a texture living on the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// A compiled shader program that accepts named uniforms.
pub trait ShaderProgram {
    type Location: Copy;

    /// Makes this program the active one.
    fn use_program(&mut self);

    /// Looks up a uniform; `None` if the program does not declare it.
    fn uniform_location(&mut self, name: &str) -> Option<Self::Location>;

    fn set_vec3(&mut self, location: Self::Location, value: Vec3);
    fn set_mat4(&mut self, location: Self::Location, value: &Mat4);
    fn set_f32(&mut self, location: Self::Location, value: f32);

    /// Uploads `value` if the program declares `name`.
    fn upload_vec3(&mut self, name: &str, value: Vec3) {
        if let Some(location) = self.uniform_location(name) {
            self.set_vec3(location, value);
        }
    }

    /// Uploads `value` if the program declares `name`.
    fn upload_mat4(&mut self, name: &str, value: &Mat4) {
        if let Some(location) = self.uniform_location(name) {
            self.set_mat4(location, value);
        }
    }

    /// Uploads `value` if the program declares `name`.
    fn upload_f32(&mut self, name: &str, value: f32) {
        if let Some(location) = self.uniform_location(name) {
            self.set_f32(location, value);
        }
    }
}

/// Buffer and texture management plus indexed drawing.
pub trait RenderBackend {
    /// Uploads interleaved vertex bytes and u16 triangle indices.
    fn upload_mesh(&mut self, vertices: &[u8], indices: &[u16]) -> MeshId;

    /// Creates a texture from decoded RGBA pixels and sampler settings.
    fn create_texture(&mut self, texture: &Texture) -> TextureId;

    /// The texture bound for meshes without one of their own.
    ///
    /// Implementations typically create [`Texture::white`] once and cache it.
    fn white_texture(&mut self) -> TextureId;

    fn bind_texture(&mut self, texture: TextureId);

    /// Draws `index_count` indices from previously uploaded buffers as
    /// triangles.
    fn draw_indexed(&mut self, mesh: MeshId, index_count: u32);
}
