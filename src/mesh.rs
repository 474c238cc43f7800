//! Triangle meshes with a single PBR-lite material.
//!
//! - [`Vertex`]: interleaved position/normal/uv, laid out for direct upload
//! - [`Material`]: base color, emissive, roughness/metallic and an optional texture
//! - [`Mesh`]: host-side geometry, its bounding box, and the backend handles
//!   it gets once uploaded
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset |
//! |-----------|-----------|--------|
//! | position  | Float32x3 | 0      |
//! | normal    | Float32x3 | 12     |
//! | uv        | Float32x2 | 24     |
//!
//! 32 bytes per vertex; indices are u16 triangle lists.

use std::sync::Arc;

use glam::Vec3;

use crate::bounds::Aabb;
use crate::render::{MeshId, RenderBackend, ShaderProgram, TextureId, uniforms};
use crate::texture::Texture;

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] lets a slice of vertices be handed to
/// the backend as raw bytes without copying.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Byte distance between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Surface parameters uploaded alongside each mesh.
#[derive(Clone, Debug)]
pub struct Material {
    pub base_color: Vec3,
    /// Alpha from the base color factor. Primitives whose alpha is exactly
    /// zero never become meshes.
    pub alpha: f32,
    pub emissive: Vec3,
    pub roughness: f32,
    pub metallic: f32,
    /// Decoded base color texture, shared between meshes using the same image.
    pub texture: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            alpha: 1.0,
            emissive: Vec3::ZERO,
            roughness: 1.0,
            metallic: 0.0,
            texture: None,
        }
    }
}

/// Backend handles for an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Uploaded {
    mesh: MeshId,
    texture: Option<TextureId>,
}

/// Triangle geometry with a bounding box and material.
///
/// Geometry is built on the host, then [`Mesh::upload`] hands it to the
/// backend and drops the host copies; only the counts stay behind for drawing.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    vertex_count: usize,
    index_count: usize,
    /// Bounds of every position pushed so far.
    pub bounds: Aabb,
    pub material: Material,
    uploaded: Option<Uploaded>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vertex and grows the bounding box around it.
    pub fn push_vertex(&mut self, vertex: Vertex) {
        self.bounds.extend(Vec3::from(vertex.position));
        self.vertices.push(vertex);
        self.vertex_count += 1;
    }

    pub fn push_triangle(&mut self, a: u16, b: u16, c: u16) {
        self.indices.extend_from_slice(&[a, b, c]);
        self.index_count += 3;
    }

    /// Host-side vertices; empty once uploaded.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Host-side indices; empty once uploaded.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded.is_some()
    }

    /// Uploads geometry and texture, then frees the host arrays.
    ///
    /// Does nothing if the mesh is already uploaded.
    pub fn upload(&mut self, backend: &mut impl RenderBackend) {
        if self.is_uploaded() {
            return;
        }
        let texture = self
            .material
            .texture
            .as_deref()
            .map(|texture| backend.create_texture(texture));
        self.upload_with_texture(backend, texture);
    }

    /// Uploads geometry using an already created texture handle.
    pub(crate) fn upload_with_texture(
        &mut self,
        backend: &mut impl RenderBackend,
        texture: Option<TextureId>,
    ) {
        if self.is_uploaded() {
            return;
        }
        let mesh = backend.upload_mesh(bytemuck::cast_slice(&self.vertices), &self.indices);
        self.uploaded = Some(Uploaded { mesh, texture });
        self.vertices = Vec::new();
        self.indices = Vec::new();
    }

    /// Uploads material uniforms, binds the texture and issues the draw.
    ///
    /// Meshes that were never uploaded are skipped.
    pub fn render<S: ShaderProgram>(&self, shader: &mut S, backend: &mut impl RenderBackend) {
        let Some(uploaded) = self.uploaded else {
            return;
        };

        shader.upload_vec3(uniforms::BASE_COLOR, self.material.base_color);
        shader.upload_vec3(uniforms::EMISSIVE, self.material.emissive);
        shader.upload_f32(uniforms::ROUGHNESS, self.material.roughness);
        shader.upload_f32(uniforms::METALLIC, self.material.metallic);

        let texture = match uploaded.texture {
            Some(texture) => texture,
            None => backend.white_texture(),
        };
        backend.bind_texture(texture);
        backend.draw_indexed(uploaded.mesh, self.index_count as u32);
    }
}
