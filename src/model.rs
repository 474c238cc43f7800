use std::collections::HashMap;
use std::sync::Arc;

use crate::bounds::Aabb;
use crate::frustum::Frustum;
use crate::mesh::Mesh;
use crate::render::{RenderBackend, ShaderProgram, uniforms};
use crate::transform::Transform;

/// A loaded asset: meshes with node transforms baked into their vertices,
/// placed as a whole by one [`Transform`].
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub transform: Transform,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of all mesh bounds, in model space.
    pub fn bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .filter(|mesh| !mesh.bounds.is_empty())
            .fold(Aabb::EMPTY, |mut acc, mesh| {
                acc.extend(mesh.bounds.min);
                acc.extend(mesh.bounds.max);
                acc
            })
    }

    /// Model bounds moved into world space by the model transform.
    pub fn world_bounds(&self) -> Aabb {
        self.bounds().transformed(&self.transform.matrix())
    }

    /// Returns true unless the frustum rejects the world bounds.
    pub fn is_visible(&self, frustum: &Frustum) -> bool {
        let bounds = self.world_bounds();
        bounds.is_empty() || frustum.contains_aabb(&bounds)
    }

    /// Uploads every mesh. Meshes sharing a decoded image share one backend
    /// texture.
    pub fn upload(&mut self, backend: &mut impl RenderBackend) {
        let mut created = HashMap::new();
        for mesh in self.meshes.iter_mut().filter(|mesh| !mesh.is_uploaded()) {
            let texture = mesh.material.texture.clone().map(|texture| {
                *created
                    .entry(Arc::as_ptr(&texture))
                    .or_insert_with(|| backend.create_texture(&texture))
            });
            mesh.upload_with_texture(backend, texture);
        }
    }

    /// Uploads the model matrix and draws every mesh.
    ///
    /// With a frustum, the whole model is skipped when its world bounds are
    /// outside. Returns whether anything was drawn.
    pub fn render<S: ShaderProgram>(
        &self,
        shader: &mut S,
        backend: &mut impl RenderBackend,
        frustum: Option<&Frustum>,
    ) -> bool {
        self.render_at(&self.transform, shader, backend, frustum)
    }

    /// Like [`Model::render`], placed by `transform` instead of the model's
    /// own. Lets several entities share one loaded model.
    pub fn render_at<S: ShaderProgram>(
        &self,
        transform: &Transform,
        shader: &mut S,
        backend: &mut impl RenderBackend,
        frustum: Option<&Frustum>,
    ) -> bool {
        let matrix = transform.matrix();
        if let Some(frustum) = frustum {
            let bounds = self.bounds().transformed(&matrix);
            if !bounds.is_empty() && !frustum.contains_aabb(&bounds) {
                return false;
            }
        }

        shader.use_program();
        shader.upload_mat4(uniforms::MODEL_MATRIX, &matrix);
        for mesh in &self.meshes {
            mesh.render(shader, backend);
        }
        true
    }
}
