//! # Stardrift
//!
//! **The scene core of a small planet-flyer: glTF/GLB loading, transforms,
//! a free-fly camera and frustum culling.**
//!
//! Stardrift never talks to a graphics API. Meshes, textures and uniforms go
//! through two capability traits, [`RenderBackend`] and [`ShaderProgram`],
//! that the host implements for whatever it renders with.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stardrift::*;
//!
//! # fn run(backend: &mut impl RenderBackend, shader: &mut impl ShaderProgram) -> Result<()> {
//! let loader = GltfLoader::from_dir("assets/models");
//! let mut ship = loader.load_blocking("ship.glb")?;
//! ship.upload(backend);
//!
//! let mut camera = Camera::new(Vec3::new(0.0, 20.0, 60.0));
//! camera.update(Vec2::new(1280.0, 720.0));
//! camera.bind(shader);
//!
//! ship.transform.set_position(0.0, 0.0, -10.0);
//! ship.render(shader, backend, Some(camera.frustum()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Pieces
//!
//! - [`Transform`] memoizes its matrix behind a dirty flag.
//! - [`Camera`] runs scripted or free-fly and keeps its [`Frustum`] current.
//! - [`GltfLoader`] builds a [`Model`] with node transforms baked into vertices.
//! - [`Stage`] ticks entities, the camera and the render pass in a fixed order.

mod bounds;
mod camera;
mod error;
mod frustum;
pub mod gltf;
mod input;
mod mesh;
mod model;
mod render;
mod stage;
mod texture;
mod transform;

pub use bounds::Aabb;
pub use camera::{Camera, CameraConfig, CameraMode};
pub use error::{LoadError, Result};
pub use frustum::{Frustum, plane};
pub use gltf::{FileFetcher, GltfLoader, LoaderConfig, MemoryFetcher, ResourceFetcher};
pub use input::{Input, InputState};
pub use mesh::{Material, Mesh, Vertex};
pub use model::Model;
pub use render::{MeshId, RenderBackend, ShaderProgram, TextureId, uniforms};
pub use stage::{Entity, RenderContext, Stage, UpdateContext};
pub use texture::{Filter, SamplerParams, Texture, Wrap};
pub use transform::Transform;

// Re-export glam types for convenience
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export winit input types used by InputState
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
