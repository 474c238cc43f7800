//! Headless demo: load a glTF/GLB model, print what was loaded, then fly a
//! scripted camera past it for a few simulated frames and report how often
//! frustum culling kept it off screen.
//!
//! ```text
//! RUST_LOG=debug cargo run -- assets/models/planet.glb
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use stardrift::{
    Camera, Entity, GltfLoader, Input, Mat4, MeshId, Model, RenderBackend, RenderContext,
    ShaderProgram, Stage, Texture, TextureId, Transform, UpdateContext, Vec2, Vec3,
};

const FRAMES: u32 = 120;
const FRAME_TIME: f32 = 1.0 / 60.0;
const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

/// Counts what a real backend would have been asked to do.
#[derive(Default)]
struct CountingBackend {
    meshes: usize,
    textures: usize,
    draws: usize,
    triangles: u64,
}

impl RenderBackend for CountingBackend {
    fn upload_mesh(&mut self, _vertices: &[u8], _indices: &[u16]) -> MeshId {
        self.meshes += 1;
        MeshId(self.meshes - 1)
    }

    fn create_texture(&mut self, _texture: &Texture) -> TextureId {
        self.textures += 1;
        TextureId(self.textures - 1)
    }

    fn white_texture(&mut self) -> TextureId {
        TextureId(usize::MAX)
    }

    fn bind_texture(&mut self, _texture: TextureId) {}

    fn draw_indexed(&mut self, _mesh: MeshId, index_count: u32) {
        self.draws += 1;
        self.triangles += u64::from(index_count / 3);
    }
}

/// Accepts every uniform and discards it.
struct NullShader;

impl ShaderProgram for NullShader {
    type Location = ();

    fn use_program(&mut self) {}

    fn uniform_location(&mut self, _name: &str) -> Option<()> {
        Some(())
    }

    fn set_vec3(&mut self, _location: (), _value: Vec3) {}
    fn set_mat4(&mut self, _location: (), _value: &Mat4) {}
    fn set_f32(&mut self, _location: (), _value: f32) {}
}

/// Slowly spins the model and sweeps the camera around it, far enough that
/// the model leaves the view for part of the orbit.
struct Showcase {
    model: Rc<Model>,
    transform: Transform,
    radius: f32,
    frames_drawn: Rc<std::cell::Cell<u32>>,
}

impl Entity<NullShader, CountingBackend> for Showcase {
    fn update(&mut self, ctx: &mut UpdateContext<'_>, dt: f32) {
        let spin = self.transform.rotation.y + dt * 0.5;
        self.transform.set_rotation(0.0, spin, 0.0);

        let angle = ctx.time * std::f32::consts::TAU / (FRAMES as f32 * FRAME_TIME);
        let eye = Vec3::new(angle.cos(), 0.3, angle.sin()) * self.radius;
        // Look along the orbit tangent half of the time so the model drifts
        // in and out of view.
        let target = if angle.sin() > 0.0 {
            Vec3::ZERO
        } else {
            eye + Vec3::new(-angle.sin(), 0.0, angle.cos())
        };
        ctx.camera.look_at(eye, target);
    }

    fn render(&self, ctx: &mut RenderContext<'_, NullShader, CountingBackend>) {
        let drawn = self.model.render_at(
            &self.transform,
            ctx.shader,
            ctx.backend,
            Some(ctx.camera.frustum()),
        );
        if drawn {
            self.frames_drawn.set(self.frames_drawn.get() + 1);
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: stardrift <model.gltf|model.glb>");
        return ExitCode::FAILURE;
    };

    let path = Path::new(&path);
    let base = path.parent().unwrap_or(Path::new(""));
    let Some(file) = path.file_name().and_then(|f| f.to_str()) else {
        eprintln!("[stardrift] not a file path: {}", path.display());
        return ExitCode::FAILURE;
    };

    let mut model = match GltfLoader::from_dir(base).load_blocking(file) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("[stardrift] failed to load {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    println!("{}: {} mesh(es)", path.display(), model.meshes.len());
    for (i, mesh) in model.meshes.iter().enumerate() {
        let material = &mesh.material;
        println!(
            "  mesh {i}: {} vertices, {} triangles, bounds {:?}..{:?}, base color {:?}, texture {}",
            mesh.vertex_count(),
            mesh.index_count() / 3,
            mesh.bounds.min,
            mesh.bounds.max,
            material.base_color,
            material
                .texture
                .as_ref()
                .map_or("none".to_string(), |t| format!("{}x{}", t.width, t.height)),
        );
    }

    let bounds = model.bounds();
    if bounds.is_empty() {
        println!("nothing to render");
        return ExitCode::SUCCESS;
    }
    println!("model bounds {:?}..{:?}", bounds.min, bounds.max);

    let mut backend = CountingBackend::default();
    model.upload(&mut backend);

    let frames_drawn = Rc::new(std::cell::Cell::new(0));
    let showcase = Showcase {
        model: Rc::new(model),
        // Center the model on the origin so the orbit circles it.
        transform: Transform::from_position(-bounds.center()),
        radius: bounds.size().length().max(1.0) * 1.5,
        frames_drawn: Rc::clone(&frames_drawn),
    };

    let input = Input::new();
    let mut stage = Stage::new(Camera::new(Vec3::ZERO), NullShader, backend);
    stage.add_entity(Box::new(showcase), &input);
    for _ in 0..FRAMES {
        stage.tick(&input, FRAME_TIME, VIEWPORT);
    }

    println!(
        "{FRAMES} frames: model visible in {}, culled in {}; {} draw calls, {} triangles",
        frames_drawn.get(),
        FRAMES - frames_drawn.get(),
        stage.backend.draws,
        stage.backend.triangles
    );
    ExitCode::SUCCESS
}
