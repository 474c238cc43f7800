//! glTF 2.0 / GLB loading into a [`Model`].
//!
//! The loader:
//!
//! 1. parses the container (GLB chunks or plain JSON),
//! 2. resolves every buffer (GLB binary chunk, `data:` URI, or a fetch),
//! 3. resolves global node matrices for the default scene,
//! 4. walks mesh-bearing nodes depth-first and bakes each node's matrix into
//!    the first primitive's vertex positions.
//!
//! Only triangle lists with u16-addressable vertices are accepted. Extra
//! primitives and extra scenes are ignored with a warning.
//!
//! # Example
//!
//! ```no_run
//! use stardrift::GltfLoader;
//!
//! let loader = GltfLoader::from_dir("assets");
//! let model = loader.load_blocking("ship.glb")?;
//! println!("{} meshes", model.meshes.len());
//! # Ok::<(), stardrift::LoadError>(())
//! ```

pub mod accessor;
pub mod document;
pub mod fetch;
pub mod glb;
pub mod scene_graph;
pub mod uri;

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3};
use log::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::mesh::{Material, Mesh, Vertex};
use crate::model::Model;
use crate::texture::{Filter, Texture};

use accessor::{AccessorData, AccessorLayout, ComponentType, ElementShape, decode_accessor};
use document::{Document, MODE_TRIANGLES, PbrMetallicRoughness, Primitive, lookup};
pub use fetch::{FileFetcher, MemoryFetcher, ResourceFetcher};

/// Vertices addressable by 16-bit indices.
const MAX_VERTICES: usize = u16::MAX as usize + 1;
/// Upper bound on index accessor length.
const MAX_INDICES: usize = 1 << 24;

/// Loader settings.
#[derive(Clone, Debug, Default)]
pub struct LoaderConfig {
    /// Filtering for decoded textures.
    pub filter: Filter,
}

/// Builds [`Model`]s from glTF and GLB files.
#[derive(Debug)]
pub struct GltfLoader<F = FileFetcher> {
    fetcher: F,
    config: LoaderConfig,
}

impl GltfLoader<FileFetcher> {
    /// A loader reading files below `base`.
    pub fn from_dir(base: impl Into<PathBuf>) -> Self {
        Self::new(FileFetcher::new(base))
    }
}

impl<F: ResourceFetcher> GltfLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetches `uri` and parses it as GLB (by `.glb` extension or magic
    /// bytes) or as glTF JSON. Relative resources resolve against `uri`.
    pub async fn load(&self, uri: &str) -> Result<Model> {
        let bytes = self.fetcher.fetch(uri).await?;
        if uri.to_ascii_lowercase().ends_with(".glb") || glb::is_glb(&bytes) {
            self.parse_glb_at(&bytes, uri).await
        } else {
            self.parse_gltf_at(&bytes, uri).await
        }
    }

    /// Parses an in-memory GLB file.
    pub async fn parse_glb(&self, bytes: &[u8]) -> Result<Model> {
        self.parse_glb_at(bytes, "").await
    }

    /// Parses an in-memory glTF JSON document.
    pub async fn parse_gltf(&self, json: &[u8]) -> Result<Model> {
        self.parse_gltf_at(json, "").await
    }

    /// [`GltfLoader::load`], driven to completion on the current thread.
    pub fn load_blocking(&self, uri: &str) -> Result<Model> {
        pollster::block_on(self.load(uri))
    }

    async fn parse_glb_at(&self, bytes: &[u8], origin: &str) -> Result<Model> {
        let container = glb::parse(bytes)?;
        debug!(
            "[gltf] GLB: {} byte JSON chunk, BIN chunk {}",
            container.json.len(),
            container.bin.map_or(0, <[u8]>::len)
        );
        let doc = Document::from_slice(container.json)?;
        let buffers = self.resolve_buffers(&doc, container.bin, origin).await?;
        self.build(&doc, &buffers, origin).await
    }

    async fn parse_gltf_at(&self, json: &[u8], origin: &str) -> Result<Model> {
        debug!("[gltf] glTF JSON document, {} bytes", json.len());
        let doc = Document::from_slice(json)?;
        let buffers = self.resolve_buffers(&doc, None, origin).await?;
        self.build(&doc, &buffers, origin).await
    }

    /// Loads every buffer in declaration order.
    async fn resolve_buffers(
        &self,
        doc: &Document,
        bin: Option<&[u8]>,
        origin: &str,
    ) -> Result<Vec<Vec<u8>>> {
        let mut buffers = Vec::with_capacity(doc.buffers.len());
        for (index, buffer) in doc.buffers.iter().enumerate() {
            let data = match (&buffer.uri, bin) {
                (Some(uri), _) => self.fetch_uri(uri, origin).await?,
                (None, Some(bin)) if index == 0 => bin.to_vec(),
                (None, _) => {
                    return Err(LoadError::malformed(format!(
                        "buffer {index} has no uri and no GLB binary chunk backs it"
                    )));
                }
            };
            if data.len() < buffer.byte_length {
                return Err(LoadError::malformed(format!(
                    "buffer {index} holds {} bytes, {} declared",
                    data.len(),
                    buffer.byte_length
                )));
            }
            buffers.push(data);
        }
        debug!("[gltf] resolved {} buffer(s)", buffers.len());
        Ok(buffers)
    }

    async fn fetch_uri(&self, uri: &str, origin: &str) -> Result<Vec<u8>> {
        if uri::is_data_uri(uri) {
            return Ok(uri::parse_data_uri(uri)?.data);
        }
        self.fetcher.fetch(&uri::resolve_relative(origin, uri)).await
    }

    async fn build(&self, doc: &Document, buffers: &[Vec<u8>], origin: &str) -> Result<Model> {
        let roots = if doc.scenes.is_empty() {
            debug!("[gltf] no scenes defined, using parentless nodes as roots");
            scene_graph::parentless(&doc.nodes)
        } else {
            let index = doc.scene.unwrap_or(0);
            if doc.scenes.len() > 1 {
                warn!(
                    "[gltf] {} scenes defined, loading only scene {index}",
                    doc.scenes.len()
                );
            }
            lookup(&doc.scenes, index, "scene")?.nodes.clone()
        };

        let scene = scene_graph::resolve(&doc.nodes, &roots)?;
        debug!(
            "[gltf] {} node visit(s) from {} root(s)",
            scene.visits.len(),
            roots.len()
        );

        let mut extractor = Extractor {
            loader: self,
            doc,
            buffers,
            origin,
            textures: HashMap::new(),
        };

        let mut model = Model::new();
        for visit in &scene.visits {
            let Some(mesh_index) = doc.nodes[visit.node].mesh else {
                continue;
            };
            if let Some(mesh) = extractor.mesh(mesh_index, &visit.global).await? {
                model.meshes.push(mesh);
            }
        }

        let bounds = model.bounds();
        info!(
            "[gltf] loaded {} mesh(es), {} texture(s), bounds {:?}..{:?}",
            model.meshes.len(),
            extractor.textures.len(),
            bounds.min,
            bounds.max
        );
        Ok(model)
    }
}

/// Per-load state: the parsed document, its buffers and decoded images.
struct Extractor<'a, F> {
    loader: &'a GltfLoader<F>,
    doc: &'a Document,
    buffers: &'a [Vec<u8>],
    origin: &'a str,
    /// Decoded images keyed by image index.
    textures: HashMap<usize, Arc<Texture>>,
}

impl<F: ResourceFetcher> Extractor<'_, F> {
    /// Builds the mesh for `mesh_index` placed by `global`.
    ///
    /// Returns `None` when the material's base color alpha is exactly zero.
    async fn mesh(&mut self, mesh_index: usize, global: &Mat4) -> Result<Option<Mesh>> {
        let doc = self.doc;
        let def = lookup(&doc.meshes, mesh_index, "mesh")?;
        let primitive = def
            .primitives
            .first()
            .ok_or_else(|| LoadError::malformed(format!("mesh {mesh_index} has no primitives")))?;
        if def.primitives.len() > 1 {
            warn!(
                "[gltf] mesh {mesh_index} has {} primitives, using the first",
                def.primitives.len()
            );
        }
        if let Some(mode) = primitive.mode.filter(|&mode| mode != MODE_TRIANGLES) {
            return Err(LoadError::unsupported(format!(
                "primitive mode {mode} in mesh {mesh_index}"
            )));
        }

        let Some(material) = self.material(primitive).await? else {
            debug!("[gltf] mesh {mesh_index} dropped: base color alpha is zero");
            return Ok(None);
        };

        let mut mesh = self.geometry(primitive, global)?;
        mesh.material = material;
        debug!(
            "[gltf] mesh {mesh_index}: {} vertices, {} indices",
            mesh.vertex_count(),
            mesh.index_count()
        );
        Ok(Some(mesh))
    }

    /// Resolves the primitive's material; `None` means "discard the mesh".
    async fn material(&mut self, primitive: &Primitive) -> Result<Option<Material>> {
        let mut material = Material::default();
        let Some(index) = primitive.material else {
            return Ok(Some(material));
        };

        let doc = self.doc;
        let def = lookup(&doc.materials, index, "material")?;
        let pbr: Cow<'_, PbrMetallicRoughness> = match &def.pbr_metallic_roughness {
            Some(pbr) => Cow::Borrowed(pbr),
            None => Cow::Owned(PbrMetallicRoughness::default()),
        };

        material.roughness = pbr.roughness_factor.unwrap_or(1.0);
        material.metallic = pbr.metallic_factor.unwrap_or(0.0);
        if let Some([r, g, b, a]) = pbr.base_color_factor {
            if a == 0.0 {
                return Ok(None);
            }
            material.base_color = Vec3::new(r, g, b);
            material.alpha = a;
        }
        if let Some(emissive) = def.emissive_factor {
            material.emissive = Vec3::from(emissive);
        }
        if let Some(info) = &pbr.base_color_texture {
            material.texture = Some(self.texture(info.index).await?);
        }
        Ok(Some(material))
    }

    /// Decodes the image behind texture `index`, once per image.
    async fn texture(&mut self, index: usize) -> Result<Arc<Texture>> {
        let doc = self.doc;
        let def = lookup(&doc.textures, index, "texture")?;
        let source = def
            .source
            .ok_or_else(|| LoadError::unsupported(format!("texture {index} has no image source")))?;
        if let Some(texture) = self.textures.get(&source) {
            return Ok(Arc::clone(texture));
        }

        let image = lookup(&doc.images, source, "image")?;
        let (label, bytes): (String, Cow<'_, [u8]>) = match (image.buffer_view, &image.uri) {
            (Some(view), _) => (format!("image {source}"), Cow::Borrowed(self.view_bytes(view)?)),
            (None, Some(uri)) => (
                uri::resolve_relative(self.origin, uri),
                Cow::Owned(self.loader.fetch_uri(uri, self.origin).await?),
            ),
            (None, None) => {
                return Err(LoadError::unsupported(format!(
                    "image {source} has neither bufferView nor uri"
                )));
            }
        };

        let texture = Texture::from_bytes(&bytes, self.loader.config.filter)
            .map_err(|err| LoadError::fetch(label, err))?;
        debug!(
            "[gltf] image {source}: {}x{} {}",
            texture.width,
            texture.height,
            image.mime_type.as_deref().unwrap_or("(no mime type)")
        );

        let texture = Arc::new(texture);
        self.textures.insert(source, Arc::clone(&texture));
        Ok(texture)
    }

    /// Reads positions, normals, uvs and indices into a mesh, baking
    /// `global` into positions and normals.
    fn geometry(&self, primitive: &Primitive, global: &Mat4) -> Result<Mesh> {
        let attribute = |name: &str| primitive.attributes.get(name).copied();

        let position_index =
            attribute("POSITION").ok_or_else(|| LoadError::MissingAttribute("POSITION".into()))?;
        let index_accessor = primitive
            .indices
            .ok_or_else(|| LoadError::MissingAttribute("indices".into()))?;

        let positions = self.read_floats(position_index, ElementShape::Vec3, "POSITION")?;
        let vertex_count = positions.len() / 3;
        let normals = attribute("NORMAL")
            .map(|index| self.read_floats(index, ElementShape::Vec3, "NORMAL"))
            .transpose()?;
        let uvs = attribute("TEXCOORD_0")
            .map(|index| self.read_floats(index, ElementShape::Vec2, "TEXCOORD_0"))
            .transpose()?;

        for (name, values, width) in [("NORMAL", &normals, 3), ("TEXCOORD_0", &uvs, 2)] {
            if let Some(values) = values {
                if values.len() / width != vertex_count {
                    return Err(LoadError::malformed(format!(
                        "{name} has {} elements, POSITION has {vertex_count}",
                        values.len() / width
                    )));
                }
            }
        }

        let normal_matrix = Mat3::from_mat4(*global).inverse().transpose();
        let mut mesh = Mesh::new();
        for v in 0..vertex_count {
            let position = global.transform_point3(Vec3::from_slice(&positions[v * 3..]));
            let normal = match &normals {
                Some(normals) => (normal_matrix * Vec3::from_slice(&normals[v * 3..]))
                    .normalize_or(Vec3::Z),
                None => Vec3::Z,
            };
            let uv = match &uvs {
                Some(uvs) => [uvs[v * 2], uvs[v * 2 + 1]],
                None => [0.0, 0.0],
            };
            mesh.push_vertex(Vertex::new(position.to_array(), normal.to_array(), uv));
        }

        let (_, data) = self.read_accessor(index_accessor, MAX_INDICES, "indices")?;
        let indices = data.into_indices()?;
        if indices.len() % 3 != 0 {
            return Err(LoadError::malformed(format!(
                "{} indices do not form whole triangles",
                indices.len()
            )));
        }
        for triangle in indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| {
                u16::try_from(i)
                    .ok()
                    .filter(|&i| usize::from(i) < vertex_count)
                    .ok_or_else(|| {
                        LoadError::malformed(format!(
                            "index {i} out of range for {vertex_count} vertices"
                        ))
                    })
            });
            mesh.push_triangle(a?, b?, c?);
        }

        Ok(mesh)
    }

    /// Reads vertex attribute accessor `index` as floats, checking it has
    /// `shape`.
    fn read_floats(&self, index: usize, shape: ElementShape, name: &str) -> Result<Vec<f32>> {
        let (actual, data) = self.read_accessor(index, MAX_VERTICES, name)?;
        if actual != shape {
            return Err(LoadError::unsupported(format!(
                "{name} accessor is {actual:?}, expected {shape:?}"
            )));
        }
        if self.doc.accessors[index].normalized {
            Ok(data.into_normalized_f32())
        } else {
            Ok(data.into_f32())
        }
    }

    /// Decodes accessor `index`, rejecting more than `max_count` elements
    /// before anything is allocated.
    fn read_accessor(
        &self,
        index: usize,
        max_count: usize,
        name: &str,
    ) -> Result<(ElementShape, AccessorData)> {
        let accessor = lookup(&self.doc.accessors, index, "accessor")?;
        let component_type = ComponentType::try_from(accessor.component_type)?;
        let shape: ElementShape = accessor.kind.parse()?;
        if accessor.count > max_count {
            return Err(LoadError::unsupported(format!(
                "{name} accessor has {} elements, at most {max_count} are supported",
                accessor.count
            )));
        }

        let mut layout = AccessorLayout {
            component_type,
            shape,
            count: accessor.count,
            byte_offset: accessor.byte_offset,
            byte_stride: None,
        };

        let data = match accessor.buffer_view {
            Some(view_index) => {
                let view = lookup(&self.doc.buffer_views, view_index, "bufferView")?;
                layout.byte_stride = view.byte_stride;
                decode_accessor(self.view_bytes(view_index)?, &layout)?
            }
            None => AccessorData::zeroed(component_type, accessor.count * shape.components()),
        };
        Ok((shape, data))
    }

    /// The bytes covered by buffer view `index`.
    fn view_bytes(&self, index: usize) -> Result<&[u8]> {
        let view = lookup(&self.doc.buffer_views, index, "bufferView")?;
        let buffer = lookup(self.buffers, view.buffer, "buffer")?;
        view.byte_offset
            .checked_add(view.byte_length)
            .and_then(|end| buffer.get(view.byte_offset..end))
            .ok_or_else(|| {
                LoadError::malformed(format!(
                    "bufferView {index} spans past the end of buffer {}",
                    view.buffer
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Aabb;
    use serde_json::{Value, json};

    const POSITIONS: [[f32; 3]; 3] = [[0.0, 1.0, 0.0], [-1.0, -2.0, 0.5], [3.0, 0.0, -1.0]];

    /// Positions (36 bytes) then u16 indices 0,1,2 (6 bytes + 2 padding).
    fn triangle_bin() -> Vec<u8> {
        let mut bin: Vec<u8> = POSITIONS
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        for i in [0u16, 1, 2] {
            bin.extend(i.to_le_bytes());
        }
        bin.extend([0, 0]);
        bin
    }

    fn triangle_doc(buffer_uri: Option<&str>) -> Value {
        let mut buffer = json!({ "byteLength": 44 });
        if let Some(uri) = buffer_uri {
            buffer["uri"] = json!(uri);
        }
        json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "buffers": [buffer]
        })
    }

    fn embedded_doc() -> Value {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            uri::tests::base64_encode(&triangle_bin())
        );
        triangle_doc(Some(&uri))
    }

    fn loader() -> GltfLoader<MemoryFetcher> {
        GltfLoader::new(MemoryFetcher::new())
    }

    fn parse(doc: &Value) -> Result<Model> {
        pollster::block_on(loader().parse_gltf(doc.to_string().as_bytes()))
    }

    fn parse_glb(doc: &Value, bin: &[u8]) -> Result<Model> {
        let glb = glb::tests::build_glb(doc.to_string().as_bytes(), Some(bin));
        pollster::block_on(loader().parse_glb(&glb))
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn single_triangle_end_to_end() {
        let model = parse(&embedded_doc()).unwrap();

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(
            mesh.bounds,
            Aabb::new(Vec3::new(-1.0, -2.0, -1.0), Vec3::new(3.0, 1.0, 0.5))
        );
        for (vertex, position) in mesh.vertices().iter().zip(POSITIONS) {
            assert_eq!(vertex.position, position);
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
            assert_eq!(vertex.uv, [0.0, 0.0]);
        }
    }

    #[test]
    fn glb_with_binary_chunk() {
        let model = parse_glb(&triangle_doc(None), &triangle_bin()).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].vertex_count(), 3);
    }

    #[test]
    fn glb_with_wrong_magic_is_malformed() {
        let mut glb = glb::tests::build_glb(triangle_doc(None).to_string().as_bytes(), None);
        glb[..4].copy_from_slice(b"GLTF");
        let result = pollster::block_on(loader().parse_glb(&glb));
        assert!(matches!(result, Err(LoadError::MalformedContainer(_))));
    }

    #[test]
    fn load_detects_container_and_resolves_siblings() {
        let fetcher = MemoryFetcher::new()
            .with(
                "models/tri.gltf",
                triangle_doc(Some("tri.bin")).to_string().into_bytes(),
            )
            .with("models/tri.bin", triangle_bin())
            .with(
                "models/tri.model",
                glb::tests::build_glb(triangle_doc(None).to_string().as_bytes(), Some(&triangle_bin())),
            );
        let loader = GltfLoader::new(fetcher);

        let from_json = pollster::block_on(loader.load("models/tri.gltf")).unwrap();
        assert_eq!(from_json.meshes.len(), 1);

        // No .glb extension: detected by magic.
        let from_glb = pollster::block_on(loader.load("models/tri.model")).unwrap();
        assert_eq!(from_glb.meshes[0].bounds, from_json.meshes[0].bounds);
    }

    #[test]
    fn missing_external_buffer_fails_fetch() {
        let result = parse(&triangle_doc(Some("nowhere.bin")));
        match result {
            Err(LoadError::ResourceFetchFailed { uri, .. }) => assert_eq!(uri, "nowhere.bin"),
            other => panic!("expected fetch failure, got {other:?}"),
        }
    }

    #[test]
    fn node_transform_is_baked_into_vertices() {
        let mut doc = embedded_doc();
        doc["nodes"] = json!([
            { "translation": [10, 0, 0], "children": [1] },
            { "translation": [0, 5, 0], "mesh": 0 }
        ]);
        let model = parse(&doc).unwrap();

        let bounds = model.meshes[0].bounds;
        assert!(bounds.min.abs_diff_eq(Vec3::new(9.0, 3.0, -1.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(13.0, 6.0, 0.5), 1e-6));
    }

    #[test]
    fn rotated_node_rotates_normals() {
        let mut doc = embedded_doc();
        let normals: Vec<u8> = [[0.0f32, 0.0, 1.0]; 3]
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut bin = triangle_bin();
        bin.extend(&normals);
        doc["buffers"] = json!([{
            "byteLength": bin.len(),
            "uri": format!("data:;base64,{}", uri::tests::base64_encode(&bin))
        }]);
        doc["bufferViews"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "buffer": 0, "byteOffset": 44, "byteLength": 36 }));
        doc["accessors"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC3" }));
        doc["meshes"][0]["primitives"][0]["attributes"]["NORMAL"] = json!(2);
        // Quarter turn about Y: +Z becomes +X.
        let half = std::f32::consts::FRAC_1_SQRT_2;
        doc["nodes"][0]["rotation"] = json!([0.0, half, 0.0, half]);

        let model = parse(&doc).unwrap();
        let normal = Vec3::from(model.meshes[0].vertices()[0].normal);
        assert!(normal.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn zero_alpha_primitive_is_dropped() {
        let mut doc = embedded_doc();
        doc["materials"] = json!([{ "pbrMetallicRoughness": { "baseColorFactor": [1, 0, 0, 0] } }]);
        doc["meshes"][0]["primitives"][0]["material"] = json!(0);

        let model = parse(&doc).unwrap();
        assert!(model.meshes.is_empty());
    }

    #[test]
    fn material_factors_and_emissive() {
        let mut doc = embedded_doc();
        doc["materials"] = json!([{
            "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1, 0.75], "metallicFactor": 0.5 },
            "emissiveFactor": [1, 0.5, 0]
        }]);
        doc["meshes"][0]["primitives"][0]["material"] = json!(0);

        let model = parse(&doc).unwrap();
        let material = &model.meshes[0].material;
        assert_eq!(material.base_color, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(material.alpha, 0.75);
        assert_eq!(material.emissive, Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(material.roughness, 1.0);
        assert_eq!(material.metallic, 0.5);
        assert!(material.texture.is_none());
    }

    #[test]
    fn missing_position_or_indices() {
        let mut doc = embedded_doc();
        doc["meshes"][0]["primitives"][0]["attributes"] = json!({ "NORMAL": 0 });
        assert!(matches!(parse(&doc), Err(LoadError::MissingAttribute(name)) if name == "POSITION"));

        let mut doc = embedded_doc();
        doc["meshes"][0]["primitives"][0]
            .as_object_mut()
            .unwrap()
            .remove("indices");
        assert!(matches!(parse(&doc), Err(LoadError::MissingAttribute(name)) if name == "indices"));
    }

    #[test]
    fn unsupported_component_type() {
        let mut doc = embedded_doc();
        doc["accessors"][0]["componentType"] = json!(5130);
        assert!(matches!(parse(&doc), Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn non_triangle_mode_is_unsupported() {
        let mut doc = embedded_doc();
        doc["meshes"][0]["primitives"][0]["mode"] = json!(1);
        assert!(matches!(parse(&doc), Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn out_of_range_references_are_malformed() {
        let mut doc = embedded_doc();
        doc["nodes"][0]["mesh"] = json!(3);
        assert!(matches!(parse(&doc), Err(LoadError::MalformedContainer(_))));

        let mut doc = embedded_doc();
        doc["accessors"][1]["count"] = json!(2);
        assert!(matches!(parse(&doc), Err(LoadError::MalformedContainer(_))));

        let mut doc = embedded_doc();
        doc["meshes"][0]["primitives"] = json!([]);
        assert!(matches!(parse(&doc), Err(LoadError::MalformedContainer(_))));
    }

    #[test]
    fn index_past_vertex_count_is_malformed() {
        let mut bin = triangle_bin();
        bin[40..42].copy_from_slice(&9u16.to_le_bytes());
        let result = parse_glb(&triangle_doc(None), &bin);
        assert!(matches!(result, Err(LoadError::MalformedContainer(_))));
    }

    #[test]
    fn cyclic_nodes_fail() {
        let mut doc = embedded_doc();
        doc["nodes"] = json!([{ "mesh": 0, "children": [1] }, { "children": [0] }]);
        assert!(matches!(parse(&doc), Err(LoadError::SceneGraphCycle(0))));
    }

    #[test]
    fn bad_json_is_parse_failure() {
        let result = pollster::block_on(loader().parse_gltf(b"{\"nodes\": [}"));
        assert!(matches!(result, Err(LoadError::ParseFailed(_))));
    }

    #[test]
    fn embedded_texture_is_decoded_once() {
        let image = png(4, 4);
        let mut bin = triangle_bin();
        bin.extend(&image);

        let mut doc = triangle_doc(None);
        doc["buffers"][0]["byteLength"] = json!(bin.len());
        doc["bufferViews"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "buffer": 0, "byteOffset": 44, "byteLength": image.len() }));
        doc["images"] = json!([{ "bufferView": 2, "mimeType": "image/png" }]);
        doc["textures"] = json!([{ "source": 0 }]);
        doc["materials"] = json!([{ "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }]);
        doc["meshes"][0]["primitives"][0]["material"] = json!(0);
        doc["nodes"] = json!([{ "mesh": 0 }, { "mesh": 0, "translation": [0, 0, -5] }]);
        doc["scenes"] = json!([{ "nodes": [0, 1] }]);

        let model = parse_glb(&doc, &bin).unwrap();
        assert_eq!(model.meshes.len(), 2);

        let a = model.meshes[0].material.texture.as_ref().unwrap();
        let b = model.meshes[1].material.texture.as_ref().unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!((a.width, a.height), (4, 4));
        assert!(a.sampler.mipmaps);
        assert_eq!(a.sampler.filter, Filter::Linear);

        let nearest = GltfLoader::new(MemoryFetcher::new()).with_config(LoaderConfig {
            filter: Filter::Nearest,
        });
        let glb = glb::tests::build_glb(doc.to_string().as_bytes(), Some(bin.as_slice()));
        let model = pollster::block_on(nearest.parse_glb(&glb)).unwrap();
        let texture = model.meshes[0].material.texture.as_ref().unwrap();
        assert_eq!(texture.sampler.filter, Filter::Nearest);
    }

    #[test]
    fn undecodable_image_fails_fetch() {
        let mut doc = embedded_doc();
        doc["images"] = json!([{ "uri": "data:image/png;base64,AAAA" }]);
        doc["textures"] = json!([{ "source": 0 }]);
        doc["materials"] = json!([{ "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }]);
        doc["meshes"][0]["primitives"][0]["material"] = json!(0);

        assert!(matches!(parse(&doc), Err(LoadError::ResourceFetchFailed { .. })));
    }

    #[test]
    fn scene_defaults_to_first_and_falls_back_to_roots() {
        let mut doc = embedded_doc();
        doc.as_object_mut().unwrap().remove("scene");
        assert_eq!(parse(&doc).unwrap().meshes.len(), 1);

        doc.as_object_mut().unwrap().remove("scenes");
        assert_eq!(parse(&doc).unwrap().meshes.len(), 1);
    }

    #[test]
    fn strided_positions_are_read() {
        // Positions interleaved with 4 bytes of padding per vertex.
        let mut bin = Vec::new();
        for p in POSITIONS {
            for v in p {
                bin.extend(v.to_le_bytes());
            }
            bin.extend([0xAA; 4]);
        }
        for i in [0u16, 1, 2] {
            bin.extend(i.to_le_bytes());
        }
        bin.extend([0, 0]);

        let mut doc = triangle_doc(None);
        doc["buffers"][0]["byteLength"] = json!(bin.len());
        doc["bufferViews"] = json!([
            { "buffer": 0, "byteOffset": 0, "byteLength": 48, "byteStride": 16 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 6 }
        ]);

        let model = parse_glb(&doc, &bin).unwrap();
        let positions: Vec<[f32; 3]> = model.meshes[0].vertices().iter().map(|v| v.position).collect();
        assert_eq!(positions, POSITIONS.to_vec());
    }

    #[test]
    fn oversized_accessor_without_buffer_view_is_rejected() {
        let mut doc = embedded_doc();
        doc["accessors"][0] = json!({ "componentType": 5126, "count": 4_000_000_000u64, "type": "VEC3" });
        assert!(matches!(parse(&doc), Err(LoadError::UnsupportedFormat(_))));

        let mut doc = embedded_doc();
        doc["accessors"][1] = json!({ "componentType": 5125, "count": 4_000_000_000u64, "type": "SCALAR" });
        assert!(matches!(parse(&doc), Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn accessor_without_buffer_view_reads_zeros() {
        let mut doc = embedded_doc();
        doc["meshes"][0]["primitives"][0]["attributes"]["TEXCOORD_0"] = json!(2);
        doc["accessors"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "componentType": 5126, "count": 3, "type": "VEC2" }));

        let model = parse(&doc).unwrap();
        assert!(model.meshes[0].vertices().iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn normalized_texcoords_are_scaled() {
        let mut bin = triangle_bin();
        bin.extend([0, 255, 255, 0, 51, 102]);

        let mut doc = triangle_doc(None);
        doc["buffers"][0]["byteLength"] = json!(bin.len());
        doc["meshes"][0]["primitives"][0]["attributes"]["TEXCOORD_0"] = json!(2);
        doc["bufferViews"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "buffer": 0, "byteOffset": 44, "byteLength": 6 }));
        doc["accessors"].as_array_mut().unwrap().push(json!({
            "bufferView": 2, "componentType": 5121, "normalized": true, "count": 3, "type": "VEC2"
        }));

        let model = parse_glb(&doc, &bin).unwrap();
        let uvs: Vec<[f32; 2]> = model.meshes[0].vertices().iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 1.0], [1.0, 0.0], [0.2, 0.4]]);

        doc["accessors"][2]["normalized"] = json!(false);
        let model = parse_glb(&doc, &bin).unwrap();
        assert_eq!(model.meshes[0].vertices()[0].uv, [0.0, 255.0]);
    }
}
