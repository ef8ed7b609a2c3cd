//! Asset loading: fetch the texture and the model, decode both, and decorate
//! every mesh of the model graph.
//!
//! Decoding is target-independent; only the network fetch is browser-only.

use glam::Mat4;
use thiserror::Error;

use crate::scene::{rgb, GroupNode, Material, MeshData, MeshNode, ModelGraph, OtherNode, SceneNode};

/// Opacity given to every loaded mesh.
pub const MODEL_OPACITY: f32 = 0.9;
/// Emissive tint added to every loaded mesh.
pub const MODEL_EMISSIVE: u32 = 0x00FFFF;
pub const MODEL_EMISSIVE_INTENSITY: f32 = 0.3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("invalid model: {0}")]
    Model(String),

    #[error("model contains no geometry")]
    NoGeometry,

    #[error("invalid texture: {0}")]
    Texture(String),

    #[error("model has zero or non-finite extent")]
    Degenerate,
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A model ready for display: its node graph and the texture its meshes sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub graph: ModelGraph,
    pub texture: Option<TextureImage>,
}

/// Terminal result of one load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(LoadedModel),
    Failed(LoadError),
}

impl From<Result<LoadedModel, LoadError>> for LoadOutcome {
    fn from(result: Result<LoadedModel, LoadError>) -> Self {
        match result {
            Ok(model) => LoadOutcome::Loaded(model),
            Err(err) => LoadOutcome::Failed(err),
        }
    }
}

/// Progress of the one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PendingLoad {
    progress: f32,
}

impl PendingLoad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Move progress forward to `fraction`, clamped to [0, 1]. Regressions
    /// and NaN are ignored. Returns whether progress changed.
    pub fn advance(&mut self, fraction: f32) -> bool {
        let next = fraction.clamp(0.0, 1.0);
        if next > self.progress {
            self.progress = next;
            true
        } else {
            false
        }
    }
}

/// Decode a binary glTF (`.glb`) with embedded buffers into a model graph.
pub fn parse_model(bytes: &[u8]) -> Result<ModelGraph, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::Model(e.to_string()))?;
    let blob = gltf.blob.as_deref();
    let document = &gltf.document;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::Model("no scenes".into()))?;

    let children = scene
        .nodes()
        .map(|node| convert_node(&node, blob))
        .collect::<Result<Vec<_>, _>>()?;

    let graph = ModelGraph::new(SceneNode::Group(GroupNode {
        name: scene.name().unwrap_or("model").to_string(),
        local: Mat4::IDENTITY,
        children,
    }));

    if graph.vertex_count() == 0 {
        return Err(LoadError::NoGeometry);
    }
    Ok(graph)
}

fn convert_node(node: &gltf::Node<'_>, blob: Option<&[u8]>) -> Result<SceneNode, LoadError> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());

    let mut children = Vec::new();
    if let Some(mesh) = node.mesh() {
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("{name}: skipping non-triangle primitive {i}");
                continue;
            }
            children.push(SceneNode::Mesh(MeshNode {
                name: format!("{name}.{i}"),
                local: Mat4::IDENTITY,
                mesh: read_primitive(&primitive, blob)?,
                material: read_material(&primitive.material()),
                cast_shadow: false,
                receive_shadow: false,
            }));
        }
    }
    let has_mesh = !children.is_empty();
    for child in node.children() {
        children.push(convert_node(&child, blob)?);
    }

    Ok(match children.len() {
        0 => SceneNode::Other(OtherNode { name, local }),
        1 if has_mesh => match children.pop() {
            Some(SceneNode::Mesh(mut mesh)) => {
                mesh.name = name;
                mesh.local = local;
                SceneNode::Mesh(mesh)
            }
            Some(other) => other,
            None => SceneNode::Other(OtherNode { name, local }),
        },
        _ => SceneNode::Group(GroupNode { name, local, children }),
    })
}

fn read_primitive(primitive: &gltf::Primitive<'_>, blob: Option<&[u8]>) -> Result<MeshData, LoadError> {
    let reader = primitive.reader(|buffer| match buffer.source() {
        gltf::buffer::Source::Bin => blob,
        gltf::buffer::Source::Uri(_) => None,
    });

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| LoadError::Model("primitive without positions".into()))?
        .collect();
    let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_default();

    Ok(MeshData {
        positions,
        normals,
        uvs,
        indices,
    }
    .completed())
}

fn read_material(material: &gltf::Material<'_>) -> Material {
    let [r, g, b, a] = material.pbr_metallic_roughness().base_color_factor();
    Material {
        color: [r, g, b],
        opacity: a,
        transparent: material.alpha_mode() == gltf::material::AlphaMode::Blend,
        emissive: material.emissive_factor(),
        ..Material::default()
    }
}

/// Decode PNG or JPEG bytes to RGBA8.
pub fn decode_texture(bytes: &[u8]) -> Result<TextureImage, LoadError> {
    let image = image::load_from_memory(bytes).map_err(|e| LoadError::Texture(e.to_string()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(LoadError::Texture("image has zero size".into()));
    }
    Ok(TextureImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Apply the texture and the hero material settings to every mesh in the graph.
pub fn prepare_model(mut graph: ModelGraph, texture: Option<TextureImage>) -> LoadedModel {
    let textured = texture.is_some();
    graph.for_each_mesh_mut(|node| {
        node.cast_shadow = true;
        node.receive_shadow = true;
        node.material.textured = textured;
        node.material.transparent = true;
        node.material.opacity = MODEL_OPACITY;
        node.material.emissive = rgb(MODEL_EMISSIVE);
        node.material.emissive_intensity = MODEL_EMISSIVE_INTENSITY;
    });
    LoadedModel { graph, texture }
}

/// Combine the two fetch results. A texture failure is logged and the model
/// is shown untextured; a model failure fails the load.
pub fn assemble(
    texture_bytes: Result<Vec<u8>, LoadError>,
    model_bytes: Result<Vec<u8>, LoadError>,
    mut on_progress: impl FnMut(f32),
) -> LoadOutcome {
    let texture = match texture_bytes.and_then(|bytes| decode_texture(&bytes)) {
        Ok(texture) => Some(texture),
        Err(err) => {
            log::warn!("texture unavailable, showing model untextured: {err}");
            None
        }
    };
    on_progress(0.6);

    let graph = match model_bytes.and_then(|bytes| parse_model(&bytes)) {
        Ok(graph) => graph,
        Err(err) => return LoadOutcome::Failed(err),
    };
    on_progress(0.9);

    let model = prepare_model(graph, texture);
    on_progress(1.0);
    LoadOutcome::Loaded(model)
}

#[cfg(target_arch = "wasm32")]
mod fetch {
    use js_sys::Uint8Array;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use super::LoadError;

    fn fetch_error(url: &str, err: JsValue) -> LoadError {
        LoadError::Fetch {
            url: url.to_string(),
            reason: err.as_string().unwrap_or_else(|| format!("{err:?}")),
        }
    }

    /// Issue the request immediately; the returned future resolves to the
    /// response.
    pub fn start(url: &str) -> Result<JsFuture, LoadError> {
        let window = web_sys::window().ok_or_else(|| LoadError::Fetch {
            url: url.to_string(),
            reason: "no window".into(),
        })?;
        Ok(JsFuture::from(window.fetch_with_str(url)))
    }

    pub async fn body(url: &str, request: JsFuture) -> Result<Vec<u8>, LoadError> {
        let response: web_sys::Response = request
            .await
            .map_err(|e| fetch_error(url, e))?
            .dyn_into()
            .map_err(|e| fetch_error(url, e))?;
        if !response.ok() {
            return Err(LoadError::Http {
                url: url.to_string(),
                status: response.status(),
            });
        }
        let buffer = response.array_buffer().map_err(|e| fetch_error(url, e))?;
        let buffer = JsFuture::from(buffer).await.map_err(|e| fetch_error(url, e))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

/// Fetch texture and model concurrently, then decode and decorate.
#[cfg(target_arch = "wasm32")]
pub async fn load_asset(texture_url: &str, model_url: &str, mut on_progress: impl FnMut(f32)) -> LoadOutcome {
    let texture_request = fetch::start(texture_url);
    let model_request = fetch::start(model_url);

    let texture_bytes = match texture_request {
        Ok(request) => fetch::body(texture_url, request).await,
        Err(err) => Err(err),
    };
    on_progress(0.3);
    let model_bytes = match model_request {
        Ok(request) => fetch::body(model_url, request).await,
        Err(err) => Err(err),
    };
    assemble(texture_bytes, model_bytes, on_progress)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal GLB holding one triangle node with positions only.
    pub(crate) fn triangle_glb(scale: f32) -> Vec<u8> {
        let json = r#"{"asset":{"version":"2.0"},"scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"mesh":0,"name":"tri","scale":[SCALE,SCALE,SCALE]}],"meshes":[{"primitives":[{"attributes":{"POSITION":0}}]}],"buffers":[{"byteLength":36}],"bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":36}],"accessors":[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]}]}"#
            .replace("SCALE", &scale.to_string());
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    // ── PendingLoad ──

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut pending = PendingLoad::new();
        assert!(pending.advance(0.5));
        assert!(!pending.advance(0.2));
        assert_eq!(pending.progress(), 0.5);
        assert!(pending.advance(3.0));
        assert_eq!(pending.progress(), 1.0);
        assert!(!pending.advance(f32::NAN));
        assert_eq!(pending.progress(), 1.0);
    }

    // ── Decoding ──

    #[test]
    fn test_parse_triangle_glb() {
        let graph = parse_model(&triangle_glb(2.0)).unwrap();
        assert_eq!(graph.mesh_count(), 1);
        assert_eq!(graph.vertex_count(), 3);
        let (mesh, _) = graph.meshes()[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.mesh.normals.len(), 3);

        let bounds = graph.bounding_box(&Mat4::IDENTITY);
        assert_eq!(bounds.max.x, 2.0);
        assert_eq!(bounds.max.y, 2.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_model(b"not a model"), Err(LoadError::Model(_))));
    }

    #[test]
    fn test_decode_png() {
        let texture = decode_texture(&png_bytes(4, 2)).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.rgba.len(), 4 * 2 * 4);
        assert_eq!(&texture.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_texture(&[1, 2, 3]), Err(LoadError::Texture(_))));
    }

    // ── Decoration ──

    #[test]
    fn test_prepare_decorates_every_mesh() {
        let texture = decode_texture(&png_bytes(1, 1)).unwrap();
        let model = prepare_model(crate::scene::tests::two_box_graph(), Some(texture));
        let meshes = model.graph.meshes();
        assert_eq!(meshes.len(), 2);
        for (mesh, _) in meshes {
            assert!(mesh.cast_shadow && mesh.receive_shadow);
            assert!(mesh.material.textured);
            assert!(mesh.material.transparent);
            assert_eq!(mesh.material.opacity, MODEL_OPACITY);
            assert_eq!(mesh.material.emissive, [0.0, 1.0, 1.0]);
            assert_eq!(mesh.material.emissive_intensity, MODEL_EMISSIVE_INTENSITY);
        }
    }

    #[test]
    fn test_assemble_texture_failure_keeps_model() {
        let mut steps = Vec::new();
        let outcome = assemble(
            Err(LoadError::Http { url: "/t.png".into(), status: 404 }),
            Ok(triangle_glb(1.0)),
            |p| steps.push(p),
        );
        match outcome {
            LoadOutcome::Loaded(model) => {
                assert!(model.texture.is_none());
                assert!(model.graph.meshes().iter().all(|(m, _)| !m.material.textured));
            }
            LoadOutcome::Failed(err) => panic!("unexpected failure: {err}"),
        }
        assert_eq!(steps, vec![0.6, 0.9, 1.0]);
    }

    #[test]
    fn test_assemble_model_failure_fails() {
        let outcome = assemble(
            Ok(png_bytes(1, 1)),
            Err(LoadError::Fetch { url: "/m.glb".into(), reason: "offline".into() }),
            |_| {},
        );
        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Fetch { .. })));
    }
}
