use glam::{Mat4, Vec3};
use hackviewer_gpu_shared::math::Aabb;
use hackviewer_gpu_shared::uniforms::MaterialUniforms;

/// Radius of the placeholder sphere shown when the asset fails to load.
/// Already viewer-sized, so it is never normalized.
pub const FALLBACK_RADIUS: f32 = 2.0;
const FALLBACK_SEGMENTS: u32 = 32;

/// `0xRRGGBB` to RGB floats in [0, 1].
pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Triangle mesh with one normal and one UV per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self, transform: &Mat4) -> Aabb {
        Aabb::from_points(
            self.positions
                .iter()
                .map(|p| transform.transform_point3(Vec3::from_array(*p))),
        )
    }

    /// Fill in whatever the source asset left out: sequential indices,
    /// smooth normals, and zero UVs.
    pub fn completed(mut self) -> Self {
        let n = self.positions.len();
        if self.indices.is_empty() {
            self.indices = (0..n as u32).collect();
        }
        self.indices.retain(|&i| (i as usize) < n);
        self.indices.truncate(self.indices.len() / 3 * 3);
        if self.normals.len() != n {
            self.normals = smooth_normals(&self.positions, &self.indices);
        }
        if self.uvs.len() != n {
            self.uvs = vec![[0.0, 0.0]; n];
        }
        self
    }
}

fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            Vec3::from_array(positions[a]),
            Vec3::from_array(positions[b]),
            Vec3::from_array(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

/// Surface appearance of one mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
    pub transparent: bool,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    /// Sample the model texture as albedo.
    pub textured: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            transparent: false,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            textured: false,
        }
    }
}

impl Material {
    pub fn uniforms(&self) -> MaterialUniforms {
        let opacity = if self.transparent { self.opacity } else { 1.0 };
        MaterialUniforms::new(
            self.color,
            opacity,
            self.emissive,
            self.emissive_intensity,
            self.textured,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub local: Mat4,
    pub mesh: MeshData,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub name: String,
    pub local: Mat4,
    pub children: Vec<SceneNode>,
}

/// Anything in the asset that is neither geometry nor a container
/// (cameras, lights, empty transforms).
#[derive(Debug, Clone, PartialEq)]
pub struct OtherNode {
    pub name: String,
    pub local: Mat4,
}

/// One node of a loaded model. Only `Mesh` nodes carry geometry and
/// receive material, texture, and shadow settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Mesh(MeshNode),
    Group(GroupNode),
    Other(OtherNode),
}

impl SceneNode {
    pub fn name(&self) -> &str {
        match self {
            SceneNode::Mesh(n) => &n.name,
            SceneNode::Group(n) => &n.name,
            SceneNode::Other(n) => &n.name,
        }
    }

    pub fn local(&self) -> Mat4 {
        match self {
            SceneNode::Mesh(n) => n.local,
            SceneNode::Group(n) => n.local,
            SceneNode::Other(n) => n.local,
        }
    }
}

fn walk<'a, F: FnMut(&'a SceneNode, Mat4)>(node: &'a SceneNode, parent: Mat4, f: &mut F) {
    let world = parent * node.local();
    f(node, world);
    if let SceneNode::Group(group) = node {
        for child in &group.children {
            walk(child, world, f);
        }
    }
}

fn walk_mut<F: FnMut(&mut SceneNode)>(node: &mut SceneNode, f: &mut F) {
    f(&mut *node);
    if let SceneNode::Group(group) = node {
        for child in &mut group.children {
            walk_mut(child, f);
        }
    }
}

/// A loaded object graph rooted at a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGraph {
    pub root: SceneNode,
}

impl ModelGraph {
    pub fn new(root: SceneNode) -> Self {
        Self { root }
    }

    /// Visit every node depth-first with its model-space transform.
    pub fn visit<'a>(&'a self, mut f: impl FnMut(&'a SceneNode, Mat4)) {
        walk(&self.root, Mat4::IDENTITY, &mut f);
    }

    /// Mutate every mesh node, however deeply nested.
    pub fn for_each_mesh_mut(&mut self, mut f: impl FnMut(&mut MeshNode)) {
        walk_mut(&mut self.root, &mut |node: &mut SceneNode| {
            if let SceneNode::Mesh(mesh) = node {
                f(mesh);
            }
        });
    }

    /// Mesh nodes paired with their model-space transforms.
    pub fn meshes(&self) -> Vec<(&MeshNode, Mat4)> {
        let mut out = Vec::new();
        self.visit(|node, world| {
            if let SceneNode::Mesh(mesh) = node {
                out.push((mesh, world));
            }
        });
        out
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(|_, _| count += 1);
        count
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes().len()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes().iter().map(|(m, _)| m.mesh.vertex_count()).sum()
    }

    /// Exact box around every vertex once the whole model is placed by `model`.
    pub fn bounding_box(&self, model: &Mat4) -> Aabb {
        self.meshes()
            .iter()
            .fold(Aabb::EMPTY, |acc, (mesh, world)| {
                acc.union(&mesh.mesh.bounds(&(*model * *world)))
            })
    }
}

/// UV sphere centered on the origin, `width_segments` around and
/// `height_segments` pole to pole.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let w = width_segments.max(3);
    let h = height_segments.max(2);
    let mut mesh = MeshData::default();

    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        let theta = v * std::f32::consts::PI;
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let phi = u * std::f32::consts::TAU;
            let normal = Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
            mesh.positions.push((normal * radius).to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([u, 1.0 - v]);
        }
    }

    let row = w + 1;
    for iy in 0..h {
        for ix in 0..w {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

/// Lit blue sphere shown in place of an asset that failed to load.
pub fn fallback_sphere() -> ModelGraph {
    ModelGraph::new(SceneNode::Mesh(MeshNode {
        name: "fallback-sphere".into(),
        local: Mat4::IDENTITY,
        mesh: uv_sphere(FALLBACK_RADIUS, FALLBACK_SEGMENTS, FALLBACK_SEGMENTS),
        material: Material {
            color: rgb(0x3B82F6),
            opacity: 0.8,
            transparent: true,
            emissive: rgb(0x1E40AF),
            emissive_intensity: 0.2,
            textured: false,
        },
        cast_shadow: false,
        receive_shadow: false,
    }))
}
