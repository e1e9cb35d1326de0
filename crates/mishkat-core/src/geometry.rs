//! Decoded geometry: triangle meshes, bounds and the model scene graph

use glam::{Mat4, Vec3};

use crate::material::MaterialDesc;

/// Indexed triangle mesh in model units
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Build a mesh and derive smooth normals from its triangles
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            normals: Vec::new(),
            positions,
            uvs: None,
            indices,
        };
        mesh.compute_smooth_normals();
        mesh
    }

    /// Build a mesh with caller-supplied normals, falling back to computed
    /// ones when the counts do not line up
    pub fn with_normals(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        if normals.len() == positions.len() {
            Self {
                positions,
                normals,
                uvs: None,
                indices,
            }
        } else {
            Self::new(positions, indices)
        }
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        if uvs.len() == self.positions.len() {
            self.uvs = Some(uvs);
        }
        self
    }

    /// Area-weighted vertex normals
    pub fn compute_smooth_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
            let face = (pb - pa).cross(pc - pa);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        self.normals = accum
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }

    /// Bounds of the vertices after applying `transform`
    pub fn bounds(&self, transform: &Mat4) -> Option<Aabb> {
        Aabb::from_points(
            self.positions
                .iter()
                .map(|p| transform.transform_point3(Vec3::from(*p))),
        )
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box around the points, `None` when there are none
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first, first);
        for p in iter {
            aabb.extend(p);
        }
        Some(aabb)
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around the transformed corners
    pub fn transformed(&self, transform: &Mat4) -> Aabb {
        let corners = self.corners().map(|c| transform.transform_point3(c));
        // corners is never empty
        Aabb::from_points(corners).unwrap_or(*self)
    }
}

/// One drawable part of a model
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: Option<String>,
    pub mesh: MeshData,
    pub material: MaterialDesc,
    /// Placement of this part inside the model
    pub transform: Mat4,
}

/// Renderer-independent scene produced by a decoder
#[derive(Debug, Clone, Default)]
pub struct ModelScene {
    pub meshes: Vec<SceneMesh>,
}

impl ModelScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene holding one mesh at the origin
    pub fn single(mesh: MeshData, material: MaterialDesc) -> Self {
        Self {
            meshes: vec![SceneMesh {
                name: None,
                mesh,
                material,
                transform: Mat4::IDENTITY,
            }],
        }
    }

    pub fn push(&mut self, mesh: SceneMesh) {
        self.meshes.push(mesh);
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.iter().all(|m| m.mesh.is_empty())
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.triangle_count()).sum()
    }

    /// Bounds of every part in model space
    pub fn bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .filter_map(|m| m.mesh.bounds(&m.transform))
            .reduce(|a, b| a.union(&b))
    }
}
