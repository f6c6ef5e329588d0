use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Vertex layout shared by both render passes.
///
/// The colour is stored as bytes and normalized to `[0, 1]` by the vertex
/// fetch (`Unorm8x4`). The fourth byte only pads the attribute to a format the
/// GPU accepts and is always opaque.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    /// Colour normalized the same way the vertex fetch does it.
    pub fn albedo(&self) -> Vec3 {
        Vec3::new(
            self.color[0] as f32 / 255.0,
            self.color[1] as f32 / 255.0,
            self.color[2] as f32 / 255.0,
        )
    }
}

/// Index of a mesh inside the [`GeometryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub usize);

/// Triangle mesh with indices local to its own vertex list.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Iterates the mesh triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// Builds meshes out of flat-shaded quads.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a quad given its corners in fan order.
    ///
    /// The face normal is `(c2 - c0) x (c1 - c0)`, so corners listed clockwise
    /// when seen from outside give an outward normal.
    pub fn quad(mut self, corners: [Vec3; 4], color: [u8; 3]) -> Self {
        let normal = face_normal(corners[0], corners[1], corners[2]);
        let base = self.vertices.len() as u32;
        for corner in corners {
            self.vertices.push(Vertex {
                position: corner.to_array(),
                color: [color[0], color[1], color[2], u8::MAX],
                normal: normal.to_array(),
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self
    }

    pub fn build(self, name: impl Into<String>) -> Mesh {
        Mesh {
            name: name.into(),
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    (p2 - p0).cross(p1 - p0).normalize_or_zero()
}

/// Unit cube centred at the origin, one colour per face.
pub fn unit_cube() -> Mesh {
    let h = 0.5;
    MeshBuilder::new()
        // front
        .quad(
            [
                Vec3::new(-h, h, h),
                Vec3::new(h, h, h),
                Vec3::new(h, -h, h),
                Vec3::new(-h, -h, h),
            ],
            [255, 0, 0],
        )
        // back
        .quad(
            [
                Vec3::new(h, h, -h),
                Vec3::new(-h, h, -h),
                Vec3::new(-h, -h, -h),
                Vec3::new(h, -h, -h),
            ],
            [0, 255, 0],
        )
        // left
        .quad(
            [
                Vec3::new(-h, h, -h),
                Vec3::new(-h, h, h),
                Vec3::new(-h, -h, h),
                Vec3::new(-h, -h, -h),
            ],
            [0, 0, 255],
        )
        // right
        .quad(
            [
                Vec3::new(h, h, h),
                Vec3::new(h, h, -h),
                Vec3::new(h, -h, -h),
                Vec3::new(h, -h, h),
            ],
            [255, 255, 0],
        )
        // top
        .quad(
            [
                Vec3::new(-h, h, -h),
                Vec3::new(h, h, -h),
                Vec3::new(h, h, h),
                Vec3::new(-h, h, h),
            ],
            [255, 0, 255],
        )
        // bottom
        .quad(
            [
                Vec3::new(-h, -h, h),
                Vec3::new(h, -h, h),
                Vec3::new(h, -h, -h),
                Vec3::new(-h, -h, -h),
            ],
            [0, 255, 255],
        )
        .build("cube")
}

/// Upward-facing unit quad lying at `y = 0.5`.
pub fn ground_plane() -> Mesh {
    let h = 0.5;
    MeshBuilder::new()
        .quad(
            [
                Vec3::new(-h, h, -h),
                Vec3::new(h, h, -h),
                Vec3::new(h, h, h),
                Vec3::new(-h, h, h),
            ],
            [250, 250, 250],
        )
        .build("ground")
}

/// Static list of meshes, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    meshes: Vec<Mesh>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the cube and the ground plane, in that order.
    pub fn builtin() -> (Self, MeshId, MeshId) {
        let mut store = Self::new();
        let cube = store.insert(unit_cube());
        let ground = store.insert(ground_plane());
        (store, cube, ground)
    }

    pub fn insert(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| (MeshId(index), mesh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 28);
    }

    #[test]
    fn cube_normals_are_flat_and_outward() {
        let cube = unit_cube();
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.indices().len(), 36);
        for [a, b, c] in cube.triangles() {
            assert_eq!(a.normal, b.normal);
            assert_eq!(b.normal, c.normal);
            let normal = a.normal();
            assert!((normal.length() - 1.0).abs() < 1e-6);
            assert!(normal.dot(b.position() - a.position()).abs() < 1e-6);
            assert!(normal.dot(c.position() - a.position()).abs() < 1e-6);
            let centre = (a.position() + b.position() + c.position()) / 3.0;
            assert!(normal.dot(centre) > 0.0, "normal points inward");
        }
    }

    #[test]
    fn indices_stay_inside_each_mesh() {
        let (store, _, _) = GeometryStore::builtin();
        for (_, mesh) in store.iter() {
            let count = mesh.vertices().len() as u32;
            assert!(mesh.indices().iter().all(|&index| index < count));
        }
    }

    #[test]
    fn ground_faces_up_with_normalized_colour() {
        let ground = ground_plane();
        assert_eq!(ground.index_count(), 6);
        for vertex in ground.vertices() {
            assert_eq!(vertex.normal(), Vec3::Y);
            assert!((vertex.albedo().x - 250.0 / 255.0).abs() < 1e-6);
        }
    }
}
