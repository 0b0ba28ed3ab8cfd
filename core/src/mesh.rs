// Vertex/index buffers shared by every generator.
//
// A [`Mesh`] is plain data handed to the renderer: the renderer never
// mutates it and the owning generator rebuilds it wholesale.

use glam::{Mat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

// Triangle mesh with CCW winding, three indices per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    // Interleaved `[px, py, pz, nx, ny, nz, u, v]` per vertex, ready for upload.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertices.len() * 8);
        for v in &self.vertices {
            out.extend_from_slice(&v.position.to_array());
            out.extend_from_slice(&v.normal.to_array());
            out.extend_from_slice(&v.uv.to_array());
        }
        out
    }

    // Append `other`, rebasing its indices.
    pub fn merge(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    // Copy with positions and normals carried through `matrix` (a rigid
    // transform such as a tree's model matrix).
    pub fn transformed(&self, matrix: Mat4) -> Mesh {
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex {
                position: matrix.transform_point3(v.position),
                normal: matrix.transform_vector3(v.normal).normalize_or_zero(),
                uv: v.uv,
            })
            .collect();
        Mesh {
            vertices,
            indices: self.indices.clone(),
        }
    }
}

// Accumulates vertices and indices, then hands out the finished [`Mesh`].
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    // Index the next pushed vertex will get.
    pub fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.next_index();
        self.vertices.push(vertex);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn build(self) -> Mesh {
        Mesh {
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

// Two triangles per grid cell over a row-major `width x depth` vertex grid:
// (top-left, bottom-left, top-right) and (top-right, bottom-left, bottom-right).
pub(crate) fn push_grid_indices(mb: &mut MeshBuilder, width: usize, depth: usize) {
    for z in 0..depth.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let top_left = (z * width + x) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((z + 1) * width + x) as u32;
            let bottom_right = bottom_left + 1;

            mb.push_triangle(top_left, bottom_left, top_right);
            mb.push_triangle(top_right, bottom_left, bottom_right);
        }
    }
}

// Central-difference normal of a row-major height grid. Edge cells have no
// full neighbourhood and keep the straight-up normal.
pub(crate) fn grid_normal(heights: &[f32], width: usize, depth: usize, x: usize, z: usize) -> Vec3 {
    if x == 0 || z == 0 || x + 1 >= width || z + 1 >= depth {
        return Vec3::Y;
    }
    let h_left = heights[z * width + x - 1];
    let h_right = heights[z * width + x + 1];
    let h_down = heights[(z - 1) * width + x];
    let h_up = heights[(z + 1) * width + x];

    Vec3::new(h_left - h_right, 2.0, h_down - h_up).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mb = MeshBuilder::new();
        for z in 0..2 {
            for x in 0..2 {
                mb.push_vertex(Vertex::new(
                    Vec3::new(x as f32, 0.0, z as f32),
                    Vec3::Y,
                    Vec2::new(x as f32, z as f32),
                ));
            }
        }
        push_grid_indices(&mut mb, 2, 2);
        mb.build()
    }

    #[test]
    fn grid_indices_wind_consistently() {
        let mesh = quad();
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3]);

        // Both triangles face +Y
        for tri in mesh.indices.chunks(3) {
            let a = mesh.vertices[tri[0] as usize].position;
            let b = mesh.vertices[tri[1] as usize].position;
            let c = mesh.vertices[tri[2] as usize].position;
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn merge_rebases_indices() {
        let mut a = quad();
        let b = quad();
        a.merge(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(&a.indices[6..], &[4, 6, 5, 5, 6, 7]);
    }

    #[test]
    fn transformed_moves_positions_and_turns_normals() {
        let m = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0))
            * Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let moved = quad().transformed(m);
        assert_eq!(moved.indices, quad().indices);
        // (1, 0, 0) turns to (0, 1, 0), then lifts by 5
        assert!((moved.vertices[1].position - Vec3::new(0.0, 6.0, 0.0)).length() < 1e-5);
        assert!((moved.vertices[1].normal - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn interleaved_layout() {
        let mesh = quad();
        let data = mesh.interleaved();
        assert_eq!(data.len(), 4 * 8);
        // second vertex: position (1, 0, 0), normal +Y, uv (1, 0)
        assert_eq!(&data[8..16], &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn grid_normal_of_a_slope() {
        // Height rises along +x by 1 per cell
        let heights: Vec<f32> = (0..9).map(|i| (i % 3) as f32).collect();
        let n = grid_normal(&heights, 3, 3, 1, 1);
        let expected = Vec3::new(-2.0, 2.0, 0.0).normalize();
        assert!((n - expected).length() < 1e-6);
        assert_eq!(grid_normal(&heights, 3, 3, 0, 1), Vec3::Y);
    }
}
