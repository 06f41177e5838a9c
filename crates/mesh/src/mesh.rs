use std::fmt;

use blake3::Hasher;
use deepvein_core::Rgba;
use glam::Vec3;

/// Hash of the packed vertex and index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for MeshHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Interleaved vertex layout for upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex {
    /// Position in chunk-local coordinates.
    pub position: [f32; 3],
    /// Linear vertex color.
    pub color: Rgba,
}

/// Indexed triangle list with per-vertex colors.
///
/// Extraction emits three fresh vertices per triangle, so `indices` is `0, 1, 2, 3, ...` unless the
/// mesh has been welded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions in chunk-local coordinates.
    pub positions: Vec<Vec3>,
    /// Triangle list; length is a multiple of three.
    pub indices: Vec<u32>,
    /// Vertex colors, parallel to `positions`.
    pub colors: Vec<Rgba>,
}

impl Mesh {
    /// Empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a triangle with three new vertices.
    pub fn push_triangle(&mut self, positions: [Vec3; 3], colors: [Rgba; 3]) {
        let base = self.positions.len() as u32;
        self.positions.extend(positions);
        self.colors.extend(colors);
        self.indices.extend([base, base + 1, base + 2]);
    }

    /// Interleave positions and colors.
    pub fn packed_vertices(&self) -> Vec<PackedVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(position, color)| PackedVertex {
                position: position.to_array(),
                color: *color,
            })
            .collect()
    }

    /// Stable hash of the vertex and index buffers.
    pub fn hash(&self) -> MeshHash {
        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(&self.packed_vertices()));
        hasher.update(bytemuck::cast_slice(&self.indices));
        MeshHash(*hasher.finalize().as_bytes())
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Rgba::WHITE, Rgba::WHITE, Rgba::MAGENTA],
        );
        mesh
    }

    #[test]
    fn push_triangle_appends_fresh_vertices() {
        let mut mesh = one_triangle();
        mesh.push_triangle([Vec3::Z; 3], [Rgba::WHITE; 3]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.colors.len(), mesh.positions.len());
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let a = one_triangle();
        let b = one_triangle();
        assert_eq!(a.hash(), b.hash());

        let mut c = one_triangle();
        c.colors[2] = Rgba::WHITE;
        assert_ne!(a.hash(), c.hash());

        assert_ne!(Mesh::new().hash(), a.hash());
        assert_eq!(a.hash().to_hex().len(), 64);
    }

    #[test]
    fn packed_vertices_interleave() {
        let packed = one_triangle().packed_vertices();
        assert_eq!(packed.len(), 3);
        assert_eq!(packed[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(packed[2].color, Rgba::MAGENTA);
        assert_eq!(
            bytemuck::cast_slice::<PackedVertex, u8>(&packed).len(),
            3 * 7 * 4
        );
    }

    #[test]
    fn packed_colors_cast_to_rgba_floats() {
        let packed = one_triangle().packed_vertices();
        let floats: &[f32] = bytemuck::cast_slice(&packed);
        assert_eq!(&floats[14..21], &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);

        let mesh = one_triangle();
        let colors: &[f32] = bytemuck::cast_slice(&mesh.colors);
        assert_eq!(&colors[8..], &Rgba::MAGENTA.to_array());
    }

    #[test]
    fn bounds_cover_all_vertices() {
        assert_eq!(Mesh::new().bounds(), None);
        let (lo, hi) = one_triangle().bounds().unwrap();
        assert_eq!(lo, Vec3::ZERO);
        assert_eq!(hi, Vec3::new(1.0, 1.0, 0.0));
    }
}
