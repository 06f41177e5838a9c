//! Optional vertex welding for extracted meshes.

use std::collections::HashMap;

use glam::Vec3;
use tracing::debug;

use crate::mesh::Mesh;

/// Tolerance used when the caller passes a non-positive or non-finite epsilon.
pub const DEFAULT_WELD_EPSILON: f32 = 1e-5;

/// Merge vertices that share a position (quantized to `epsilon`).
///
/// The first vertex seen at a position keeps its color. Triangles that collapse because two of
/// their corners merged are dropped.
pub fn weld(mesh: &Mesh, epsilon: f32) -> Mesh {
    let epsilon = if epsilon.is_finite() && epsilon > 0.0 {
        epsilon
    } else {
        DEFAULT_WELD_EPSILON
    };

    let mut welded = Mesh::new();
    let mut slots: HashMap<[i64; 3], u32> = HashMap::with_capacity(mesh.positions.len() / 2);
    let mut remap = Vec::with_capacity(mesh.positions.len());

    for (position, color) in mesh.positions.iter().zip(&mesh.colors) {
        let key = quantize(*position, epsilon);
        let slot = *slots.entry(key).or_insert_with(|| {
            welded.positions.push(*position);
            welded.colors.push(*color);
            (welded.positions.len() - 1) as u32
        });
        remap.push(slot);
    }

    for tri in mesh.indices.chunks_exact(3) {
        let Some(mapped) = tri
            .iter()
            .map(|&i| remap.get(i as usize).copied())
            .collect::<Option<Vec<u32>>>()
        else {
            continue;
        };
        if mapped[0] == mapped[1] || mapped[1] == mapped[2] || mapped[0] == mapped[2] {
            continue;
        }
        welded.indices.extend(mapped);
    }

    debug!(
        before = mesh.vertex_count(),
        after = welded.vertex_count(),
        triangles = welded.triangle_count(),
        "mesh welded"
    );
    welded
}

fn quantize(position: Vec3, epsilon: f32) -> [i64; 3] {
    (position / epsilon).round().to_array().map(|c| c as i64)
}
