//! Marching-cubes surface extraction.

use deepvein_world::{GridCoord, StrataLayer, VoxelGrid};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::mesh::Mesh;
use crate::shade::vertex_color;
use crate::tables::{triangles, CORNER_OFFSETS, EDGE_CONNECTIONS};

/// Counters gathered during one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeshStats {
    /// Triangles emitted.
    pub triangles: usize,
    /// Vertices emitted, three per triangle.
    pub vertices: usize,
    /// Cubes with a mixed configuration (neither fully solid nor fully empty).
    pub active_cubes: usize,
}

/// Configuration index for eight corner densities: bit `i` set when corner `i` is solid.
#[inline]
pub fn cube_configuration(densities: &[f32; 8]) -> u8 {
    densities
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d > 0.0)
        .fold(0u8, |config, (i, _)| config | (1 << i))
}

/// Where the zero crossing sits between densities `d1` and `d2`, as a fraction from `d1`.
///
/// Equal densities give `0`. The result is clamped to `[0, 1]`. Spans too wide for `f32` are
/// divided in `f64`.
#[inline]
pub fn edge_t(d1: f32, d2: f32) -> f32 {
    if d1 == d2 {
        return 0.0;
    }
    let span = d1 - d2;
    let t = if span.is_finite() {
        d1 / span
    } else {
        (d1 as f64 / (d1 as f64 - d2 as f64)) as f32
    };
    if t.is_finite() {
        t.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Builder-style front end over [`extract`].
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    grid: &'a VoxelGrid,
    layers: Option<&'a [StrataLayer]>,
}

impl<'a> Extractor<'a> {
    /// Extractor over `grid` with material-only coloring.
    pub fn new(grid: &'a VoxelGrid) -> Self {
        Self { grid, layers: None }
    }

    /// Color vertices from these stratigraphy layers.
    pub fn with_layers(mut self, layers: &'a [StrataLayer]) -> Self {
        self.layers = Some(layers);
        self
    }

    /// [`Self::extract_with_stats`] without the counters.
    pub fn extract(&self) -> Mesh {
        self.extract_with_stats().0
    }

    /// Run marching cubes over every cube in the grid.
    #[instrument(skip_all, fields(width = self.grid.width(), height = self.grid.height()))]
    pub fn extract_with_stats(&self) -> (Mesh, MeshStats) {
        let grid = self.grid;
        let mut mesh = Mesh::new();
        let mut stats = MeshStats::default();

        for y in 0..grid.height() {
            for z in 0..grid.width() {
                for x in 0..grid.width() {
                    let corners = CORNER_OFFSETS
                        .map(|[dx, dy, dz]| GridCoord::new(x + dx, y + dy, z + dz));
                    let densities = corners.map(|c| grid.density(c).unwrap_or(0.0));

                    let config = cube_configuration(&densities);
                    if config == 0 || config == u8::MAX {
                        continue;
                    }
                    stats.active_cubes += 1;

                    for edges in triangles(config) {
                        let vertices = edges.map(|edge| {
                            let [a, b] = EDGE_CONNECTIONS[edge];
                            let t = edge_t(densities[a], densities[b]);
                            let position = corners[a].as_vec3().lerp(corners[b].as_vec3(), t);
                            let color =
                                vertex_color(grid, self.layers, corners[a], corners[b], t, position);
                            (position, color)
                        });
                        mesh.push_triangle(vertices.map(|v| v.0), vertices.map(|v| v.1));
                    }
                }
            }
        }

        stats.triangles = mesh.triangle_count();
        stats.vertices = mesh.vertex_count();
        debug!(
            triangles = stats.triangles,
            vertices = stats.vertices,
            active_cubes = stats.active_cubes,
            "surface extracted"
        );
        (mesh, stats)
    }
}

/// Extract the zero-density surface of `grid`, optionally colored by `layers`.
pub fn extract(grid: &VoxelGrid, layers: Option<&[StrataLayer]>) -> Mesh {
    let extractor = Extractor::new(grid);
    match layers {
        Some(layers) => extractor.with_layers(layers).extract(),
        None => extractor.extract(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shade::FALLBACK_COLOR;
    use deepvein_core::Material;
    use glam::Vec3;

    fn unit_cube(densities: [f32; 8]) -> VoxelGrid {
        let mut grid = VoxelGrid::new(1, 1).unwrap();
        for (corner, density) in CORNER_OFFSETS.iter().zip(densities) {
            let coord = GridCoord::new(corner[0], corner[1], corner[2]);
            grid.set_density(coord, density);
            let material = if density > 0.0 {
                Material::Granite
            } else {
                Material::Air
            };
            grid.set_material(coord, material);
        }
        grid
    }

    #[test]
    fn single_solid_corner_yields_one_triangle() {
        let mut densities = [-1.0; 8];
        densities[0] = 5.0;
        assert_eq!(cube_configuration(&densities), 1);

        let mesh = extract(&unit_cube(densities), None);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);

        let t = 5.0 / 6.0;
        let expected = [Vec3::new(t, 0.0, 0.0), Vec3::new(0.0, t, 0.0), Vec3::new(0.0, 0.0, t)];
        for (got, want) in mesh.positions.iter().zip(expected) {
            assert!(got.distance(want) < 1e-5, "vertex {got} expected {want}");
        }
    }

    #[test]
    fn uniform_cubes_emit_nothing() {
        assert!(extract(&unit_cube([1.0; 8]), None).is_empty());
        assert!(extract(&unit_cube([-1.0; 8]), None).is_empty());
        assert!(extract(&unit_cube([0.0; 8]), None).is_empty());
    }

    #[test]
    fn zero_density_counts_as_empty() {
        let mut densities = [0.0; 8];
        densities[6] = 0.5;
        assert_eq!(cube_configuration(&densities), 1 << 6);
    }

    #[test]
    fn edge_t_handles_degenerate_inputs() {
        assert_eq!(edge_t(2.0, 2.0), 0.0);
        assert_eq!(edge_t(5.0, -1.0), 5.0 / 6.0);
        assert_eq!(edge_t(-1.0, 5.0), 1.0 / 6.0);
        assert_eq!(edge_t(0.0, 3.0), 0.0);
        assert_eq!(edge_t(1.0, 2.0), 0.0);
        assert_eq!(edge_t(-1.0, -3.0), 0.0);
    }

    #[test]
    fn edge_t_survives_overflowing_spans() {
        assert_eq!(edge_t(f32::MAX, -f32::MAX), 0.5);
        assert_eq!(edge_t(-f32::MAX, f32::MAX), 0.5);
        assert!((edge_t(3e38, -1e38) - 0.75).abs() < 1e-6);
        assert!((edge_t(-1e38, 3e38) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn triangles_are_fresh_vertex_triples() {
        let mut densities = [-1.0; 8];
        densities[0] = 1.0;
        densities[6] = 2.0;
        let (mesh, stats) = Extractor::new(&unit_cube(densities)).extract_with_stats();
        assert_eq!(mesh.indices.len() % 3, 0);
        let expected: Vec<u32> = (0..mesh.vertex_count() as u32).collect();
        assert_eq!(mesh.indices, expected);
        assert_eq!(stats.active_cubes, 1);
        assert_eq!(stats.triangles, mesh.triangle_count());
    }

    #[test]
    fn ore_corner_colors_its_vertices() {
        let mut densities = [-1.0; 8];
        densities[0] = 5.0;
        let mut grid = unit_cube(densities);
        grid.set_material(GridCoord::new(0, 0, 0), Material::DiamondOre);

        let mesh = extract(&grid, None);
        // Edges 0 and 8 start at corner 0; edge 3 starts at corner 3 (air).
        assert_eq!(mesh.colors[0], Material::DiamondOre.color());
        assert_eq!(mesh.colors[1], Material::DiamondOre.color());
        assert_ne!(mesh.colors[2], FALLBACK_COLOR);
        assert_ne!(mesh.colors[2], Material::DiamondOre.color());
    }

    #[test]
    fn builder_and_free_function_agree() {
        let mut densities = [-1.0; 8];
        densities[1] = 1.0;
        densities[2] = 0.5;
        let grid = unit_cube(densities);
        let layers = deepvein_world::default_layers();
        assert_eq!(
            Extractor::new(&grid).with_layers(&layers).extract(),
            extract(&grid, Some(&layers))
        );
    }
}
