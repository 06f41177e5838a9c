//! Property-based tests for surface extraction
//!
//! Critical invariants:
//! - every vertex lies on a grid edge inside the grid bounds
//! - index buffers are whole triangles of fresh vertices
//! - colors are parallel to positions and never the fallback for a well-formed grid

use deepvein_core::Material;
use deepvein_mesh::{extract, FALLBACK_COLOR};
use deepvein_world::{default_layers, VoxelGrid};
use proptest::prelude::*;

const WIDTH: usize = 4;
const HEIGHT: usize = 5;
const SAMPLES: usize = (WIDTH + 1) * (HEIGHT + 1) * (WIDTH + 1);

fn grid_from(densities: &[f32]) -> VoxelGrid {
    let mut grid = VoxelGrid::new(WIDTH, HEIGHT).unwrap();
    let coords: Vec<_> = grid.coords().collect();
    for (coord, &density) in coords.into_iter().zip(densities) {
        grid.set_density(coord, density);
        let material = if density > 0.0 {
            Material::Limestone
        } else {
            Material::Air
        };
        grid.set_material(coord, material);
    }
    grid
}

fn is_integral(v: f32) -> bool {
    v.fract() == 0.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn vertices_lie_on_grid_edges(densities in prop::collection::vec(-4.0f32..4.0, SAMPLES)) {
        let grid = grid_from(&densities);
        let mesh = extract(&grid, None);

        prop_assert_eq!(mesh.indices.len() % 3, 0);
        prop_assert_eq!(mesh.colors.len(), mesh.positions.len());
        prop_assert_eq!(mesh.indices.len(), mesh.positions.len());

        for p in &mesh.positions {
            prop_assert!((0.0..=WIDTH as f32).contains(&p.x), "x out of bounds: {}", p);
            prop_assert!((0.0..=HEIGHT as f32).contains(&p.y), "y out of bounds: {}", p);
            prop_assert!((0.0..=WIDTH as f32).contains(&p.z), "z out of bounds: {}", p);
            let integral = [p.x, p.y, p.z].into_iter().filter(|&c| is_integral(c)).count();
            prop_assert!(integral >= 2, "vertex {} is not on a grid edge", p);
        }
    }

    #[test]
    fn well_formed_grids_never_use_fallback(densities in prop::collection::vec(-4.0f32..4.0, SAMPLES)) {
        let grid = grid_from(&densities);
        let layers = default_layers();
        for mesh in [extract(&grid, None), extract(&grid, Some(&layers))] {
            prop_assert!(mesh.colors.iter().all(|&c| c != FALLBACK_COLOR));
        }
    }

    #[test]
    fn extraction_is_deterministic(densities in prop::collection::vec(-4.0f32..4.0, SAMPLES)) {
        let grid = grid_from(&densities);
        prop_assert_eq!(extract(&grid, None).hash(), extract(&grid, None).hash());
    }
}
