//! Connectivity analysis for ore deposits.
//!
//! A cluster is grown from an ore sample through every face-adjacent solid sample, ore or not.
//! Clusters whose flood reaches the bottom row are grounded; everything else is floating and
//! should be detached by the caller.

use deepvein_core::MaterialTally;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::grid::{GridCoord, VoxelGrid};

/// Ore samples reached by one flood fill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OreCluster {
    /// Ore samples in discovery order.
    pub cells: Vec<GridCoord>,
}

impl OreCluster {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.cells.contains(&coord)
    }

    /// Ore samples per material, read back from `grid`.
    pub fn materials(&self, grid: &VoxelGrid) -> MaterialTally {
        let mut tally = MaterialTally::new();
        for material in self.cells.iter().filter_map(|&c| grid.material(c)) {
            *tally.entry(material).or_insert(0) += 1;
        }
        tally
    }
}

/// Every ore cluster in a grid, split by whether it rests on the ground.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClusterReport {
    pub floating: Vec<OreCluster>,
    pub grounded: Vec<OreCluster>,
}

impl ClusterReport {
    /// Total ore samples across both lists.
    pub fn ore_cells(&self) -> usize {
        self.floating
            .iter()
            .chain(&self.grounded)
            .map(OreCluster::len)
            .sum()
    }
}

/// Flood-fill every solid ore sample into clusters.
///
/// Samples are scanned in storage order. Each flood marks every solid sample it passes through,
/// so no sample is visited twice across the whole scan.
#[instrument(skip_all, fields(width = grid.width(), height = grid.height()))]
pub fn analyze_ore_clusters(grid: &VoxelGrid) -> ClusterReport {
    let mut visited = vec![false; grid.sample_count()];
    let mut stack: Vec<GridCoord> = Vec::new();
    let mut report = ClusterReport::default();

    for (index, start) in grid.coords().enumerate() {
        if visited[index] || !grid.is_solid(start) {
            continue;
        }
        if !grid.material(start).is_some_and(|m| m.is_ore()) {
            continue;
        }

        let mut cluster = OreCluster::default();
        let mut grounded = false;
        visited[index] = true;
        stack.push(start);

        while let Some(coord) = stack.pop() {
            if coord.y == 0 {
                grounded = true;
            }
            if grid.material(coord).is_some_and(|m| m.is_ore()) {
                cluster.cells.push(coord);
            }
            for neighbor in coord.face_neighbors().into_iter().flatten() {
                let Some(slot) = grid.linear_index(neighbor) else {
                    continue;
                };
                if !visited[slot] && grid.is_solid(neighbor) {
                    visited[slot] = true;
                    stack.push(neighbor);
                }
            }
        }

        if grounded {
            report.grounded.push(cluster);
        } else {
            report.floating.push(cluster);
        }
    }

    debug!(
        floating = report.floating.len(),
        grounded = report.grounded.len(),
        "ore clusters analyzed"
    );
    report
}

/// Ore clusters that no longer touch the bottom row.
pub fn find_floating_ore_clusters(grid: &VoxelGrid) -> Vec<OreCluster> {
    analyze_ore_clusters(grid).floating
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepvein_core::Material;

    fn empty(width: usize, height: usize) -> VoxelGrid {
        let mut grid = VoxelGrid::new(width, height).unwrap();
        let coords: Vec<_> = grid.coords().collect();
        for coord in coords {
            grid.set_density(coord, -1.0);
        }
        grid
    }

    fn place(grid: &mut VoxelGrid, coord: GridCoord, material: Material) {
        grid.set_density(coord, 1.0);
        grid.set_material(coord, material);
    }

    #[test]
    fn isolated_ore_above_ground_floats() {
        let mut grid = empty(10, 10);
        let ore = GridCoord::new(4, 5, 4);
        place(&mut grid, ore, Material::GoldOre);

        let floating = find_floating_ore_clusters(&grid);
        assert_eq!(floating.len(), 1);
        assert_eq!(floating[0].cells, vec![ore]);
    }

    #[test]
    fn ore_on_bottom_row_is_grounded() {
        let mut grid = empty(6, 6);
        let ore = GridCoord::new(2, 0, 3);
        place(&mut grid, ore, Material::IronOre);

        let report = analyze_ore_clusters(&grid);
        assert!(report.floating.is_empty());
        assert_eq!(report.grounded.len(), 1);
        assert!(report.grounded[0].contains(ore));
    }

    #[test]
    fn stone_bridge_to_ground_anchors_ore() {
        let mut grid = empty(6, 6);
        for y in 0..4 {
            place(&mut grid, GridCoord::new(1, y, 1), Material::Granite);
        }
        let ore = GridCoord::new(1, 4, 1);
        place(&mut grid, ore, Material::CopperOre);

        let report = analyze_ore_clusters(&grid);
        assert!(report.floating.is_empty());
        assert_eq!(report.grounded.len(), 1);
        assert_eq!(report.grounded[0].cells, vec![ore]);
    }

    #[test]
    fn severing_the_bridge_detaches_ore() {
        let mut grid = empty(6, 6);
        for y in 0..4 {
            place(&mut grid, GridCoord::new(1, y, 1), Material::Granite);
        }
        place(&mut grid, GridCoord::new(1, 4, 1), Material::CopperOre);
        place(&mut grid, GridCoord::new(2, 4, 1), Material::CopperOre);

        grid.set_density(GridCoord::new(1, 2, 1), -1.0);
        grid.set_material(GridCoord::new(1, 2, 1), Material::Air);

        let floating = find_floating_ore_clusters(&grid);
        assert_eq!(floating.len(), 1);
        assert_eq!(floating[0].len(), 2);
        assert_eq!(
            floating[0].materials(&grid).get(&Material::CopperOre),
            Some(&2)
        );
    }

    #[test]
    fn diagonal_contact_does_not_connect() {
        let mut grid = empty(6, 6);
        place(&mut grid, GridCoord::new(2, 2, 2), Material::GoldOre);
        place(&mut grid, GridCoord::new(3, 3, 2), Material::GoldOre);

        let floating = find_floating_ore_clusters(&grid);
        assert_eq!(floating.len(), 2);
    }

    #[test]
    fn stone_only_regions_produce_no_clusters() {
        let mut grid = empty(4, 4);
        place(&mut grid, GridCoord::new(1, 2, 1), Material::Granite);
        let report = analyze_ore_clusters(&grid);
        assert_eq!(report, ClusterReport::default());
    }

    #[test]
    fn ore_with_empty_density_is_ignored() {
        let mut grid = empty(4, 4);
        grid.set_material(GridCoord::new(1, 2, 1), Material::DiamondOre);
        assert!(find_floating_ore_clusters(&grid).is_empty());
    }

    #[test]
    fn clusters_partition_all_ore_cells() {
        let mut grid = empty(5, 5);
        place(&mut grid, GridCoord::new(0, 0, 0), Material::IronOre);
        place(&mut grid, GridCoord::new(0, 1, 0), Material::GoldOre);
        place(&mut grid, GridCoord::new(3, 3, 3), Material::DiamondOre);
        place(&mut grid, GridCoord::new(3, 4, 3), Material::DiamondOre);
        place(&mut grid, GridCoord::new(1, 3, 4), Material::Limestone);

        let report = analyze_ore_clusters(&grid);
        assert_eq!(report.ore_cells(), grid.ore_count());
        assert_eq!(report.grounded.len(), 1);
        assert_eq!(report.grounded[0].len(), 2);
        assert_eq!(report.floating.len(), 1);
        assert_eq!(report.floating[0].len(), 2);
    }
}
