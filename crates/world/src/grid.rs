use std::fmt;

use deepvein_core::{Material, MaterialTally};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strata::StrataLayer;

/// Sentinel layer index stored for samples that belong to no stratigraphy layer (air).
pub const NO_LAYER: u8 = u8::MAX;

/// Upper bound on total sample count for a single grid.
pub const MAX_SAMPLES: usize = 1 << 26;

/// Errors raised while allocating a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or height was zero.
    #[error("grid dimensions must be positive (width {width}, height {height})")]
    InvalidDimensions {
        /// Requested horizontal cube count.
        width: usize,
        /// Requested vertical cube count.
        height: usize,
    },
    /// The sample count would exceed [`MAX_SAMPLES`].
    #[error("grid of width {width} and height {height} exceeds {MAX_SAMPLES} samples")]
    TooLarge {
        /// Requested horizontal cube count.
        width: usize,
        /// Requested vertical cube count.
        height: usize,
    },
}

/// Integer sample coordinate inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Sample column along X.
    pub x: usize,
    /// Sample row, upwards.
    pub y: usize,
    /// Sample column along Z.
    pub z: usize,
}

impl GridCoord {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Floor a local-space position to the sample at or below it.
    ///
    /// Returns `None` for negative or non-finite positions; the upper bound is the grid's job.
    pub fn from_local(local: Vec3) -> Option<Self> {
        if !local.is_finite() {
            return None;
        }
        let floored = local.floor();
        if floored.x < 0.0 || floored.y < 0.0 || floored.z < 0.0 {
            return None;
        }
        Some(Self::new(
            floored.x as usize,
            floored.y as usize,
            floored.z as usize,
        ))
    }

    /// Sample position in local space.
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// The six face neighbours, with `None` for those below zero on any axis.
    pub fn face_neighbors(self) -> [Option<GridCoord>; 6] {
        let Self { x, y, z } = self;
        [
            Some(Self::new(x + 1, y, z)),
            x.checked_sub(1).map(|x| Self::new(x, y, z)),
            Some(Self::new(x, y + 1, z)),
            y.checked_sub(1).map(|y| Self::new(x, y, z)),
            Some(Self::new(x, y, z + 1)),
            z.checked_sub(1).map(|z| Self::new(x, y, z)),
        ]
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Density and material field for a single chunk, stored as flat parallel arrays.
///
/// A grid of `width × height` cubes has `(width + 1) × (height + 1) × (width + 1)` samples
/// sitting on the cube corners. Positive density means solid.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    width: usize,
    height: usize,
    density: Vec<f32>,
    material: Vec<Material>,
    layer_index: Vec<u8>,
    surface_height: Vec<f32>,
}

impl VoxelGrid {
    /// Allocate an empty (all air, zero density) grid of `width × height × width` cubes.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let side = width
            .checked_add(1)
            .ok_or(GridError::TooLarge { width, height })?;
        let samples = side
            .checked_mul(side)
            .and_then(|area| height.checked_add(1).and_then(|h| area.checked_mul(h)))
            .filter(|&count| count <= MAX_SAMPLES)
            .ok_or(GridError::TooLarge { width, height })?;

        Ok(Self {
            width,
            height,
            density: vec![0.0; samples],
            material: vec![Material::Air; samples],
            layer_index: vec![NO_LAYER; samples],
            surface_height: vec![0.0; side * side],
        })
    }

    /// Horizontal cube count (X and Z).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Vertical cube count.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample counts per axis as `(x, y, z)`.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width + 1, self.height + 1, self.width + 1)
    }

    /// Total sample count.
    pub fn sample_count(&self) -> usize {
        self.density.len()
    }

    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x <= self.width && coord.y <= self.height && coord.z <= self.width
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> usize {
        debug_assert!(self.in_bounds(coord));
        let side = self.width + 1;
        (coord.y * side + coord.z) * side + coord.x
    }

    #[inline]
    fn column_index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x <= self.width && z <= self.width);
        z * (self.width + 1) + x
    }

    /// Storage index of `coord`, or `None` outside the grid.
    pub fn linear_index(&self, coord: GridCoord) -> Option<usize> {
        self.in_bounds(coord).then(|| self.index(coord))
    }

    /// Coordinate for a linear index, inverse of the internal layout.
    pub fn coord_of(&self, index: usize) -> GridCoord {
        let side = self.width + 1;
        GridCoord::new(index % side, index / (side * side), (index / side) % side)
    }

    /// Iterate all coordinates in storage order (x fastest, then z, then y).
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.sample_count()).map(move |index| self.coord_of(index))
    }

    /// Density at `coord`, or `None` outside the grid.
    pub fn density(&self, coord: GridCoord) -> Option<f32> {
        self.in_bounds(coord).then(|| self.density[self.index(coord)])
    }

    /// Overwrite density at `coord`. Out-of-bounds writes are ignored.
    pub fn set_density(&mut self, coord: GridCoord, value: f32) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.density[idx] = value;
        }
    }

    /// Material at `coord`, or `None` outside the grid.
    pub fn material(&self, coord: GridCoord) -> Option<Material> {
        self.in_bounds(coord).then(|| self.material[self.index(coord)])
    }

    /// Overwrite material at `coord`. Out-of-bounds writes are ignored.
    pub fn set_material(&mut self, coord: GridCoord, material: Material) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.material[idx] = material;
        }
    }

    /// Stratigraphy layer index at `coord`; `None` outside the grid or for [`NO_LAYER`].
    pub fn layer_index(&self, coord: GridCoord) -> Option<usize> {
        if !self.in_bounds(coord) {
            return None;
        }
        match self.layer_index[self.index(coord)] {
            NO_LAYER => None,
            index => Some(index as usize),
        }
    }

    /// Store a layer index (`None` clears it). Indices that do not fit below the sentinel are
    /// stored as [`NO_LAYER`].
    pub fn set_layer_index(&mut self, coord: GridCoord, layer: Option<usize>) {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            self.layer_index[idx] = layer
                .and_then(|l| u8::try_from(l).ok())
                .filter(|&l| l != NO_LAYER)
                .unwrap_or(NO_LAYER);
        }
    }

    /// Cached surface height of column `(x, z)`; `None` outside the grid.
    pub fn surface_height(&self, x: usize, z: usize) -> Option<f32> {
        (x <= self.width && z <= self.width).then(|| self.surface_height[self.column_index(x, z)])
    }

    /// Store the surface height of column `(x, z)`. Out-of-bounds writes are ignored.
    pub fn set_surface_height(&mut self, x: usize, z: usize, height: f32) {
        if x <= self.width && z <= self.width {
            let idx = self.column_index(x, z);
            self.surface_height[idx] = height;
        }
    }

    /// Whether the sample at `coord` is solid. Out-of-bounds is never solid.
    #[inline]
    pub fn is_solid(&self, coord: GridCoord) -> bool {
        self.density(coord).is_some_and(|d| d > 0.0)
    }

    /// Number of solid samples.
    pub fn solid_count(&self) -> usize {
        self.density.iter().filter(|&&d| d > 0.0).count()
    }

    /// Number of solid samples carrying an ore tag.
    pub fn ore_count(&self) -> usize {
        self.density
            .iter()
            .zip(&self.material)
            .filter(|(d, m)| **d > 0.0 && m.is_ore())
            .count()
    }

    /// Floor `local` to a sample and report whether it is solid.
    pub fn is_solid_at(&self, local: Vec3) -> bool {
        GridCoord::from_local(local).is_some_and(|coord| self.is_solid(coord))
    }

    /// Floor `local` to a sample and resolve its stratigraphy layer.
    pub fn layer_at<'a>(&self, local: Vec3, layers: &'a [StrataLayer]) -> Option<&'a StrataLayer> {
        let coord = GridCoord::from_local(local)?;
        layers.get(self.layer_index(coord)?)
    }

    /// Carve a sphere of density around `local`.
    ///
    /// Each sample within `radius` (inclusive) loses `strength * (1 - distance / radius)`.
    /// Samples that cross from solid to empty are counted by their previous material and reset to
    /// air with no layer. Samples outside the grid are skipped.
    pub fn modify_density(&mut self, local: Vec3, radius: f32, strength: f32) -> MaterialTally {
        let mut removed = MaterialTally::new();
        if !local.is_finite()
            || !radius.is_finite()
            || !strength.is_finite()
            || radius <= 0.0
            || strength <= 0.0
        {
            return removed;
        }

        let upper = Vec3::new(self.width as f32, self.height as f32, self.width as f32);
        let lo = (local - Vec3::splat(radius)).floor().max(Vec3::ZERO);
        let hi = (local + Vec3::splat(radius)).ceil().min(upper);
        if hi.x < lo.x || hi.y < lo.y || hi.z < lo.z {
            return removed;
        }

        for y in lo.y as usize..=hi.y as usize {
            for z in lo.z as usize..=hi.z as usize {
                for x in lo.x as usize..=hi.x as usize {
                    let coord = GridCoord::new(x, y, z);
                    let distance = local.distance(coord.as_vec3());
                    if distance > radius {
                        continue;
                    }

                    let falloff = (1.0 - distance / radius).max(0.0);
                    let idx = self.index(coord);
                    let old = self.density[idx];
                    let new = old - strength * falloff;
                    self.density[idx] = new;

                    if old > 0.0 && new <= 0.0 {
                        *removed.entry(self.material[idx]).or_insert(0) += 1;
                        self.material[idx] = Material::Air;
                        self.layer_index[idx] = NO_LAYER;
                    }
                }
            }
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepvein_core::tally_total;

    fn solid_grid(width: usize, height: usize, density: f32, material: Material) -> VoxelGrid {
        let mut grid = VoxelGrid::new(width, height).unwrap();
        let coords: Vec<_> = grid.coords().collect();
        for coord in coords {
            grid.set_density(coord, density);
            grid.set_material(coord, material);
            grid.set_layer_index(coord, Some(0));
        }
        grid
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert_eq!(
            VoxelGrid::new(0, 4),
            Err(GridError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert!(matches!(
            VoxelGrid::new(4, 0),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn new_rejects_oversized_grids() {
        assert!(matches!(
            VoxelGrid::new(usize::MAX, 1),
            Err(GridError::TooLarge { .. })
        ));
        assert!(matches!(
            VoxelGrid::new(4096, 4096),
            Err(GridError::TooLarge { .. })
        ));
    }

    #[test]
    fn new_grid_is_empty_air() {
        let grid = VoxelGrid::new(3, 5).unwrap();
        assert_eq!(grid.dimensions(), (4, 6, 4));
        assert_eq!(grid.sample_count(), 4 * 6 * 4);
        for coord in grid.coords() {
            assert_eq!(grid.density(coord), Some(0.0));
            assert_eq!(grid.material(coord), Some(Material::Air));
            assert_eq!(grid.layer_index(coord), None);
        }
        assert_eq!(grid.surface_height(3, 3), Some(0.0));
        assert_eq!(grid.surface_height(4, 0), None);
    }

    #[test]
    fn coord_of_inverts_index() {
        let grid = VoxelGrid::new(3, 2).unwrap();
        for (i, coord) in grid.coords().enumerate() {
            assert_eq!(grid.index(coord), i, "index mismatch at {coord}");
        }
    }

    #[test]
    fn out_of_bounds_access_is_harmless() {
        let mut grid = VoxelGrid::new(2, 2).unwrap();
        let outside = GridCoord::new(3, 0, 0);
        grid.set_density(outside, 10.0);
        grid.set_material(outside, Material::Granite);
        assert_eq!(grid.density(outside), None);
        assert_eq!(grid.material(outside), None);
        assert!(!grid.is_solid(outside));
    }

    #[test]
    fn layer_index_sentinel_round_trip() {
        let mut grid = VoxelGrid::new(2, 2).unwrap();
        let c = GridCoord::new(1, 1, 1);
        grid.set_layer_index(c, Some(3));
        assert_eq!(grid.layer_index(c), Some(3));
        grid.set_layer_index(c, None);
        assert_eq!(grid.layer_index(c), None);
        grid.set_layer_index(c, Some(NO_LAYER as usize));
        assert_eq!(grid.layer_index(c), None);
        grid.set_layer_index(c, Some(9000));
        assert_eq!(grid.layer_index(c), None);
    }

    #[test]
    fn dig_at_center_flips_single_cell() {
        let mut grid = solid_grid(4, 4, 5.0, Material::Granite);
        let center = Vec3::new(2.0, 2.0, 2.0);

        let removed = grid.modify_density(center, 1.0, 10.0);

        let c = GridCoord::new(2, 2, 2);
        assert_eq!(grid.density(c), Some(-5.0));
        assert_eq!(grid.material(c), Some(Material::Air));
        assert_eq!(grid.layer_index(c), None);
        assert_eq!(removed.get(&Material::Granite), Some(&1));
        assert_eq!(tally_total(&removed), 1);

        // Neighbours sit exactly on the radius and receive zero falloff.
        assert_eq!(grid.density(GridCoord::new(3, 2, 2)), Some(5.0));
        assert_eq!(grid.density(GridCoord::new(2, 1, 2)), Some(5.0));
    }

    #[test]
    fn dig_outside_grid_is_skipped() {
        let mut grid = solid_grid(3, 3, 1.0, Material::Dirt);
        let before = grid.clone();
        let removed = grid.modify_density(Vec3::new(-10.0, -10.0, -10.0), 2.0, 100.0);
        assert!(removed.is_empty());
        assert_eq!(grid, before);

        let removed = grid.modify_density(Vec3::new(50.0, 1.0, 1.0), 2.0, 100.0);
        assert!(removed.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn dig_straddling_edge_clamps() {
        let mut grid = solid_grid(3, 3, 1.0, Material::Dirt);
        let removed = grid.modify_density(Vec3::new(0.0, 0.0, 0.0), 1.5, 10.0);
        assert!(tally_total(&removed) > 0);
        assert_eq!(grid.density(GridCoord::new(0, 0, 0)), Some(-9.0));
    }

    #[test]
    fn dig_with_degenerate_arguments_is_noop() {
        let mut grid = solid_grid(2, 2, 1.0, Material::Dirt);
        let before = grid.clone();
        let p = Vec3::splat(1.0);
        assert!(grid.modify_density(p, 0.0, 5.0).is_empty());
        assert!(grid.modify_density(p, -1.0, 5.0).is_empty());
        assert!(grid.modify_density(p, 1.0, 0.0).is_empty());
        assert!(grid.modify_density(p, 1.0, -3.0).is_empty());
        assert!(grid.modify_density(Vec3::NAN, 1.0, 3.0).is_empty());
        assert!(grid.modify_density(p, f32::INFINITY, 3.0).is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn dig_does_not_count_already_empty_cells() {
        let mut grid = solid_grid(2, 2, -1.0, Material::Air);
        let removed = grid.modify_density(Vec3::splat(1.0), 2.0, 4.0);
        assert!(removed.is_empty());
    }

    #[test]
    fn is_solid_at_floors_position() {
        let mut grid = VoxelGrid::new(3, 3).unwrap();
        grid.set_density(GridCoord::new(1, 2, 1), 0.5);
        assert!(grid.is_solid_at(Vec3::new(1.9, 2.99, 1.0)));
        assert!(!grid.is_solid_at(Vec3::new(2.0, 2.5, 1.0)));
        assert!(!grid.is_solid_at(Vec3::new(-0.1, 2.5, 1.0)));
        assert!(!grid.is_solid_at(Vec3::new(1.0, 100.0, 1.0)));
    }

    #[test]
    fn layer_at_resolves_reference() {
        let layers = crate::strata::default_layers();
        let mut grid = VoxelGrid::new(3, 3).unwrap();
        grid.set_layer_index(GridCoord::new(0, 0, 0), Some(2));
        grid.set_layer_index(GridCoord::new(1, 0, 0), Some(layers.len() + 5));

        let layer = grid.layer_at(Vec3::new(0.4, 0.4, 0.4), &layers).unwrap();
        assert_eq!(layer.name, layers[2].name);
        assert!(grid.layer_at(Vec3::new(1.2, 0.0, 0.0), &layers).is_none());
        assert!(grid.layer_at(Vec3::new(2.0, 0.0, 0.0), &layers).is_none());
        assert!(grid.layer_at(Vec3::new(-1.0, 0.0, 0.0), &layers).is_none());
    }

    #[test]
    fn face_neighbors_skip_negative_axes() {
        let origin = GridCoord::new(0, 0, 0);
        let present: Vec<_> = origin.face_neighbors().into_iter().flatten().collect();
        assert_eq!(present.len(), 3);

        let inner = GridCoord::new(1, 1, 1);
        assert_eq!(inner.face_neighbors().iter().flatten().count(), 6);
    }
}
