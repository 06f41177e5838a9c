use deepvein_core::MaterialTally;
use deepvein_mesh::{Extractor, Mesh};
use deepvein_world::{
    default_layers, default_ore_rules, find_floating_ore_clusters, validate_layers,
    validate_ore_rules, GenerationStats, GridError, OreCluster, OreRule, OreRuleError,
    StrataError, StrataLayer, TerrainGenerator, TerrainParams, TerrainParamsError, VoxelGrid,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::markers::{MarkerCheck, MarkerState, OreMarker};

/// Placement of a chunk in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkTransform {
    /// World position of sample `(0, 0, 0)`.
    pub origin: Vec3,
    /// World units per grid step.
    pub voxel_size: f32,
}

impl Default for ChunkTransform {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            voxel_size: 1.0,
        }
    }
}

impl ChunkTransform {
    pub fn new(origin: Vec3, voxel_size: f32) -> Self {
        Self { origin, voxel_size }
    }

    /// Grid-space position of a world point.
    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        (world - self.origin) / self.voxel_size
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.origin + local * self.voxel_size
    }
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Strata(#[from] StrataError),
    #[error(transparent)]
    OreRules(#[from] OreRuleError),
    #[error(transparent)]
    Terrain(#[from] TerrainParamsError),
    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f32),
}

/// One terrain chunk: its grid, cached surface mesh and ore markers.
///
/// The chunk starts uninitialized. Until [`TerrainChunk::initialize_terrain`] succeeds, edits and
/// queries log a warning and return an empty result.
#[derive(Debug)]
pub struct TerrainChunk {
    transform: ChunkTransform,
    params: TerrainParams,
    layers: Vec<StrataLayer>,
    ore_rules: Vec<OreRule>,
    marker_check: MarkerCheck,
    grid: Option<VoxelGrid>,
    mesh: Option<Mesh>,
    markers: Vec<OreMarker>,
}

impl TerrainChunk {
    /// Uninitialized chunk with the default stratigraphy and ore rules.
    pub fn new(transform: ChunkTransform) -> Self {
        Self {
            transform,
            params: TerrainParams::default(),
            layers: default_layers(),
            ore_rules: default_ore_rules(),
            marker_check: MarkerCheck::default(),
            grid: None,
            mesh: None,
            markers: Vec::new(),
        }
    }

    /// Uninitialized chunk with validated configuration.
    pub fn with_config(
        transform: ChunkTransform,
        params: TerrainParams,
        layers: Vec<StrataLayer>,
        ore_rules: Vec<OreRule>,
    ) -> Result<Self, ChunkError> {
        if !(transform.voxel_size.is_finite() && transform.voxel_size > 0.0) {
            return Err(ChunkError::InvalidVoxelSize(transform.voxel_size));
        }
        params.validate()?;
        validate_layers(&layers)?;
        validate_ore_rules(&ore_rules)?;
        Ok(Self {
            params,
            layers,
            ore_rules,
            ..Self::new(transform)
        })
    }

    pub fn with_marker_check(mut self, check: MarkerCheck) -> Self {
        self.marker_check = check;
        self
    }

    pub fn transform(&self) -> &ChunkTransform {
        &self.transform
    }

    /// Parameters of the last generation, or the configured ones before the first.
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn grid(&self) -> Option<&VoxelGrid> {
        self.grid.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Allocate a fresh grid and generate terrain into it.
    ///
    /// Any cached mesh and markers from a previous generation are dropped. On error the chunk
    /// keeps its previous state.
    pub fn initialize_terrain(
        &mut self,
        params: TerrainParams,
    ) -> Result<GenerationStats, ChunkError> {
        let generator = TerrainGenerator::new(params.clone())?;
        let mut grid = VoxelGrid::new(params.width, params.height)?;
        let stats = generator.generate(&mut grid, &self.ore_rules, &self.layers);
        self.params = params;
        self.grid = Some(grid);
        self.mesh = None;
        self.markers.clear();
        Ok(stats)
    }

    /// Rebuild the cached surface and re-check every marker against the edited terrain.
    pub fn regenerate_mesh(&mut self) -> Option<&Mesh> {
        let Some(grid) = self.grid.as_ref() else {
            warn!("regenerate_mesh called on an uninitialized chunk");
            return None;
        };

        let (mesh, stats) = Extractor::new(grid)
            .with_layers(&self.layers)
            .extract_with_stats();
        info!(
            triangles = stats.triangles,
            vertices = stats.vertices,
            active_cubes = stats.active_cubes,
            "chunk mesh rebuilt"
        );

        let mut detached = 0;
        for marker in &mut self.markers {
            let state = marker.check_connection(&self.marker_check, |world| {
                solid_at(grid, &self.transform, world)
            });
            if state == MarkerState::Detached {
                detached += 1;
            }
        }
        if detached > 0 {
            debug!(detached, "ore markers lost terrain support");
        }

        self.mesh = Some(mesh);
        self.mesh.as_ref()
    }

    /// Most recently built mesh.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Carve a sphere at a world position and rebuild the mesh.
    ///
    /// `radius` is measured in grid steps.
    pub fn dig_at_position(&mut self, world: Vec3, radius: f32, strength: f32) -> MaterialTally {
        let local = self.transform.world_to_local(world);
        let Some(grid) = self.grid.as_mut() else {
            warn!("dig_at_position called on an uninitialized chunk");
            return MaterialTally::new();
        };

        let removed = grid.modify_density(local, radius, strength);
        debug!(?local, radius, strength, removed = removed.len(), "dig applied");
        self.regenerate_mesh();
        removed
    }

    /// Whether a world position falls inside a solid sample.
    pub fn is_position_in_terrain(&self, world: Vec3) -> bool {
        let Some(grid) = self.grid.as_ref() else {
            warn!("is_position_in_terrain called on an uninitialized chunk");
            return false;
        };
        solid_at(grid, &self.transform, world)
    }

    /// Stratigraphy layer of the sample under a world position.
    pub fn layer_at_position(&self, world: Vec3) -> Option<&StrataLayer> {
        let Some(grid) = self.grid.as_ref() else {
            warn!("layer_at_position called on an uninitialized chunk");
            return None;
        };
        grid.layer_at(self.transform.world_to_local(world), &self.layers)
    }

    pub fn floating_ore_clusters(&self) -> Vec<OreCluster> {
        let Some(grid) = self.grid.as_ref() else {
            warn!("floating_ore_clusters called on an uninitialized chunk");
            return Vec::new();
        };
        find_floating_ore_clusters(grid)
    }

    /// Replace the marker list with one anchored marker per solid ore sample.
    pub fn spawn_ore_markers(&mut self) -> usize {
        let Some(grid) = self.grid.as_ref() else {
            warn!("spawn_ore_markers called on an uninitialized chunk");
            return 0;
        };

        self.markers = grid
            .coords()
            .filter(|&coord| grid.is_solid(coord))
            .filter_map(|coord| {
                let material = grid.material(coord)?;
                material.is_ore().then(|| {
                    OreMarker::new(material, self.transform.local_to_world(coord.as_vec3()))
                })
            })
            .collect();
        debug!(count = self.markers.len(), "ore markers spawned");
        self.markers.len()
    }

    pub fn markers(&self) -> &[OreMarker] {
        &self.markers
    }

    /// Remove and return every detached marker.
    pub fn take_detached_markers(&mut self) -> Vec<OreMarker> {
        let (detached, anchored) = std::mem::take(&mut self.markers)
            .into_iter()
            .partition(OreMarker::is_detached);
        self.markers = anchored;
        detached
    }
}

fn solid_at(grid: &VoxelGrid, transform: &ChunkTransform, world: Vec3) -> bool {
    grid.is_solid_at(transform.world_to_local(world))
}
