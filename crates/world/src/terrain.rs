//! Terrain generation: surface heights, density fill, ore veins and layer assignment.
//!
//! Generation runs in three passes over a [`VoxelGrid`]:
//! 1. a 2D noise surface height per column,
//! 2. a density fill (`surface - y`) with base material from the stratigraphy and ore overrides,
//! 3. a layer pass that stores each solid sample's layer index.

use deepvein_core::Material;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::grid::{GridCoord, VoxelGrid};
use crate::noise::{NoiseConfig, NoiseGenerator};
use crate::ore::OreRule;
use crate::strata::{layer_index_for_depth, StrataLayer};

/// Material used for solid samples when no stratigraphy layers are supplied.
pub const FALLBACK_MATERIAL: Material = Material::Dirt;

/// Parameters controlling chunk shape and surface generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Horizontal cube count (X and Z).
    pub width: usize,
    /// Vertical cube count.
    pub height: usize,
    /// Noise seed.
    pub seed: u32,
    /// World-space X offset applied before sampling the surface noise.
    pub offset_x: f32,
    /// World-space Z offset applied before sampling the surface noise.
    pub offset_z: f32,
    /// Surface noise frequency.
    pub scale: f32,
    /// Mean surface height.
    pub base_height: f32,
    /// Peak-to-trough surface variation.
    pub amplitude: f32,
    /// Surface noise octaves. One reproduces plain Perlin.
    pub octaves: u32,
    /// Amplitude falloff between octaves.
    pub persistence: f32,
    /// Frequency growth between octaves.
    pub lacunarity: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 24,
            height: 40,
            seed: 0,
            offset_x: 0.0,
            offset_z: 0.0,
            scale: 0.05,
            base_height: 24.0,
            amplitude: 12.0,
            octaves: 1,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Terrain parameters that would poison the noise sampler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainParamsError {
    /// A parameter was NaN or infinite.
    #[error("terrain parameter `{field}` must be finite, got {value}")]
    NonFinite {
        /// Offending field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A parameter that scales noise frequency was zero or negative.
    #[error("terrain parameter `{field}` must be positive, got {value}")]
    NonPositive {
        /// Offending field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The surface amplitude was negative.
    #[error("terrain amplitude must not be negative, got {0}")]
    NegativeAmplitude(f32),
}

impl TerrainParams {
    /// Check every float parameter before it reaches the noise sampler.
    ///
    /// A zero amplitude is accepted and yields flat terrain at `base_height`.
    pub fn validate(&self) -> Result<(), TerrainParamsError> {
        let fields = [
            ("offset_x", self.offset_x),
            ("offset_z", self.offset_z),
            ("scale", self.scale),
            ("base_height", self.base_height),
            ("amplitude", self.amplitude),
            ("persistence", self.persistence),
            ("lacunarity", self.lacunarity),
        ];
        if let Some(&(field, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(TerrainParamsError::NonFinite { field, value });
        }
        for (field, value) in [("scale", self.scale), ("lacunarity", self.lacunarity)] {
            if value <= 0.0 {
                return Err(TerrainParamsError::NonPositive { field, value });
            }
        }
        if self.amplitude < 0.0 {
            return Err(TerrainParamsError::NegativeAmplitude(self.amplitude));
        }
        Ok(())
    }

    fn surface_noise(&self) -> NoiseConfig {
        NoiseConfig {
            octaves: self.octaves,
            lacunarity: self.lacunarity as f64,
            persistence: self.persistence as f64,
            frequency: self.scale as f64,
            seed: self.seed,
        }
    }
}

/// Summary of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Samples with positive density.
    pub solid_cells: usize,
    /// Solid samples tagged with an ore.
    pub ore_cells: usize,
    /// Lowest column surface height.
    pub min_surface: f32,
    /// Highest column surface height.
    pub max_surface: f32,
}

/// Deterministic terrain generator. Holds no state besides its noise sources.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    params: TerrainParams,
    surface: NoiseGenerator,
    ore: NoiseGenerator,
}

impl TerrainGenerator {
    /// Build a generator from validated parameters.
    pub fn new(params: TerrainParams) -> Result<Self, TerrainParamsError> {
        params.validate()?;
        Ok(Self {
            surface: NoiseGenerator::new(params.surface_noise()),
            ore: NoiseGenerator::new(NoiseConfig::ore(params.seed)),
            params,
        })
    }

    /// Surface height for column `(x, z)`.
    pub fn surface_height_at(&self, x: usize, z: usize) -> f32 {
        let noise = self.surface.sample_unit_2d(
            x as f64 + self.params.offset_x as f64,
            z as f64 + self.params.offset_z as f64,
        ) as f32;
        self.params.base_height + (noise - 0.5) * self.params.amplitude
    }

    /// First ore rule that claims sample `(x, y, z)`, if any.
    pub fn ore_at(&self, rules: &[OreRule], x: usize, y: usize, z: usize) -> Option<Material> {
        rules
            .iter()
            .filter(|rule| rule.applies_to_height(y))
            .find(|rule| {
                let value = self.ore.sample_planar_3d(
                    x as f64,
                    y as f64,
                    z as f64,
                    rule.seed_offset as f64,
                    rule.scale as f64,
                );
                value > rule.threshold as f64
            })
            .map(|rule| rule.material)
    }

    /// Fill `grid` with terrain. Every sample is overwritten.
    #[instrument(
        skip_all,
        fields(width = grid.width(), height = grid.height(), seed = self.params.seed)
    )]
    pub fn generate(
        &self,
        grid: &mut VoxelGrid,
        ore_rules: &[OreRule],
        layers: &[StrataLayer],
    ) -> GenerationStats {
        let (size_x, size_y, size_z) = grid.dimensions();

        let mut min_surface = f32::INFINITY;
        let mut max_surface = f32::NEG_INFINITY;
        for z in 0..size_z {
            for x in 0..size_x {
                let surface = self.surface_height_at(x, z);
                min_surface = min_surface.min(surface);
                max_surface = max_surface.max(surface);
                grid.set_surface_height(x, z, surface);
            }
        }

        let mut stats = GenerationStats {
            min_surface,
            max_surface,
            ..Default::default()
        };

        for y in 0..size_y {
            for z in 0..size_z {
                for x in 0..size_x {
                    let coord = GridCoord::new(x, y, z);
                    let surface = grid.surface_height(x, z).unwrap_or_default();
                    let density = surface - y as f32;
                    grid.set_density(coord, density);

                    if density <= 0.0 {
                        grid.set_material(coord, Material::Air);
                        continue;
                    }

                    let base = layer_index_for_depth(layers, density)
                        .map_or(FALLBACK_MATERIAL, |index| layers[index].material);
                    let material = self.ore_at(ore_rules, x, y, z).unwrap_or(base);
                    grid.set_material(coord, material);

                    stats.solid_cells += 1;
                    if material.is_ore() {
                        stats.ore_cells += 1;
                    }
                }
            }
        }

        apply_layers(grid, layers);

        debug!(
            solid = stats.solid_cells,
            ore = stats.ore_cells,
            min_surface = stats.min_surface,
            max_surface = stats.max_surface,
            "terrain generated"
        );
        stats
    }
}

/// Generate terrain into `grid` with a throwaway generator.
pub fn generate(
    grid: &mut VoxelGrid,
    params: &TerrainParams,
    ore_rules: &[OreRule],
    layers: &[StrataLayer],
) -> Result<GenerationStats, TerrainParamsError> {
    Ok(TerrainGenerator::new(params.clone())?.generate(grid, ore_rules, layers))
}

/// Store the stratigraphy layer of every solid sample; empty samples get no layer.
///
/// Depth is measured from the column's cached surface height. Solid samples deeper than the last
/// layer take the last layer.
pub fn apply_layers(grid: &mut VoxelGrid, layers: &[StrataLayer]) {
    let (size_x, size_y, size_z) = grid.dimensions();
    for y in 0..size_y {
        for z in 0..size_z {
            for x in 0..size_x {
                let coord = GridCoord::new(x, y, z);
                let layer = if grid.is_solid(coord) {
                    let surface = grid.surface_height(x, z).unwrap_or_default();
                    layer_index_for_depth(layers, surface - y as f32)
                } else {
                    None
                };
                grid.set_layer_index(coord, layer);
            }
        }
    }
}
