use anyhow::Result;
use deepvein_chunk::{ChunkError, ChunkTransform, DigTool, MarkerCheck, TerrainChunk};
use deepvein_world::{default_layers, default_ore_rules, OreRule, StrataLayer, TerrainParams};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/deepvein.toml";

/// Everything needed to build and dig one chunk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeepveinConfig {
    pub terrain: TerrainParams,
    /// Placement of the chunk in world space.
    pub transform: ChunkTransform,
    /// Stratigraphy, shallowest first.
    pub layers: Vec<StrataLayer>,
    /// Ore rules in priority order.
    pub ore_rules: Vec<OreRule>,
    pub tool: DigTool,
    pub markers: MarkerCheck,
}

impl Default for DeepveinConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
            transform: ChunkTransform::default(),
            layers: default_layers(),
            ore_rules: default_ore_rules(),
            tool: DigTool::default(),
            markers: MarkerCheck::default(),
        }
    }
}

impl DeepveinConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    ///
    /// Terrain parameters the generator would reject count as an error.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<DeepveinConfig>(&contents) {
                Ok(cfg) => match cfg.terrain.validate() {
                    Ok(()) => cfg,
                    Err(err) => {
                        warn!("Invalid terrain in {}: {err}. Using defaults", path.display());
                        DeepveinConfig::default()
                    }
                },
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    DeepveinConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Config not found at {}. Using defaults", path.display());
                }
                DeepveinConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Validate the layers and ore rules and build an uninitialized chunk from them.
    pub fn build_chunk(&self) -> Result<TerrainChunk, ChunkError> {
        Ok(TerrainChunk::with_config(
            self.transform,
            self.terrain.clone(),
            self.layers.clone(),
            self.ore_rules.clone(),
        )?
        .with_marker_check(self.markers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepvein_core::Material;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(name: &str) -> PathBuf {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("deepvein_{name}_{timestamp}"))
    }

    #[test]
    fn toml_round_trip_preserves_config() {
        let dir = scratch_dir("config_round_trip");
        let path = dir.join("deepvein.toml");

        let mut config = DeepveinConfig::default();
        config.terrain.seed = 77;
        config.tool.tier = 2;
        config.layers[1].blend_range = 0.25;
        config.ore_rules.truncate(2);

        config.save_to_path(&path).expect("config saved");
        let loaded = DeepveinConfig::load_from_path(&path);
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = scratch_dir("config_missing").join("absent.toml");
        assert_eq!(DeepveinConfig::load_from_path(&path), DeepveinConfig::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = scratch_dir("config_malformed");
        fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("bad.toml");
        fs::write(&path, "terrain = [not toml").expect("write");
        assert_eq!(DeepveinConfig::load_from_path(&path), DeepveinConfig::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = scratch_dir("config_partial");
        fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("partial.toml");
        fs::write(&path, "[terrain]\nseed = 9\nwidth = 10\n\n[tool]\ntier = 3\n").expect("write");

        let loaded = DeepveinConfig::load_from_path(&path);
        assert_eq!(loaded.terrain.seed, 9);
        assert_eq!(loaded.terrain.width, 10);
        assert_eq!(loaded.terrain.height, TerrainParams::default().height);
        assert_eq!(loaded.tool.tier, 3);
        assert_eq!(loaded.tool.strength, DigTool::default().strength);
        assert_eq!(loaded.layers, default_layers());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn nan_terrain_scale_falls_back_to_defaults() {
        let dir = scratch_dir("config_nan_scale");
        fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("nan.toml");
        fs::write(&path, "[terrain]\nseed = 4\nscale = nan\n").expect("write");
        assert_eq!(DeepveinConfig::load_from_path(&path), DeepveinConfig::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn build_chunk_validates_configuration() {
        assert!(DeepveinConfig::default().build_chunk().is_ok());

        let mut config = DeepveinConfig::default();
        config.ore_rules[0].material = Material::Limestone;
        assert!(matches!(config.build_chunk(), Err(ChunkError::OreRules(_))));

        let mut config = DeepveinConfig::default();
        config.layers.clear();
        assert!(matches!(config.build_chunk(), Err(ChunkError::Strata(_))));

        let mut config = DeepveinConfig::default();
        config.terrain.amplitude = f32::INFINITY;
        assert!(matches!(config.build_chunk(), Err(ChunkError::Terrain(_))));
    }
}
