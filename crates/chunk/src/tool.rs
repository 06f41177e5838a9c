//! The digging tool: tier gating and hardness-scaled strikes against a chunk.

use deepvein_core::MaterialTally;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chunk::TerrainChunk;

/// Result of one strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DigOutcome {
    /// The layer at the hit point needs a better tool.
    Blocked {
        /// Name of the blocking layer.
        layer: String,
        /// Lowest tool tier that breaks it.
        required_tier: u32,
    },
    /// Samples flipped to air, per material.
    Dug {
        /// Removed sample count per material.
        removed: MaterialTally,
    },
}

impl DigOutcome {
    /// Short lowercase name for event logs.
    pub fn label(&self) -> &'static str {
        match self {
            DigOutcome::Blocked { .. } => "blocked",
            DigOutcome::Dug { .. } => "dug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigTool {
    /// Highest layer tier this tool can break.
    pub tier: u32,
    /// Density removed at the center of a strike, before hardness.
    pub strength: f32,
    /// Strike radius in grid steps.
    pub radius: f32,
}

impl Default for DigTool {
    fn default() -> Self {
        Self {
            tier: 0,
            strength: 10.0,
            radius: 2.0,
        }
    }
}

impl DigTool {
    /// Same tool at another tier.
    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier;
        self
    }

    /// Strike the chunk at a world position.
    ///
    /// The layer under `hit` decides whether the strike lands and how much its hardness
    /// divides the strength. A hit outside any layer digs at full strength.
    pub fn strike(&self, chunk: &mut TerrainChunk, hit: Vec3) -> DigOutcome {
        let strength = match chunk.layer_at_position(hit) {
            Some(layer) if self.tier < layer.required_tool_tier => {
                info!(
                    layer = %layer.name,
                    required = layer.required_tool_tier,
                    tier = self.tier,
                    "tool tier too low"
                );
                return DigOutcome::Blocked {
                    layer: layer.name.clone(),
                    required_tier: layer.required_tool_tier,
                };
            }
            Some(layer) => self.strength / layer.hardness,
            None => self.strength,
        };

        let removed = chunk.dig_at_position(hit, self.radius, strength);
        DigOutcome::Dug { removed }
    }
}
