//! Depth-keyed stratigraphy layers.
//!
//! Layers are ordered shallow to deep. Depth is measured downwards from a column's surface height,
//! so a sample at `y` in a column with surface `s` has depth `s - y`.

use deepvein_core::{Material, Rgba};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::NO_LAYER;

/// One band of the stratigraphy profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrataLayer {
    /// Display name.
    pub name: String,
    /// Base material written to solid samples in this band.
    pub material: Material,
    /// Depth (inclusive) where the band starts.
    pub depth_start: f32,
    /// Depth (exclusive) where the band ends.
    pub depth_end: f32,
    /// Display color.
    pub color: Rgba,
    /// Distance from either boundary over which color fades into the neighbouring layer.
    #[serde(default)]
    pub blend_range: f32,
    /// Minimum tool tier able to dig this band.
    #[serde(default)]
    pub required_tool_tier: u32,
    /// Divisor applied to dig strength.
    #[serde(default = "default_hardness")]
    pub hardness: f32,
}

fn default_hardness() -> f32 {
    1.0
}

impl StrataLayer {
    /// Construct a layer with no blending, tier 0 and unit hardness.
    pub fn new(name: impl Into<String>, material: Material, depth_start: f32, depth_end: f32) -> Self {
        Self {
            name: name.into(),
            material,
            depth_start,
            depth_end,
            color: material.color(),
            blend_range: 0.0,
            required_tool_tier: 0,
            hardness: 1.0,
        }
    }

    /// Override the display color.
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Override the blend range.
    pub fn with_blend(mut self, blend_range: f32) -> Self {
        self.blend_range = blend_range;
        self
    }

    /// Override tool tier and hardness.
    pub fn with_digging(mut self, required_tool_tier: u32, hardness: f32) -> Self {
        self.required_tool_tier = required_tool_tier;
        self.hardness = hardness;
        self
    }

    /// Whether `depth` falls in `[depth_start, depth_end)`.
    #[inline]
    pub fn contains_depth(&self, depth: f32) -> bool {
        depth >= self.depth_start && depth < self.depth_end
    }
}

/// Index of the layer containing `depth`.
///
/// Depths beyond the last band clamp to the deepest layer; depths above the first band (negative,
/// from interpolation above the cached surface) clamp to the first. `None` only for an empty list.
pub fn layer_index_for_depth(layers: &[StrataLayer], depth: f32) -> Option<usize> {
    let first = layers.first()?;
    if let Some(index) = layers.iter().position(|layer| layer.contains_depth(depth)) {
        return Some(index);
    }
    if depth < first.depth_start {
        Some(0)
    } else {
        Some(layers.len() - 1)
    }
}

/// Configuration problems in a layer list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrataError {
    #[error("stratigraphy needs at least one layer")]
    Empty,
    #[error("{count} layers exceed the limit of {max}")]
    TooMany { count: usize, max: usize },
    #[error("layer `{name}` has an empty interval [{start}, {end})")]
    EmptyInterval { name: String, start: f32, end: f32 },
    #[error("layer `{name}` starts at {found} but the previous layer ends at {expected}")]
    Discontinuous {
        name: String,
        expected: f32,
        found: f32,
    },
    #[error("layer `{name}` has negative blend range {blend_range}")]
    NegativeBlend { name: String, blend_range: f32 },
    #[error("layer `{name}` has non-positive hardness {hardness}")]
    NonPositiveHardness { name: String, hardness: f32 },
    #[error("layer `{name}` uses air as its material")]
    AirMaterial { name: String },
}

/// Check that layers are non-empty, contiguous, ordered and sane.
pub fn validate_layers(layers: &[StrataLayer]) -> Result<(), StrataError> {
    if layers.is_empty() {
        return Err(StrataError::Empty);
    }
    let max = NO_LAYER as usize;
    if layers.len() > max {
        return Err(StrataError::TooMany {
            count: layers.len(),
            max,
        });
    }

    let mut previous_end: Option<f32> = None;
    for layer in layers {
        if layer.depth_end.partial_cmp(&layer.depth_start) != Some(std::cmp::Ordering::Greater) {
            return Err(StrataError::EmptyInterval {
                name: layer.name.clone(),
                start: layer.depth_start,
                end: layer.depth_end,
            });
        }
        if let Some(expected) = previous_end {
            if layer.depth_start != expected {
                return Err(StrataError::Discontinuous {
                    name: layer.name.clone(),
                    expected,
                    found: layer.depth_start,
                });
            }
        }
        if layer.blend_range.is_nan() || layer.blend_range < 0.0 {
            return Err(StrataError::NegativeBlend {
                name: layer.name.clone(),
                blend_range: layer.blend_range,
            });
        }
        if layer.hardness.is_nan() || layer.hardness <= 0.0 {
            return Err(StrataError::NonPositiveHardness {
                name: layer.name.clone(),
                hardness: layer.hardness,
            });
        }
        if layer.material.is_air() {
            return Err(StrataError::AirMaterial {
                name: layer.name.clone(),
            });
        }
        previous_end = Some(layer.depth_end);
    }
    Ok(())
}

/// The stock six-band profile: grass, dirt, limestone, granite, bedrock, molten core.
pub fn default_layers() -> Vec<StrataLayer> {
    vec![
        StrataLayer::new("Grass", Material::Grass, 0.0, 1.0).with_blend(0.5),
        StrataLayer::new("Topsoil", Material::Dirt, 1.0, 4.0)
            .with_color(Rgba::rgb(0.62, 0.45, 0.27))
            .with_blend(1.0),
        StrataLayer::new("Limestone", Material::Limestone, 4.0, 10.0)
            .with_blend(1.0)
            .with_digging(0, 1.5),
        StrataLayer::new("Granite", Material::Granite, 10.0, 18.0)
            .with_blend(1.0)
            .with_digging(1, 2.5),
        StrataLayer::new("Bedrock", Material::Bedrock, 18.0, 26.0)
            .with_blend(0.5)
            .with_digging(2, 4.0),
        StrataLayer::new("Molten Core", Material::Molten, 26.0, 1000.0)
            .with_blend(0.5)
            .with_digging(3, 6.0),
    ]
}
