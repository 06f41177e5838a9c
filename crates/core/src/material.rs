//! Material tags stored per grid sample.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Rgba;

/// Substance occupying a grid sample.
///
/// Only meaningful while the sample's density is positive; empty samples are always [`Material::Air`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Material {
    /// Empty space.
    #[default]
    Air = 0,
    /// Grass-covered topsoil.
    Grass,
    /// Loose soil.
    Dirt,
    /// Pale sedimentary rock.
    Limestone,
    /// Hard crystalline rock.
    Granite,
    /// Near-indestructible base rock.
    Bedrock,
    /// Molten rock at the bottom of the chunk.
    Molten,
    /// Copper ore.
    CopperOre,
    /// Iron ore.
    IronOre,
    /// Gold ore.
    GoldOre,
    /// Amethyst ore.
    AmethystOre,
    /// Diamond ore.
    DiamondOre,
}

impl Material {
    /// Every material tag, in declaration order.
    pub const ALL: [Material; 12] = [
        Material::Air,
        Material::Grass,
        Material::Dirt,
        Material::Limestone,
        Material::Granite,
        Material::Bedrock,
        Material::Molten,
        Material::CopperOre,
        Material::IronOre,
        Material::GoldOre,
        Material::AmethystOre,
        Material::DiamondOre,
    ];

    /// Every ore tag.
    pub const ORES: [Material; 5] = [
        Material::CopperOre,
        Material::IronOre,
        Material::GoldOre,
        Material::AmethystOre,
        Material::DiamondOre,
    ];

    /// Whether this is the empty-space tag.
    #[inline]
    pub fn is_air(self) -> bool {
        self == Material::Air
    }

    /// Whether this tag is one of the ore variants.
    #[inline]
    pub fn is_ore(self) -> bool {
        matches!(
            self,
            Material::CopperOre
                | Material::IronOre
                | Material::GoldOre
                | Material::AmethystOre
                | Material::DiamondOre
        )
    }

    /// Fixed palette color for this material.
    ///
    /// Ores always render with this color; terrain materials only fall back to it when no
    /// stratigraphy layer applies.
    pub fn color(self) -> Rgba {
        match self {
            Material::Air => Rgba::CLEAR,
            Material::Grass => Rgba::rgb(0.4, 0.6, 0.3),
            Material::Dirt => Rgba::rgb(0.55, 0.40, 0.25),
            Material::Limestone => Rgba::rgb(0.75, 0.72, 0.60),
            Material::Granite => Rgba::rgb(0.35, 0.35, 0.38),
            Material::Bedrock => Rgba::rgb(0.15, 0.15, 0.15),
            Material::Molten => Rgba::rgb(0.9, 0.3, 0.1),
            Material::CopperOre => Rgba::rgb(0.72, 0.45, 0.20),
            Material::IronOre => Rgba::rgb(0.65, 0.65, 0.68),
            Material::GoldOre => Rgba::rgb(1.0, 0.84, 0.0),
            Material::AmethystOre => Rgba::rgb(0.68, 0.40, 0.72),
            Material::DiamondOre => Rgba::rgb(0.68, 0.85, 0.90),
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Material::Air => "air",
            Material::Grass => "grass",
            Material::Dirt => "dirt",
            Material::Limestone => "limestone",
            Material::Granite => "granite",
            Material::Bedrock => "bedrock",
            Material::Molten => "molten",
            Material::CopperOre => "copper_ore",
            Material::IronOre => "iron_ore",
            Material::GoldOre => "gold_ore",
            Material::AmethystOre => "amethyst_ore",
            Material::DiamondOre => "diamond_ore",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
