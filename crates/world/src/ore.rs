//! Ore vein placement rules.

use deepvein_core::Material;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generation-time predicate that replaces base material with an ore.
///
/// Rules are evaluated in list order; the first rule whose volumetric noise exceeds its threshold
/// claims the sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OreRule {
    /// Ore tag written on a match.
    pub material: Material,
    /// Noise value that must be exceeded. Higher is rarer.
    pub threshold: f32,
    /// Noise sampling scale. Smaller gives larger, more coherent veins.
    pub scale: f32,
    /// Lowest sample row (inclusive) the rule applies to.
    pub min_y: usize,
    /// Highest sample row (inclusive) the rule applies to.
    pub max_y: usize,
    /// Coordinate offset that decorrelates this rule from the others.
    #[serde(default)]
    pub seed_offset: f32,
}

impl OreRule {
    pub fn new(material: Material, threshold: f32, scale: f32, min_y: usize, max_y: usize) -> Self {
        Self {
            material,
            threshold,
            scale,
            min_y,
            max_y,
            seed_offset: 0.0,
        }
    }

    pub fn with_seed_offset(mut self, seed_offset: f32) -> Self {
        self.seed_offset = seed_offset;
        self
    }

    /// Whether row `y` lies inside the rule's vertical band.
    #[inline]
    pub fn applies_to_height(&self, y: usize) -> bool {
        (self.min_y..=self.max_y).contains(&y)
    }

    /// Check this rule in isolation.
    pub fn validate(&self) -> Result<(), OreRuleError> {
        if !self.material.is_ore() {
            return Err(OreRuleError::NotAnOre(self.material));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(OreRuleError::InvalidScale {
                material: self.material,
                scale: self.scale,
            });
        }
        if self.min_y > self.max_y {
            return Err(OreRuleError::InvertedBand {
                material: self.material,
                min_y: self.min_y,
                max_y: self.max_y,
            });
        }
        Ok(())
    }
}

/// Problems with an ore rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OreRuleError {
    #[error("ore rule material `{0}` is not an ore")]
    NotAnOre(Material),
    #[error("ore rule for `{material}` has invalid scale {scale}")]
    InvalidScale { material: Material, scale: f32 },
    #[error("ore rule for `{material}` has inverted band {min_y}..={max_y}")]
    InvertedBand {
        material: Material,
        min_y: usize,
        max_y: usize,
    },
}

/// Validate each rule in order, reporting the first failure.
pub fn validate_ore_rules(rules: &[OreRule]) -> Result<(), OreRuleError> {
    rules.iter().try_for_each(OreRule::validate)
}

/// Stock rule set, common to rare. Rarer ores sit deeper and use smaller veins.
pub fn default_ore_rules() -> Vec<OreRule> {
    vec![
        OreRule::new(Material::CopperOre, 0.20, 0.15, 6, 30).with_seed_offset(17.31),
        OreRule::new(Material::IronOre, 0.22, 0.13, 4, 26).with_seed_offset(143.77),
        OreRule::new(Material::GoldOre, 0.26, 0.11, 2, 18).with_seed_offset(311.09),
        OreRule::new(Material::AmethystOre, 0.28, 0.10, 1, 12).with_seed_offset(529.53),
        OreRule::new(Material::DiamondOre, 0.30, 0.09, 0, 8).with_seed_offset(877.41),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_validate() {
        validate_ore_rules(&default_ore_rules()).unwrap();
    }

    #[test]
    fn band_is_inclusive() {
        let rule = OreRule::new(Material::IronOre, 0.2, 0.1, 3, 5);
        assert!(!rule.applies_to_height(2));
        assert!(rule.applies_to_height(3));
        assert!(rule.applies_to_height(5));
        assert!(!rule.applies_to_height(6));
    }

    #[test]
    fn validate_rejects_non_ore_material() {
        let rule = OreRule::new(Material::Granite, 0.2, 0.1, 0, 5);
        assert_eq!(rule.validate(), Err(OreRuleError::NotAnOre(Material::Granite)));
    }

    #[test]
    fn validate_rejects_bad_scale_and_band() {
        let rule = OreRule::new(Material::GoldOre, 0.2, 0.0, 0, 5);
        assert!(matches!(rule.validate(), Err(OreRuleError::InvalidScale { .. })));

        let rule = OreRule::new(Material::GoldOre, 0.2, 0.1, 9, 5);
        assert!(matches!(rule.validate(), Err(OreRuleError::InvertedBand { .. })));
    }

    #[test]
    fn validate_reports_first_failure_in_order() {
        let rules = vec![
            OreRule::new(Material::IronOre, 0.2, 0.1, 0, 5),
            OreRule::new(Material::Dirt, 0.2, 0.1, 0, 5),
            OreRule::new(Material::GoldOre, 0.2, -1.0, 0, 5),
        ];
        assert_eq!(
            validate_ore_rules(&rules),
            Err(OreRuleError::NotAnOre(Material::Dirt))
        );
    }
}
