//! Deterministic coherent noise for surface and ore generation.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Seed offset that separates the ore noise stream from the surface stream.
pub const ORE_SEED_OFFSET: u32 = 1000;

/// Configuration for multi-octave noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Number of octaves (layers of detail)
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves
    pub persistence: f64,
    /// Base frequency
    pub frequency: f64,
    /// Seed for deterministic generation
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 1,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 1.0,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Single-octave unit-frequency noise; callers scale coordinates themselves.
    pub fn ore(seed: u32) -> Self {
        Self {
            seed: seed.wrapping_add(ORE_SEED_OFFSET),
            ..Self::default()
        }
    }
}

/// Fractal Perlin noise sampler.
#[derive(Clone)]
pub struct NoiseGenerator {
    perlin: Perlin,
    config: NoiseConfig,
}

impl NoiseGenerator {
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            perlin: Perlin::new(config.seed),
            config,
        }
    }

    /// Multi-octave noise at 2D coordinates, in `[-1, 1]`.
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves.max(1) {
            value += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        (value / max_value).clamp(-1.0, 1.0)
    }

    /// [`Self::sample_2d`] remapped to `[0, 1]`.
    pub fn sample_unit_2d(&self, x: f64, y: f64) -> f64 {
        ((self.sample_2d(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Cheap volumetric noise built from three planar samples.
    ///
    /// Computes `n(x, y) * n(z, y) * n(x, z)` where each `n(a, b)` samples `[0, 1]` noise at
    /// `((a + offset) * scale, (b + offset) * scale)`. The result lies in `[0, 1]` and is strongly
    /// biased towards small values, so thresholds around `0.2` already produce sparse veins.
    pub fn sample_planar_3d(&self, x: f64, y: f64, z: f64, offset: f64, scale: f64) -> f64 {
        let n = |a: f64, b: f64| self.sample_unit_2d((a + offset) * scale, (b + offset) * scale);
        n(x, y) * n(z, y) * n(x, z)
    }
}

impl std::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic() {
        let config = NoiseConfig {
            octaves: 3,
            frequency: 0.07,
            seed: 12345,
            ..Default::default()
        };
        let a = NoiseGenerator::new(config.clone());
        let b = NoiseGenerator::new(config);

        for x in 0..10 {
            for y in 0..10 {
                assert_eq!(
                    a.sample_2d(x as f64, y as f64),
                    b.sample_2d(x as f64, y as f64),
                    "noise not deterministic at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn unit_samples_stay_in_range() {
        let gen = NoiseGenerator::new(NoiseConfig {
            octaves: 4,
            ..Default::default()
        });
        for x in 0..60 {
            for y in 0..60 {
                let v = gen.sample_unit_2d(x as f64 * 0.13, y as f64 * 0.17);
                assert!((0.0..=1.0).contains(&v), "value {v} out of range");
            }
        }
    }

    #[test]
    fn planar_product_stays_in_range() {
        let gen = NoiseGenerator::new(NoiseConfig::ore(7));
        for i in 0..200 {
            let f = i as f64;
            let v = gen.sample_planar_3d(f * 0.7, f * 0.3, f * 1.1, 17.31, 0.15);
            assert!((0.0..=1.0).contains(&v), "value {v} out of range");
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = NoiseGenerator::new(NoiseConfig {
            seed: 1,
            ..Default::default()
        });
        let b = NoiseGenerator::new(NoiseConfig {
            seed: 2,
            ..Default::default()
        });
        let any_different = (0..20)
            .flat_map(|x| (0..20).map(move |y| (x as f64 * 0.37, y as f64 * 0.41)))
            .any(|(x, y)| (a.sample_2d(x, y) - b.sample_2d(x, y)).abs() > 1e-3);
        assert!(any_different, "different seeds should produce different noise");
    }

    #[test]
    fn ore_config_offsets_seed() {
        assert_eq!(NoiseConfig::ore(5).seed, 5 + ORE_SEED_OFFSET);
        assert_eq!(NoiseConfig::ore(u32::MAX).seed, ORE_SEED_OFFSET - 1);
    }
}
