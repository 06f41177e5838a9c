//! Ore markers: world-space handles for ore samples that detach once the rock around them is gone.

use deepvein_core::Material;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Whether a marker still has terrain around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    /// At least one probe found terrain.
    Anchored,
    /// Every probe found air.
    Detached,
}

/// Probe settings for [`OreMarker::check_connection`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerCheck {
    /// Distance from the marker to each of the six axis probes, in world units.
    pub radius: f32,
    /// Solid probes needed to stay anchored.
    pub min_solid_samples: usize,
}

impl Default for MarkerCheck {
    fn default() -> Self {
        Self {
            radius: 1.5,
            min_solid_samples: 1,
        }
    }
}

impl MarkerCheck {
    /// The six axis-aligned probe points around `center`.
    pub fn probes(&self, center: Vec3) -> [Vec3; 6] {
        let r = self.radius;
        [
            center + Vec3::X * r,
            center - Vec3::X * r,
            center + Vec3::Y * r,
            center - Vec3::Y * r,
            center + Vec3::Z * r,
            center - Vec3::Z * r,
        ]
    }
}

/// A single ore sample exposed to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OreMarker {
    pub material: Material,
    /// World-space position of the ore sample.
    pub position: Vec3,
    pub state: MarkerState,
}

impl OreMarker {
    pub fn new(material: Material, position: Vec3) -> Self {
        Self {
            material,
            position,
            state: MarkerState::Anchored,
        }
    }

    pub fn is_detached(&self) -> bool {
        self.state == MarkerState::Detached
    }

    /// Probe the terrain around the marker and update its state.
    ///
    /// `is_solid` answers whether a world-space point lies inside terrain.
    pub fn check_connection(
        &mut self,
        check: &MarkerCheck,
        is_solid: impl Fn(Vec3) -> bool,
    ) -> MarkerState {
        let solid = check
            .probes(self.position)
            .into_iter()
            .filter(|&probe| is_solid(probe))
            .count();
        self.state = if solid < check.min_solid_samples {
            MarkerState::Detached
        } else {
            MarkerState::Anchored
        };
        self.state
    }
}
