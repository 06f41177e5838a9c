//! Per-vertex coloring.
//!
//! A vertex on the edge `a -> b` takes, in order of preference:
//! 1. the palette color of an ore at `a`,
//! 2. the stratigraphy color of `a`'s layer, blended towards the neighbouring layer near either
//!    boundary,
//! 3. the palette colors of `a` and `b`, interpolated along the edge.
//!
//! Any failed lookup produces [`FALLBACK_COLOR`].

use deepvein_core::Rgba;
use deepvein_world::{GridCoord, StrataLayer, VoxelGrid};
use glam::Vec3;

/// Color for vertices whose source data could not be resolved.
pub const FALLBACK_COLOR: Rgba = Rgba::MAGENTA;

/// Color a vertex at `position` on the edge from `a` to `b`, `t` of the way along.
pub fn vertex_color(
    grid: &VoxelGrid,
    layers: Option<&[StrataLayer]>,
    a: GridCoord,
    b: GridCoord,
    t: f32,
    position: Vec3,
) -> Rgba {
    let Some(material_a) = grid.material(a) else {
        return FALLBACK_COLOR;
    };
    if material_a.is_ore() {
        return material_a.color();
    }

    if let Some(layers) = layers {
        if let Some(index) = grid.layer_index(a).filter(|&i| i < layers.len()) {
            return match grid.surface_height(a.x, a.z) {
                Some(surface) => layer_color(layers, index, surface - position.y),
                None => FALLBACK_COLOR,
            };
        }
    }

    match grid.material(b) {
        Some(material_b) => material_a.color().lerp(material_b.color(), t),
        None => FALLBACK_COLOR,
    }
}

/// Color of `layers[index]` at `depth`, faded into a neighbour within its blend range.
///
/// The start boundary wins when both are in range. `index` must be in bounds.
pub fn layer_color(layers: &[StrataLayer], index: usize, depth: f32) -> Rgba {
    let layer = &layers[index];
    let base = layer.color;
    let blend = layer.blend_range;
    if blend <= 0.0 {
        return base;
    }

    let to_start = (depth - layer.depth_start).abs();
    let to_end = (depth - layer.depth_end).abs();
    if to_start < blend && index > 0 {
        layers[index - 1].color.lerp(base, to_start / blend)
    } else if to_end < blend && index + 1 < layers.len() {
        layers[index + 1].color.lerp(base, to_end / blend)
    } else {
        base
    }
}
