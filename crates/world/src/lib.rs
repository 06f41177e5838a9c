//! Voxel density grid, procedural terrain and ore connectivity.

mod clusters;
mod grid;
mod noise;
mod ore;
mod strata;
mod terrain;

pub use clusters::*;
pub use crate::noise::{NoiseConfig, NoiseGenerator, ORE_SEED_OFFSET};
pub use grid::*;
pub use ore::*;
pub use strata::*;
pub use terrain::*;
