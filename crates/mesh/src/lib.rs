//! Marching-cubes surface extraction with stratigraphy vertex colors.

#![warn(missing_docs)]

mod extract;
mod mesh;
mod shade;
pub mod tables;
mod weld;

pub use extract::*;
pub use mesh::*;
pub use shade::*;
pub use weld::*;
