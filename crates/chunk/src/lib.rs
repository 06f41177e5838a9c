//! Chunk-owner facade: world-space digging, mesh caching, ore markers and the dig tool.

mod chunk;
mod markers;
mod tool;

pub use chunk::*;
pub use markers::*;
pub use tool::*;
