//! Core geometry and data model for the halogrid stencil engine.
//!
//! This crate provides the fundamental data structures for decomposing a
//! large multi-channel raster across a grid of worker nodes: the perimeter
//! minimizing partitioner, the process grid and neighbor resolver, the
//! halo-padded planar tile, and the normalized 3x3 convolution kernel.

pub mod error;
pub mod grid;
pub mod kernel;
pub mod params;
pub mod partition;
pub mod tile;

pub use error::{Error, Result};
pub use grid::{Direction, NeighborSet, ProcessGrid};
pub use kernel::Kernel3;
pub use params::RunParams;
pub use partition::partition;
pub use tile::{Region, Tile, TilePair};
