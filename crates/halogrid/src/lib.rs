//! # Halogrid
//!
//! A distributed halo-exchange stencil engine for large multi-channel
//! rasters.
//!
//! Halogrid runs an iterative 3x3 convolution (Gaussian blur by default)
//! over a 2D raster split across a grid of cooperating worker nodes. Each
//! node owns a rectangular tile padded with a 1-cell halo ring; every round
//! it exchanges boundary cells with its neighbors, overlapping the transfers
//! with a speculative compute pass over its own cells.
//!
//! ## Quick Start
//!
//! ```rust
//! use halogrid::prelude::*;
//!
//! // Choose a node grid for an 8x8 raster on 4 nodes.
//! let width_div = partition(8, 8, 4).unwrap();
//! let grid = ProcessGrid::new(8, 8, 4, width_div).unwrap();
//! assert_eq!((grid.tile_rows, grid.tile_cols), (4, 4));
//! ```
//!
//! ## Running a Grid
//!
//! ```rust,ignore
//! use halogrid::prelude::*;
//!
//! let params = RunParams { global_width: 1024, global_height: 1024,
//!     channels: 3, rounds: 10, track_similarity: true };
//! params.validate()?;
//!
//! let width_div = partition(1024, 1024, 4)?;
//! let grid = ProcessGrid::new(1024, 1024, 4, width_div)?;
//! let kernel = Kernel3::gaussian();
//!
//! // One worker thread per rank over an in-process channel mesh.
//! for mut comm in ChannelMesh::build(4) {
//!     let report = run_node(&params, &grid, &kernel,
//!         SimdCapability::detect(), &input, &output, &mut comm)?;
//! }
//! ```

// Re-export member crates
pub use halogrid_core as core;
pub use halogrid_engine as engine;
pub use halogrid_simd as simd;

// ============================================================================
// Convenient re-exports from halogrid_core
// ============================================================================

pub use halogrid_core::{
    // Errors
    Error as CoreError,
    // Grid geometry
    Direction,
    // Kernel
    Kernel3,
    NeighborSet,
    ProcessGrid,
    Region,
    // Run parameters
    RunParams,
    // Tile storage
    Tile,
    TilePair,
    // Partitioner
    partition,
};

// ============================================================================
// Convenient re-exports from halogrid_simd
// ============================================================================

pub use halogrid_simd::{ChangeLatch, SimdCapability, apply_stencil};

// ============================================================================
// Convenient re-exports from halogrid_engine
// ============================================================================

pub use halogrid_engine::{
    // Halo exchange
    Axis,
    // Transport
    ChannelMesh,
    Communicator,
    // Iteration driver
    Driver,
    DriverConfig,
    DriverReport,
    // Errors
    Error as EngineError,
    ExchangeHandle,
    NodeReport,
    // Timing
    PhaseTimes,
    // Storage
    RasterFile,
    StridedRegion,
    begin_exchange,
    // Worker pipeline
    run_node,
    wait,
};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module containing commonly used types and functions.
///
/// ```rust
/// use halogrid::prelude::*;
/// ```
pub mod prelude {
    // Geometry
    pub use crate::{Direction, NeighborSet, ProcessGrid, partition};

    // Data model
    pub use crate::{Kernel3, Region, RunParams, Tile, TilePair};

    // Stencil kernel
    pub use crate::{ChangeLatch, SimdCapability, apply_stencil};

    // Engine
    pub use crate::{
        ChannelMesh, Communicator, Driver, DriverConfig, DriverReport, RasterFile, run_node,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_square_grid() {
        assert_eq!(partition(8, 8, 4).unwrap(), 2);
    }

    #[test]
    fn test_grid_from_partition() {
        let width_div = partition(64, 32, 8).unwrap();
        let grid = ProcessGrid::new(64, 32, 8, width_div).unwrap();
        assert_eq!(grid.num_nodes(), 8);
        assert_eq!(grid.global_width % grid.tile_cols, 0);
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let k = Kernel3::gaussian();
        let sum: f32 = k.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lone_node_mesh() {
        let mut meshes = ChannelMesh::build(1);
        assert_eq!(meshes[0].rank(), 0);
        assert_eq!(meshes[0].size(), 1);
        assert!(meshes.pop().unwrap().allreduce_or(true).unwrap());
    }
}
