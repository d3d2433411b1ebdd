//! The per-node pipeline: read, pack, iterate, unpack, write.

use halogrid_core::{Kernel3, NeighborSet, ProcessGrid, RunParams, TilePair};
use halogrid_simd::SimdCapability;

use crate::driver::{Driver, DriverConfig, DriverReport};
use crate::error::Result;
use crate::storage::RasterFile;
use crate::timing::{PhaseTimer, PhaseTimes};
use crate::transport::Communicator;

/// What one node hands back to bootstrap.
#[derive(Debug, Clone, Copy)]
pub struct NodeReport {
    pub driver: DriverReport,
    /// Grid-maximum phase times; `Some` on rank 0 only.
    pub times: Option<PhaseTimes>,
}

/// Run one node of the grid end to end.
///
/// Every phase is bracketed by a barrier so the reduced per-phase times
/// measure the phase itself rather than node skew.
pub fn run_node(
    params: &RunParams,
    grid: &ProcessGrid,
    kernel: &Kernel3,
    capability: SimdCapability,
    input: &RasterFile,
    output: &RasterFile,
    comm: &mut dyn Communicator,
) -> Result<NodeReport> {
    let rank = comm.rank();
    let (origin_row, origin_col) = grid.origin_of(rank);
    let neighbors = NeighborSet::resolve(grid, rank);

    comm.barrier()?;
    let timer = PhaseTimer::start();
    let interleaved = input.read_region(origin_row, origin_col, grid.tile_rows, grid.tile_cols)?;
    let mut pair = TilePair::new(grid.tile_rows, grid.tile_cols, params.channels);
    pair.current_mut().pack(&interleaved);
    let read = timer.elapsed();

    comm.barrier()?;
    let timer = PhaseTimer::start();
    let driver = Driver::new(
        neighbors,
        kernel,
        DriverConfig {
            rounds: params.rounds,
            track_similarity: params.track_similarity,
            capability,
        },
    );
    let report = driver.run(&mut pair, comm)?;
    let compute = timer.elapsed();

    comm.barrier()?;
    let timer = PhaseTimer::start();
    let result = pair.current().unpack();
    output.write_region(origin_row, origin_col, grid.tile_rows, grid.tile_cols, &result)?;
    let write = timer.elapsed();

    let times = PhaseTimes {
        read,
        compute,
        write,
    }
    .reduce_max(comm)?;

    Ok(NodeReport {
        driver: report,
        times,
    })
}
