//! Halo exchange: concurrent directed boundary transfers, one per direction.
//!
//! One combined transfer moves a whole logical boundary across every channel
//! plane: a row boundary is `channels` blocks of `cols` contiguous samples
//! (one per plane), a column boundary is `channels * (rows + 2)`
//! single-sample blocks strided by the padded row width, walking every plane
//! at a fixed column — padding rows included.
//!
//! The exchange runs as two overlapped axis phases per round. Row transfers
//! (top/bottom) go first; column transfers are issued only after the row
//! phase has landed, so the two padding-row cells of each column payload
//! relay the *diagonal* neighbor's corner value for the current round.
//! Issuing all four directions at once would leave those corners one round
//! stale and break agreement with a single-process reference convolution.
//! Within a phase the transfers are concurrent and completion order is
//! unspecified; `begin_exchange` never blocks, and the halo rings a phase
//! writes are undefined until its [`wait`] returns.

use halogrid_core::{Direction, NeighborSet, Tile};

use crate::error::Result;
use crate::transport::{Communicator, StridedRegion};

/// One phase of the per-round exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Top and bottom row transfers.
    Rows,
    /// Left and right column transfers (carry the halo corners).
    Cols,
}

impl Axis {
    /// The two directions of this phase.
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::Rows => [Direction::Top, Direction::Bottom],
            Axis::Cols => [Direction::Left, Direction::Right],
        }
    }
}

/// The region of a node's own cells adjacent to the `direction` edge.
pub fn boundary_region(tile: &Tile, direction: Direction) -> StridedRegion {
    let pc = tile.padded_cols();
    let rows = tile.rows();
    match direction {
        Direction::Top => row_region(tile, pc + 1),
        Direction::Bottom => row_region(tile, rows * pc + 1),
        Direction::Left => col_region(tile, 1),
        Direction::Right => col_region(tile, pc - 2),
    }
}

/// The halo ring written by a receive from `direction`.
pub fn halo_region(tile: &Tile, direction: Direction) -> StridedRegion {
    let pc = tile.padded_cols();
    let rows = tile.rows();
    match direction {
        Direction::Top => row_region(tile, 1),
        Direction::Bottom => row_region(tile, (rows + 1) * pc + 1),
        Direction::Left => col_region(tile, 0),
        Direction::Right => col_region(tile, pc - 1),
    }
}

fn row_region(tile: &Tile, offset: usize) -> StridedRegion {
    StridedRegion {
        offset,
        block_len: tile.cols(),
        block_count: tile.channels(),
        stride: tile.plane_len(),
    }
}

fn col_region(tile: &Tile, offset: usize) -> StridedRegion {
    StridedRegion {
        offset,
        block_len: 1,
        block_count: tile.channels() * tile.padded_rows(),
        stride: tile.padded_cols(),
    }
}

/// The in-flight receives of one exchange phase.
#[derive(Debug)]
pub struct ExchangeHandle {
    round: u32,
    expected: Vec<(Direction, usize)>,
}

impl ExchangeHandle {
    /// Transfers still owed to this phase.
    pub fn pending(&self) -> usize {
        self.expected.len()
    }
}

/// Issue the non-blocking sends of one phase and register the matching
/// receives. Directions without a neighbor are skipped entirely; their halo
/// rings keep their last-written value.
pub fn begin_exchange(
    tile: &Tile,
    neighbors: &NeighborSet,
    axis: Axis,
    round: u32,
    comm: &mut dyn Communicator,
) -> Result<ExchangeHandle> {
    let mut expected = Vec::with_capacity(2);
    for direction in axis.directions() {
        let Some(peer) = neighbors.get(direction) else {
            continue;
        };
        let payload = boundary_region(tile, direction).gather(tile.as_slice());
        // Receiver-relative tag: our top boundary lands in the peer's
        // bottom halo.
        comm.send_halo(peer, direction.opposite(), round, payload)?;
        expected.push((direction, peer));
    }
    Ok(ExchangeHandle { round, expected })
}

/// Block until every transfer of the phase has completed, landing each
/// payload directly in its halo ring.
pub fn wait(handle: ExchangeHandle, tile: &mut Tile, comm: &mut dyn Communicator) -> Result<()> {
    for (direction, peer) in handle.expected {
        let payload = comm.recv_halo(peer, direction, handle.round)?;
        halo_region(tile, direction).scatter(tile.as_mut_slice(), &payload);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_boundary_covers_all_planes() {
        let tile = Tile::new(4, 6, 3);
        let region = boundary_region(&tile, Direction::Top);
        assert_eq!(region.offset, tile.padded_cols() + 1);
        assert_eq!(region.block_len, 6);
        assert_eq!(region.block_count, 3);
        assert_eq!(region.stride, tile.plane_len());
        assert_eq!(region.len(), 18);
    }

    #[test]
    fn column_boundary_walks_padded_rows_of_every_plane() {
        let tile = Tile::new(4, 6, 2);
        let region = boundary_region(&tile, Direction::Right);
        assert_eq!(region.offset, tile.padded_cols() - 2);
        assert_eq!(region.block_len, 1);
        assert_eq!(region.block_count, 2 * 6);
        assert_eq!(region.stride, tile.padded_cols());
    }

    #[test]
    fn boundary_and_halo_regions_are_disjoint() {
        let tile = Tile::new(3, 3, 1);
        for dir in Direction::ALL {
            let b = boundary_region(&tile, dir);
            let h = halo_region(&tile, dir);
            assert_ne!(b.offset, h.offset, "{dir}");
            assert_eq!(b.len(), h.len(), "{dir}");
        }
    }

    #[test]
    fn gathered_boundary_matches_owned_cells() {
        let mut tile = Tile::new(3, 4, 2);
        let interleaved: Vec<f32> = (0..3 * 4 * 2).map(|i| i as f32).collect();
        tile.pack(&interleaved);

        let payload = boundary_region(&tile, Direction::Bottom).gather(tile.as_slice());
        for channel in 0..2 {
            for col in 0..4 {
                assert_eq!(payload[channel * 4 + col], tile.get(channel, 3, col + 1));
            }
        }
    }

    #[test]
    fn axes_partition_the_directions() {
        let mut all: Vec<Direction> = Axis::Rows
            .directions()
            .into_iter()
            .chain(Axis::Cols.directions())
            .collect();
        all.sort_by_key(|d| format!("{d}"));
        let mut expected = Direction::ALL.to_vec();
        expected.sort_by_key(|d| format!("{d}"));
        assert_eq!(all, expected);
    }
}
