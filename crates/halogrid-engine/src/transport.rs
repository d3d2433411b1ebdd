//! Transport seam: strided-region descriptors and the communicator trait.
//!
//! A [`StridedRegion`] describes one logical tile boundary across every
//! channel plane as (base offset, block length, block count, stride) over
//! the flat arena, so one gather/scatter pair moves a whole boundary in a
//! single transfer. The [`Communicator`] trait is the seam between the
//! engine and whatever transport carries the data; the engine never assumes
//! more than directed halo send/receive plus three collectives.

use halogrid_core::Direction;

use crate::error::Result;

/// A strided region of a flat `f32` arena: `block_count` blocks of
/// `block_len` contiguous samples, consecutive blocks `stride` samples
/// apart, starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedRegion {
    pub offset: usize,
    pub block_len: usize,
    pub block_count: usize,
    pub stride: usize,
}

impl StridedRegion {
    /// Total samples covered.
    pub fn len(&self) -> usize {
        self.block_len * self.block_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the region out of `arena` into a contiguous payload.
    pub fn gather(&self, arena: &[f32]) -> Vec<f32> {
        let mut payload = Vec::with_capacity(self.len());
        for block in 0..self.block_count {
            let start = self.offset + block * self.stride;
            payload.extend_from_slice(&arena[start..start + self.block_len]);
        }
        payload
    }

    /// Copy a contiguous `payload` back into the region of `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `payload.len()` differs from `self.len()`.
    pub fn scatter(&self, arena: &mut [f32], payload: &[f32]) {
        assert_eq!(payload.len(), self.len(), "payload size mismatch");
        for block in 0..self.block_count {
            let start = self.offset + block * self.stride;
            arena[start..start + self.block_len]
                .copy_from_slice(&payload[block * self.block_len..(block + 1) * self.block_len]);
        }
    }
}

/// Directed, non-blocking transport between the nodes of one run.
///
/// Halo sends must not block; `recv_halo` blocks until the matching packet
/// of the current round has arrived. `direction` is always receiver
/// relative: a packet sent toward a node's top neighbor is tagged
/// `Direction::Bottom`, the ring it lands in over there.
pub trait Communicator: Send {
    /// This node's rank.
    fn rank(&self) -> usize;

    /// Number of nodes in the run.
    fn size(&self) -> usize;

    /// Issue a non-blocking directed send of one boundary payload.
    fn send_halo(
        &mut self,
        to: usize,
        direction: Direction,
        round: u32,
        payload: Vec<f32>,
    ) -> Result<()>;

    /// Block until the halo payload from `from` for `direction` arrives.
    fn recv_halo(&mut self, from: usize, direction: Direction, round: u32) -> Result<Vec<f32>>;

    /// Grid-wide logical OR. Collective: every node must call it once per
    /// round when similarity tracking is enabled.
    fn allreduce_or(&mut self, local: bool) -> Result<bool>;

    /// Grid-wide maximum, delivered to rank 0 only. Collective.
    fn reduce_max(&mut self, local: f64) -> Result<Option<f64>>;

    /// Block until every node has entered the barrier. Collective.
    fn barrier(&mut self) -> Result<()>;
}
