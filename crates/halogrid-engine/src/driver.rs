//! The per-node iteration driver.
//!
//! Each round: issue the row exchange, speculatively compute the whole
//! owned region with whatever halo data is resident, wait for the rows,
//! issue the column exchange, recompute the top/bottom boundary rings while
//! the columns are in flight, wait for them, recompute the left/right rings,
//! aggregate the changed flag grid-wide when similarity tracking is on, and
//! swap the tile roles. Only the outermost owned ring can be stale after the
//! speculative pass, and the border corrections overwrite exactly those
//! cells with their final values.

use halogrid_core::{Direction, Kernel3, NeighborSet, Region, TilePair};
use halogrid_simd::{apply_stencil, ChangeLatch, SimdCapability};

use crate::error::Result;
use crate::exchange::{self, Axis};
use crate::transport::Communicator;

/// Driver settings, identical on every node.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Maximum number of rounds.
    pub rounds: usize,
    /// Terminate early once a round changes nothing anywhere in the grid.
    pub track_similarity: bool,
    /// Kernel implementation to dispatch to.
    pub capability: SimdCapability,
}

/// What a finished run looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverReport {
    /// Rounds actually executed (the convergence round counts).
    pub rounds_completed: usize,
    /// Whether the run ended by grid-wide convergence rather than the
    /// round budget.
    pub converged: bool,
}

/// The iteration driver of one node.
#[derive(Debug, Clone)]
pub struct Driver<'a> {
    neighbors: NeighborSet,
    kernel: &'a Kernel3,
    config: DriverConfig,
}

impl<'a> Driver<'a> {
    pub fn new(neighbors: NeighborSet, kernel: &'a Kernel3, config: DriverConfig) -> Self {
        Self {
            neighbors,
            kernel,
            config,
        }
    }

    /// Run up to `config.rounds` rounds over `pair`, leaving the final
    /// result in `pair.current()`.
    pub fn run(&self, pair: &mut TilePair, comm: &mut dyn Communicator) -> Result<DriverReport> {
        let mut report = DriverReport {
            rounds_completed: 0,
            converged: false,
        };

        let rows = pair.current().rows();
        let cols = pair.current().cols();

        for round in 0..self.config.rounds {
            let rows_handle = exchange::begin_exchange(
                pair.current(),
                &self.neighbors,
                Axis::Rows,
                round as u32,
                comm,
            )?;

            // Speculative pass: full owned region, halos as-is. Only this
            // pass feeds the change latch.
            let mut latch = ChangeLatch::new();
            let track = self.config.track_similarity;
            self.compute(pair, Region::owned(rows, cols), track.then_some(&mut latch));

            exchange::wait(rows_handle, pair.current_mut(), comm)?;

            // Column transfers go out only now, so their padding-row cells
            // carry this round's corner values onward.
            let cols_handle = exchange::begin_exchange(
                pair.current(),
                &self.neighbors,
                Axis::Cols,
                round as u32,
                comm,
            )?;

            // Top/bottom correction overlaps the in-flight column phase; a
            // corner cell recomputed here with a stale corner halo is in a
            // left/right ring too and gets its final value below.
            for direction in Axis::Rows.directions() {
                if self.neighbors.get(direction).is_some() {
                    self.compute(pair, border_region(rows, cols, direction), None);
                }
            }

            exchange::wait(cols_handle, pair.current_mut(), comm)?;

            for direction in Axis::Cols.directions() {
                if self.neighbors.get(direction).is_some() {
                    self.compute(pair, border_region(rows, cols, direction), None);
                }
            }

            report.rounds_completed = round + 1;

            if self.config.track_similarity {
                let any_changed = comm.allreduce_or(latch.changed())?;
                pair.swap();
                if !any_changed {
                    report.converged = true;
                    break;
                }
            } else {
                pair.swap();
            }
        }

        Ok(report)
    }

    fn compute(&self, pair: &mut TilePair, region: Region, mut latch: Option<&mut ChangeLatch>) {
        let (current, next) = pair.split_mut();
        let stride = current.padded_cols();
        for channel in 0..current.channels() {
            apply_stencil(
                current.plane(channel),
                next.plane_mut(channel),
                stride,
                self.kernel,
                region,
                self.config.capability,
                latch.as_deref_mut(),
            );
        }
    }
}

/// The owned boundary ring recomputed after halo data from `direction` has
/// landed.
fn border_region(rows: usize, cols: usize, direction: Direction) -> Region {
    match direction {
        Direction::Top => Region {
            row_start: 1,
            row_end: 2,
            col_start: 1,
            col_end: cols + 1,
        },
        Direction::Bottom => Region {
            row_start: rows,
            row_end: rows + 1,
            col_start: 1,
            col_end: cols + 1,
        },
        Direction::Left => Region {
            row_start: 1,
            row_end: rows + 1,
            col_start: 1,
            col_end: 2,
        },
        Direction::Right => Region {
            row_start: 1,
            row_end: rows + 1,
            col_start: cols,
            col_end: cols + 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ChannelMesh;
    use halogrid_core::ProcessGrid;

    fn lone_node() -> (NeighborSet, ChannelMesh) {
        let grid = ProcessGrid::new(8, 8, 1, 1).unwrap();
        let neighbors = NeighborSet::resolve(&grid, 0);
        let mesh = ChannelMesh::build(1).pop().unwrap();
        (neighbors, mesh)
    }

    #[test]
    fn fixed_point_terminates_after_one_round() {
        let (neighbors, mut comm) = lone_node();
        let kernel = Kernel3::gaussian();
        let driver = Driver::new(
            neighbors,
            &kernel,
            DriverConfig {
                rounds: 100,
                track_similarity: true,
                capability: SimdCapability::detect(),
            },
        );

        // All-zero tile is a fixed point; must stop after exactly 1 round.
        let mut pair = TilePair::new(8, 8, 1);
        let report = driver.run(&mut pair, &mut comm).unwrap();
        assert_eq!(report.rounds_completed, 1);
        assert!(report.converged);
    }

    #[test]
    fn runs_full_budget_while_changing() {
        let (neighbors, mut comm) = lone_node();
        let kernel = Kernel3::gaussian();
        let driver = Driver::new(
            neighbors,
            &kernel,
            DriverConfig {
                rounds: 3,
                track_similarity: true,
                capability: SimdCapability::detect(),
            },
        );

        let mut pair = TilePair::new(8, 8, 1);
        pair.current_mut().set(0, 4, 4, 16.0);
        let report = driver.run(&mut pair, &mut comm).unwrap();
        assert_eq!(report.rounds_completed, 3);
        assert!(!report.converged);
    }

    #[test]
    fn tracking_off_ignores_convergence() {
        let (neighbors, mut comm) = lone_node();
        let kernel = Kernel3::gaussian();
        let driver = Driver::new(
            neighbors,
            &kernel,
            DriverConfig {
                rounds: 5,
                track_similarity: false,
                capability: SimdCapability::detect(),
            },
        );

        let mut pair = TilePair::new(4, 4, 1);
        let report = driver.run(&mut pair, &mut comm).unwrap();
        assert_eq!(report.rounds_completed, 5);
        assert!(!report.converged);
    }

    #[test]
    fn lone_node_blur_spreads_impulse() {
        let (neighbors, mut comm) = lone_node();
        let kernel = Kernel3::gaussian();
        let driver = Driver::new(
            neighbors,
            &kernel,
            DriverConfig {
                rounds: 1,
                track_similarity: false,
                capability: SimdCapability::detect(),
            },
        );

        let mut pair = TilePair::new(8, 8, 1);
        pair.current_mut().set(0, 4, 4, 16.0);
        driver.run(&mut pair, &mut comm).unwrap();

        let out = pair.current();
        assert!((out.get(0, 4, 4) - 4.0).abs() < 1e-5);
        assert!((out.get(0, 3, 3) - 1.0).abs() < 1e-5);
        assert!((out.get(0, 5, 4) - 2.0).abs() < 1e-5);
        assert_eq!(out.get(0, 1, 1), 0.0);
    }
}
