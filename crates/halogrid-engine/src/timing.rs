//! Per-phase wall-clock instrumentation.
//!
//! Each node times its own read, compute, and write phases; the slowest
//! node's time per phase is what a run reports, reduced to rank 0.

use std::time::Instant;

use crate::error::Result;
use crate::transport::Communicator;

/// Stopwatch for one phase.
#[derive(Debug)]
pub struct PhaseTimer {
    start: Instant,
}

impl PhaseTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed seconds since `start`.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Elapsed seconds per phase of one node (or, after reduction, the grid
/// maximum per phase).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimes {
    pub read: f64,
    pub compute: f64,
    pub write: f64,
}

impl PhaseTimes {
    /// Reduce each phase to its grid-wide maximum. Collective; rank 0 gets
    /// the result.
    pub fn reduce_max(&self, comm: &mut dyn Communicator) -> Result<Option<PhaseTimes>> {
        let read = comm.reduce_max(self.read)?;
        let compute = comm.reduce_max(self.compute)?;
        let write = comm.reduce_max(self.write)?;
        Ok(match (read, compute, write) {
            (Some(read), Some(compute), Some(write)) => Some(PhaseTimes {
                read,
                compute,
                write,
            }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ChannelMesh;
    use std::thread;

    #[test]
    fn timer_measures_something() {
        let timer = PhaseTimer::start();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(timer.elapsed() > 0.0);
    }

    #[test]
    fn reduction_takes_the_slowest_node() {
        let meshes = ChannelMesh::build(2);
        let handles: Vec<_> = meshes
            .into_iter()
            .enumerate()
            .map(|(rank, mut m)| {
                thread::spawn(move || {
                    let times = PhaseTimes {
                        read: rank as f64,
                        compute: 2.0 - rank as f64,
                        write: 0.5,
                    };
                    times.reduce_max(&mut m).unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results[0],
            Some(PhaseTimes {
                read: 1.0,
                compute: 2.0,
                write: 0.5
            })
        );
        assert_eq!(results[1], None);
    }

    #[test]
    fn skewed_arrival_keeps_phases_separate() {
        let meshes = ChannelMesh::build(3);
        let handles: Vec<_> = meshes
            .into_iter()
            .enumerate()
            .map(|(rank, mut m)| {
                thread::spawn(move || {
                    let times = match rank {
                        0 => PhaseTimes {
                            read: 1.0,
                            compute: 1.0,
                            write: 1.0,
                        },
                        1 => PhaseTimes {
                            read: 0.0,
                            compute: 100.0,
                            write: 0.0,
                        },
                        _ => {
                            // Arrive late: all three of rank 1's packets are
                            // already queued at the root by now. The compute
                            // maximum must not leak into the read reduction.
                            thread::sleep(std::time::Duration::from_millis(20));
                            PhaseTimes {
                                read: 5.0,
                                compute: 5.0,
                                write: 5.0,
                            }
                        }
                    };
                    times.reduce_max(&mut m).unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results[0],
            Some(PhaseTimes {
                read: 5.0,
                compute: 100.0,
                write: 5.0
            })
        );
        assert_eq!(results[1], None);
        assert_eq!(results[2], None);
    }
}
