//! Distributed stencil engine for halogrid.
//!
//! This crate provides:
//! - the strided-region transport abstraction and the in-process channel
//!   mesh communicator
//! - the halo exchange (two overlapped axis phases per round)
//! - the iteration driver (exchange, speculative compute, wait, border
//!   correction, convergence check, buffer swap)
//! - seek-based region I/O against a flat raster file
//! - per-phase wall time instrumentation
//! - the per-node worker pipeline tying the above together

pub mod driver;
pub mod error;
pub mod exchange;
pub mod mesh;
pub mod storage;
pub mod timing;
pub mod transport;
pub mod worker;

pub use driver::{Driver, DriverConfig, DriverReport};
pub use error::{Error, Result};
pub use exchange::{begin_exchange, wait, Axis, ExchangeHandle};
pub use mesh::ChannelMesh;
pub use storage::RasterFile;
pub use timing::{PhaseTimer, PhaseTimes};
pub use transport::{Communicator, StridedRegion};
pub use worker::{run_node, NodeReport};
