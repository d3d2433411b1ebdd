//! Error types for halogrid-engine.

use halogrid_core::Direction;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] halogrid_core::Error),

    #[error("node {rank}: {direction} transfer with node {peer} failed to complete")]
    Transfer {
        rank: usize,
        peer: usize,
        direction: Direction,
    },

    #[error("node {rank}: collective {op} failed: peer disconnected")]
    Collective { rank: usize, op: &'static str },

    #[error("region {op} at row {row} failed")]
    Storage {
        op: &'static str,
        row: usize,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
