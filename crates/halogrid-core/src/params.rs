//! Validated run parameters, identical on every node.

use crate::error::{Error, Result};

/// Run parameters shared by every node of a run.
///
/// Bootstrap validates these once, before any tile is allocated; the engine
/// assumes they are well-formed thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Global raster width in pixels.
    pub global_width: usize,
    /// Global raster height in pixels.
    pub global_height: usize,
    /// Samples per pixel (e.g. 1 = grayscale, 3 = RGB, 4 = RGBA).
    pub channels: usize,
    /// Maximum number of stencil rounds to run.
    pub rounds: usize,
    /// Enable grid-wide similarity tracking for early termination.
    pub track_similarity: bool,
}

impl RunParams {
    /// Check the parameters for validity.
    pub fn validate(&self) -> Result<()> {
        if self.global_width == 0 || self.global_height == 0 {
            return Err(Error::InvalidParameter(format!(
                "raster dimensions must be positive, got {}x{}",
                self.global_width, self.global_height
            )));
        }
        if self.channels == 0 {
            return Err(Error::InvalidParameter(
                "channel count must be at least 1".into(),
            ));
        }
        if self.rounds == 0 {
            return Err(Error::InvalidParameter(
                "iteration count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            global_width: 0,
            global_height: 0,
            channels: 1,
            rounds: 1,
            track_similarity: false,
        }
    }
}
