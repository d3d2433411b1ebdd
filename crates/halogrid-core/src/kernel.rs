//! The 3x3 convolution kernel.

use crate::error::{Error, Result};

/// A 3x3 stencil kernel, normalized at construction so its weights sum to
/// 1.0 and immutable thereafter.
///
/// Weights are stored row-major: `weights[di * 3 + dj]` is the contribution
/// of the neighbor at row offset `di - 1`, column offset `dj - 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel3 {
    weights: [f32; 9],
}

impl Kernel3 {
    /// Normalize `weights` to sum 1.0. Fails when the sum is zero.
    pub fn normalized(weights: [f32; 9]) -> Result<Self> {
        let sum: f32 = weights.iter().sum();
        if sum == 0.0 {
            return Err(Error::ZeroKernelSum);
        }
        let mut weights = weights;
        for w in &mut weights {
            *w /= sum;
        }
        Ok(Self { weights })
    }

    /// The default Gaussian blur kernel.
    pub fn gaussian() -> Self {
        Self::normalized([1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0])
            .expect("gaussian weights sum to 16")
    }

    /// All 9 weights, row-major.
    pub fn weights(&self) -> &[f32; 9] {
        &self.weights
    }

    /// Weight of the neighbor at `(di, dj)`, each in `0..3`.
    #[inline]
    pub fn weight(&self, di: usize, dj: usize) -> f32 {
        debug_assert!(di < 3 && dj < 3);
        self.weights[di * 3 + dj]
    }

    /// The three weights of kernel row `di`, for 1D row convolution.
    #[inline]
    pub fn row(&self, di: usize) -> [f32; 3] {
        debug_assert!(di < 3);
        [
            self.weights[di * 3],
            self.weights[di * 3 + 1],
            self.weights[di * 3 + 2],
        ]
    }
}
