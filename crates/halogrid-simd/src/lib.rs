//! SIMD-accelerated 3x3 stencil kernels for halogrid.
//!
//! Provides numerically equivalent scalar and vector implementations of the
//! normalized 3x3 convolution applied to a halo-padded channel plane:
//! - scalar: direct 9-term neighborhood sum
//! - vector: three 3-tap 1D row convolutions summed elementwise, 8 cells per
//!   AVX2 lane
//!
//! On x86/x86_64 the AVX2+FMA path is selected by runtime detection; all
//! other architectures fall back to scalar.

pub mod capability;
pub mod stencil;

pub use capability::SimdCapability;
pub use stencil::{apply_stencil, apply_stencil_scalar, ChangeLatch};
