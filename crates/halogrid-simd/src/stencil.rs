//! Scalar and vector forms of the 3x3 stencil.
//!
//! Both forms compute, for every cell of the requested region,
//! `dst[i][j] = sum over the 3x3 neighborhood of src[i+di][j+dj] * w[di][dj]`
//! on a halo-padded plane. The vector form decomposes the 2D stencil into
//! three independent 3-tap 1D horizontal convolutions, one per source row
//! with that row's kernel weights, and sums them elementwise — an exact
//! algebraic rewrite, so scalar and vector results agree up to floating
//! point summation order.

use halogrid_core::{Kernel3, Region};

use crate::capability::SimdCapability;

/// Sticky per-node changed flag, reset each round.
///
/// Latches true on the first cell whose stencil output differs from its
/// input; once latched, further comparisons are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeLatch {
    changed: bool,
}

impl ChangeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one produced cell. `before` is the input value, `after` the
    /// stencil output at the same cell.
    #[inline]
    pub fn observe(&mut self, before: f32, after: f32) {
        if !self.changed && before != after {
            self.changed = true;
        }
    }

    /// Whether any observed cell changed this round.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

/// Apply the stencil over `region` of one channel plane, dispatching on
/// `capability`.
///
/// `src` and `dst` are padded planes of row stride `stride`; the region must
/// lie inside the owned cells so the full neighbor ring is addressable.
/// When `latch` is given, every produced cell is compared against its input.
///
/// # Panics
///
/// Panics if `src` and `dst` have different lengths or the region (plus its
/// neighbor ring) exceeds the plane.
pub fn apply_stencil(
    src: &[f32],
    dst: &mut [f32],
    stride: usize,
    kernel: &Kernel3,
    region: Region,
    capability: SimdCapability,
    latch: Option<&mut ChangeLatch>,
) {
    assert_eq!(src.len(), dst.len(), "plane size mismatch");
    assert!(region.row_start >= 1 && region.col_start >= 1, "region touches the halo");
    assert!(
        region.col_end < stride && (region.row_end + 1) * stride <= src.len(),
        "region exceeds plane"
    );
    if region.is_empty() {
        return;
    }

    match capability {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdCapability::Avx2 => unsafe {
            apply_stencil_avx2(src, dst, stride, kernel, region, latch)
        },
        SimdCapability::Scalar => apply_stencil_scalar(src, dst, stride, kernel, region, latch),
    }
}

/// Scalar implementation: direct 9-term neighborhood sum.
pub fn apply_stencil_scalar(
    src: &[f32],
    dst: &mut [f32],
    stride: usize,
    kernel: &Kernel3,
    region: Region,
    mut latch: Option<&mut ChangeLatch>,
) {
    for row in region.row_start..region.row_end {
        for col in region.col_start..region.col_end {
            let mut acc = 0.0;
            for di in 0..3 {
                let base = (row + di - 1) * stride + col - 1;
                for dj in 0..3 {
                    acc += src[base + dj] * kernel.weight(di, dj);
                }
            }
            let idx = row * stride + col;
            dst[idx] = acc;
            if let Some(l) = latch.as_deref_mut() {
                l.observe(src[idx], acc);
            }
        }
    }
}

// ============================================================================
// AVX2 Implementation
// ============================================================================

/// AVX2+FMA implementation: per output row, three 3-tap 1D convolutions over
/// the source rows, summed elementwise 8 cells at a time.
///
/// # Safety
///
/// Caller must ensure AVX2 and FMA are available.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn apply_stencil_avx2(
    src: &[f32],
    dst: &mut [f32],
    stride: usize,
    kernel: &Kernel3,
    region: Region,
    mut latch: Option<&mut ChangeLatch>,
) {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    let width = region.col_end - region.col_start;
    // One line buffer per kernel row, reused across output rows.
    let mut lines = [vec![0.0f32; width], vec![0.0f32; width], vec![0.0f32; width]];

    for row in region.row_start..region.row_end {
        for di in 0..3 {
            let base = (row + di - 1) * stride + region.col_start - 1;
            convolve_row_avx2(&src[base..base + width + 2], &mut lines[di], kernel.row(di));
        }

        let out = row * stride + region.col_start;
        let mut i = 0;
        while i + 8 <= width {
            // SAFETY: i + 8 <= width bounds every load and the store.
            unsafe {
                let sum = _mm256_add_ps(
                    _mm256_add_ps(
                        _mm256_loadu_ps(lines[0].as_ptr().add(i)),
                        _mm256_loadu_ps(lines[1].as_ptr().add(i)),
                    ),
                    _mm256_loadu_ps(lines[2].as_ptr().add(i)),
                );
                _mm256_storeu_ps(dst.as_mut_ptr().add(out + i), sum);
            }
            i += 8;
        }
        while i < width {
            dst[out + i] = lines[0][i] + lines[1][i] + lines[2][i];
            i += 1;
        }

        if let Some(l) = latch.as_deref_mut() {
            for i in 0..width {
                l.observe(src[out + i], dst[out + i]);
            }
        }
    }
}

/// 3-tap 1D convolution of one padded source row.
///
/// `input` holds `output.len() + 2` samples starting one cell left of the
/// first output cell; `output[i] = sum(input[i + k] * taps[k])` for k in 0..3.
///
/// # Safety
///
/// Caller must ensure AVX2 and FMA are available.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn convolve_row_avx2(input: &[f32], output: &mut [f32], taps: [f32; 3]) {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    debug_assert_eq!(input.len(), output.len() + 2);
    let width = output.len();

    let tap_vec = [
        _mm256_set1_ps(taps[0]),
        _mm256_set1_ps(taps[1]),
        _mm256_set1_ps(taps[2]),
    ];

    let mut i = 0;
    while i + 8 <= width {
        // SAFETY: the widest load reads input[i + 2 .. i + 10] and
        // i + 10 <= width + 2 == input.len().
        unsafe {
            let mut acc = _mm256_mul_ps(tap_vec[0], _mm256_loadu_ps(input.as_ptr().add(i)));
            acc = _mm256_fmadd_ps(tap_vec[1], _mm256_loadu_ps(input.as_ptr().add(i + 1)), acc);
            acc = _mm256_fmadd_ps(tap_vec[2], _mm256_loadu_ps(input.as_ptr().add(i + 2)), acc);
            _mm256_storeu_ps(output.as_mut_ptr().add(i), acc);
        }
        i += 8;
    }

    // Scalar tail for the last < 8 cells.
    while i < width {
        output[i] = input[i] * taps[0] + input[i + 1] * taps[1] + input[i + 2] * taps[2];
        i += 1;
    }
}
