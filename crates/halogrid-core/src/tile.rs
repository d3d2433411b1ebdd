//! Halo-padded planar tile storage.
//!
//! Each node owns a `rows` x `cols` rectangle of the global raster, stored
//! as one contiguous arena of `channels` planes. Every plane is padded with
//! a 1-cell halo ring: padded row/col 0 and `rows+1` / `cols+1` mirror
//! neighbor data (or stay at their last-written value on global edges), and
//! rows/cols `1..=rows` / `1..=cols` are owned cells.

/// A half-open rectangle of padded-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl Region {
    /// The full owned region of a `rows` x `cols` tile.
    pub fn owned(rows: usize, cols: usize) -> Self {
        Self {
            row_start: 1,
            row_end: rows + 1,
            col_start: 1,
            col_end: cols + 1,
        }
    }

    /// Number of cells covered.
    pub fn len(&self) -> usize {
        (self.row_end - self.row_start) * (self.col_end - self.col_start)
    }

    pub fn is_empty(&self) -> bool {
        self.row_end <= self.row_start || self.col_end <= self.col_start
    }
}

/// Per-channel planar tile with a 1-cell halo ring around each plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
    channels: usize,
}

impl Tile {
    /// Allocate a zeroed tile for `rows` x `cols` owned cells of `channels`
    /// channels.
    pub fn new(rows: usize, cols: usize, channels: usize) -> Self {
        assert!(rows > 0 && cols > 0 && channels > 0);
        let data = vec![0.0; channels * (rows + 2) * (cols + 2)];
        Self {
            data,
            rows,
            cols,
            channels,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Padded row count (`rows + 2`).
    pub fn padded_rows(&self) -> usize {
        self.rows + 2
    }

    /// Padded column count (`cols + 2`), the row stride of every plane.
    pub fn padded_cols(&self) -> usize {
        self.cols + 2
    }

    /// Cells per channel plane, halo included.
    pub fn plane_len(&self) -> usize {
        self.padded_rows() * self.padded_cols()
    }

    /// Flat arena offset of padded cell `(row, col)` in channel `channel`.
    #[inline]
    pub fn index(&self, channel: usize, row: usize, col: usize) -> usize {
        debug_assert!(channel < self.channels, "channel {channel} out of range");
        debug_assert!(row < self.padded_rows(), "padded row {row} out of range");
        debug_assert!(col < self.padded_cols(), "padded col {col} out of range");
        channel * self.plane_len() + row * self.padded_cols() + col
    }

    #[inline]
    pub fn get(&self, channel: usize, row: usize, col: usize) -> f32 {
        self.data[self.index(channel, row, col)]
    }

    #[inline]
    pub fn set(&mut self, channel: usize, row: usize, col: usize, value: f32) {
        let i = self.index(channel, row, col);
        self.data[i] = value;
    }

    /// The whole arena.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// One channel plane, halo included.
    pub fn plane(&self, channel: usize) -> &[f32] {
        let len = self.plane_len();
        &self.data[channel * len..(channel + 1) * len]
    }

    pub fn plane_mut(&mut self, channel: usize) -> &mut [f32] {
        let len = self.plane_len();
        &mut self.data[channel * len..(channel + 1) * len]
    }

    /// Copy an interleaved `rows * cols * channels` sample block into the
    /// owned cells of every plane. Halo cells are left untouched.
    pub fn pack(&mut self, interleaved: &[f32]) {
        assert_eq!(
            interleaved.len(),
            self.rows * self.cols * self.channels,
            "interleaved buffer size mismatch"
        );
        let channels = self.channels;
        for channel in 0..channels {
            for row in 0..self.rows {
                let base = self.index(channel, row + 1, 1);
                let line = &mut self.data[base..base + self.cols];
                let mut reader = (row * self.cols) * channels + channel;
                for cell in line.iter_mut() {
                    *cell = interleaved[reader];
                    reader += channels;
                }
            }
        }
    }

    /// Read the owned cells of every plane back into interleaved order.
    pub fn unpack(&self) -> Vec<f32> {
        let channels = self.channels;
        let mut interleaved = vec![0.0; self.rows * self.cols * channels];
        for channel in 0..channels {
            for row in 0..self.rows {
                let base = self.index(channel, row + 1, 1);
                let line = &self.data[base..base + self.cols];
                let mut writer = (row * self.cols) * channels + channel;
                for &cell in line {
                    interleaved[writer] = cell;
                    writer += channels;
                }
            }
        }
        interleaved
    }
}

/// The double buffer of a node: two tiles whose roles rotate every round.
///
/// `swap` reassigns roles without copying cell data.
#[derive(Debug, Clone)]
pub struct TilePair {
    current: Tile,
    next: Tile,
}

impl TilePair {
    pub fn new(rows: usize, cols: usize, channels: usize) -> Self {
        Self {
            current: Tile::new(rows, cols, channels),
            next: Tile::new(rows, cols, channels),
        }
    }

    pub fn current(&self) -> &Tile {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Tile {
        &mut self.current
    }

    /// Both buffers at once, for reading `current` while writing `next`.
    pub fn split_mut(&mut self) -> (&Tile, &mut Tile) {
        (&self.current, &mut self.next)
    }

    /// Rotate buffer roles.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip_multichannel() {
        for channels in 1..=4 {
            let rows = 3;
            let cols = 5;
            let interleaved: Vec<f32> =
                (0..rows * cols * channels).map(|i| i as f32 * 0.5).collect();
            let mut tile = Tile::new(rows, cols, channels);
            tile.pack(&interleaved);
            assert_eq!(tile.unpack(), interleaved, "channels = {channels}");
        }
    }

    #[test]
    fn pack_places_planar_samples() {
        // 2x2, 2 channels: interleaved [c0 c1 | c0 c1 | ...] row-major.
        let mut tile = Tile::new(2, 2, 2);
        tile.pack(&[10.0, 20.0, 11.0, 21.0, 12.0, 22.0, 13.0, 23.0]);
        assert_eq!(tile.get(0, 1, 1), 10.0);
        assert_eq!(tile.get(0, 1, 2), 11.0);
        assert_eq!(tile.get(0, 2, 1), 12.0);
        assert_eq!(tile.get(1, 2, 2), 23.0);
    }

    #[test]
    fn pack_leaves_halo_zero() {
        let mut tile = Tile::new(2, 2, 1);
        tile.pack(&[1.0, 2.0, 3.0, 4.0]);
        for row in 0..tile.padded_rows() {
            for col in 0..tile.padded_cols() {
                let owned = (1..=2).contains(&row) && (1..=2).contains(&col);
                if !owned {
                    assert_eq!(tile.get(0, row, col), 0.0, "halo ({row},{col})");
                }
            }
        }
    }

    #[test]
    fn plane_views_are_disjoint_per_channel() {
        let mut tile = Tile::new(2, 3, 2);
        tile.plane_mut(1)[0] = 7.0;
        assert_eq!(tile.plane(0)[0], 0.0);
        assert_eq!(tile.plane(1)[0], 7.0);
    }

    #[test]
    fn swap_rotates_roles_without_copy() {
        let mut pair = TilePair::new(2, 2, 1);
        pair.current_mut().set(0, 1, 1, 5.0);
        pair.swap();
        assert_eq!(pair.current().get(0, 1, 1), 0.0);
        pair.swap();
        assert_eq!(pair.current().get(0, 1, 1), 5.0);
    }

    #[test]
    fn owned_region_covers_tile() {
        let r = Region::owned(4, 6);
        assert_eq!(r.len(), 24);
        assert!(!r.is_empty());
    }
}
