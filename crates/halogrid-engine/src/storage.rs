//! Seek-based region I/O against a flat raster file.
//!
//! The file is a row-major, interleaved, multi-channel `f32` raster of
//! fixed global width; every node reads and writes only its own rectangle,
//! one row at a time at the right byte offset.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Handle to one raster file, shaped by the run parameters.
#[derive(Debug, Clone)]
pub struct RasterFile {
    path: PathBuf,
    global_width: usize,
    channels: usize,
}

impl RasterFile {
    pub fn new(path: impl Into<PathBuf>, global_width: usize, channels: usize) -> Self {
        Self {
            path: path.into(),
            global_width,
            channels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn byte_offset(&self, row: usize, col: usize) -> u64 {
        (((row * self.global_width) + col) * self.channels * std::mem::size_of::<f32>()) as u64
    }

    /// Read a `rows` x `cols` rectangle at `(origin_row, origin_col)` into
    /// interleaved samples.
    pub fn read_region(
        &self,
        origin_row: usize,
        origin_col: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Vec<f32>> {
        let mut file = File::open(&self.path).map_err(|source| Error::Storage {
            op: "read",
            row: origin_row,
            source,
        })?;

        let line_len = cols * self.channels;
        let mut line = vec![0u8; line_len * std::mem::size_of::<f32>()];
        let mut samples = Vec::with_capacity(rows * line_len);
        for row in 0..rows {
            let wrap = |source| Error::Storage {
                op: "read",
                row: origin_row + row,
                source,
            };
            file.seek(SeekFrom::Start(
                self.byte_offset(origin_row + row, origin_col),
            ))
            .map_err(wrap)?;
            file.read_exact(&mut line).map_err(wrap)?;
            samples.extend_from_slice(&bytemuck::pod_collect_to_vec::<u8, f32>(&line));
        }
        Ok(samples)
    }

    /// Write a `rows` x `cols` rectangle of interleaved samples at
    /// `(origin_row, origin_col)`, creating the file if needed.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len() != rows * cols * channels`.
    pub fn write_region(
        &self,
        origin_row: usize,
        origin_col: usize,
        rows: usize,
        cols: usize,
        samples: &[f32],
    ) -> Result<()> {
        let line_len = cols * self.channels;
        assert_eq!(samples.len(), rows * line_len, "sample buffer size mismatch");

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| Error::Storage {
                op: "write",
                row: origin_row,
                source,
            })?;

        for row in 0..rows {
            let wrap = |source| Error::Storage {
                op: "write",
                row: origin_row + row,
                source,
            };
            file.seek(SeekFrom::Start(
                self.byte_offset(origin_row + row, origin_col),
            ))
            .map_err(wrap)?;
            let line = &samples[row * line_len..(row + 1) * line_len];
            file.write_all(bytemuck::cast_slice(line)).map_err(wrap)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_raster(name: &str, width: usize, channels: usize) -> RasterFile {
        let mut path = std::env::temp_dir();
        path.push(format!("halogrid-storage-{name}-{}", std::process::id()));
        RasterFile::new(path, width, channels)
    }

    #[test]
    fn region_roundtrip() {
        let raster = temp_raster("roundtrip", 8, 2);
        let full: Vec<f32> = (0..8 * 4 * 2).map(|i| i as f32 * 0.25).collect();
        raster.write_region(0, 0, 4, 8, &full).unwrap();

        // A 2x3 rectangle at (1, 2).
        let region = raster.read_region(1, 2, 2, 3).unwrap();
        let mut expected = Vec::new();
        for row in 1..3 {
            for col in 2..5 {
                for c in 0..2 {
                    expected.push(full[(row * 8 + col) * 2 + c]);
                }
            }
        }
        assert_eq!(region, expected);

        std::fs::remove_file(raster.path()).ok();
    }

    #[test]
    fn disjoint_tiles_compose_the_global_raster() {
        let raster = temp_raster("tiles", 4, 1);
        // Two nodes writing the left and right 4x2 halves.
        let left: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let right: Vec<f32> = (0..8).map(|i| 100.0 + i as f32).collect();
        raster.write_region(0, 0, 4, 2, &left).unwrap();
        raster.write_region(0, 2, 4, 2, &right).unwrap();

        let row2 = raster.read_region(2, 0, 1, 4).unwrap();
        assert_eq!(row2, vec![4.0, 5.0, 104.0, 105.0]);

        std::fs::remove_file(raster.path()).ok();
    }

    #[test]
    fn missing_file_is_a_storage_error() {
        let raster = temp_raster("missing-never-created", 4, 1);
        let err = raster.read_region(0, 0, 1, 1).unwrap_err();
        assert!(matches!(err, Error::Storage { op: "read", .. }));
    }
}
