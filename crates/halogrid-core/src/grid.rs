//! Process grid geometry and neighbor resolution.

use std::fmt;

use crate::error::{Error, Result};

/// The four halo-exchange directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    /// All directions, in the fixed issue order of an exchange round.
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Bottom,
        Direction::Left,
        Direction::Right,
    ];

    /// The opposite direction: data sent toward `self` arrives at the
    /// receiver's `self.opposite()` halo.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Top => "top",
            Direction::Bottom => "bottom",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

/// Geometry of the node grid over the global raster.
///
/// A grid of `height_div` rows by `width_div` columns of nodes, each owning
/// a `tile_rows` x `tile_cols` rectangle. Rank `r` sits at grid coordinate
/// `(r / width_div, r % width_div)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    /// Nodes across.
    pub width_div: usize,
    /// Nodes down.
    pub height_div: usize,
    /// Global raster width.
    pub global_width: usize,
    /// Global raster height.
    pub global_height: usize,
    /// Rows owned by each node.
    pub tile_rows: usize,
    /// Columns owned by each node.
    pub tile_cols: usize,
}

impl ProcessGrid {
    /// Build the grid from a width divisor produced by
    /// [`partition`](crate::partition::partition).
    pub fn new(
        global_width: usize,
        global_height: usize,
        procs: usize,
        width_div: usize,
    ) -> Result<Self> {
        if width_div == 0 || procs % width_div != 0 {
            return Err(Error::InvalidParameter(format!(
                "width divisor {width_div} does not divide {procs} nodes"
            )));
        }
        let height_div = procs / width_div;
        if global_width % width_div != 0 || global_height % height_div != 0 {
            return Err(Error::InvalidParameter(format!(
                "{global_width}x{global_height} raster not divisible by a \
                 {height_div}x{width_div} node grid"
            )));
        }
        Ok(Self {
            width_div,
            height_div,
            global_width,
            global_height,
            tile_rows: global_height / height_div,
            tile_cols: global_width / width_div,
        })
    }

    /// Total number of nodes in the grid.
    pub fn num_nodes(&self) -> usize {
        self.width_div * self.height_div
    }

    /// Grid coordinate (row, col) of a rank.
    pub fn coord_of(&self, rank: usize) -> (usize, usize) {
        debug_assert!(rank < self.num_nodes());
        (rank / self.width_div, rank % self.width_div)
    }

    /// Global raster origin (row, col) of a rank's tile.
    pub fn origin_of(&self, rank: usize) -> (usize, usize) {
        let (gr, gc) = self.coord_of(rank);
        (gr * self.tile_rows, gc * self.tile_cols)
    }
}

/// The up-to-four neighbors of a node, fixed once the grid is known.
///
/// A direction holds `None` when the tile touches that global edge; halo
/// exchange treats such a direction as a no-op and the halo ring keeps its
/// last-written value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborSet {
    pub top: Option<usize>,
    pub bottom: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl NeighborSet {
    /// Resolve the neighbors of `rank` on `grid`.
    pub fn resolve(grid: &ProcessGrid, rank: usize) -> Self {
        let (origin_row, origin_col) = grid.origin_of(rank);

        let top = (origin_row != 0).then(|| rank - grid.width_div);
        let bottom =
            (origin_row + grid.tile_rows != grid.global_height).then(|| rank + grid.width_div);
        let left = (origin_col != 0).then(|| rank - 1);
        let right = (origin_col + grid.tile_cols != grid.global_width).then(|| rank + 1);

        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// The neighbor rank in `dir`, if any.
    pub fn get(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::Top => self.top,
            Direction::Bottom => self.bottom,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Iterate over the directions that have a real neighbor.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, usize)> + '_ {
        Direction::ALL
            .iter()
            .filter_map(|&d| self.get(d).map(|r| (d, r)))
    }
}
