use std::fmt;

use serde::{Deserialize, Serialize};

/// Size in bytes of the commitment of a single data matrix row.
pub const ROW_COMMITMENT_SIZE: usize = 48;

/// Size in bytes of the proof for a single cell.
pub const CELL_PROOF_SIZE: usize = 80;

/// Returns the segment of `commitment` that commits to `row`, or `None` if `commitment` is too short
/// to contain it.
pub fn row_commitment(commitment: &[u8], row: u32) -> Option<&[u8]> {
    let start = (row as usize).checked_mul(ROW_COMMITMENT_SIZE)?;
    commitment.get(start..start.checked_add(ROW_COMMITMENT_SIZE)?)
}

/// A single entry of a block's erasure-coded data matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Returns the cell mirrored across the matrix diagonal.
    pub const fn transpose(&self) -> Self {
        Self { row: self.col, col: self.row }
    }

    /// Returns `true` if the cell lies on the matrix diagonal.
    pub const fn is_diagonal(&self) -> bool {
        self.row == self.col
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(u32, u32)> for Cell {
    fn from((row, col): (u32, u32)) -> Self {
        Self { row, col }
    }
}
