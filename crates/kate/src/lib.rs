#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Verification of sampled cells against the commitment published in a block header.
//!
//! The node answers a proof query for `k` cells with a single byte string made of `k` proof
//! segments of [`CELL_PROOF_SIZE`] bytes, in the order the cells were requested. The header
//! commitment holds one segment of [`ROW_COMMITMENT_SIZE`] bytes per matrix row. [`verify_batch`]
//! pairs every requested cell with its two segments and hands them to a [`CellVerifier`].

use lumos_primitives::cell::row_commitment;
use lumos_primitives::{Cell, CELL_PROOF_SIZE, ROW_COMMITMENT_SIZE};
use tracing::debug;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("proof is {actual} bytes, expected {expected} bytes for {cells} cells")]
    MalformedResponse { cells: usize, expected: usize, actual: usize },

    #[error("commitment of {len} bytes has no segment for row {row}")]
    MalformedCommitment { row: u32, len: usize },
}

/// Checks a single cell proof against the commitment of the cell's row.
pub trait CellVerifier: Send + Sync {
    fn check_cell(&self, cell: Cell, commitment: &[u8], proof: &[u8]) -> bool;
}

impl<T: CellVerifier + ?Sized> CellVerifier for std::sync::Arc<T> {
    fn check_cell(&self, cell: Cell, commitment: &[u8], proof: &[u8]) -> bool {
        (**self).check_cell(cell, commitment, proof)
    }
}

/// A [`CellVerifier`] that only checks the shape of its inputs.
///
/// A cell passes when the commitment segment and the proof segment have the expected sizes and
/// the proof segment is not all zeroes. It does not open the commitment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralVerifier;

impl CellVerifier for StructuralVerifier {
    fn check_cell(&self, _: Cell, commitment: &[u8], proof: &[u8]) -> bool {
        commitment.len() == ROW_COMMITMENT_SIZE
            && proof.len() == CELL_PROOF_SIZE
            && proof.iter().any(|b| *b != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOutcome {
    pub cell: Cell,
    pub verified: bool,
}

/// Outcome of verifying a batch of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub success_count: usize,
    /// Per-cell results, in request order.
    pub results: Vec<CellOutcome>,
}

impl BatchOutcome {
    /// Number of cells that were checked.
    pub fn attempts(&self) -> usize {
        self.results.len()
    }

    pub fn failure_count(&self) -> usize {
        self.attempts() - self.success_count
    }
}

/// Verifies every cell of `cells` against its row segment of `commitment` and its segment of
/// `proof`.
///
/// Fails without checking any cell if `proof` is not exactly one segment per cell, or if a cell's
/// row is not covered by `commitment`.
pub fn verify_batch<V>(
    verifier: &V,
    cells: &[Cell],
    commitment: &[u8],
    proof: &[u8],
) -> Result<BatchOutcome, Error>
where
    V: CellVerifier + ?Sized,
{
    let expected = cells.len() * CELL_PROOF_SIZE;
    if proof.len() != expected {
        return Err(Error::MalformedResponse { cells: cells.len(), expected, actual: proof.len() });
    }

    let segments = cells
        .iter()
        .map(|cell| {
            row_commitment(commitment, cell.row)
                .ok_or(Error::MalformedCommitment { row: cell.row, len: commitment.len() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut outcome = BatchOutcome { success_count: 0, results: Vec::with_capacity(cells.len()) };

    for ((cell, segment), proof) in
        cells.iter().zip(segments).zip(proof.chunks_exact(CELL_PROOF_SIZE))
    {
        let verified = verifier.check_cell(*cell, segment, proof);
        debug!(target: "kate", %cell, %verified, "Checked cell proof.");

        if verified {
            outcome.success_count += 1;
        }
        outcome.results.push(CellOutcome { cell: *cell, verified });
    }

    Ok(outcome)
}
