#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod block;
pub mod cell;

pub use block::{Block, BlockHash, BlockNumber, ExtrinsicsRoot, Header, SignedBlock};
pub use cell::{Cell, CELL_PROOF_SIZE, ROW_COMMITMENT_SIZE};
