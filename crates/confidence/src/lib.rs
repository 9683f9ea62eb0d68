#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod scoring;
mod store;

pub use scoring::{exponential_confidence, ratio_confidence, serialise_confidence, ScoringPolicy};
pub use store::{BlockRecord, ConfidenceStore, Progress};
