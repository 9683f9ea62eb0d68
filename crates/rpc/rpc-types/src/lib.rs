#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Request and response types of the `light` RPC namespace.

pub mod confidence;
pub mod progress;

pub use confidence::{BlockNumberArg, ConfidenceResponse, InvalidBlockNumber};
pub use progress::ProgressResponse;
