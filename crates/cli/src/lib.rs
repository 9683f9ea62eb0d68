#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Command line interface of the light client.

pub mod args;
pub mod options;
pub mod utils;

pub use args::NodeArgs;
pub use options::*;
