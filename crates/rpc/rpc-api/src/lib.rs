#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! JSON-RPC API definitions.
//!
//! [`chain`] and [`kate`] describe the node the light client talks to. [`light`] is the API the
//! light client serves.

pub mod chain;
pub mod kate;
pub mod light;
