//! AWS-oriented adapters and handlers for the object copy trigger.
//!
//! This crate owns runtime integration details (the Lambda handler and the
//! storage adapter seam) and re-exports the domain primitives from
//! `object_copy_core` under a single `runtime` module boundary.

pub mod adapters;
pub mod handlers;

pub mod runtime {
    pub use object_copy_core::{config, event, keys, plan};
}
