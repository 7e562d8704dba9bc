//! Shared object copy domain primitives.
//!
//! This crate owns the event notification contract, key naming and copy
//! planning. It intentionally excludes AWS SDK and Lambda runtime concerns,
//! which live in `object_copy_lambda`.

pub mod config;
pub mod event;
pub mod keys;
pub mod plan;
