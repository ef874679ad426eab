//! Launch Flow — sequential, conditionally-gated launch task pipeline.
//!
//! An ordered chain of asynchronous launch tasks executed one at a time.
//! Each task may be skipped based on persisted state, suspend until an
//! external completion signal fires, and record a value once it has run.

pub mod chain;
pub mod config;
pub mod error;
pub mod store;
