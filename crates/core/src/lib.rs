//! neta-core
//!
//! Core library for the NETA transcriptomic dataset catalog.
//!
//! This crate owns the catalog database (datasets, samples, genes, expression
//! values and analysis task records), the wrapper around the external
//! statistical runtime, and the dispatcher that ties a task record to one
//! runtime invocation.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, HTTP API).

pub mod db;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
