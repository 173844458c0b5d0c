//! Catalog database integration and project layout definitions.
//!
//! This module wraps a SQLite database storing:
//! - Datasets and their samples
//! - Genes and per-sample expression values
//! - Analysis task records (one per runtime invocation)
//!
//! It also defines the on-disk project layout and the serializable project
//! configuration that points at the database and the analysis runtime.

pub mod catalog_db;
pub mod config;
pub mod context;
pub mod layout;
pub mod models;
pub mod queries;
pub mod tasks;
pub mod util;

pub use catalog_db::*;
pub use config::*;
pub use context::*;
pub use layout::*;
pub use models::*;
pub use queries::*;
pub use util::*;
