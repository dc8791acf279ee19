//! Tree-shaking bundler for ES modules
//!
//! [`build`] loads the module graph reachable from an entry file, keeps only
//! the top-level statements the entry needs, renames colliding bindings and
//! returns a [`Bundle`] that renders to a single CommonJS file.

use std::path::Path;

pub mod analyzer;
pub mod bundle;
pub mod config;
pub mod deconflict;
pub mod dirs;
pub mod error;
pub mod expand;
pub mod external_module;
pub mod finalisers;
pub mod generate;
pub mod graph;
pub mod module;
pub mod parser;
pub mod resolver;
pub mod scope;
pub mod snippet;
pub mod types;
pub mod walker;

pub use bundle::{Bundle, GenerateOptions, Output};
pub use error::BundleError;
pub use finalisers::{ExportMode, OutputFormat};

/// Build a bundle rooted at `entry`
pub fn build(entry: &Path) -> anyhow::Result<Bundle> {
    Bundle::build(entry)
}
