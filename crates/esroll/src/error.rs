//! Error kinds surfaced by a build
//!
//! Every variant is fatal: a build either completes or aborts with one of
//! these, wrapped in an `anyhow::Error` at the public API boundary.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error(
        "Module {} does not export {name} (imported by {})",
        module.display(),
        importer.display()
    )]
    UnresolvedExport {
        module: PathBuf,
        name: String,
        importer: PathBuf,
    },

    #[error("Could not read module {}", path.display())]
    UnreadableModule {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "'{mode}' was specified for the exports option, but the entry module has the following \
         exports: {}",
        keys.join(", ")
    )]
    InvalidExportMode { mode: String, keys: Vec<String> },

    #[error("Unhandled export shape in {}: {shape}", path.display())]
    UnhandledExportShape { path: PathBuf, shape: String },

    #[error("Cannot edit {start}..{end}: {reason}")]
    SnippetEdit {
        start: usize,
        end: usize,
        reason: &'static str,
    },
}
