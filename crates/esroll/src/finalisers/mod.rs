//! Output formats and the export modes they support

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::BundleError, graph::ModuleGraph, snippet::SnippetBundle, types::ModuleId};

pub mod cjs;

/// Module format of the generated bundle
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// CommonJS: `require` for externals, `exports`/`module.exports` for the entry
    #[default]
    Cjs,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cjs => "cjs",
        }
    }

    /// Wrap the assembled body in the format's imports and exports
    pub fn finalise(
        self,
        graph: &ModuleGraph,
        entry: ModuleId,
        body: &mut SnippetBundle,
        mode: ExportMode,
    ) {
        match self {
            Self::Cjs => cjs::finalise(graph, entry, body, mode),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the entry module's exports are exposed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Pick `none`, `default` or `named` from the entry's exports
    #[default]
    Auto,
    /// The default export becomes the whole module
    Default,
    /// One property per export
    Named,
    /// Nothing is exported
    None,
}

impl ExportMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Default => "default",
            Self::Named => "named",
            Self::None => "none",
        }
    }

    /// Resolve `auto` and check an explicit mode against the entry's export keys
    pub fn resolve(self, keys: &[&str]) -> Result<Self, BundleError> {
        let inferred = match keys {
            [] => Self::None,
            ["default"] => Self::Default,
            _ => Self::Named,
        };
        let compatible = match self {
            Self::Auto => return Ok(inferred),
            Self::Default => inferred == Self::Default,
            Self::None => inferred == Self::None,
            Self::Named => true,
        };
        if compatible {
            Ok(self)
        } else {
            Err(BundleError::InvalidExportMode {
                mode: self.as_str().to_owned(),
                keys: keys.iter().map(|&key| key.to_owned()).collect(),
            })
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
