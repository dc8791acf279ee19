//! Build entry point: fetch, expand, deconflict, then generate on demand

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    deconflict::deconflict,
    error::BundleError,
    finalisers::{ExportMode, OutputFormat},
    generate::render,
    graph::ModuleGraph,
    resolver::normalize,
    types::{ModuleId, StatementRef},
};

/// Options accepted by [`Bundle::generate`] and [`Bundle::write`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub exports: ExportMode,
    pub format: OutputFormat,
}

/// Generated bundle text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub code: String,
}

/// A built module graph, ready to be generated any number of times
#[derive(Debug)]
pub struct Bundle {
    pub entry_path: PathBuf,
    graph: ModuleGraph,
    entry: ModuleId,
    statements: Vec<StatementRef>,
}

impl Bundle {
    /// Load the graph reachable from `entry`, keep what the entry needs and
    /// assign collision-free names
    pub fn build(entry: &Path) -> Result<Self> {
        let entry_path = entry_path(entry)?;
        info!("Bundling {}", entry_path.display());

        let mut graph = ModuleGraph::new();
        let entry = graph.fetch_entry(&entry_path)?;
        let statements = graph.expand_all_statements(entry, true)?;
        deconflict(&mut graph, &statements);

        info!(
            "Included {} statements from {} modules and {} external modules",
            statements.len(),
            graph.modules().len(),
            graph.externals().len()
        );
        Ok(Self {
            entry_path,
            graph,
            entry,
            statements,
        })
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn statements(&self) -> &[StatementRef] {
        &self.statements
    }

    /// The export mode that will be used for `requested`
    pub fn export_mode(&self, requested: ExportMode) -> Result<ExportMode, BundleError> {
        let keys: Vec<&str> = self
            .graph
            .module(self.entry)
            .exports
            .keys()
            .map(String::as_str)
            .collect();
        let mode = requested.resolve(&keys)?;
        debug!("Export mode {requested} resolved to {mode} for exports {keys:?}");
        Ok(mode)
    }

    /// Render the bundle; the graph is not modified
    pub fn generate(&self, options: &GenerateOptions) -> Result<Output> {
        let mode = self.export_mode(options.exports)?;
        let mut body = render(&self.graph, &self.statements)?;
        options
            .format
            .finalise(&self.graph, self.entry, &mut body, mode);
        Ok(Output {
            code: body.to_string(),
        })
    }

    /// Generate and write the result to `dest`
    pub fn write(&self, dest: &Path, options: &GenerateOptions) -> Result<()> {
        let output = self.generate(options)?;
        if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(dest, output.code)
            .with_context(|| format!("Failed to write bundle to {}", dest.display()))?;
        info!("Wrote bundle to {}", dest.display());
        Ok(())
    }
}

/// Absolute entry path; `main` means `main.js`
fn entry_path(entry: &Path) -> Result<PathBuf> {
    let mut path = if entry.is_absolute() {
        entry.to_path_buf()
    } else {
        env::current_dir()
            .context("Failed to determine the working directory")?
            .join(entry)
    };
    if path.extension().is_none() {
        path.set_extension("js");
    }
    Ok(normalize(&path))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_entry_path_gets_extension() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = entry_path(&temp_dir.path().join("src/../main"))?;
        assert_eq!(path, temp_dir.path().join("main.js"));
        Ok(())
    }

    #[test]
    fn test_export_mode_uses_entry_exports() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let entry = temp_dir.path().join("main.js");
        fs::write(&entry, "export var a = 1;\nexport default a;\n")?;

        let bundle = Bundle::build(&entry)?;
        assert_eq!(bundle.export_mode(ExportMode::Auto)?, ExportMode::Named);
        assert!(bundle.export_mode(ExportMode::Default).is_err());
        assert!(bundle.export_mode(ExportMode::None).is_err());
        Ok(())
    }
}
