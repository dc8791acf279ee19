use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, trace};

/// Where an import specifier points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A project source file
    Local(PathBuf),
    /// Anything that is neither relative nor absolute, e.g. `path` or `lodash/fp`
    External,
}

/// Turns import specifiers into source locations
///
/// Relative specifiers are joined to the importer's directory and always end
/// in `.js` (`./foo` and `./foo.js` name the same file). Absolute specifiers are
/// taken as-is. Everything else is external.
#[derive(Debug, Default)]
pub struct ModuleResolver {
    /// Cache keyed by (importer directory, specifier)
    cache: IndexMap<(PathBuf, String), Resolution>,
}

impl ModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `specifier` as imported from `importer`
    pub fn resolve(&mut self, specifier: &str, importer: &Path) -> Resolution {
        let base = importer.parent().map(Path::to_path_buf).unwrap_or_default();
        let key = (base, specifier.to_owned());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let resolution = if Path::new(specifier).is_absolute() {
            Resolution::Local(PathBuf::from(specifier))
        } else if specifier.starts_with('.') {
            let file = format!("{}.js", specifier.strip_suffix(".js").unwrap_or(specifier));
            Resolution::Local(normalize(&key.0.join(file)))
        } else {
            debug!("Treating '{specifier}' as an external module");
            Resolution::External
        };

        trace!(
            "Resolved '{specifier}' from {} to {resolution:?}",
            importer.display()
        );
        self.cache.insert(key, resolution.clone());
        resolution
    }
}

/// Lexically normalize a path, folding `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Turn a module id into something usable as a JS identifier
pub fn identifier_from(id: &str) -> String {
    let mut name: String = id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
