use rustc_hash::FxHashMap;

use crate::{resolver::identifier_from, types::ExternalId};

/// A specifier that does not resolve to project source
///
/// External modules are leaves: nothing is expanded, they are only required
/// by the output and accessed through their assigned name.
#[derive(Debug)]
pub struct ExternalModule {
    pub id: ExternalId,
    /// The specifier as written, e.g. `path`
    pub specifier: String,
    /// Name the module is bound to in the output
    pub name: String,
    pub needs_default: bool,
    pub needs_named: bool,
    pub suggested_names: FxHashMap<String, String>,
}

impl ExternalModule {
    pub fn new(id: ExternalId, specifier: &str) -> Self {
        Self {
            id,
            specifier: specifier.to_owned(),
            name: identifier_from(specifier),
            needs_default: false,
            needs_named: false,
            suggested_names: FxHashMap::default(),
        }
    }

    pub fn suggest_name(&mut self, export_name: &str, suggestion: &str) {
        if !self.suggested_names.contains_key(export_name) {
            self.suggested_names
                .insert(export_name.to_owned(), suggestion.to_owned());
        }
    }

    /// Name the bundle should bind this module to, before deconfliction
    pub fn preferred_name(&self) -> String {
        self.suggested_names
            .get("*")
            .or_else(|| self.suggested_names.get("default"))
            .cloned()
            .unwrap_or_else(|| identifier_from(&self.specifier))
    }

    pub fn rename(&mut self, replacement: &str) {
        replacement.clone_into(&mut self.name);
    }

    /// Expression through which `name` is reached in the output
    pub fn canonical_name(&self, name: &str) -> String {
        match name {
            "default" if self.needs_named => format!("{}__default", self.name),
            "default" | "*" => self.name.clone(),
            _ => format!("{}.{name}", self.name),
        }
    }
}
