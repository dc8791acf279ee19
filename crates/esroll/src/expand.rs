//! Statement inclusion
//!
//! Starting from the entry module, statements are pulled in through three
//! edges: the definitions a statement depends on, the statement itself, and
//! every statement that later modifies something it defines. Inclusion is
//! monotonic and each name is defined at most once per module, so cycles in
//! the import graph terminate.

use log::{debug, trace};
use swc_core::ecma::ast::{ExportSpecifier, ModuleDecl, ModuleItem, NamedExport};

use crate::{
    error::BundleError,
    graph::ModuleGraph,
    module::{ImportBinding, export_name},
    types::{ModuleId, ModuleRef, StatementRef},
};

impl ModuleGraph {
    /// Include every statement of `module` in source order
    ///
    /// Imports are never included directly. `export { .. }` lists only matter
    /// for the entry module, where each listed binding is defined.
    pub fn expand_all_statements(
        &mut self,
        module: ModuleId,
        is_entry: bool,
    ) -> Result<Vec<StatementRef>, BundleError> {
        let mut all = Vec::new();

        for index in 0..self.module(module).statements.len() {
            let at = StatementRef::new(module, index);
            if self.statement(at).included {
                continue;
            }

            match &self.module(module).ast.body[index] {
                ModuleItem::ModuleDecl(ModuleDecl::Import(_)) => {}
                ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named))
                    if !named.specifiers.is_empty() =>
                {
                    if !is_entry {
                        continue;
                    }
                    let locals = listed_locals(named);
                    self.statement_mut(at).included = true;
                    for local in locals {
                        all.extend(self.define(module, &local)?);
                    }
                }
                _ => all.extend(self.expand_statement(at)?),
            }
        }

        Ok(all)
    }

    /// Include one statement with its prerequisites and mutators
    ///
    /// Returns nothing when the statement was already included.
    pub fn expand_statement(
        &mut self,
        at: StatementRef,
    ) -> Result<Vec<StatementRef>, BundleError> {
        let statement = self.statement_mut(at);
        if statement.included {
            return Ok(Vec::new());
        }
        statement.included = true;
        let dependencies: Vec<String> = statement.depends_on.iter().cloned().collect();

        let mut result = Vec::new();
        for name in dependencies {
            result.extend(self.define(at.module, &name)?);
        }
        result.push(at);

        let defines: Vec<String> = self.statement(at).defines.iter().cloned().collect();
        for name in defines {
            let mutators = self
                .module(at.module)
                .modifications
                .get(&name)
                .cloned()
                .unwrap_or_default();
            for index in mutators {
                let mutator = StatementRef::new(at.module, index);
                if !self.statement(mutator).included {
                    trace!("Including statement {index} because it modifies '{name}'");
                    result.extend(self.expand_statement(mutator)?);
                }
            }
        }

        Ok(result)
    }

    /// Include whatever is needed for `name` to exist in `module`
    ///
    /// Each name is handled once per module; repeated requests return nothing.
    pub fn define(
        &mut self,
        module: ModuleId,
        name: &str,
    ) -> Result<Vec<StatementRef>, BundleError> {
        if !self.module_mut(module).defined.insert(name.to_owned()) {
            return Ok(Vec::new());
        }

        if let Some(import) = self.module(module).imports.get(name).cloned() {
            return self.define_import(module, import);
        }

        let source = self.module(module);
        let statement = if name == "default" {
            match source.exports.get("default") {
                Some(export) if export.is_declaration => {
                    let local = export.local_name.clone();
                    return self.define(module, &local);
                }
                Some(export) => export.statement,
                None => None,
            }
        } else {
            source.definitions.get(name).copied()
        };

        match statement {
            Some(index) => self.expand_statement(StatementRef::new(module, index)),
            None => {
                trace!(
                    "'{name}' has no definition in {}, treating it as a global",
                    source.path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    fn define_import(
        &mut self,
        module: ModuleId,
        import: ImportBinding,
    ) -> Result<Vec<StatementRef>, BundleError> {
        let importer = self.module(module).path.clone();
        let target = self.fetch_module(&import.source, &importer)?;
        if let Some(binding) = self.module_mut(module).imports.get_mut(&import.local_name) {
            binding.module = Some(target);
        }

        let suggestion = self
            .module(module)
            .suggested_names
            .get(&import.local_name)
            .cloned()
            .unwrap_or_else(|| import.local_name.clone());
        if import.is_default() {
            self.suggest_name(target, "default", &suggestion);
        } else if import.is_namespace() {
            self.suggest_name(target, "*", &suggestion);
            self.suggest_name(target, "default", &format!("{suggestion}__default"));
        }

        let id = match target {
            ModuleRef::External(id) => {
                let external = self.external_mut(id);
                if import.is_default() {
                    external.needs_default = true;
                } else {
                    external.needs_named = true;
                }
                return Ok(Vec::new());
            }
            ModuleRef::Internal(id) => id,
        };

        if import.is_namespace() {
            debug!(
                "{} is imported as a namespace by {}",
                self.module(id).path.display(),
                importer.display()
            );
            self.namespace_modules.insert(id);
            return self.expand_all_statements(id, false);
        }

        let exporter = self.module(id);
        let Some(export) = exporter.exports.get(&import.name) else {
            return Err(BundleError::UnresolvedExport {
                module: exporter.path.clone(),
                name: import.name,
                importer,
            });
        };
        let local = export.local_name.clone();
        self.define(id, &local)
    }
}

/// Local bindings named by an `export { .. }` list
fn listed_locals(named: &NamedExport) -> Vec<String> {
    named
        .specifiers
        .iter()
        .filter_map(|specifier| match specifier {
            ExportSpecifier::Named(specifier) => Some(export_name(&specifier.orig)),
            ExportSpecifier::Namespace(specifier) => Some(export_name(&specifier.name)),
            ExportSpecifier::Default(_) => None,
        })
        .collect()
}
