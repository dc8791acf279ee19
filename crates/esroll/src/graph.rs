//! The module graph: every module and external reached from the entry
//!
//! Modules are created on first fetch and cached by resolved path, so a path
//! maps to exactly one [`Module`] however many importers name it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    analyzer::Statement,
    error::BundleError,
    external_module::ExternalModule,
    module::Module,
    resolver::{ModuleResolver, Resolution},
    types::{ExternalId, FxIndexSet, ModuleId, ModuleRef, StatementRef},
};

#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    externals: Vec<ExternalModule>,
    by_path: FxHashMap<PathBuf, ModuleId>,
    by_specifier: FxHashMap<String, ExternalId>,
    /// Modules imported as `* as name`, in discovery order
    pub(crate) namespace_modules: FxIndexSet<ModuleId>,
    resolver: ModuleResolver,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the entry module from `path`
    pub fn fetch_entry(&mut self, path: &Path) -> Result<ModuleId, BundleError> {
        self.load_module(path.to_path_buf())
    }

    /// Resolve `specifier` relative to `importer` and load what it points to
    pub fn fetch_module(
        &mut self,
        specifier: &str,
        importer: &Path,
    ) -> Result<ModuleRef, BundleError> {
        match self.resolver.resolve(specifier, importer) {
            Resolution::Local(path) => self.load_module(path).map(ModuleRef::Internal),
            Resolution::External => Ok(ModuleRef::External(self.external_for(specifier))),
        }
    }

    fn load_module(&mut self, path: PathBuf) -> Result<ModuleId, BundleError> {
        if let Some(&id) = self.by_path.get(&path) {
            return Ok(id);
        }

        debug!("Fetching module {}", path.display());
        let source = fs::read_to_string(&path).map_err(|source| BundleError::UnreadableModule {
            path: path.clone(),
            source,
        })?;
        let id = ModuleId::new(self.modules.len() as u32);
        let module = Module::new(id, path.clone(), source)?;
        self.by_path.insert(path, id);
        self.modules.push(module);
        Ok(id)
    }

    fn external_for(&mut self, specifier: &str) -> ExternalId {
        if let Some(&id) = self.by_specifier.get(specifier) {
            return id;
        }
        debug!("Registering external module '{specifier}'");
        let id = ExternalId::new(self.externals.len() as u32);
        self.externals.push(ExternalModule::new(id, specifier));
        self.by_specifier.insert(specifier.to_owned(), id);
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn external(&self, id: ExternalId) -> &ExternalModule {
        &self.externals[id.index()]
    }

    pub fn external_mut(&mut self, id: ExternalId) -> &mut ExternalModule {
        &mut self.externals[id.index()]
    }

    pub fn externals(&self) -> &[ExternalModule] {
        &self.externals
    }

    pub fn namespace_modules(&self) -> impl Iterator<Item = &Module> {
        self.namespace_modules.iter().map(|&id| self.module(id))
    }

    pub fn statement(&self, at: StatementRef) -> &Statement {
        self.module(at.module).statement(at.index)
    }

    pub fn statement_mut(&mut self, at: StatementRef) -> &mut Statement {
        &mut self.module_mut(at.module).statements[at.index]
    }

    /// Forward a name hint to whatever `target` is
    pub fn suggest_name(&mut self, target: ModuleRef, export_name: &str, suggestion: &str) {
        match target {
            ModuleRef::Internal(id) => self.module_mut(id).suggest_name(export_name, suggestion),
            ModuleRef::External(id) => self.external_mut(id).suggest_name(export_name, suggestion),
        }
    }
}
