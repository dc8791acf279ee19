//! One parsed, analysed source module
//!
//! A [`Module`] owns its AST, the import and export tables extracted from it,
//! the per-statement analysis, and the canonical-name cache that maps its
//! top-level names onto the identifiers used in the bundle.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
};

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::ecma::ast::{
    Decl, DefaultDecl, ExportSpecifier, Expr, ImportSpecifier, ModuleDecl, ModuleExportName,
    ModuleItem,
};

use crate::{
    analyzer::{Statement, analyse, binding_names},
    error::BundleError,
    graph::ModuleGraph,
    parser::{SourceComment, parse_module},
    resolver::identifier_from,
    scope::ScopeTree,
    types::{FxIndexMap, ModuleId, ModuleRef},
};

/// A name this module imports, keyed by its local name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Specifier as written, e.g. `./math` or `path`
    pub source: String,
    /// Exported name in the target: a plain name, `default` or `*`
    pub name: String,
    pub local_name: String,
    /// Filled in once the import has been followed
    pub module: Option<ModuleRef>,
}

impl ImportBinding {
    pub fn is_namespace(&self) -> bool {
        self.name == "*"
    }

    pub fn is_default(&self) -> bool {
        self.name == "default"
    }
}

/// A name this module exports, keyed by its exported name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBinding {
    /// Binding behind the export; `default` for anonymous default exports
    pub local_name: String,
    /// Index of the statement carrying a declaration or default export
    pub statement: Option<usize>,
    /// `export default function name() {}` and `export default class Name {}`
    pub is_declaration: bool,
    /// The identifier in `export default name`
    pub identifier: Option<String>,
}

impl ExportBinding {
    fn named(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            statement: None,
            is_declaration: false,
            identifier: None,
        }
    }
}

#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    pub path: PathBuf,
    pub source: Rc<str>,
    pub ast: swc_core::ecma::ast::Module,
    pub comments: Vec<SourceComment>,
    pub imports: FxIndexMap<String, ImportBinding>,
    pub exports: FxIndexMap<String, ExportBinding>,
    pub statements: Vec<Statement>,
    pub scopes: ScopeTree,
    /// Top-level name to the index of the statement defining it
    pub definitions: FxHashMap<String, usize>,
    /// Top-level name to the statements that may mutate it, in source order
    pub modifications: FxHashMap<String, Vec<usize>>,
    /// First-wins name hints for `default` and `*`, pushed by importers
    pub suggested_names: FxHashMap<String, String>,
    /// Names already requested through `define`, resolved or in flight
    pub(crate) defined: FxHashSet<String>,
    canonical_names: RefCell<FxHashMap<String, String>>,
}

impl Module {
    /// Parse and analyse `source`
    pub fn new(id: ModuleId, path: PathBuf, source: String) -> Result<Self, BundleError> {
        let parsed = parse_module(&source, &path)?;
        let source: Rc<str> = Rc::from(source);

        let mut module = Self {
            id,
            path,
            source,
            ast: parsed.ast,
            comments: parsed.comments,
            imports: FxIndexMap::default(),
            exports: FxIndexMap::default(),
            statements: Vec::new(),
            scopes: ScopeTree::new(),
            definitions: FxHashMap::default(),
            modifications: FxHashMap::default(),
            suggested_names: FxHashMap::default(),
            defined: FxHashSet::default(),
            canonical_names: RefCell::new(FxHashMap::default()),
        };
        module.analyse()?;
        Ok(module)
    }

    fn analyse(&mut self) -> Result<(), BundleError> {
        for (index, item) in self.ast.body.iter().enumerate() {
            if let ModuleItem::ModuleDecl(decl) = item {
                let (imports, exports) = extract_bindings(decl, index, &self.path)?;
                self.imports.extend(imports);
                self.exports.extend(exports);
            }
        }

        self.statements = analyse(
            self.id,
            &self.ast,
            &self.source,
            &self.comments,
            &mut self.scopes,
        );

        for statement in &self.statements {
            for name in &statement.defines {
                self.definitions.insert(name.clone(), statement.index);
            }
            for name in &statement.modifies {
                self.modifications
                    .entry(name.clone())
                    .or_default()
                    .push(statement.index);
            }
        }

        debug!(
            "Analysed {}: {} statements, {} imports, {} exports",
            self.path.display(),
            self.statements.len(),
            self.imports.len(),
            self.exports.len()
        );
        Ok(())
    }

    pub fn statement(&self, index: usize) -> &Statement {
        &self.statements[index]
    }

    /// Record a name hint for `default` or `*`; the first hint wins
    pub fn suggest_name(&mut self, export_name: &str, suggestion: &str) {
        if !self.suggested_names.contains_key(export_name) {
            self.suggested_names
                .insert(export_name.to_owned(), suggestion.to_owned());
        }
    }

    /// Force the canonical name of a top-level binding
    pub fn rename(&self, name: &str, replacement: &str) {
        debug!(
            "Renaming '{name}' to '{replacement}' in {}",
            self.path.display()
        );
        self.canonical_names
            .borrow_mut()
            .insert(name.to_owned(), replacement.to_owned());
    }

    /// The identifier `name` is represented by in the bundle
    pub fn canonical_name(&self, name: &str, graph: &ModuleGraph) -> String {
        if let Some(cached) = self.canonical_names.borrow().get(name) {
            return cached.clone();
        }

        let canonical = self.resolve_canonical_name(name, graph);
        self.canonical_names
            .borrow_mut()
            .insert(name.to_owned(), canonical.clone());
        canonical
    }

    fn resolve_canonical_name(&self, local: &str, graph: &ModuleGraph) -> String {
        if local == "*" {
            return self
                .suggested_names
                .get("*")
                .cloned()
                .unwrap_or_else(|| local.to_owned());
        }

        if let Some(import) = self.imports.get(local) {
            return match import.module {
                Some(ModuleRef::Internal(id)) => {
                    let target = graph.module(id);
                    if import.is_namespace() {
                        target.canonical_name("*", graph)
                    } else {
                        target.exports.get(&import.name).map_or_else(
                            || local.to_owned(),
                            |export| target.canonical_name(&export.local_name, graph),
                        )
                    }
                }
                Some(ModuleRef::External(id)) => graph.external(id).canonical_name(&import.name),
                None => local.to_owned(),
            };
        }

        if local == "default" {
            return match self.exports.get("default") {
                Some(ExportBinding {
                    identifier: Some(identifier),
                    ..
                }) => self.canonical_name(identifier, graph),
                Some(export) if export.local_name != "default" => {
                    self.canonical_name(&export.local_name, graph)
                }
                _ => self.anonymous_default_name(),
            };
        }

        local.to_owned()
    }

    /// Statement emitted as `var <name> = ..` for an anonymous default export
    pub fn anonymous_default(&self) -> Option<usize> {
        self.exports
            .get("default")
            .filter(|export| export.local_name == "default" && export.identifier.is_none())
            .and_then(|export| export.statement)
    }

    /// Name an anonymous default export is declared under before deconfliction
    ///
    /// The first importer's local name wins, then the module's file stem.
    pub fn anonymous_default_name(&self) -> String {
        if let Some(suggestion) = self.suggested_names.get("default") {
            return suggestion.clone();
        }
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        identifier_from(&stem)
    }
}

type Bindings = (
    Vec<(String, ImportBinding)>,
    Vec<(String, ExportBinding)>,
);

/// Import and export table entries contributed by one module declaration
fn extract_bindings(
    decl: &ModuleDecl,
    index: usize,
    path: &Path,
) -> Result<Bindings, BundleError> {
    let mut imports = Vec::new();
    let mut exports = Vec::new();
    let unhandled = |shape: &str| BundleError::UnhandledExportShape {
        path: path.to_path_buf(),
        shape: shape.to_owned(),
    };

    match decl {
        ModuleDecl::Import(import) => {
            let source = import.src.value.to_string();
            for specifier in &import.specifiers {
                let (local, name) = match specifier {
                    ImportSpecifier::Named(named) => (
                        named.local.sym.to_string(),
                        named
                            .imported
                            .as_ref()
                            .map_or_else(|| named.local.sym.to_string(), export_name),
                    ),
                    ImportSpecifier::Default(default) => {
                        (default.local.sym.to_string(), "default".to_owned())
                    }
                    ImportSpecifier::Namespace(namespace) => {
                        (namespace.local.sym.to_string(), "*".to_owned())
                    }
                };
                imports.push(import_entry(&source, name, local));
            }
        }
        ModuleDecl::ExportDecl(export) => {
            let names = match &export.decl {
                Decl::Var(var) => var
                    .decls
                    .iter()
                    .flat_map(|declarator| binding_names(&declarator.name))
                    .collect(),
                Decl::Fn(function) => vec![function.ident.sym.to_string()],
                Decl::Class(class) => vec![class.ident.sym.to_string()],
                _ => return Err(unhandled("declaration export")),
            };
            for name in names {
                let mut binding = ExportBinding::named(name.clone());
                binding.statement = Some(index);
                exports.push((name, binding));
            }
        }
        ModuleDecl::ExportNamed(named) => {
            let source = named.src.as_ref().map(|src| src.value.to_string());
            for specifier in &named.specifiers {
                match specifier {
                    ExportSpecifier::Named(specifier) => {
                        let local = export_name(&specifier.orig);
                        let exported = specifier
                            .exported
                            .as_ref()
                            .map_or_else(|| local.clone(), export_name);
                        if let Some(source) = &source {
                            imports.push(import_entry(source, local.clone(), local.clone()));
                        }
                        exports.push((exported, ExportBinding::named(local)));
                    }
                    ExportSpecifier::Namespace(specifier) => {
                        let Some(source) = &source else {
                            return Err(unhandled("namespace export without a source"));
                        };
                        let local = export_name(&specifier.name);
                        imports.push(import_entry(source, "*".to_owned(), local.clone()));
                        exports.push((local.clone(), ExportBinding::named(local)));
                    }
                    ExportSpecifier::Default(_) => return Err(unhandled("default re-export")),
                }
            }
        }
        ModuleDecl::ExportDefaultDecl(export) => {
            let name = match &export.decl {
                DefaultDecl::Fn(function) => function.ident.as_ref(),
                DefaultDecl::Class(class) => class.ident.as_ref(),
                DefaultDecl::TsInterfaceDecl(_) => return Err(unhandled("interface export")),
            };
            let binding = ExportBinding {
                local_name: name.map_or_else(|| "default".to_owned(), |name| name.sym.to_string()),
                statement: Some(index),
                is_declaration: name.is_some(),
                identifier: None,
            };
            exports.push(("default".to_owned(), binding));
        }
        ModuleDecl::ExportDefaultExpr(export) => {
            let identifier = match &*export.expr {
                Expr::Ident(ident) => Some(ident.sym.to_string()),
                _ => None,
            };
            let binding = ExportBinding {
                local_name: "default".to_owned(),
                statement: Some(index),
                is_declaration: false,
                identifier,
            };
            exports.push(("default".to_owned(), binding));
        }
        // Rejected when the statement is emitted
        _ => {}
    }

    Ok((imports, exports))
}

fn import_entry(source: &str, name: String, local_name: String) -> (String, ImportBinding) {
    (
        local_name.clone(),
        ImportBinding {
            source: source.to_owned(),
            name,
            local_name,
            module: None,
        },
    )
}

pub(crate) fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(string) => string.value.to_string(),
    }
}
