//! Assembling included statements into one body of code
//!
//! Each statement is cut from its module's source as a [`Snippet`], has its
//! export syntax stripped and its top-level references rewritten to canonical
//! names, then joined with blank-line margins reconstructed from the source.

use log::{debug, trace};
use rustc_hash::FxHashMap;
use swc_core::{
    common::Spanned,
    ecma::ast::{DefaultDecl, Expr, Ident, ModuleDecl, ModuleItem},
};

use crate::{
    error::BundleError,
    graph::ModuleGraph,
    module::Module,
    parser::range,
    scope::{ScopeId, ScopeTree},
    snippet::{Snippet, SnippetBundle},
    types::StatementRef,
    walker::{Control, Node, ScopeKey, Visitor, walk},
};

/// Render `statements` in order, preceded by the namespace objects
pub fn render(
    graph: &ModuleGraph,
    statements: &[StatementRef],
) -> Result<SnippetBundle, BundleError> {
    let mut bundle = SnippetBundle::new();
    let mut previous_margin = 0;

    for &at in statements {
        let Some(snippet) = render_statement(graph, at)? else {
            trace!("Dropping redundant statement {} of module {:?}", at.index, at.module);
            continue;
        };
        let statement = graph.statement(at);
        // at least one newline, so statements never share a line
        let margin = statement.margin.0.max(previous_margin).max(2);
        bundle.add_source(&snippet, "\n".repeat(margin - 1));
        previous_margin = statement.margin.1;
    }

    let namespaces = namespace_block(graph, &bundle.indent_string());
    bundle.prepend(&namespaces);
    bundle.trim();
    Ok(bundle)
}

fn render_statement(
    graph: &ModuleGraph,
    at: StatementRef,
) -> Result<Option<Snippet>, BundleError> {
    let module = graph.module(at.module);
    let statement = graph.statement(at);
    let item = &module.ast.body[at.index];
    let mut snippet = statement.snippet.clone();

    if !strip_export(graph, module, item, &mut snippet)? {
        return Ok(None);
    }

    let replacements: FxHashMap<String, String> = statement
        .depends_on
        .iter()
        .chain(&statement.defines)
        .filter_map(|name| {
            let canonical = module.canonical_name(name, graph);
            (canonical != *name).then(|| (name.clone(), canonical))
        })
        .collect();

    if !replacements.is_empty() {
        let mut renamer = Renamer {
            tree: &module.scopes,
            scopes: &statement.scopes,
            frames: vec![replacements],
            snippet: &mut snippet,
            error: None,
        };
        walk(item, &mut renamer);
        if let Some(err) = renamer.error {
            return Err(err);
        }
    }

    snippet.trim();
    Ok(Some(snippet))
}

/// Remove export syntax from a statement; `false` means drop it entirely
fn strip_export(
    graph: &ModuleGraph,
    module: &Module,
    item: &ModuleItem,
    snippet: &mut Snippet,
) -> Result<bool, BundleError> {
    let ModuleItem::ModuleDecl(decl) = item else {
        return Ok(true);
    };
    let unhandled = |shape: &str| BundleError::UnhandledExportShape {
        path: module.path.clone(),
        shape: shape.to_owned(),
    };
    let start = range(decl.span()).start;

    match decl {
        ModuleDecl::Import(_) | ModuleDecl::ExportNamed(_) => Ok(false),
        ModuleDecl::ExportDecl(export) => {
            snippet.remove(start, range(export.decl.span()).start)?;
            Ok(true)
        }
        ModuleDecl::ExportDefaultDecl(export) => {
            let (name, span) = match &export.decl {
                DefaultDecl::Fn(function) => (function.ident.as_ref(), function.function.span),
                DefaultDecl::Class(class) => (class.ident.as_ref(), class.class.span),
                DefaultDecl::TsInterfaceDecl(_) => return Err(unhandled("interface export")),
            };
            let declaration = range(span).start;
            if name.is_some() {
                snippet.remove(start, declaration)?;
            } else {
                let canonical = module.canonical_name("default", graph);
                snippet.overwrite(start, declaration, format!("var {canonical} = "))?;
            }
            Ok(true)
        }
        ModuleDecl::ExportDefaultExpr(export) => {
            let canonical = module.canonical_name("default", graph);
            if let Expr::Ident(ident) = &*export.expr {
                if module.canonical_name(&ident.sym, graph) == canonical {
                    return Ok(false);
                }
            }
            snippet.overwrite(
                start,
                range(export.expr.span()).start,
                format!("var {canonical} = "),
            )?;
            Ok(true)
        }
        ModuleDecl::ExportAll(_) => Err(unhandled("export *")),
        _ => Err(unhandled("TypeScript module declaration")),
    }
}

/// Synthetic objects for modules imported as `* as name`
fn namespace_block(graph: &ModuleGraph, indent: &str) -> String {
    let mut block = String::new();
    for module in graph.namespace_modules() {
        let name = module.canonical_name("*", graph);
        debug!("Emitting namespace object '{name}' for {}", module.path.display());

        let getters: Vec<String> = module
            .exports
            .iter()
            .map(|(key, export)| {
                let target = module.canonical_name(&export.local_name, graph);
                format!("{indent}get {key} () {{ return {target} }}")
            })
            .collect();
        block.push_str(&format!("var {name} = {{\n{}\n}}\n\n", getters.join(",\n")));
    }
    block
}

/// Rewrites references to top-level names, honouring shadowing
struct Renamer<'a> {
    tree: &'a ScopeTree,
    scopes: &'a FxHashMap<ScopeKey, ScopeId>,
    /// Replacements still visible at each open scope
    frames: Vec<FxHashMap<String, String>>,
    snippet: &'a mut Snippet,
    error: Option<BundleError>,
}

impl Renamer<'_> {
    fn replace(&mut self, ident: &Ident, shorthand: bool) -> Control {
        let name: &str = &ident.sym;
        let Some(canonical) = self.frames.last().and_then(|frame| frame.get(name)) else {
            return Control::Continue;
        };
        let content = if shorthand {
            format!("{name}: {canonical}")
        } else {
            canonical.clone()
        };
        let span = range(ident.span);
        match self.snippet.overwrite(span.start, span.end, content) {
            Ok(()) => Control::Continue,
            Err(err) => {
                self.error = Some(err);
                Control::Abort
            }
        }
    }
}

impl Visitor for Renamer<'_> {
    fn enter(&mut self, node: &Node<'_>) -> Control {
        if let Some(key) = node.scope_key() {
            let current = self.frames.last().cloned().unwrap_or_default();
            let frame: FxHashMap<String, String> = match self.scopes.get(&key) {
                Some(&id) => {
                    let scope = self.tree.get(id);
                    current
                        .into_iter()
                        .filter(|(name, _)| !scope.declares(name))
                        .collect()
                }
                None => current,
            };
            let shadowed = frame.is_empty();
            self.frames.push(frame);
            return if shadowed {
                Control::Skip
            } else {
                Control::Continue
            };
        }

        match node {
            Node::Ident(ident) => self.replace(ident, false),
            Node::ShorthandProperty(ident) => self.replace(ident, true),
            _ => Control::Continue,
        }
    }

    fn leave(&mut self, node: &Node<'_>) {
        if node.scope_key().is_some() {
            self.frames.pop();
        }
    }
}
