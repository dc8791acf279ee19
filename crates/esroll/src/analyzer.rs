//! Per-statement scope and dependency analysis
//!
//! Every top-level statement is walked twice. The first walk builds the scope
//! tree and collects the names the statement defines at the top level; the
//! second re-enters those scopes to classify identifier references as
//! top-level dependencies and assignment targets as modifications.

use std::{ops::Range, rc::Rc};

use log::trace;
use rustc_hash::FxHashMap;
use swc_core::{
    common::Spanned,
    ecma::{
        ast::{
            ArrayPat, AssignPatProp, BindingIdent, Expr, Ident, MemberExpr, Module, ModuleItem,
            ObjectPat, Pat, PropName, SuperPropExpr, VarDeclKind,
        },
        visit::{Visit, VisitWith},
    },
};

use crate::{
    parser::{SourceComment, range},
    scope::{ScopeId, ScopeTree},
    snippet::Snippet,
    types::{FxIndexSet, ModuleId, StatementRef},
    walker::{Control, FunctionKind, Node, ScopeKey, Visitor, walk},
};

/// Analysis record for one top-level statement
#[derive(Debug)]
pub struct Statement {
    pub module: ModuleId,
    /// Position in the module body
    pub index: usize,
    /// Byte range of the statement node, without attached comments
    pub span: Range<usize>,
    /// Top-level names this statement declares
    pub defines: FxIndexSet<String>,
    /// Top-level names this statement may mutate
    pub modifies: FxIndexSet<String>,
    /// Top-level names this statement reads but does not declare
    pub depends_on: FxIndexSet<String>,
    pub included: bool,
    /// Newline-separated segments before and after the statement
    pub margin: (usize, usize),
    pub leading_comments: Vec<Range<usize>>,
    pub trailing_comment: Option<Range<usize>>,
    /// Source text of the statement including its attached comments
    pub snippet: Snippet,
    /// Scopes opened by nodes inside this statement
    pub scopes: FxHashMap<ScopeKey, ScopeId>,
}

impl Statement {
    pub const fn reference(&self) -> StatementRef {
        StatementRef::new(self.module, self.index)
    }
}

#[derive(Debug, Clone, Default)]
struct Attached {
    leading: Vec<Range<usize>>,
    trailing: Option<Range<usize>>,
}

/// Analyse every statement of `ast`, declaring top-level names in `tree`
pub fn analyse(
    module: ModuleId,
    ast: &Module,
    source: &Rc<str>,
    comments: &[SourceComment],
    tree: &mut ScopeTree,
) -> Vec<Statement> {
    let whole = Snippet::new(Rc::clone(source));
    let attached = attach_comments(source, &ast.body, comments);
    let mut statements: Vec<Statement> = Vec::with_capacity(ast.body.len());
    let mut previous_end = 0;

    for ((index, item), attached) in ast.body.iter().enumerate().zip(attached) {
        let span = range(item.span());
        let start = attached.leading.first().map_or(span.start, |c| c.start);
        let end = attached.trailing.as_ref().map_or(span.end, |c| c.end);

        let gap = &source[previous_end.min(start)..start];
        let margin = gap.matches('\n').count() + 1;
        if let Some(previous) = statements.last_mut() {
            previous.margin.1 = margin;
        }

        let mut builder = ScopeBuilder {
            tree: &mut *tree,
            current: ScopeTree::ROOT,
            scopes: FxHashMap::default(),
            defines: FxIndexSet::default(),
        };
        walk(item, &mut builder);

        statements.push(Statement {
            module,
            index,
            snippet: whole.snip(start, end),
            span,
            defines: builder.defines,
            modifies: FxIndexSet::default(),
            depends_on: FxIndexSet::default(),
            included: false,
            margin: (margin, 0),
            leading_comments: attached.leading,
            trailing_comment: attached.trailing,
            scopes: builder.scopes,
        });
        previous_end = end;
    }

    for (statement, item) in statements.iter_mut().zip(&ast.body) {
        collect_dependencies(statement, item, tree);
        trace!(
            "statement {} defines {:?}, depends on {:?}, modifies {:?}",
            statement.index, statement.defines, statement.depends_on, statement.modifies
        );
    }

    statements
}

fn collect_dependencies(statement: &mut Statement, item: &ModuleItem, tree: &ScopeTree) {
    let mut collector = DependencyCollector {
        tree,
        scopes: &statement.scopes,
        current: ScopeTree::ROOT,
        defines: &statement.defines,
        depends_on: FxIndexSet::default(),
        modifies: FxIndexSet::default(),
    };
    walk(item, &mut collector);
    let (depends_on, modifies) = (collector.depends_on, collector.modifies);
    statement.depends_on = depends_on;
    statement.modifies = modifies;
}

/// Attach comments found between statements
///
/// A comment on the same line as the end of the previous statement trails
/// that statement; any other comment leads the next one. Comments inside a
/// statement stay part of its own text and are not attached.
fn attach_comments(
    source: &str,
    body: &[ModuleItem],
    comments: &[SourceComment],
) -> Vec<Attached> {
    let mut attached = vec![Attached::default(); body.len()];
    let mut cursor = 0;
    let mut previous_end: Option<usize> = None;

    for (index, item) in body.iter().enumerate() {
        let span = range(item.span());
        let mut may_trail = previous_end.is_some();

        while let Some(comment) = comments.get(cursor) {
            if comment.end > span.start {
                break;
            }
            cursor += 1;
            if let Some(end) = previous_end {
                if comment.start < end {
                    continue;
                }
                if may_trail && !source[end..comment.start].contains('\n') {
                    attached[index - 1].trailing = Some(comment.start..comment.end);
                    may_trail = false;
                    continue;
                }
            }
            attached[index].leading.push(comment.start..comment.end);
            may_trail = false;
        }
        previous_end = Some(span.end);
    }

    if let (Some(last), Some(end)) = (attached.last_mut(), previous_end) {
        let after = comments[cursor..].iter().find(|comment| comment.start >= end);
        if let Some(comment) = after {
            if !source[end..comment.start].contains('\n') {
                last.trailing = Some(comment.start..comment.end);
            }
        }
    }

    attached
}

/// First pass: scopes and top-level definitions
struct ScopeBuilder<'a> {
    tree: &'a mut ScopeTree,
    current: ScopeId,
    scopes: FxHashMap<ScopeKey, ScopeId>,
    defines: FxIndexSet<String>,
}

impl ScopeBuilder<'_> {
    fn declare(&mut self, name: &str, is_block_declaration: bool) {
        let landed = self.tree.add(self.current, name, is_block_declaration);
        if landed == ScopeTree::ROOT {
            self.defines.insert(name.to_owned());
        }
    }

    fn open(&mut self, node: &Node<'_>, is_block: bool, names: Vec<String>) {
        let id = self.tree.push(self.current, is_block, names);
        if let Some(key) = node.scope_key() {
            self.scopes.insert(key, id);
        }
        self.current = id;
    }
}

impl Visitor for ScopeBuilder<'_> {
    fn enter(&mut self, node: &Node<'_>) -> Control {
        match node {
            Node::Function(function) => {
                let mut names: Vec<String> = function
                    .params
                    .iter()
                    .flat_map(|param| binding_names(param))
                    .collect();
                match (function.kind, function.name) {
                    (FunctionKind::Declaration, Some(name)) => self.declare(&name.sym, false),
                    (FunctionKind::Expression, Some(name)) => names.push(name.sym.to_string()),
                    _ => {}
                }
                self.open(node, false, names);
            }
            Node::Block(_) => self.open(node, true, Vec::new()),
            Node::Catch(clause) => {
                let names = clause.param.as_ref().map(binding_names).unwrap_or_default();
                self.open(node, true, names);
            }
            Node::VarDecl(decl) => {
                let is_block = decl.kind == VarDeclKind::Let;
                for declarator in &decl.decls {
                    for name in binding_names(&declarator.name) {
                        self.declare(&name, is_block);
                    }
                }
            }
            Node::ClassDecl(ident) => self.declare(&ident.sym, false),
            _ => {}
        }
        Control::Continue
    }

    fn leave(&mut self, node: &Node<'_>) {
        if node.scope_key().is_some() {
            if let Some(parent) = self.tree.get(self.current).parent() {
                self.current = parent;
            }
        }
    }
}

/// Second pass: reads and writes of top-level names
struct DependencyCollector<'a> {
    tree: &'a ScopeTree,
    scopes: &'a FxHashMap<ScopeKey, ScopeId>,
    current: ScopeId,
    defines: &'a FxIndexSet<String>,
    depends_on: FxIndexSet<String>,
    modifies: FxIndexSet<String>,
}

impl DependencyCollector<'_> {
    fn read(&mut self, ident: &Ident) {
        let name: &str = &ident.sym;
        if !self.defines.contains(name) && self.tree.is_top_level_reference(self.current, name) {
            self.depends_on.insert(name.to_owned());
        }
    }

    fn write<N: VisitWith<RootFinder>>(&mut self, target: &N) {
        let mut finder = RootFinder::default();
        target.visit_with(&mut finder);
        if let Some(root) = finder.root {
            if self.tree.is_top_level_reference(self.current, &root) {
                self.modifies.insert(root);
            }
        }
    }
}

impl Visitor for DependencyCollector<'_> {
    fn enter(&mut self, node: &Node<'_>) -> Control {
        if let Some(scope) = node.scope_key().and_then(|key| self.scopes.get(&key)) {
            self.current = *scope;
        }
        match node {
            Node::Import(_) => return Control::Skip,
            Node::Ident(ident) | Node::ShorthandProperty(ident) => self.read(ident),
            Node::Assign(assign) => self.write(&assign.left),
            Node::Update(update) => self.write(&update.arg),
            Node::Call(call) => {
                for arg in call.args.iter().filter(|arg| arg.spread.is_none()) {
                    self.write(&arg.expr);
                }
            }
            _ => {}
        }
        Control::Continue
    }

    fn leave(&mut self, node: &Node<'_>) {
        let opened = node
            .scope_key()
            .is_some_and(|key| self.scopes.contains_key(&key));
        if opened {
            if let Some(parent) = self.tree.get(self.current).parent() {
                self.current = parent;
            }
        }
    }
}

/// Names bound by a declaration pattern
pub fn binding_names(pat: &Pat) -> Vec<String> {
    let mut collector = BindingCollector::default();
    pat.visit_with(&mut collector);
    collector.names
}

#[derive(Default)]
struct BindingCollector {
    names: Vec<String>,
}

impl Visit for BindingCollector {
    fn visit_binding_ident(&mut self, n: &BindingIdent) {
        self.names.push(n.id.sym.to_string());
    }

    fn visit_assign_pat_prop(&mut self, n: &AssignPatProp) {
        let key: &Ident = &n.key;
        self.names.push(key.sym.to_string());
    }

    // Default values and computed keys bind nothing
    fn visit_expr(&mut self, _n: &Expr) {}

    fn visit_prop_name(&mut self, _n: &PropName) {}
}

/// Finds the base identifier of an assignment target (`a` in `a.b[c].d`)
#[derive(Default)]
struct RootFinder {
    root: Option<String>,
}

impl Visit for RootFinder {
    fn visit_ident(&mut self, n: &Ident) {
        if self.root.is_none() {
            self.root = Some(n.sym.to_string());
        }
    }

    fn visit_member_expr(&mut self, n: &MemberExpr) {
        n.obj.visit_with(self);
    }

    fn visit_expr(&mut self, n: &Expr) {
        if matches!(n, Expr::Ident(_) | Expr::Member(_) | Expr::Paren(_)) {
            n.visit_children_with(self);
        }
    }

    fn visit_pat(&mut self, n: &Pat) {
        if matches!(n, Pat::Ident(_) | Pat::Expr(_)) {
            n.visit_children_with(self);
        }
    }

    fn visit_super_prop_expr(&mut self, _n: &SuperPropExpr) {}

    fn visit_array_pat(&mut self, _n: &ArrayPat) {}

    fn visit_object_pat(&mut self, _n: &ObjectPat) {}
}
