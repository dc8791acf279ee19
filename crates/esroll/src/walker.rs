//! Depth-first traversal that projects the swc AST onto the handful of node
//! shapes the analyzer and the identifier rewriter care about.
//!
//! The walk is driven by [`swc_core::ecma::visit::Visit`], so child order is
//! the stable field order of the AST. Callers implement [`Visitor`] and steer
//! the walk with [`Control`].

use swc_core::{
    common::Span,
    ecma::{
        ast::{
            ArrowExpr, AssignExpr, AssignPatProp, BlockStmt, BreakStmt, CallExpr, CatchClause,
            ClassDecl, ClassExpr, Constructor, ContinueStmt, DefaultDecl, ExportDefaultDecl,
            ExportSpecifier, Expr, FnDecl, FnExpr, Function, GetterProp, Ident, ImportDecl,
            ImportSpecifier, LabeledStmt, MemberExpr, MemberProp, ModuleExportName, NamedExport,
            ParamOrTsParamProp, Pat, PrivateName, Prop, PropName, SetterProp, Stmt, SuperProp,
            SuperPropExpr, UpdateExpr, VarDecl,
        },
        visit::{Visit, VisitWith},
    },
};

use crate::parser::offset;

/// Returned from [`Visitor::enter`] to steer the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Descend into the node's children
    Continue,
    /// Do not descend, but still call `leave` for this node
    Skip,
    /// Stop the whole walk; no further callbacks fire
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
    /// Class and object methods, constructors, getters and setters
    Method,
}

#[derive(Debug)]
pub struct FunctionNode<'n> {
    pub kind: FunctionKind,
    /// Declared name; for declarations this binds in the enclosing scope
    pub name: Option<&'n Ident>,
    pub params: Vec<&'n Pat>,
    pub span: Span,
}

/// Node shapes reported to a [`Visitor`]
#[derive(Debug)]
pub enum Node<'n> {
    Function(FunctionNode<'n>),
    Block(&'n BlockStmt),
    Catch(&'n CatchClause),
    VarDecl(&'n VarDecl),
    /// A class declaration, carrying its name
    ClassDecl(&'n Ident),
    Import(&'n ImportDecl),
    Assign(&'n AssignExpr),
    Update(&'n UpdateExpr),
    Call(&'n CallExpr),
    /// An identifier in reference or binding position
    Ident(&'n Ident),
    /// `{ a }` in an object literal or pattern; the key doubles as a reference
    ShorthandProperty(&'n Ident),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Function,
    Block,
    Catch,
}

/// Stable identity of a scope-introducing node within one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub kind: ScopeKind,
    pub start: usize,
    pub end: usize,
}

impl ScopeKey {
    fn new(kind: ScopeKind, span: Span) -> Self {
        Self {
            kind,
            start: offset(span.lo),
            end: offset(span.hi),
        }
    }
}

impl Node<'_> {
    /// Key of the scope this node opens, if it opens one
    pub fn scope_key(&self) -> Option<ScopeKey> {
        match self {
            Node::Function(function) => Some(ScopeKey::new(ScopeKind::Function, function.span)),
            Node::Block(block) => Some(ScopeKey::new(ScopeKind::Block, block.span)),
            Node::Catch(clause) => Some(ScopeKey::new(ScopeKind::Catch, clause.span)),
            _ => None,
        }
    }
}

pub trait Visitor {
    fn enter(&mut self, node: &Node<'_>) -> Control;

    fn leave(&mut self, _node: &Node<'_>) {}
}

/// Walk `node` and everything below it
pub fn walk<'v, N, V>(node: &N, visitor: &'v mut V)
where
    V: Visitor,
    N: VisitWith<Walker<'v, V>> + ?Sized,
{
    let mut walker = Walker {
        visitor,
        aborted: false,
    };
    node.visit_with(&mut walker);
}

#[derive(Debug)]
pub struct Walker<'v, V> {
    visitor: &'v mut V,
    aborted: bool,
}

impl<V: Visitor> Walker<'_, V> {
    fn dispatch(&mut self, node: &Node<'_>, children: impl FnOnce(&mut Self)) {
        if self.aborted {
            return;
        }
        match self.visitor.enter(node) {
            Control::Abort => {
                self.aborted = true;
                return;
            }
            Control::Skip => {}
            Control::Continue => children(self),
        }
        if !self.aborted {
            self.visitor.leave(node);
        }
    }

    fn function(&mut self, kind: FunctionKind, name: Option<&Ident>, function: &Function) {
        let node = Node::Function(FunctionNode {
            kind,
            name,
            params: function.params.iter().map(|param| &param.pat).collect(),
            span: function.span,
        });
        self.dispatch(&node, |walker| function.visit_children_with(walker));
    }

    fn class_declaration(&mut self, ident: &Ident, children: impl FnOnce(&mut Self)) {
        self.visit_ident(ident);
        self.dispatch(&Node::ClassDecl(ident), children);
    }
}

impl<V: Visitor> Visit for Walker<'_, V> {
    fn visit_stmt(&mut self, n: &Stmt) {
        if !self.aborted {
            n.visit_children_with(self);
        }
    }

    fn visit_expr(&mut self, n: &Expr) {
        if !self.aborted {
            n.visit_children_with(self);
        }
    }

    fn visit_pat(&mut self, n: &Pat) {
        if !self.aborted {
            n.visit_children_with(self);
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.visit_ident(&n.ident);
        self.function(FunctionKind::Declaration, Some(&n.ident), &n.function);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        self.function(FunctionKind::Expression, n.ident.as_ref(), &n.function);
    }

    fn visit_function(&mut self, n: &Function) {
        self.function(FunctionKind::Method, None, n);
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        let node = Node::Function(FunctionNode {
            kind: FunctionKind::Arrow,
            name: None,
            params: n.params.iter().collect(),
            span: n.span,
        });
        self.dispatch(&node, |walker| {
            n.params.visit_with(walker);
            n.body.visit_with(walker);
        });
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        n.key.visit_with(self);
        let params = n
            .params
            .iter()
            .filter_map(|param| match param {
                ParamOrTsParamProp::Param(param) => Some(&param.pat),
                ParamOrTsParamProp::TsParamProp(_) => None,
            })
            .collect();
        let node = Node::Function(FunctionNode {
            kind: FunctionKind::Method,
            name: None,
            params,
            span: n.span,
        });
        self.dispatch(&node, |walker| {
            n.params.visit_with(walker);
            n.body.visit_with(walker);
        });
    }

    fn visit_getter_prop(&mut self, n: &GetterProp) {
        n.key.visit_with(self);
        let node = Node::Function(FunctionNode {
            kind: FunctionKind::Method,
            name: None,
            params: Vec::new(),
            span: n.span,
        });
        self.dispatch(&node, |walker| n.body.visit_with(walker));
    }

    fn visit_setter_prop(&mut self, n: &SetterProp) {
        n.key.visit_with(self);
        let node = Node::Function(FunctionNode {
            kind: FunctionKind::Method,
            name: None,
            params: vec![&*n.param],
            span: n.span,
        });
        self.dispatch(&node, |walker| {
            n.param.visit_with(walker);
            n.body.visit_with(walker);
        });
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.dispatch(&Node::Block(n), |walker| n.visit_children_with(walker));
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        self.dispatch(&Node::Catch(n), |walker| n.visit_children_with(walker));
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        self.dispatch(&Node::VarDecl(n), |walker| n.visit_children_with(walker));
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.class_declaration(&n.ident, |walker| n.class.visit_with(walker));
    }

    // The name of a class expression only binds inside the class body
    fn visit_class_expr(&mut self, n: &ClassExpr) {
        n.class.visit_with(self);
    }

    fn visit_export_default_decl(&mut self, n: &ExportDefaultDecl) {
        match &n.decl {
            DefaultDecl::Fn(FnExpr {
                ident: Some(ident),
                function,
            }) => {
                self.visit_ident(ident);
                self.function(FunctionKind::Declaration, Some(ident), function);
            }
            DefaultDecl::Class(ClassExpr {
                ident: Some(ident),
                class,
            }) => self.class_declaration(ident, |walker| class.visit_with(walker)),
            _ => n.visit_children_with(self),
        }
    }

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        self.dispatch(&Node::Import(n), |walker| {
            for specifier in &n.specifiers {
                let local = match specifier {
                    ImportSpecifier::Named(named) => &named.local,
                    ImportSpecifier::Default(default) => &default.local,
                    ImportSpecifier::Namespace(namespace) => &namespace.local,
                };
                walker.visit_ident(local);
            }
        });
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        if n.src.is_some() {
            return;
        }
        for specifier in &n.specifiers {
            if let ExportSpecifier::Named(named) = specifier {
                if let ModuleExportName::Ident(orig) = &named.orig {
                    self.visit_ident(orig);
                }
            }
        }
    }

    fn visit_assign_expr(&mut self, n: &AssignExpr) {
        self.dispatch(&Node::Assign(n), |walker| n.visit_children_with(walker));
    }

    fn visit_update_expr(&mut self, n: &UpdateExpr) {
        self.dispatch(&Node::Update(n), |walker| n.visit_children_with(walker));
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        self.dispatch(&Node::Call(n), |walker| n.visit_children_with(walker));
    }

    fn visit_ident(&mut self, n: &Ident) {
        self.dispatch(&Node::Ident(n), |_| {});
    }

    fn visit_prop(&mut self, n: &Prop) {
        match n {
            Prop::Shorthand(ident) => self.dispatch(&Node::ShorthandProperty(ident), |_| {}),
            _ => n.visit_children_with(self),
        }
    }

    fn visit_assign_pat_prop(&mut self, n: &AssignPatProp) {
        let key: &Ident = &n.key;
        self.dispatch(&Node::ShorthandProperty(key), |_| {});
        n.value.visit_with(self);
    }

    fn visit_prop_name(&mut self, n: &PropName) {
        if let PropName::Computed(computed) = n {
            computed.visit_with(self);
        }
    }

    fn visit_member_expr(&mut self, n: &MemberExpr) {
        n.obj.visit_with(self);
        if let MemberProp::Computed(computed) = &n.prop {
            computed.visit_with(self);
        }
    }

    fn visit_super_prop_expr(&mut self, n: &SuperPropExpr) {
        if let SuperProp::Computed(computed) = &n.prop {
            computed.visit_with(self);
        }
    }

    fn visit_private_name(&mut self, _n: &PrivateName) {}

    fn visit_labeled_stmt(&mut self, n: &LabeledStmt) {
        n.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _n: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _n: &ContinueStmt) {}
}
