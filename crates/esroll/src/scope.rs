//! Lexical scopes of one module
//!
//! Scopes are kept in an arena owned by the module. Scope 0 is the module
//! top level; every function, block and catch clause below it gets its own
//! entry, created once during analysis and re-entered by later passes.

use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeId>,
    depth: usize,
    names: FxHashSet<String>,
    is_block: bool,
}

impl Scope {
    pub const fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn declares(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                depth: 0,
                names: FxHashSet::default(),
                is_block: false,
            }],
        }
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Open a child scope of `parent`, pre-seeded with `names`
    pub fn push(
        &mut self,
        parent: ScopeId,
        is_block: bool,
        names: impl IntoIterator<Item = String>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let depth = self.get(parent).depth + 1;
        self.scopes.push(Scope {
            parent: Some(parent),
            depth,
            names: names.into_iter().collect(),
            is_block,
        });
        id
    }

    /// Declare `name` in `scope` and return the scope it landed in
    ///
    /// Hoisting declarations made inside a block scope move up to the nearest
    /// non-block ancestor; block-scoped declarations stay where they are.
    pub fn add(&mut self, scope: ScopeId, name: &str, is_block_declaration: bool) -> ScopeId {
        let mut target = scope;
        if !is_block_declaration {
            while let Scope {
                is_block: true,
                parent: Some(parent),
                ..
            } = self.get(target)
            {
                target = *parent;
            }
        }
        self.scopes[target.index()].names.insert(name.to_owned());
        target
    }

    /// Walk outward from `scope` to the first scope declaring `name`
    pub fn find_defining_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.get(id);
            if scope.declares(name) {
                return Some(id);
            }
            current = scope.parent;
        }
        None
    }

    /// Whether `name` seen from `scope` refers to a top-level binding or to
    /// nothing declared in this module
    pub fn is_top_level_reference(&self, scope: ScopeId, name: &str) -> bool {
        self.find_defining_scope(scope, name)
            .is_none_or(|found| self.get(found).depth == 0)
    }
}
