//! Cross-module name deconfliction
//!
//! Flattening every included statement into one scope means two modules that
//! both declare `helper` at the top level would collide. Each top-level name is
//! assigned to its owners in discovery order; when a name has several owners
//! the last one keeps it and the others are renamed by prefixing `_` until the
//! candidate is free.
//!
//! Besides declared names, the bundle introduces a `var` for each anonymous
//! default export and each namespace object; those claim their names too.

use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::{
    graph::ModuleGraph,
    types::{ExternalId, FxIndexMap, ModuleId, StatementRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Module(ModuleId),
    /// The `var` an anonymous default export is declared as
    Default(ModuleId),
    /// The namespace object built for `import * as name`
    Namespace(ModuleId),
    External(ExternalId),
}

/// Rename top-level bindings so that no two owners share a name
pub fn deconflict(graph: &mut ModuleGraph, statements: &[StatementRef]) {
    let mut definers: FxIndexMap<String, Vec<Owner>> = FxIndexMap::default();
    let mut claim = |name: &str, owner: Owner| {
        let owners = definers.entry(name.to_owned()).or_default();
        if !owners.contains(&owner) {
            owners.push(owner);
        }
    };

    for module in graph.namespace_modules() {
        claim(&module.canonical_name("*", graph), Owner::Namespace(module.id));
    }
    for &at in statements {
        for name in &graph.statement(at).defines {
            claim(name, Owner::Module(at.module));
        }
        let module = graph.module(at.module);
        if module.anonymous_default() == Some(at.index) {
            claim(&module.anonymous_default_name(), Owner::Default(at.module));
        }
    }

    let externals: Vec<(ExternalId, String)> = graph
        .externals()
        .iter()
        .map(|external| (external.id, external.preferred_name()))
        .collect();
    for (id, name) in externals {
        graph.external_mut(id).rename(&name);
        claim(&name, Owner::External(id));
    }

    let mut taken: FxHashSet<String> = definers.keys().cloned().collect();
    for (name, owners) in &definers {
        let Some((keeper, renamed)) = owners.split_last() else {
            continue;
        };
        if renamed.is_empty() {
            continue;
        }

        info!(
            "Name conflict for '{name}' across {} owners, {} keeps it",
            owners.len(),
            describe(graph, *keeper)
        );
        for &owner in renamed {
            let replacement = safe_name(name, &taken);
            taken.insert(replacement.clone());
            debug!("Renaming {} '{name}' to '{replacement}'", describe(graph, owner));
            match owner {
                Owner::Module(id) => graph.module(id).rename(name, &replacement),
                Owner::Default(id) => graph.module(id).rename("default", &replacement),
                Owner::Namespace(id) => graph.module(id).rename("*", &replacement),
                Owner::External(id) => graph.external_mut(id).rename(&replacement),
            }
        }
    }
}

fn safe_name(name: &str, taken: &FxHashSet<String>) -> String {
    let mut candidate = format!("_{name}");
    while taken.contains(&candidate) {
        candidate.insert(0, '_');
    }
    candidate
}

fn describe(graph: &ModuleGraph, owner: Owner) -> String {
    match owner {
        Owner::Module(id) => graph.module(id).path.display().to_string(),
        Owner::Default(id) => format!("default export of {}", graph.module(id).path.display()),
        Owner::Namespace(id) => format!("namespace of {}", graph.module(id).path.display()),
        Owner::External(id) => format!("external '{}'", graph.external(id).specifier),
    }
}
