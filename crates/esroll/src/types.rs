//! Shared type definitions for the esroll crate
//!
//! Identifiers used across the graph, the expansion pass and the assembler.
//! They are plain indexes into the arenas owned by [`crate::graph::ModuleGraph`].

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Unique identifier for a project-local module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for an external (not project-local) module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalId(u32);

impl ExternalId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an import specifier resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleRef {
    Internal(ModuleId),
    External(ExternalId),
}

/// A top-level statement, addressed by its owning module and body index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementRef {
    pub module: ModuleId,
    pub index: usize,
}

impl StatementRef {
    pub const fn new(module: ModuleId, index: usize) -> Self {
        Self { module, index }
    }
}
