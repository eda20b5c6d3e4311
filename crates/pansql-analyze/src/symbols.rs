//! Symbol table for top-level script names.
//!
//! Top-level identifiers (dictionaries, stream variables, endpoints)
//! resolve case-insensitively; the declared spelling is preserved for
//! messages and emission. Stream and field names inside dictionaries stay
//! case-sensitive and are resolved elsewhere.

use indexmap::IndexMap;
use pansql_ast::{DeclKind, Direction, Ident};

/// What a top-level name is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A loaded dictionary (index into the analysis dictionary list).
    Dict { index: usize },
    /// A `table`/`stream` declaration.
    StreamVar {
        kind: DeclKind,
        /// Origin dictionary index
        dict: usize,
        /// Exact stream name within the dictionary
        stream_name: String,
        /// For `table` declarations, index into the resolved table list
        table: Option<usize>,
    },
    /// An `open` endpoint.
    Endpoint {
        direction: Direction,
        connector: String,
        dict: usize,
        conn_str: String,
    },
}

/// One binding: declared spelling plus the symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    pub symbol: Symbol,
}

/// Case-insensitive map from identifier to symbol.
///
/// Iteration order is insertion order, which keeps every downstream
/// traversal deterministic.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: IndexMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name. Returns false if the name (case-folded) is taken.
    pub fn insert(&mut self, ident: &Ident, symbol: Symbol) -> bool {
        let key = ident.key();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            SymbolEntry {
                name: ident.text.clone(),
                symbol,
            },
        );
        true
    }

    /// Look up a name case-insensitively.
    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    /// Mutable lookup, for marking tables used during join resolution.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SymbolEntry> {
        self.entries.get_mut(&name.to_ascii_lowercase())
    }

    /// All entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.values()
    }
}
