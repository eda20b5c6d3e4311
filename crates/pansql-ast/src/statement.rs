//! Top-level statement forms.
//!
//! A script is an ordered list of statements. Statements form a closed
//! variant tree; passes dispatch with exhaustive matches.

use crate::foundation::Span;
use crate::query::Query;
use std::fmt;

/// An identifier with its source location and declared spelling.
///
/// Top-level identifiers resolve case-insensitively; the spelling is kept
/// for messages and emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    /// The case-folded form used as a symbol-table key.
    pub fn key(&self) -> String {
        self.text.to_ascii_lowercase()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A `dict.item` reference (declaration targets, map endpoints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub dict: Ident,
    pub item: Ident,
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dict, self.item)
    }
}

/// Whether a declared variable is materialized in memory or streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Table,
    Stream,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Table => write!(f, "TABLE"),
            DeclKind::Stream => write!(f, "STREAM"),
        }
    }
}

/// Endpoint direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// `load <name> '<path>'` — bind a dictionary file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadStmt {
    pub name: Ident,
    pub path: String,
    pub span: Span,
}

/// `stream <name> as <dict>.<stream>` / `table <name> as <dict>.<stream>`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclStmt {
    pub name: Ident,
    pub kind: DeclKind,
    pub source: QualifiedName,
    pub span: Span,
}

/// `open <name> as <connector> for read|write with <dict>, '<connstr>'`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStmt {
    pub name: Ident,
    pub connector: Ident,
    pub direction: Direction,
    pub dict: Ident,
    pub conn_str: String,
    pub span: Span,
}

/// `select ... into <name>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub query: Query,
    pub into: Ident,
    pub span: Span,
}

/// One `dst = src` entry of a map field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapEntry {
    pub dest: Ident,
    pub source: Ident,
}

/// `map <dict>.<stream> to <dict>.<stream> [with (dst = src, ...)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStmt {
    pub source: QualifiedName,
    pub dest: QualifiedName,
    pub fields: Vec<FieldMapEntry>,
    pub span: Span,
}

/// `sync <reader> to <writer>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStmt {
    pub reader: Ident,
    pub writer: Ident,
    pub span: Span,
}

/// `abort '<message>'` — fail compilation with the given message.
#[derive(Debug, Clone, PartialEq)]
pub struct AbortStmt {
    pub message: String,
    pub span: Span,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Load(LoadStmt),
    Decl(DeclStmt),
    Open(OpenStmt),
    Select(SelectStmt),
    Map(MapStmt),
    Sync(SyncStmt),
    Abort(AbortStmt),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Load(s) => s.span,
            Statement::Decl(s) => s.span,
            Statement::Open(s) => s.span,
            Statement::Select(s) => s.span,
            Statement::Map(s) => s.span,
            Statement::Sync(s) => s.span,
            Statement::Abort(s) => s.span,
        }
    }
}

/// A parsed script: its display name plus ordered statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub name: String,
    pub statements: Vec<Statement>,
}
