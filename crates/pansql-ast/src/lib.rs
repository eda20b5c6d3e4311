//! Syntax tree for PanSQL scripts.
//!
//! The parser builds these trees; every later pass consumes them
//! read-only. Pass-specific annotations (resolved symbols, inferred
//! types) live in side tables keyed by [`ExprId`], keeping the tree
//! immutable after parse.

pub mod error;
pub mod foundation;
mod query;
mod statement;

pub use error::CompilerError;
pub use query::{
    BinaryOp, ColumnRef, Expr, ExprId, ExprKind, JoinClause, Query, SelectColumn, SourceRef,
    UnaryOp,
};
pub use statement::{
    AbortStmt, DeclKind, DeclStmt, Direction, FieldMapEntry, Ident, LoadStmt, MapStmt, OpenStmt,
    QualifiedName, Script, SelectStmt, Statement, SyncStmt,
};
