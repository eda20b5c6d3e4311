//! Semantic analysis for PanSQL scripts.
//!
//! # What this crate does
//!
//! 1. **Builds the symbol table** — `load`, `table`/`stream`, and `open`
//!    statements bind names (case-insensitively at the top level).
//! 2. **Resolves selects** — binds FROM/JOIN sources and every column
//!    reference to `(ordinal, field type)`, recorded in side tables keyed
//!    by expression id.
//! 3. **Enforces structure** — single use of streamed inputs, joins only
//!    against tables on their unique key, no ORDER BY over a stream.
//! 4. **Validates projections** — arity, destination-field resolution,
//!    assignability, and null coverage against the destination stream.
//! 5. **Links** — collects explicit and select-implied name maps,
//!    auto-maps unhandled source streams by name, and warns about
//!    streams that cannot be synchronized.
//!
//! The analyzer aborts on the first error. Warnings accumulate and are
//! returned alongside the analysis.

mod link;
mod resolve;
mod symbols;

pub use link::{link, Linkage};
pub use resolve::{
    analyze, AggKind, Analysis, ColumnBinding, ColumnOrigin, ColumnValue, InputBinding,
    OutputBinding, ResolvedAggregate, ResolvedColumn, ResolvedJoin, ResolvedMap, ResolvedSelect,
    ResolvedTable, SlotAssign, SyncEdge,
};
pub use symbols::{Symbol, SymbolTable};
