//! Transformer IR and code emission.
//!
//! The builder lowers each resolved select into a deterministic
//! per-stream transformer plan; the emitter renders the plans as a C#
//! program, a project manifest, and a connectors manifest. Emission is
//! byte-stable: identifier numbering, ordering, and whitespace are fixed
//! so golden-file comparison is exact.

mod build;
mod emit;
pub mod ir;

pub use build::build_program;
pub use emit::{emit_connectors, emit_program, emit_project};
