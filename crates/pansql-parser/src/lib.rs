//! Hand-written recursive descent parser for PanSQL.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead and expression-id
//!   allocation
//! - `error`: ParseError
//! - `stmt`: statement parsers (keyword-dispatched)
//! - `query`: `select` body parser
//! - `expr`: predicate/expression parser using Pratt parsing

pub mod parser;

pub use parser::{parse_script, ParseError};

// Re-export lexer
pub use pansql_lexer::{lex, LexError, Token};
