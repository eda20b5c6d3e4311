//! Parser entry points.

mod error;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

mod expr;
mod query;
mod stmt;

use pansql_ast::Script;
use pansql_lexer::Token;
use std::ops::Range;

/// Parse a tokenized script into its statement list.
///
/// `file_id` tags every produced span so errors from a multi-script
/// compilation resolve to the right file. Stops at the first syntax
/// error.
pub fn parse_script(
    name: &str,
    tokens: &[(Token, Range<usize>)],
    file_id: u16,
) -> Result<Script, ParseError> {
    let mut stream = TokenStream::new(tokens, file_id);
    let statements = stmt::parse_statements(&mut stream)?;
    Ok(Script {
        name: name.to_string(),
        statements,
    })
}
