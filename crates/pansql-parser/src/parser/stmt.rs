//! Statement parsers (keyword-dispatched).

use super::{query, ParseError, TokenStream};
use pansql_ast::{
    AbortStmt, DeclKind, DeclStmt, Direction, FieldMapEntry, Ident, LoadStmt, MapStmt, OpenStmt,
    QualifiedName, SelectStmt, Statement, SyncStmt,
};
use pansql_lexer::Token;

/// Parse all statements from a token stream.
pub fn parse_statements(stream: &mut TokenStream) -> Result<Vec<Statement>, ParseError> {
    let mut statements = Vec::new();
    while !stream.at_end() {
        statements.push(parse_statement(stream)?);
    }
    Ok(statements)
}

/// Parse a single statement (keyword-dispatched).
fn parse_statement(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    match stream.peek() {
        Some(Token::Load) => parse_load(stream),
        Some(Token::Table) => parse_decl(stream, DeclKind::Table),
        Some(Token::Stream) => parse_decl(stream, DeclKind::Stream),
        Some(Token::Open) => parse_open(stream),
        Some(Token::Select) => parse_select(stream),
        Some(Token::Map) => parse_map(stream),
        Some(Token::Sync) => parse_sync(stream),
        Some(Token::Abort) => parse_abort(stream),
        other => Err(ParseError::unexpected_token(
            other,
            "at statement",
            stream.current_span(),
        )),
    }
}

/// Expect an identifier and return it with its span.
pub(super) fn expect_ident(stream: &mut TokenStream, context: &str) -> Result<Ident, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(name)) => Ok(Ident::new(name.clone(), span)),
        other => Err(ParseError::unexpected_token(other, context, span)),
    }
}

/// Expect a string literal.
fn expect_string(stream: &mut TokenStream, context: &str) -> Result<String, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::String(text)) => Ok(text.clone()),
        other => Err(ParseError::unexpected_token(other, context, span)),
    }
}

/// Parse `dict.item`.
fn parse_qualified_name(stream: &mut TokenStream) -> Result<QualifiedName, ParseError> {
    let dict = expect_ident(stream, "as dictionary name")?;
    stream.expect(Token::Dot)?;
    let item = expect_ident(stream, "as stream name")?;
    Ok(QualifiedName { dict, item })
}

/// `load <name> '<path>'`
fn parse_load(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Load)?;
    let name = expect_ident(stream, "as dictionary name")?;
    let path = expect_string(stream, "as dictionary file path")?;
    Ok(Statement::Load(LoadStmt {
        name,
        path,
        span: stream.span_from(start),
    }))
}

/// `table <name> as <dict>.<stream>` / `stream <name> as <dict>.<stream>`
fn parse_decl(stream: &mut TokenStream, kind: DeclKind) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    stream.advance(); // table | stream keyword
    let name = expect_ident(stream, "as variable name")?;
    stream.expect(Token::As)?;
    let source = parse_qualified_name(stream)?;
    Ok(Statement::Decl(DeclStmt {
        name,
        kind,
        source,
        span: stream.span_from(start),
    }))
}

/// `open <name> as <connector> for read|write with <dict>, '<connstr>'`
fn parse_open(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Open)?;
    let name = expect_ident(stream, "as endpoint name")?;
    stream.expect(Token::As)?;
    let connector = expect_ident(stream, "as connector name")?;
    stream.expect(Token::For)?;
    let direction = match stream.peek() {
        Some(Token::Read) => {
            stream.advance();
            Direction::Read
        }
        Some(Token::Write) => {
            stream.advance();
            Direction::Write
        }
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "after 'for' (expected 'read' or 'write')",
                stream.current_span(),
            ));
        }
    };
    stream.expect(Token::With)?;
    let dict = expect_ident(stream, "as dictionary name")?;
    stream.expect(Token::Comma)?;
    let conn_str = expect_string(stream, "as connection string")?;
    Ok(Statement::Open(OpenStmt {
        name,
        connector,
        direction,
        dict,
        conn_str,
        span: stream.span_from(start),
    }))
}

/// `select ... into <name>`
fn parse_select(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    let query = query::parse_query(stream)?;
    stream.expect(Token::Into)?;
    let into = expect_ident(stream, "as select target")?;
    Ok(Statement::Select(SelectStmt {
        query,
        into,
        span: stream.span_from(start),
    }))
}

/// `map <dict>.<stream> to <dict>.<stream> [with (dst = src, ...)]`
fn parse_map(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Map)?;
    let source = parse_qualified_name(stream)?;
    stream.expect(Token::To)?;
    let dest = parse_qualified_name(stream)?;

    let mut fields = Vec::new();
    if matches!(stream.peek(), Some(Token::With)) {
        stream.advance();
        stream.expect(Token::LParen)?;
        loop {
            let dest_field = expect_ident(stream, "as destination field name")?;
            stream.expect(Token::Eq)?;
            let source_field = expect_ident(stream, "as source field name")?;
            fields.push(FieldMapEntry {
                dest: dest_field,
                source: source_field,
            });
            if matches!(stream.peek(), Some(Token::Comma)) {
                stream.advance();
            } else {
                break;
            }
        }
        stream.expect(Token::RParen)?;
    }

    Ok(Statement::Map(MapStmt {
        source,
        dest,
        fields,
        span: stream.span_from(start),
    }))
}

/// `sync <reader> to <writer>`
fn parse_sync(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Sync)?;
    let reader = expect_ident(stream, "as reader endpoint")?;
    stream.expect(Token::To)?;
    let writer = expect_ident(stream, "as writer endpoint")?;
    Ok(Statement::Sync(SyncStmt {
        reader,
        writer,
        span: stream.span_from(start),
    }))
}

/// `abort '<message>'`
fn parse_abort(stream: &mut TokenStream) -> Result<Statement, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Abort)?;
    let message = expect_string(stream, "as abort message")?;
    Ok(Statement::Abort(AbortStmt {
        message,
        span: stream.span_from(start),
    }))
}
