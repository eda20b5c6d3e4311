//! `select` body parser.

use super::stmt::expect_ident;
use super::{expr, ParseError, TokenStream};
use pansql_ast::{ColumnRef, JoinClause, Query, SelectColumn, SourceRef};
use pansql_lexer::Token;

/// Parse a `select` body up to (but not including) `into`.
pub fn parse_query(stream: &mut TokenStream) -> Result<Query, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Select)?;

    let columns = parse_select_columns(stream)?;
    stream.expect(Token::From)?;

    let name = expect_ident(stream, "as select source")?;
    let alias = match stream.peek() {
        Some(Token::Ident(_)) => Some(expect_ident(stream, "as source alias")?),
        _ => None,
    };
    let from = SourceRef { name, alias };

    let join = if matches!(stream.peek(), Some(Token::Join)) {
        Some(parse_join(stream)?)
    } else {
        None
    };

    let where_clause = if matches!(stream.peek(), Some(Token::Where)) {
        stream.advance();
        Some(expr::parse_expr(stream)?)
    } else {
        None
    };

    let group_by = if matches!(stream.peek(), Some(Token::Group)) {
        stream.advance();
        stream.expect(Token::By)?;
        parse_column_list(stream)?
    } else {
        Vec::new()
    };

    let having = if matches!(stream.peek(), Some(Token::Having)) {
        stream.advance();
        Some(expr::parse_expr(stream)?)
    } else {
        None
    };

    let order_by = if matches!(stream.peek(), Some(Token::Order)) {
        stream.advance();
        stream.expect(Token::By)?;
        parse_column_list(stream)?
    } else {
        Vec::new()
    };

    Ok(Query {
        columns,
        from,
        join,
        where_clause,
        group_by,
        having,
        order_by,
        span: stream.span_from(start),
    })
}

/// Parse the projection list: `expr [as alias | alias], ...`
fn parse_select_columns(stream: &mut TokenStream) -> Result<Vec<SelectColumn>, ParseError> {
    let mut columns = Vec::new();
    loop {
        let e = expr::parse_expr(stream)?;
        let alias = match stream.peek() {
            Some(Token::As) => {
                stream.advance();
                Some(expect_ident(stream, "as column alias")?)
            }
            // Bare alias: `p.Vendor VendorID`
            Some(Token::Ident(_)) => Some(expect_ident(stream, "as column alias")?),
            _ => None,
        };
        columns.push(SelectColumn { expr: e, alias });
        if matches!(stream.peek(), Some(Token::Comma)) {
            stream.advance();
        } else {
            break;
        }
    }
    Ok(columns)
}

/// Parse `join <table> <alias> on <col> = <col>`.
fn parse_join(stream: &mut TokenStream) -> Result<JoinClause, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Join)?;
    let table = expect_ident(stream, "as join table")?;
    let alias = expect_ident(stream, "as join table alias")?;
    stream.expect(Token::On)?;
    let left = parse_column_ref(stream)?;
    stream.expect(Token::Eq)?;
    let right = parse_column_ref(stream)?;
    Ok(JoinClause {
        table,
        alias,
        left,
        right,
        span: stream.span_from(start),
    })
}

/// Parse a comma-separated list of column references.
fn parse_column_list(stream: &mut TokenStream) -> Result<Vec<ColumnRef>, ParseError> {
    let mut columns = vec![parse_column_ref(stream)?];
    while matches!(stream.peek(), Some(Token::Comma)) {
        stream.advance();
        columns.push(parse_column_ref(stream)?);
    }
    Ok(columns)
}

/// Parse `col` or `alias.col`.
pub(super) fn parse_column_ref(stream: &mut TokenStream) -> Result<ColumnRef, ParseError> {
    let first = expect_ident(stream, "as column reference")?;
    if matches!(stream.peek(), Some(Token::Dot)) {
        stream.advance();
        let column = expect_ident(stream, "as column name")?;
        Ok(ColumnRef {
            qualifier: Some(first),
            column,
        })
    } else {
        Ok(ColumnRef {
            qualifier: None,
            column: first,
        })
    }
}
