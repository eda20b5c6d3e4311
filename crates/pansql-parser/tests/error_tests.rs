//! Parser error handling tests.

use pansql_parser::{lex, parse_script, ParseError};

/// Helper to verify that parsing fails.
fn expect_error(source: &str) -> ParseError {
    let tokens = lex(source).expect("lexing should succeed");
    match parse_script("test.pansql", &tokens, 0) {
        Ok(_) => panic!("expected parse error, but parsing succeeded"),
        Err(err) => err,
    }
}

#[test]
fn test_unknown_statement_keyword() {
    let err = expect_error("frobnicate users");
    assert!(err.message.contains("at statement"), "got: {}", err.message);
}

#[test]
fn test_select_without_into() {
    let err = expect_error("select p.Id from products p");
    assert!(err.message.contains("into"), "got: {}", err.message);
}

#[test]
fn test_select_without_from() {
    let err = expect_error("select p.Id into x");
    assert!(err.message.contains("from"), "got: {}", err.message);
}

#[test]
fn test_open_with_bad_direction() {
    let err = expect_error("open r as MSSQL for sideways with d, 'c'");
    assert!(
        err.message.contains("read") || err.message.contains("write"),
        "got: {}",
        err.message
    );
}

#[test]
fn test_truncated_statement() {
    let err = expect_error("sync myReader to");
    assert!(
        err.message.contains("end of input"),
        "got: {}",
        err.message
    );
}

#[test]
fn test_unclosed_paren_in_predicate() {
    let err = expect_error("select p.Id from products p where (a = 1 into x");
    assert!(err.message.contains("expected ')'"), "got: {}", err.message);
}

#[test]
fn test_bare_star_outside_count() {
    let err = expect_error("select * from products p into x");
    assert!(
        err.message.contains("count(*)"),
        "got: {}",
        err.message
    );
}

#[test]
fn test_map_missing_to() {
    let err = expect_error("map a.S b.T");
    assert!(err.message.contains("'to'"), "got: {}", err.message);
}

#[test]
fn test_error_spans_point_into_source() {
    let source = "sync myReader myWriter";
    let err = expect_error(source);
    assert!((err.span.start as usize) < source.len());
}
