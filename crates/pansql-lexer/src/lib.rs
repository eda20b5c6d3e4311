// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for PanSQL scripts.
//!
//! Tokenization uses logos. Keywords are matched case-insensitively;
//! identifiers preserve their spelling. Comments (`--` to end of line and
//! `/* ... */` blocks) are stripped during lexing.
//!
//! The [`lex`] entry point pairs every token with its byte range and turns
//! lexer failures into positioned [`LexError`]s, distinguishing
//! unterminated strings and block comments from stray characters.

use logos::Logos;
use std::fmt;

/// PanSQL token.
///
/// Covers the DSL statement keywords, the SQL subset keywords, operators,
/// delimiters, and literals. Keywords match in any ASCII case.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"--[^\n]*")] // Skip -- comments
#[logos(skip r"/\*([^*]|\*[^/])*\*/")] // Skip /* */ comments
pub enum Token {
    // === Statement keywords ===
    #[token("load", ignore(ascii_case))]
    Load,
    #[token("table", ignore(ascii_case))]
    Table,
    #[token("stream", ignore(ascii_case))]
    Stream,
    #[token("open", ignore(ascii_case))]
    Open,
    #[token("as", ignore(ascii_case))]
    As,
    #[token("for", ignore(ascii_case))]
    For,
    #[token("read", ignore(ascii_case))]
    Read,
    #[token("write", ignore(ascii_case))]
    Write,
    #[token("with", ignore(ascii_case))]
    With,
    #[token("map", ignore(ascii_case))]
    Map,
    #[token("to", ignore(ascii_case))]
    To,
    #[token("sync", ignore(ascii_case))]
    Sync,
    #[token("abort", ignore(ascii_case))]
    Abort,

    // === SQL keywords ===
    #[token("select", ignore(ascii_case))]
    Select,
    #[token("from", ignore(ascii_case))]
    From,
    #[token("join", ignore(ascii_case))]
    Join,
    #[token("on", ignore(ascii_case))]
    On,
    #[token("where", ignore(ascii_case))]
    Where,
    #[token("group", ignore(ascii_case))]
    Group,
    #[token("by", ignore(ascii_case))]
    By,
    #[token("having", ignore(ascii_case))]
    Having,
    #[token("order", ignore(ascii_case))]
    Order,
    #[token("into", ignore(ascii_case))]
    Into,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("not", ignore(ascii_case))]
    Not,
    #[token("null", ignore(ascii_case))]
    Null,

    // === Operators ===
    #[token("=")]
    Eq,
    #[token("<>")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // === Literals ===
    /// Integer literal.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    /// Decimal literal, kept in source form so emission is byte-stable.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().to_owned())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().to_owned())]
    Decimal(String),

    /// Single-quoted string literal; `''` escapes a quote.
    ///
    /// Priority beats the unterminated-string pattern when both accept
    /// the same length (the empty literal `''`).
    #[regex(r"'([^']|'')*'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].replace("''", "'")
    }, priority = 10)]
    String(String),

    /// Identifier. Dotted qualification (`u.name`) is parsed, not lexed.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    // === Error forms ===
    // A complete string or block comment is a longer match and wins, so
    // these only fire when the closing delimiter is missing. `lex` turns
    // them into LexErrors; they never reach the parser.
    #[regex(r"'([^']|'')*")]
    UnterminatedString,
    #[regex(r"/\*([^*]|\*[^/])*\**")]
    UnterminatedComment,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Decimal(d) => write!(f, "{}", d),
            Token::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::Ident(id) => write!(f, "{}", id),
            Token::Load => write!(f, "load"),
            Token::Table => write!(f, "table"),
            Token::Stream => write!(f, "stream"),
            Token::Open => write!(f, "open"),
            Token::As => write!(f, "as"),
            Token::For => write!(f, "for"),
            Token::Read => write!(f, "read"),
            Token::Write => write!(f, "write"),
            Token::With => write!(f, "with"),
            Token::Map => write!(f, "map"),
            Token::To => write!(f, "to"),
            Token::Sync => write!(f, "sync"),
            Token::Abort => write!(f, "abort"),
            Token::Select => write!(f, "select"),
            Token::From => write!(f, "from"),
            Token::Join => write!(f, "join"),
            Token::On => write!(f, "on"),
            Token::Where => write!(f, "where"),
            Token::Group => write!(f, "group"),
            Token::By => write!(f, "by"),
            Token::Having => write!(f, "having"),
            Token::Order => write!(f, "order"),
            Token::Into => write!(f, "into"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Null => write!(f, "null"),
            Token::Eq => write!(f, "="),
            Token::Ne => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::UnterminatedString => write!(f, "<unterminated string>"),
            Token::UnterminatedComment => write!(f, "<unterminated comment>"),
        }
    }
}

/// Tokenization failure with 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.message, self.line, self.col)
    }
}

impl std::error::Error for LexError {}

/// Tokenize a script, pairing each token with its byte range.
///
/// Fails on the first unrecognized input, reporting unterminated strings
/// and block comments specifically.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let message = match result {
            Ok(Token::UnterminatedString) => "unterminated string literal".to_string(),
            Ok(Token::UnterminatedComment) => "unterminated block comment".to_string(),
            Ok(token) => {
                tokens.push((token, span));
                continue;
            }
            Err(()) => {
                let ch = source[span.start..].chars().next().unwrap_or('\0');
                format!("unexpected character '{}'", ch)
            }
        };
        let (line, col) = line_col(source, span.start);
        return Err(LexError { line, col, message });
    }
    Ok(tokens)
}

/// Compute the 1-based (line, column) of a byte offset.
fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 1;
    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
