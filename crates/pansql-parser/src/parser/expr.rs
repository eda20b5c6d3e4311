//! Predicate and projection expression parser (Pratt).

use super::{query, ParseError, TokenStream};
use pansql_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use pansql_lexer::Token;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
}

/// Precedence of `NOT`: binds looser than comparisons, tighter than `AND`,
/// so `not a = 1` reads as `not (a = 1)`.
const NOT_PRECEDENCE: u8 = 25;

/// Get binary operator metadata (precedence, associativity, operator).
///
/// Higher precedence = tighter binding. Single source of truth for binary
/// operator parsing.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Or => Some((10, Assoc::Left, BinaryOp::Or)),
        Token::And => Some((20, Assoc::Left, BinaryOp::And)),
        Token::Eq => Some((30, Assoc::Left, BinaryOp::Eq)),
        Token::Ne => Some((30, Assoc::Left, BinaryOp::Ne)),
        Token::Lt => Some((30, Assoc::Left, BinaryOp::Lt)),
        Token::Le => Some((30, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((30, Assoc::Left, BinaryOp::Gt)),
        Token::Ge => Some((30, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((40, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((40, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((50, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((50, Assoc::Left, BinaryOp::Div)),
        _ => None,
    }
}

/// Parse an expression.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_pratt(stream, 0)
}

/// Pratt parser: binary operators with precedence climbing.
fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        if let Some((prec, assoc, op)) = binary_op_info(token) {
            if prec < min_prec {
                break;
            }
            let span_start = stream.current_pos();
            stream.advance();

            let next_prec = match assoc {
                Assoc::Left => prec + 1,
            };
            let right = parse_pratt(stream, next_prec)?;

            let span = left.span.merge(&stream.span_from(span_start));
            left = Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse prefix expressions (unary operators, atoms).
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus) => {
            let start = stream.current_pos();
            stream.advance();
            let operand = parse_prefix(stream)?;
            let span = stream.span_from(start);
            Ok(Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                span,
            })
        }
        Some(Token::Not) => {
            let start = stream.current_pos();
            stream.advance();
            let operand = parse_pratt(stream, NOT_PRECEDENCE)?;
            let span = stream.span_from(start);
            Ok(Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            })
        }
        _ => parse_atom(stream),
    }
}

/// Parse atomic expressions: literals, column references, aggregate
/// calls, parenthesized expressions.
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    match stream.peek() {
        Some(Token::Integer(_)) => {
            let span = stream.current_span();
            let value = match stream.advance() {
                Some(Token::Integer(n)) => *n,
                other => return Err(ParseError::unexpected_token(other, "integer literal", span)),
            };
            Ok(Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Int(value),
                span: stream.span_from(start),
            })
        }
        Some(Token::Decimal(_)) => {
            let span = stream.current_span();
            let text = match stream.advance() {
                Some(Token::Decimal(d)) => d.clone(),
                other => return Err(ParseError::unexpected_token(other, "decimal literal", span)),
            };
            Ok(Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Decimal(text),
                span: stream.span_from(start),
            })
        }
        Some(Token::String(_)) => {
            let span = stream.current_span();
            let text = match stream.advance() {
                Some(Token::String(s)) => s.clone(),
                other => return Err(ParseError::unexpected_token(other, "string literal", span)),
            };
            Ok(Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Str(text),
                span: stream.span_from(start),
            })
        }
        Some(Token::Null) => {
            stream.advance();
            Ok(Expr {
                id: stream.fresh_id(),
                kind: ExprKind::Null,
                span: stream.span_from(start),
            })
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::Ident(_)) => {
            // Aggregate call if followed by '(' without an intervening dot.
            if matches!(stream.peek_nth(1), Some(Token::LParen)) {
                parse_call(stream)
            } else {
                let column = query::parse_column_ref(stream)?;
                Ok(Expr {
                    id: stream.fresh_id(),
                    kind: ExprKind::Column(column),
                    span: stream.span_from(start),
                })
            }
        }
        Some(Token::Star) => Err(ParseError::invalid_syntax(
            "'*' is only valid inside count(*)",
            stream.current_span(),
        )),
        other => Err(ParseError::unexpected_token(
            other,
            "in expression",
            stream.current_span(),
        )),
    }
}

/// Parse `func(arg, ...)`; `*` is accepted only as the sole argument.
fn parse_call(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let func = super::stmt::expect_ident(stream, "as function name")?;
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    if matches!(stream.peek(), Some(Token::Star)) {
        let star_start = stream.current_pos();
        stream.advance();
        args.push(Expr {
            id: stream.fresh_id(),
            kind: ExprKind::Star,
            span: stream.span_from(star_start),
        });
    } else {
        while !matches!(stream.peek(), Some(Token::RParen)) {
            args.push(parse_expr(stream)?);
            if matches!(stream.peek(), Some(Token::RParen)) {
                break;
            }
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(Expr {
        id: stream.fresh_id(),
        kind: ExprKind::Call { func, args },
        span: stream.span_from(start),
    })
}
