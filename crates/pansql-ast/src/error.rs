//! Shared compile-error type.
//!
//! Every pass after parsing reports failures through [`CompilerError`]: a
//! single kind carrying a human-readable message and an optional source
//! span. Compilation aborts on the first one raised.

use crate::foundation::Span;

/// Fatal compilation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CompilerError {
    pub message: String,
    pub span: Option<Span>,
}

impl CompilerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}
