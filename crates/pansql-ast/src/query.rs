//! SQL query trees embedded in `select` statements.
//!
//! Expressions carry an [`ExprId`] assigned during parsing; the analyzer
//! records per-node annotations (column bindings) in side tables keyed by
//! it rather than mutating the tree.

use crate::foundation::Span;
use crate::statement::Ident;
use std::fmt;

/// Identity of an expression node within one script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// Binary operators of the SQL subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}

impl BinaryOp {
    /// Whether this operator compares values (vs. arithmetic or logic).
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A possibly-qualified column reference (`u.name`, `Vendor`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: Option<Ident>,
    pub column: Ident,
}

impl ColumnRef {
    pub fn span(&self) -> Span {
        match &self.qualifier {
            Some(q) => q.span.merge(&self.column.span),
            None => self.column.span,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression variants of the SQL subset.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Column(ColumnRef),
    Int(i64),
    /// Decimal literal in source form, so emission is byte-stable.
    Decimal(String),
    Str(String),
    Null,
    /// `*`; legal only as the sole argument of `count`.
    Star,
    /// Function call — in this subset, always an aggregate.
    Call { func: Ident, args: Vec<Expr> },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// The column reference, if this node is one.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match &self.kind {
            ExprKind::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this expression contains an aggregate call.
    pub fn contains_call(&self) -> bool {
        match &self.kind {
            ExprKind::Call { .. } => true,
            ExprKind::Unary { operand, .. } => operand.contains_call(),
            ExprKind::Binary { left, right, .. } => left.contains_call() || right.contains_call(),
            _ => false,
        }
    }
}

/// One projected column: expression plus optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<Ident>,
}

impl SelectColumn {
    /// The output name of this column: its alias, or the referenced
    /// column's name.
    pub fn output_name(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(&alias.text);
        }
        self.expr.as_column().map(|c| c.column.text.as_str())
    }
}

/// The `FROM` clause: a declared variable plus optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    pub name: Ident,
    pub alias: Option<Ident>,
}

impl SourceRef {
    /// The name that qualifies columns of this source.
    pub fn binding_name(&self) -> &Ident {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

/// `JOIN tbl alias ON left = right`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: Ident,
    pub alias: Ident,
    pub left: ColumnRef,
    pub right: ColumnRef,
    pub span: Span,
}

/// A parsed `select` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub columns: Vec<SelectColumn>,
    pub from: SourceRef,
    pub join: Option<JoinClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<ColumnRef>,
    pub having: Option<Expr>,
    pub order_by: Vec<ColumnRef>,
    pub span: Span,
}
