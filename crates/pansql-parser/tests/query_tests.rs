//! `select` body parser tests.

use pansql_ast::{BinaryOp, ExprKind, Statement, UnaryOp};
use pansql_parser::{lex, parse_script};

fn parse_select(source: &str) -> pansql_ast::SelectStmt {
    let tokens = lex(source).expect("lexing failed");
    let script = parse_script("test.pansql", &tokens, 0).expect("parse should succeed");
    match script.statements.into_iter().next() {
        Some(Statement::Select(select)) => select,
        other => panic!("expected select, got {:?}", other),
    }
}

#[test]
fn test_simple_projection() {
    let select = parse_select("select p.Id, p.Name from products p into products2");
    assert_eq!(select.query.columns.len(), 2);
    assert_eq!(select.into.text, "products2");
    assert_eq!(select.query.from.name.text, "products");
    assert_eq!(select.query.from.alias.as_ref().unwrap().text, "p");

    let col = select.query.columns[0].expr.as_column().unwrap();
    assert_eq!(col.qualifier.as_ref().unwrap().text, "p");
    assert_eq!(col.column.text, "Id");
}

#[test]
fn test_as_alias_and_bare_alias() {
    let select = parse_select("select p.Vendor VendorID, t.name as type from products p into x");
    assert_eq!(
        select.query.columns[0].alias.as_ref().unwrap().text,
        "VendorID"
    );
    assert_eq!(select.query.columns[1].alias.as_ref().unwrap().text, "type");
}

#[test]
fn test_join_clause() {
    let select =
        parse_select("select u.id from users u join types t on u.typeId = t.Id into users2");
    let join = select.query.join.expect("join should be present");
    assert_eq!(join.table.text, "types");
    assert_eq!(join.alias.text, "t");
    assert_eq!(join.left.qualifier.as_ref().unwrap().text, "u");
    assert_eq!(join.left.column.text, "typeId");
    assert_eq!(join.right.column.text, "Id");
}

#[test]
fn test_where_comparison() {
    let select = parse_select("select p.Id from products p where p.Vendor = 1 into x");
    let pred = select.query.where_clause.expect("where should be present");
    match pred.kind {
        ExprKind::Binary { op, left, right } => {
            assert_eq!(op, BinaryOp::Eq);
            assert!(left.as_column().is_some());
            assert!(matches!(right.kind, ExprKind::Int(1)));
        }
        other => panic!("expected comparison, got {:?}", other),
    }
}

#[test]
fn test_and_or_precedence() {
    // a = 1 or b = 2 and c = 3  parses as  a = 1 or (b = 2 and c = 3)
    let select = parse_select("select p.Id from products p where a = 1 or b = 2 and c = 3 into x");
    let pred = select.query.where_clause.unwrap();
    match pred.kind {
        ExprKind::Binary { op, right, .. } => {
            assert_eq!(op, BinaryOp::Or);
            assert!(matches!(
                right.kind,
                ExprKind::Binary {
                    op: BinaryOp::And,
                    ..
                }
            ));
        }
        other => panic!("expected or at root, got {:?}", other),
    }
}

#[test]
fn test_not_binds_looser_than_comparison() {
    let select = parse_select("select p.Id from products p where not a = 1 into x");
    let pred = select.query.where_clause.unwrap();
    match pred.kind {
        ExprKind::Unary { op, operand } => {
            assert_eq!(op, UnaryOp::Not);
            assert!(matches!(
                operand.kind,
                ExprKind::Binary {
                    op: BinaryOp::Eq,
                    ..
                }
            ));
        }
        other => panic!("expected not at root, got {:?}", other),
    }
}

#[test]
fn test_group_by_and_having() {
    let select = parse_select(
        "select p.Vendor, max(p.Price) as MaxPrice from products p \
         group by Vendor having count(*) > 5 into x",
    );
    assert_eq!(select.query.group_by.len(), 1);
    assert_eq!(select.query.group_by[0].column.text, "Vendor");

    let having = select.query.having.expect("having should be present");
    match having.kind {
        ExprKind::Binary { op, left, .. } => {
            assert_eq!(op, BinaryOp::Gt);
            match &left.kind {
                ExprKind::Call { func, args } => {
                    assert_eq!(func.text, "count");
                    assert!(matches!(args[0].kind, ExprKind::Star));
                }
                other => panic!("expected count(*), got {:?}", other),
            }
        }
        other => panic!("expected comparison, got {:?}", other),
    }
}

#[test]
fn test_aggregate_calls() {
    let select = parse_select(
        "select p.Vendor, max(p.Price), count(p.Price) from products p group by Vendor into x",
    );
    match &select.query.columns[1].expr.kind {
        ExprKind::Call { func, args } => {
            assert_eq!(func.text, "max");
            assert_eq!(args.len(), 1);
            assert!(args[0].as_column().is_some());
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_literal_projection() {
    let select = parse_select("select p.Vendor, 10 Quantity, 'fixed' as Label from products p into x");
    assert!(matches!(select.query.columns[1].expr.kind, ExprKind::Int(10)));
    assert_eq!(select.query.columns[1].alias.as_ref().unwrap().text, "Quantity");
    assert!(matches!(
        select.query.columns[2].expr.kind,
        ExprKind::Str(ref s) if s == "fixed"
    ));
}

#[test]
fn test_null_literal() {
    let select = parse_select("select null as Empty from products p into x");
    assert!(matches!(select.query.columns[0].expr.kind, ExprKind::Null));
}

#[test]
fn test_order_by() {
    let select = parse_select("select p.Id from products p order by p.Vendor, p.Id into x");
    assert_eq!(select.query.order_by.len(), 2);
    assert_eq!(select.query.order_by[0].column.text, "Vendor");
}

#[test]
fn test_arithmetic_in_projection() {
    let select = parse_select("select p.Price * 2 as Doubled from products p into x");
    match &select.query.columns[0].expr.kind {
        ExprKind::Binary { op, .. } => assert_eq!(*op, BinaryOp::Mul),
        other => panic!("expected multiplication, got {:?}", other),
    }
}
