//! Lowering from resolved selects to transformer IR.
//!
//! Determinism rules: slot emission order is syntactic, aggregators keep
//! their declaration numbering, table loaders and row transformers are
//! sequenced by statement order, and constant slots join the hoist set.

use crate::ir::{
    AggPart, AggregationIr, AggregatorIr, ColumnAccess, InputIr, JoinIr, JoinPolicy, Literal,
    OpenIr, PredExpr, ProgramIr, RowPlan, Slot, SyncIr, TableFieldIr, TableIr, TransformerIr,
    TransformerKind,
};
use indexmap::IndexMap;
use pansql_analyze::{
    Analysis, ColumnBinding, ColumnOrigin, ColumnValue, Linkage, ResolvedSelect, SlotAssign,
    Symbol,
};
use pansql_ast::{CompilerError, Expr, ExprKind};

/// Build the whole-script program IR from a completed analysis.
pub fn build_program(
    script_name: &str,
    analysis: &Analysis,
    linkage: &Linkage,
) -> Result<ProgramIr, CompilerError> {
    let tables = build_tables(analysis)?;

    // Table loaders and row transformers interleave in statement order.
    let mut sequence: Vec<(usize, TransformerIr)> = Vec::new();
    for (index, table) in analysis.tables.iter().enumerate() {
        if !table.used {
            continue;
        }
        let input_stream = qualified_stream(analysis, table.dict, &table.stream_name);
        sequence.push((
            table.decl_index,
            TransformerIr {
                input_stream,
                output_stream: None,
                kind: TransformerKind::TableLoad { table: index },
            },
        ));
    }
    for select in &analysis.selects {
        sequence.push((select.stmt_index, lower_select(analysis, select)?));
    }
    sequence.sort_by_key(|(index, _)| *index);
    let transformers = sequence.into_iter().map(|(_, t)| t).collect();

    // Endpoints in declaration order; the sync edge indexes into them.
    let mut opens = Vec::new();
    let mut open_keys = Vec::new();
    let mut connectors: IndexMap<String, String> = IndexMap::new();
    for entry in analysis.symbols.iter() {
        if let Symbol::Endpoint {
            direction,
            connector,
            conn_str,
            ..
        } = &entry.symbol
        {
            opens.push(OpenIr {
                var_name: entry.name.clone(),
                connector: connector.clone(),
                direction: *direction,
                conn_str: conn_str.clone(),
                dict_file: None,
            });
            open_keys.push(entry.name.to_ascii_lowercase());
            connectors
                .entry(connector.to_ascii_lowercase())
                .or_insert_with(|| connector.clone());
        }
    }
    let reader = open_keys
        .iter()
        .position(|key| *key == analysis.sync.reader)
        .ok_or_else(|| CompilerError::new("internal error: sync reader endpoint not found"))?;
    let writer = open_keys
        .iter()
        .position(|key| *key == analysis.sync.writer)
        .ok_or_else(|| CompilerError::new("internal error: sync writer endpoint not found"))?;

    let (source_dict, dest_dict) = sync_dictionaries(analysis)?;

    Ok(ProgramIr {
        script_name: script_name.to_string(),
        tables,
        transformers,
        name_maps: linkage.name_maps.clone(),
        auto_maps: linkage.auto_maps.clone(),
        opens,
        sync: SyncIr { reader, writer },
        source_dict,
        dest_dict,
        connectors: connectors.into_values().collect(),
    })
}

fn build_tables(analysis: &Analysis) -> Result<Vec<TableIr>, CompilerError> {
    let mut tables = Vec::new();
    for table in &analysis.tables {
        let stream = analysis.dictionaries[table.dict]
            .stream(&table.stream_name)
            .ok_or_else(|| {
                CompilerError::new(format!(
                    "internal error: table stream '{}' not found",
                    table.stream_name
                ))
            })?;
        let key = match table.key_ordinal {
            Some(key) => key,
            None if table.used => {
                return Err(CompilerError::new(format!(
                    "table '{}' does not have a single-field primary key",
                    table.var_name
                )));
            }
            None => 0,
        };
        tables.push(TableIr {
            var_name: table.var_name.clone(),
            record_name: format!("{}_", sanitize_ident(&table.stream_name)),
            index_field: format!("_tbl_{}", sanitize_ident(&table.var_name)),
            fields: stream
                .fields
                .iter()
                .map(|f| TableFieldIr {
                    name: sanitize_ident(&f.name),
                    tag: f.ty.tag,
                    nullable: f.ty.nullable,
                })
                .collect(),
            key,
            used: table.used,
        });
    }
    Ok(tables)
}

/// Lower one resolved select into a row transformer.
fn lower_select(
    analysis: &Analysis,
    select: &ResolvedSelect,
) -> Result<TransformerIr, CompilerError> {
    let mut slots = Vec::with_capacity(select.slots.len());
    for assign in &select.slots {
        let slot = match assign {
            SlotAssign::Null => Slot::ConstLiteral(Literal::Null),
            SlotAssign::Column(index) => match &select.columns[*index].value {
                ColumnValue::Column(binding) => column_slot(binding),
                ColumnValue::LiteralInt(value) => Slot::ConstLiteral(Literal::Int(*value)),
                ColumnValue::LiteralDecimal(text) => {
                    Slot::ConstLiteral(Literal::Decimal(text.clone()))
                }
                ColumnValue::LiteralString(text) => {
                    Slot::ConstLiteral(Literal::Str(text.clone()))
                }
                ColumnValue::LiteralNull => Slot::ConstLiteral(Literal::Null),
                ColumnValue::GroupKey => Slot::AggregatorOutput {
                    index: 0,
                    part: AggPart::Key,
                },
                ColumnValue::Aggregate(index) => Slot::AggregatorOutput {
                    index: *index,
                    part: AggPart::Value,
                },
            },
        };
        slots.push(slot);
    }
    let hoisted = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| matches!(slot, Slot::ConstLiteral(_)))
        .map(|(index, _)| index)
        .collect();

    let filter = match &select.query.where_clause {
        Some(pred) => Some(lower_pred(pred, select, false)?),
        None => None,
    };

    let join = select.join.as_ref().map(|join| JoinIr {
        table: join.table,
        probe: access(&join.probe),
        policy: JoinPolicy::InnerSkipIfMissing,
    });

    let aggregation = match &select.group_key {
        Some(key) => {
            let aggregators = select
                .aggregates
                .iter()
                .map(|agg| AggregatorIr {
                    kind: agg.kind,
                    key: access(key),
                    value: agg.value.as_ref().map(access),
                })
                .collect();
            let having = match &select.query.having {
                Some(pred) => Some(lower_pred(pred, select, true)?),
                None => None,
            };
            Some(AggregationIr {
                aggregators,
                having,
            })
        }
        None => None,
    };

    let input = match select.input.table {
        Some(table) => InputIr::Table {
            table,
            order_by: select.order_by.iter().map(|b| b.ordinal).collect(),
        },
        None => InputIr::Reader,
    };

    Ok(TransformerIr {
        input_stream: qualified_stream(analysis, select.input.dict, &select.input.stream_name),
        output_stream: Some(select.output.stream_name.clone()),
        kind: TransformerKind::Rows(RowPlan {
            input,
            arity: slots.len(),
            slots,
            hoisted,
            filter,
            join,
            aggregation,
        }),
    })
}

/// Lower a predicate expression, mapping bound columns to their access
/// form. Inside HAVING, column references read the aggregation key.
fn lower_pred(
    expr: &Expr,
    select: &ResolvedSelect,
    in_having: bool,
) -> Result<PredExpr, CompilerError> {
    match &expr.kind {
        ExprKind::Column(_) => {
            let binding = select.bindings.get(&expr.id).ok_or_else(|| {
                CompilerError::new("internal error: unresolved column in predicate")
            })?;
            if in_having {
                Ok(PredExpr::AggregatorOutput {
                    index: 0,
                    part: AggPart::Key,
                })
            } else {
                Ok(column_pred(binding))
            }
        }
        ExprKind::Int(value) => Ok(PredExpr::Const(Literal::Int(*value))),
        ExprKind::Decimal(text) => Ok(PredExpr::Const(Literal::Decimal(text.clone()))),
        ExprKind::Str(text) => Ok(PredExpr::Const(Literal::Str(text.clone()))),
        ExprKind::Null => Ok(PredExpr::Const(Literal::Null)),
        ExprKind::Call { .. } => {
            let index = select.agg_index.get(&expr.id).ok_or_else(|| {
                CompilerError::new("internal error: unresolved aggregate in predicate")
            })?;
            Ok(PredExpr::AggregatorOutput {
                index: *index,
                part: AggPart::Value,
            })
        }
        ExprKind::Unary { op, operand } => Ok(PredExpr::Unary {
            op: *op,
            operand: Box::new(lower_pred(operand, select, in_having)?),
        }),
        ExprKind::Binary { op, left, right } => Ok(PredExpr::Binary {
            op: *op,
            left: Box::new(lower_pred(left, select, in_having)?),
            right: Box::new(lower_pred(right, select, in_having)?),
        }),
        ExprKind::Star => Err(CompilerError::new(
            "internal error: '*' escaped analysis",
        )),
    }
}

fn column_slot(binding: &ColumnBinding) -> Slot {
    match binding.origin {
        ColumnOrigin::Input => Slot::ReaderColumn(access(binding)),
        ColumnOrigin::Join => Slot::JoinColumn {
            field: binding.ordinal,
            tag: binding.ty.tag,
            nullable: binding.ty.nullable,
        },
    }
}

fn column_pred(binding: &ColumnBinding) -> PredExpr {
    match binding.origin {
        ColumnOrigin::Input => PredExpr::ReaderColumn(access(binding)),
        ColumnOrigin::Join => PredExpr::JoinColumn {
            field: binding.ordinal,
            tag: binding.ty.tag,
            nullable: binding.ty.nullable,
        },
    }
}

fn access(binding: &ColumnBinding) -> ColumnAccess {
    ColumnAccess {
        ordinal: binding.ordinal,
        tag: binding.ty.tag,
        nullable: binding.ty.nullable,
    }
}

fn qualified_stream(analysis: &Analysis, dict: usize, stream_name: &str) -> String {
    analysis.dictionaries[dict]
        .stream(stream_name)
        .map(|s| s.qualified_name())
        .unwrap_or_else(|| stream_name.to_string())
}

/// Compressed wire forms of the sync edge's source and destination
/// dictionaries.
fn sync_dictionaries(analysis: &Analysis) -> Result<(String, String), CompilerError> {
    let dict_of = |key: &str| -> Result<usize, CompilerError> {
        match analysis.symbols.get(key) {
            Some(entry) => match &entry.symbol {
                Symbol::Endpoint { dict, .. } => Ok(*dict),
                _ => Err(CompilerError::new(
                    "internal error: sync edge is not an endpoint",
                )),
            },
            None => Err(CompilerError::new(
                "internal error: sync endpoint not found",
            )),
        }
    };
    let source = analysis.dictionaries[dict_of(&analysis.sync.reader)?].to_compressed_string();
    let dest = analysis.dictionaries[dict_of(&analysis.sync.writer)?].to_compressed_string();
    Ok((source, dest))
}

/// Make a name safe as a C# identifier.
fn sanitize_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (index, ch) in name.chars().enumerate() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if index == 0 && ch.is_ascii_digit() {
                out.push('_');
            }
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
