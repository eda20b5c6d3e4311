//! C# program source emitter.
//!
//! Renders the Sync class (row records, table indexes, one method per
//! transformer, registration constructor) and the Main entry point that
//! wires dictionaries, reader, the optional Sync transform, and writer.

use super::csharp::{
    clr_type, clr_type_opt, cs_string, is_text, is_value_type, reader_access,
};
use super::NameGen;
use crate::ir::{
    AggPart, AggregationIr, AggregatorIr, ColumnAccess, InputIr, JoinIr, Literal, PredExpr,
    ProgramIr, RowPlan, Slot, TableIr, TransformerKind,
};
use pansql_analyze::AggKind;
use pansql_ast::{BinaryOp, UnaryOp};

/// Render the complete program source.
pub fn emit_program(ir: &ProgramIr) -> String {
    Emitter::new(ir).emit()
}

struct Emitter<'a> {
    ir: &'a ProgramIr,
    out: String,
    names: NameGen,
    transformer_names: Vec<String>,
}

/// Row-input access style for a transformer body.
enum Input<'a> {
    /// `IDataReader` local named `r`
    Reader,
    /// Loop variable over a materialized table
    Row { var: String, table: &'a TableIr },
}

/// Name context for aggregation output loops.
struct AggNames {
    key: String,
    values: ValuesStyle,
}

enum ValuesStyle {
    /// Single aggregator: a scalar loop variable
    Single(String),
    /// Multiple aggregators: a tuple loop variable, read via `.ItemN`
    Tuple(String),
}

/// Everything the expression renderer needs to name inputs.
struct RenderCtx<'a> {
    input: Input<'a>,
    join: Option<(String, &'a TableIr)>,
    agg: Option<AggNames>,
}

impl<'a> Emitter<'a> {
    fn new(ir: &'a ProgramIr) -> Self {
        Self {
            ir,
            out: String::new(),
            names: NameGen::new(),
            transformer_names: Vec::new(),
        }
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn has_transform(&self) -> bool {
        !self.ir.transformers.is_empty() || !self.ir.name_maps.is_empty()
    }

    fn emit(mut self) -> String {
        for using in [
            "System",
            "System.Collections.Generic",
            "System.Data",
            "System.IO",
            "System.Linq",
            "System.Threading.Tasks",
            "Pansynchro.Core",
            "Pansynchro.Core.Connectors",
            "Pansynchro.Core.DataDict",
            "Pansynchro.Core.Transformations",
        ] {
            self.line(0, &format!("using {};", using));
        }
        self.blank();
        self.line(0, "namespace PansynchroGenerated");
        self.line(0, "{");
        if self.has_transform() {
            self.emit_sync_class();
        }
        self.emit_main();
        self.line(0, "}");
        self.out
    }

    fn emit_sync_class(&mut self) {
        self.line(1, "class Sync : StreamTransformerBase");
        self.line(1, "{");

        let used_tables: Vec<usize> = self
            .ir
            .tables
            .iter()
            .enumerate()
            .filter(|(_, t)| t.used)
            .map(|(i, _)| i)
            .collect();
        for &index in &used_tables {
            let table = &self.ir.tables[index];
            let fields = table
                .fields
                .iter()
                .map(|f| format!("{} {}", clr_type_opt(f.tag, f.nullable), f.name))
                .collect::<Vec<_>>()
                .join(", ");
            self.line(
                2,
                &format!("private sealed record {}({});", table.record_name, fields),
            );
        }
        if !used_tables.is_empty() {
            self.blank();
            for &index in &used_tables {
                let table = &self.ir.tables[index];
                let key_type = clr_type(table.fields[table.key].tag);
                self.line(
                    2,
                    &format!(
                        "private readonly Dictionary<{}, {}> {} = new();",
                        key_type, table.record_name, table.index_field
                    ),
                );
            }
            self.blank();
        }

        for index in 0..self.ir.transformers.len() {
            let name = self.names.fresh("Transformer");
            self.transformer_names.push(name.clone());
            let transformer = &self.ir.transformers[index];
            match &transformer.kind {
                TransformerKind::TableLoad { table } => {
                    self.emit_table_loader(&name, *table);
                }
                TransformerKind::Rows(_) => {
                    // Plan is re-borrowed inside to satisfy emission order.
                    self.emit_row_transformer(&name, index);
                }
            }
            self.blank();
        }

        self.emit_constructor();
        self.line(1, "}");
        self.blank();
    }

    fn emit_table_loader(&mut self, name: &str, table_index: usize) {
        let table = &self.ir.tables[table_index];
        let key_access = reader_access("r", table.key, table.fields[table.key].tag);
        let args = table
            .fields
            .iter()
            .enumerate()
            .map(|(ordinal, field)| {
                if field.nullable {
                    format!(
                        "r.IsDBNull({}) ? ({}?)null : {}",
                        ordinal,
                        clr_type(field.tag),
                        reader_access("r", ordinal, field.tag)
                    )
                } else {
                    reader_access("r", ordinal, field.tag)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let add_line = format!(
            "{}.Add({}, new {}({}));",
            table.index_field, key_access, table.record_name, args
        );

        self.line(
            2,
            &format!("private IEnumerable<object?[]> {}(IDataReader r)", name),
        );
        self.line(2, "{");
        self.line(3, "while (r.Read())");
        self.line(3, "{");
        self.line(4, &add_line);
        self.line(3, "}");
        self.line(3, "yield break;");
        self.line(2, "}");
    }

    fn emit_row_transformer(&mut self, name: &str, transformer_index: usize) {
        let plan = match &self.ir.transformers[transformer_index].kind {
            TransformerKind::Rows(plan) => plan.clone(),
            TransformerKind::TableLoad { .. } => return,
        };

        self.line(
            2,
            &format!("private IEnumerable<object?[]> {}(IDataReader r)", name),
        );
        self.line(2, "{");
        self.line(3, &format!("var result = new object?[{}];", plan.arity));

        // Constant slots are assigned exactly once, before the row loop.
        for &index in &plan.hoisted {
            if let Slot::ConstLiteral(literal) = &plan.slots[index] {
                self.line(
                    3,
                    &format!("result[{}] = {};", index, literal_value(literal)),
                );
            }
        }

        let agg_locals = match &plan.aggregation {
            Some(aggregation) => {
                let mut locals = Vec::new();
                for aggregator in &aggregation.aggregators {
                    let local = self.names.fresh("aggregator");
                    self.line(3, &aggregator_decl(&local, aggregator));
                    locals.push(local);
                }
                locals
            }
            None => Vec::new(),
        };

        // Row loop over the reader or the materialized table.
        let input = match &plan.input {
            InputIr::Reader => {
                self.line(3, "while (r.Read())");
                Input::Reader
            }
            InputIr::Table { table, order_by } => {
                let table = &self.ir.tables[*table];
                let var = self.names.fresh("row");
                let mut source = format!("{}.Values", table.index_field);
                for (position, &ordinal) in order_by.iter().enumerate() {
                    let method = if position == 0 { "OrderBy" } else { "ThenBy" };
                    source.push_str(&format!(
                        ".{}(v => v.{})",
                        method, table.fields[ordinal].name
                    ));
                }
                self.line(3, &format!("foreach (var {} in {})", var, source));
                Input::Row { var, table }
            }
        };
        self.line(3, "{");

        let mut ctx = RenderCtx {
            input,
            join: None,
            agg: None,
        };

        if let Some(join) = &plan.join {
            self.emit_join_probe(join, &mut ctx);
        }

        if let Some(filter) = &plan.filter {
            let predicate = render_bool(filter, &ctx);
            self.line(4, &format!("if (!{})", predicate));
            self.line(4, "{");
            self.line(5, "continue;");
            self.line(4, "}");
        }

        match &plan.aggregation {
            Some(aggregation) => {
                self.emit_aggregator_feeds(aggregation, &agg_locals, &ctx);
                self.line(3, "}");
                self.emit_aggregation_output(&plan, aggregation, &agg_locals, ctx);
            }
            None => {
                self.emit_slot_writes(&plan, &ctx, 4);
                self.line(4, "yield return result;");
                self.line(3, "}");
            }
        }

        self.line(2, "}");
    }

    /// Emit the unique-index probe; rows without a match are skipped.
    fn emit_join_probe(&mut self, join: &JoinIr, ctx: &mut RenderCtx<'a>) {
        let table = &self.ir.tables[join.table];
        if join.probe.nullable {
            let null_check = match &ctx.input {
                Input::Reader => format!("r.IsDBNull({})", join.probe.ordinal),
                Input::Row { var, table } => {
                    format!("{}.{} == null", var, table.fields[join.probe.ordinal].name)
                }
            };
            self.line(4, &format!("if ({})", null_check));
            self.line(4, "{");
            self.line(5, "continue;");
            self.line(4, "}");
        }
        let probe = input_value(&join.probe, ctx);
        let local = self.names.fresh(&table.var_name);
        self.line(
            4,
            &format!(
                "if (!{}.TryGetValue({}, out var {}))",
                table.index_field, probe, local
            ),
        );
        self.line(4, "{");
        self.line(5, "continue;");
        self.line(4, "}");
        ctx.join = Some((local, table));
    }

    /// Per-row `Add` calls feeding each aggregator.
    fn emit_aggregator_feeds(
        &mut self,
        aggregation: &AggregationIr,
        locals: &[String],
        ctx: &RenderCtx<'a>,
    ) {
        let key = &aggregation.aggregators[0].key;
        if key.nullable {
            let null_check = match &ctx.input {
                Input::Reader => format!("r.IsDBNull({})", key.ordinal),
                Input::Row { var, table } => {
                    format!("{}.{} == null", var, table.fields[key.ordinal].name)
                }
            };
            self.line(4, &format!("if ({})", null_check));
            self.line(4, "{");
            self.line(5, "continue;");
            self.line(4, "}");
        }
        let key_value = input_value(key, ctx);

        for (aggregator, local) in aggregation.aggregators.iter().zip(locals) {
            match &aggregator.value {
                None => {
                    self.line(4, &format!("{}.Add({});", local, key_value));
                }
                Some(value) => {
                    let call = if aggregator.kind == AggKind::Count {
                        format!("{}.Add({});", local, key_value)
                    } else {
                        format!("{}.Add({}, {});", local, key_value, input_value(value, ctx))
                    };
                    if value.nullable {
                        let null_check = match &ctx.input {
                            Input::Reader => format!("!r.IsDBNull({})", value.ordinal),
                            Input::Row { var, table } => {
                                format!("{}.{} != null", var, table.fields[value.ordinal].name)
                            }
                        };
                        self.line(4, &format!("if ({})", null_check));
                        self.line(4, "{");
                        self.line(5, &call);
                        self.line(4, "}");
                    } else {
                        self.line(4, &call);
                    }
                }
            }
        }
    }

    /// The post-aggregation output loop: combine, having, slot writes.
    fn emit_aggregation_output(
        &mut self,
        plan: &RowPlan,
        aggregation: &AggregationIr,
        locals: &[String],
        mut ctx: RenderCtx<'a>,
    ) {
        let key_var = self.names.fresh("key");
        let (values_var, style, source) = if locals.len() == 1 {
            let value_var = self.names.fresh("value");
            (
                value_var.clone(),
                ValuesStyle::Single(value_var),
                format!("{}.Results()", locals[0]),
            )
        } else {
            let values_var = self.names.fresh("values");
            (
                values_var.clone(),
                ValuesStyle::Tuple(values_var),
                format!("AggregateHelper.Combine({})", locals.join(", ")),
            )
        };
        self.line(
            3,
            &format!(
                "foreach (var ({}, {}) in {})",
                key_var, values_var, source
            ),
        );
        self.line(3, "{");

        ctx.agg = Some(AggNames {
            key: key_var,
            values: style,
        });

        if let Some(having) = &aggregation.having {
            let predicate = render_bool(having, &ctx);
            self.line(4, &format!("if (!{})", predicate));
            self.line(4, "{");
            self.line(5, "continue;");
            self.line(4, "}");
        }

        self.emit_slot_writes(plan, &ctx, 4);
        self.line(4, "yield return result;");
        self.line(3, "}");
    }

    /// Per-row writes for every non-hoisted slot, in slot order.
    fn emit_slot_writes(&mut self, plan: &RowPlan, ctx: &RenderCtx<'a>, indent: usize) {
        for (index, slot) in plan.slots.iter().enumerate() {
            let value = match slot {
                Slot::ConstLiteral(_) => continue,
                Slot::ReaderColumn(access) => slot_input_value(access, ctx),
                Slot::JoinColumn {
                    field, nullable, ..
                } => {
                    let (var, table) = ctx
                        .join
                        .as_ref()
                        .expect("join slot outside a join transformer");
                    let field_name = &table.fields[*field].name;
                    if *nullable {
                        format!("(object?){}.{} ?? DBNull.Value", var, field_name)
                    } else {
                        format!("{}.{}", var, field_name)
                    }
                }
                Slot::AggregatorOutput { index, part } => {
                    agg_output(ctx, *index, *part)
                }
            };
            self.line(indent, &format!("result[{}] = {};", index, value));
        }
    }

    fn emit_constructor(&mut self) {
        self.line(2, "public Sync(DataDictionary destDict) : base(destDict)");
        self.line(2, "{");
        let registrations: Vec<String> = self
            .ir
            .transformers
            .iter()
            .zip(&self.transformer_names)
            .map(|(transformer, name)| {
                format!(
                    "_streamDict.Add(StreamDescription.Parse({}), {});",
                    cs_string(&transformer.input_stream),
                    name
                )
            })
            .collect();
        for registration in &registrations {
            self.line(3, registration);
        }
        for (source, dest) in &self.ir.name_maps {
            self.line(
                3,
                &format!(
                    "_nameMap.Add(StreamDescription.Parse({}), StreamDescription.Parse({}));",
                    cs_string(source),
                    cs_string(dest)
                ),
            );
        }
        self.line(2, "}");
    }

    fn emit_main(&mut self) {
        let reader_open = &self.ir.opens[self.ir.sync.reader];
        let writer_open = &self.ir.opens[self.ir.sync.writer];

        self.line(1, "public static class Program");
        self.line(1, "{");
        self.line(2, "public static async Task Main()");
        self.line(2, "{");

        // Network handoff files claim their numbers first.
        let reader_file = reader_open.dict_file.as_ref().map(|path| {
            let local = self.names.fresh("filename");
            (local, path.clone())
        });
        if let Some((local, path)) = &reader_file {
            self.line(3, &format!("var {} = {};", local, cs_string(path)));
        }
        let writer_file = writer_open.dict_file.as_ref().map(|path| {
            let local = self.names.fresh("filename");
            (local, path.clone())
        });
        if let Some((local, path)) = &writer_file {
            self.line(3, &format!("var {} = {};", local, cs_string(path)));
        }

        let source_dict = self.names.fresh("dict");
        match &reader_file {
            Some((local, _)) => {
                self.line(
                    3,
                    &format!(
                        "var {} = DataDictionary.FromCompressedString(File.ReadAllText({}));",
                        source_dict, local
                    ),
                );
            }
            None => {
                let blob = cs_string(&self.ir.source_dict);
                self.line(
                    3,
                    &format!(
                        "var {} = DataDictionary.FromCompressedString({});",
                        source_dict, blob
                    ),
                );
            }
        }

        let dest_dict = self.names.fresh("dict");
        let blob = cs_string(&self.ir.dest_dict);
        self.line(
            3,
            &format!(
                "var {} = DataDictionary.FromCompressedString({});",
                dest_dict, blob
            ),
        );
        if let Some((local, _)) = &writer_file {
            self.line(
                3,
                &format!(
                    "File.WriteAllText({}, {}.ToCompressedString());",
                    local, dest_dict
                ),
            );
        }

        let reader = self.names.fresh("reader");
        self.line(
            3,
            &format!(
                "var {} = ConnectorRegistry.GetReader({}, {});",
                reader,
                cs_string(&reader_open.connector),
                cs_string(&reader_open.conn_str)
            ),
        );
        let writer = self.names.fresh("writer");
        self.line(
            3,
            &format!(
                "var {} = ConnectorRegistry.GetWriter({}, {});",
                writer,
                cs_string(&writer_open.connector),
                cs_string(&writer_open.conn_str)
            ),
        );

        if self.has_transform() {
            let sync = self.names.fresh("sync");
            self.line(3, &format!("var {} = new Sync({});", sync, dest_dict));
            self.line(
                3,
                &format!(
                    "await {}.Sync({}.Transform({}.ReadFrom({})), {});",
                    writer, sync, reader, source_dict, dest_dict
                ),
            );
        } else {
            self.line(
                3,
                &format!(
                    "await {}.Sync({}.ReadFrom({}), {});",
                    writer, reader, source_dict, dest_dict
                ),
            );
        }

        self.line(2, "}");
        self.line(1, "}");
    }
}

/// Render a literal as a C# expression.
fn literal_value(literal: &Literal) -> String {
    match literal {
        Literal::Int(value) => value.to_string(),
        Literal::Decimal(text) => format!("{}m", text),
        Literal::Str(text) => cs_string(text),
        Literal::Null => "DBNull.Value".to_string(),
    }
}

/// The non-null value of an input column, for probes, keys, and
/// aggregator feeds (null guards are emitted by the caller).
fn input_value(access: &ColumnAccess, ctx: &RenderCtx<'_>) -> String {
    match &ctx.input {
        Input::Reader => reader_access("r", access.ordinal, access.tag),
        Input::Row { var, table } => {
            let field = &table.fields[access.ordinal];
            if field.nullable {
                if is_value_type(field.tag) {
                    format!("{}.{}.Value", var, field.name)
                } else {
                    format!("{}.{}!", var, field.name)
                }
            } else {
                format!("{}.{}", var, field.name)
            }
        }
    }
}

/// The boxed value of an input column for a result slot, with the null
/// sentinel substituted for missing values.
fn slot_input_value(access: &ColumnAccess, ctx: &RenderCtx<'_>) -> String {
    match &ctx.input {
        Input::Reader => {
            if access.nullable {
                format!(
                    "r.IsDBNull({}) ? (object?)DBNull.Value : {}",
                    access.ordinal,
                    reader_access("r", access.ordinal, access.tag)
                )
            } else {
                reader_access("r", access.ordinal, access.tag)
            }
        }
        Input::Row { var, table } => {
            let field = &table.fields[access.ordinal];
            if field.nullable {
                format!("(object?){}.{} ?? DBNull.Value", var, field.name)
            } else {
                format!("{}.{}", var, field.name)
            }
        }
    }
}

/// Access one aggregator output in the post-aggregation loop.
fn agg_output(ctx: &RenderCtx<'_>, index: usize, part: AggPart) -> String {
    let names = ctx
        .agg
        .as_ref()
        .expect("aggregator output outside an aggregation loop");
    match part {
        AggPart::Key => names.key.clone(),
        AggPart::Value => match &names.values {
            ValuesStyle::Single(var) => var.clone(),
            ValuesStyle::Tuple(var) => format!("{}.Item{}", var, index + 1),
        },
    }
}

fn aggregator_decl(local: &str, aggregator: &AggregatorIr) -> String {
    let key_type = clr_type(aggregator.key.tag);
    match (&aggregator.kind, &aggregator.value) {
        (AggKind::Count, _) => format!("var {} = new CountAggregator<{}>();", local, key_type),
        (kind, Some(value)) => format!(
            "var {} = new {}<{}, {}>();",
            local,
            agg_class(*kind),
            key_type,
            clr_type(value.tag)
        ),
        (kind, None) => format!("var {} = new {}<{}, int>();", local, agg_class(*kind), key_type),
    }
}

fn agg_class(kind: AggKind) -> &'static str {
    match kind {
        AggKind::Max => "MaxAggregator",
        AggKind::Min => "MinAggregator",
        AggKind::Sum => "SumAggregator",
        AggKind::Count => "CountAggregator",
        AggKind::Avg => "AvgAggregator",
    }
}

fn cs_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}

/// Render a predicate in boolean position.
///
/// Comparisons over nullable reader columns are guarded with `IsDBNull`
/// checks, reducing SQL three-valued logic to "null skips the row".
fn render_bool(expr: &PredExpr, ctx: &RenderCtx<'_>) -> String {
    match expr {
        PredExpr::Binary { op, left, right } if matches!(op, BinaryOp::And | BinaryOp::Or) => {
            format!(
                "({} {} {})",
                render_bool(left, ctx),
                cs_op(*op),
                render_bool(right, ctx)
            )
        }
        PredExpr::Binary { op, left, right } if op.is_comparison() => {
            let mut guards = Vec::new();
            if matches!(ctx.input, Input::Reader) {
                collect_nullable_reader_columns(left, &mut guards);
                collect_nullable_reader_columns(right, &mut guards);
            }
            let lhs = render_value(left, ctx);
            let rhs = render_value(right, ctx);
            let core = if is_text_operand(left) || is_text_operand(right) {
                match op {
                    BinaryOp::Eq | BinaryOp::Ne => format!("{} {} {}", lhs, cs_op(*op), rhs),
                    _ => format!("string.Compare({}, {}) {} 0", lhs, rhs, cs_op(*op)),
                }
            } else {
                format!("{} {} {}", lhs, cs_op(*op), rhs)
            };
            let mut out = String::from("(");
            for ordinal in guards {
                out.push_str(&format!("!r.IsDBNull({}) && ", ordinal));
            }
            out.push_str(&core);
            out.push(')');
            out
        }
        PredExpr::Unary {
            op: UnaryOp::Not,
            operand,
        } => format!("!{}", render_bool(operand, ctx)),
        PredExpr::ReaderColumn(access) if matches!(ctx.input, Input::Reader) => {
            if access.nullable {
                format!(
                    "(!r.IsDBNull({}) && {})",
                    access.ordinal,
                    reader_access("r", access.ordinal, access.tag)
                )
            } else {
                format!("({})", reader_access("r", access.ordinal, access.tag))
            }
        }
        other => format!("({})", render_value(other, ctx)),
    }
}

/// Render a predicate sub-expression in value position.
fn render_value(expr: &PredExpr, ctx: &RenderCtx<'_>) -> String {
    match expr {
        PredExpr::ReaderColumn(access) => input_column_value(access.ordinal, access.tag, ctx),
        PredExpr::JoinColumn { field, .. } => {
            let (var, table) = ctx
                .join
                .as_ref()
                .expect("join column outside a join transformer");
            format!("{}.{}", var, table.fields[*field].name)
        }
        PredExpr::AggregatorOutput { index, part } => agg_output(ctx, *index, *part),
        PredExpr::Const(literal) => match literal {
            Literal::Null => "null".to_string(),
            other => literal_value(other),
        },
        PredExpr::Unary { op, operand } => {
            let symbol = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            };
            format!("{}{}", symbol, render_value(operand, ctx))
        }
        PredExpr::Binary { op, left, right } => format!(
            "({} {} {})",
            render_value(left, ctx),
            cs_op(*op),
            render_value(right, ctx)
        ),
    }
}

/// Raw column access in value position (no null handling; guards come
/// from the enclosing comparison).
fn input_column_value(ordinal: usize, tag: pansql_dict::TypeTag, ctx: &RenderCtx<'_>) -> String {
    match &ctx.input {
        Input::Reader => reader_access("r", ordinal, tag),
        Input::Row { var, table } => format!("{}.{}", var, table.fields[ordinal].name),
    }
}

fn collect_nullable_reader_columns(expr: &PredExpr, out: &mut Vec<usize>) {
    match expr {
        PredExpr::ReaderColumn(access) => {
            if access.nullable && !out.contains(&access.ordinal) {
                out.push(access.ordinal);
            }
        }
        PredExpr::Unary { operand, .. } => collect_nullable_reader_columns(operand, out),
        PredExpr::Binary { left, right, .. } => {
            collect_nullable_reader_columns(left, out);
            collect_nullable_reader_columns(right, out);
        }
        _ => {}
    }
}

fn is_text_operand(expr: &PredExpr) -> bool {
    match expr {
        PredExpr::ReaderColumn(access) => is_text(access.tag),
        PredExpr::JoinColumn { tag, .. } => is_text(*tag),
        PredExpr::Const(Literal::Str(_)) => true,
        _ => false,
    }
}
