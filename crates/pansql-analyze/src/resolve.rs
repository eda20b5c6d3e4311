//! Resolution passes over a parsed script.
//!
//! Passes run in order: declarations bind names, selects resolve against
//! their dictionaries, structural rules are enforced (single use, join
//! keys, ordering), and each projection is validated against its
//! destination stream. The first error aborts analysis.

use crate::symbols::{Symbol, SymbolTable};
use pansql_ast::foundation::Span;
use pansql_ast::{
    ColumnRef, CompilerError, DeclKind, Direction, Expr, ExprId, ExprKind, Query, Script,
    SelectStmt, Statement, UnaryOp,
};
use pansql_dict::{DataDictionary, FieldType, StreamDefinition, TypeTag};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Aggregate function kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKind {
    Max,
    Min,
    Sum,
    Count,
    Avg,
}

impl AggKind {
    /// Parse an aggregate function name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "max" => Some(AggKind::Max),
            "min" => Some(AggKind::Min),
            "sum" => Some(AggKind::Sum),
            "count" => Some(AggKind::Count),
            "avg" => Some(AggKind::Avg),
            _ => None,
        }
    }
}

/// Where a resolved column reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrigin {
    /// The streaming (or table) input of the `FROM` clause
    Input,
    /// The joined table
    Join,
}

/// Resolution result for one column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    pub origin: ColumnOrigin,
    /// Field ordinal within the origin stream
    pub ordinal: usize,
    pub ty: FieldType,
}

/// The resolved `FROM` source of a select.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    pub var_name: String,
    pub kind: DeclKind,
    pub dict: usize,
    pub stream_name: String,
    /// For table inputs, index into the resolved table list
    pub table: Option<usize>,
}

/// The resolved `into` target of a select.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBinding {
    pub var_name: String,
    pub dict: usize,
    pub stream_name: String,
}

/// The resolved join clause: which table, probed by which input column.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJoin {
    /// Index into the resolved table list
    pub table: usize,
    /// Input-side column whose value probes the table's unique index
    pub probe: ColumnBinding,
}

/// One aggregator of an aggregation plan, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAggregate {
    pub kind: AggKind,
    /// The aggregated column; `None` for `count(*)`
    pub value: Option<ColumnBinding>,
}

impl ResolvedAggregate {
    /// The field type this aggregator produces.
    pub fn result_type(&self) -> FieldType {
        match (self.kind, &self.value) {
            (AggKind::Count, _) => FieldType::plain(TypeTag::Int),
            (AggKind::Avg, Some(v)) if matches!(v.ty.tag, TypeTag::Decimal | TypeTag::Money) => {
                FieldType::plain(v.ty.tag)
            }
            (AggKind::Avg, Some(_)) => FieldType::plain(TypeTag::Double),
            (_, Some(v)) => FieldType::plain(v.ty.tag),
            // Non-count aggregates always carry a value column.
            (_, None) => FieldType::plain(TypeTag::Int),
        }
    }
}

/// Classification of one projected select column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Column(ColumnBinding),
    LiteralInt(i64),
    LiteralDecimal(String),
    LiteralString(String),
    LiteralNull,
    /// The grouping column of an aggregation query
    GroupKey,
    /// Index into the aggregate list
    Aggregate(usize),
}

/// A classified select column plus the type it produces (`None` for NULL).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub value: ColumnValue,
    pub ty: Option<FieldType>,
}

/// Assignment of one destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAssign {
    /// Fed by the select column with this index
    Column(usize),
    /// Not projected; filled with the null sentinel
    Null,
}

/// A fully resolved `select` statement.
#[derive(Debug, Clone)]
pub struct ResolvedSelect {
    pub stmt_index: usize,
    pub query: Query,
    pub input: InputBinding,
    pub output: OutputBinding,
    /// Classified select columns, parallel to `query.columns`
    pub columns: Vec<ResolvedColumn>,
    /// One entry per destination field, in destination order
    pub slots: Vec<SlotAssign>,
    /// Column bindings for every column reference in predicates
    pub bindings: HashMap<ExprId, ColumnBinding>,
    pub join: Option<ResolvedJoin>,
    pub group_key: Option<ColumnBinding>,
    pub aggregates: Vec<ResolvedAggregate>,
    /// Aggregate call expression -> index into `aggregates`
    pub agg_index: HashMap<ExprId, usize>,
    /// Resolved ORDER BY columns (table inputs only)
    pub order_by: Vec<ColumnBinding>,
}

/// A `table` declaration, resolved against its dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub var_name: String,
    pub dict: usize,
    pub stream_name: String,
    /// Ordinal of the single primary-key field, when the key is one field
    pub key_ordinal: Option<usize>,
    /// Statement index of the declaration, for emission ordering
    pub decl_index: usize,
    /// Whether any join probes this table
    pub used: bool,
}

/// An explicit `map` statement, resolved to plain stream names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMap {
    pub source_stream: String,
    pub dest_stream: String,
}

/// The script's single `sync` command, by endpoint symbol keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEdge {
    pub reader: String,
    pub writer: String,
}

/// Everything later passes need: dictionaries, symbols, resolved
/// statements, and accumulated warnings.
#[derive(Debug)]
pub struct Analysis {
    pub dictionaries: Vec<DataDictionary>,
    pub symbols: SymbolTable,
    pub tables: Vec<ResolvedTable>,
    pub selects: Vec<ResolvedSelect>,
    pub maps: Vec<ResolvedMap>,
    pub sync: SyncEdge,
    pub warnings: Vec<String>,
}

/// Run all resolution passes over a script.
///
/// `base_dir` anchors relative dictionary paths from `load` statements.
pub fn analyze(script: &Script, base_dir: &Path) -> Result<Analysis, CompilerError> {
    let mut analyzer = Analyzer {
        base_dir,
        dictionaries: Vec::new(),
        symbols: SymbolTable::new(),
        tables: Vec::new(),
        selects: Vec::new(),
        maps: Vec::new(),
        sync: None,
        consumed: HashSet::new(),
        handled_sources: HashSet::new(),
        warnings: Vec::new(),
    };
    analyzer.resolve_declarations(script)?;
    analyzer.resolve_bodies(script)?;
    analyzer.finish()
}

struct Analyzer<'a> {
    base_dir: &'a Path,
    dictionaries: Vec<DataDictionary>,
    symbols: SymbolTable,
    tables: Vec<ResolvedTable>,
    selects: Vec<ResolvedSelect>,
    maps: Vec<ResolvedMap>,
    sync: Option<SyncEdge>,
    /// Stream variables already consumed by a select
    consumed: HashSet<String>,
    /// Source stream names claimed by a select or an explicit map
    handled_sources: HashSet<String>,
    warnings: Vec<String>,
}

impl<'a> Analyzer<'a> {
    /// Pass 1: bind dictionaries, stream variables, and endpoints.
    fn resolve_declarations(&mut self, script: &Script) -> Result<(), CompilerError> {
        for (decl_index, statement) in script.statements.iter().enumerate() {
            match statement {
                Statement::Load(load) => {
                    let path = self.base_dir.join(&load.path);
                    let dict = DataDictionary::load(&path).map_err(|e| {
                        CompilerError::with_span(
                            format!(
                                "failed to load dictionary '{}' from '{}': {}",
                                load.name, load.path, e
                            ),
                            load.span,
                        )
                    })?;
                    let index = self.dictionaries.len();
                    self.dictionaries.push(dict);
                    self.bind(&load.name, Symbol::Dict { index }, load.span)?;
                }
                Statement::Decl(decl) => {
                    let dict = self.expect_dict(&decl.source.dict)?;
                    let stream = self.expect_stream(dict, &decl.source.item)?;
                    let stream_name = stream.name.clone();
                    let table = match decl.kind {
                        DeclKind::Table => {
                            let key_ordinal = stream.single_key_ordinal();
                            self.tables.push(ResolvedTable {
                                var_name: decl.name.text.clone(),
                                dict,
                                stream_name: stream_name.clone(),
                                key_ordinal,
                                decl_index,
                                used: false,
                            });
                            Some(self.tables.len() - 1)
                        }
                        DeclKind::Stream => None,
                    };
                    self.bind(
                        &decl.name,
                        Symbol::StreamVar {
                            kind: decl.kind,
                            dict,
                            stream_name,
                            table,
                        },
                        decl.span,
                    )?;
                }
                Statement::Open(open) => {
                    let dict = self.expect_dict(&open.dict)?;
                    self.bind(
                        &open.name,
                        Symbol::Endpoint {
                            direction: open.direction,
                            connector: open.connector.text.clone(),
                            dict,
                            conn_str: open.conn_str.clone(),
                        },
                        open.span,
                    )?;
                }
                Statement::Abort(abort) => {
                    return Err(CompilerError::with_span(abort.message.clone(), abort.span));
                }
                Statement::Select(_) | Statement::Map(_) | Statement::Sync(_) => {}
            }
        }
        Ok(())
    }

    /// Pass 2: resolve selects, maps, and the sync edge in statement order.
    fn resolve_bodies(&mut self, script: &Script) -> Result<(), CompilerError> {
        for (index, statement) in script.statements.iter().enumerate() {
            match statement {
                Statement::Select(select) => {
                    let resolved = self.resolve_select(index, select)?;
                    self.selects.push(resolved);
                }
                Statement::Map(map) => {
                    let resolved = self.resolve_map(map)?;
                    self.maps.push(resolved);
                }
                Statement::Sync(sync) => {
                    if self.sync.is_some() {
                        return Err(CompilerError::with_span(
                            "a script may declare only one sync command",
                            sync.span,
                        ));
                    }
                    self.expect_endpoint(&sync.reader, Direction::Read)?;
                    self.expect_endpoint(&sync.writer, Direction::Write)?;
                    self.sync = Some(SyncEdge {
                        reader: sync.reader.key(),
                        writer: sync.writer.key(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Analysis, CompilerError> {
        let sync = self
            .sync
            .ok_or_else(|| CompilerError::new("script declares no sync command"))?;
        Ok(Analysis {
            dictionaries: self.dictionaries,
            symbols: self.symbols,
            tables: self.tables,
            selects: self.selects,
            maps: self.maps,
            sync,
            warnings: self.warnings,
        })
    }

    fn bind(
        &mut self,
        name: &pansql_ast::Ident,
        symbol: Symbol,
        span: Span,
    ) -> Result<(), CompilerError> {
        if !self.symbols.insert(name, symbol) {
            return Err(CompilerError::with_span(
                format!("the name '{}' has already been declared", name),
                span,
            ));
        }
        Ok(())
    }

    fn expect_dict(&self, name: &pansql_ast::Ident) -> Result<usize, CompilerError> {
        match self.symbols.get(&name.text) {
            Some(entry) => match entry.symbol {
                Symbol::Dict { index } => Ok(index),
                _ => Err(CompilerError::with_span(
                    format!("'{}' is not a dictionary", name),
                    name.span,
                )),
            },
            None => Err(CompilerError::with_span(
                format!("unknown name '{}'", name),
                name.span,
            )),
        }
    }

    fn expect_stream(
        &self,
        dict: usize,
        name: &pansql_ast::Ident,
    ) -> Result<&StreamDefinition, CompilerError> {
        let dictionary = &self.dictionaries[dict];
        dictionary.stream(&name.text).ok_or_else(|| {
            CompilerError::with_span(
                format!(
                    "dictionary '{}' has no stream named '{}'",
                    dictionary.name, name
                ),
                name.span,
            )
        })
    }

    fn expect_endpoint(
        &self,
        name: &pansql_ast::Ident,
        direction: Direction,
    ) -> Result<(), CompilerError> {
        let entry = self.symbols.get(&name.text).ok_or_else(|| {
            CompilerError::with_span(format!("unknown name '{}'", name), name.span)
        })?;
        match &entry.symbol {
            Symbol::Endpoint { direction: d, .. } if *d == direction => Ok(()),
            _ => {
                let wanted = match direction {
                    Direction::Read => "reader",
                    Direction::Write => "writer",
                };
                Err(CompilerError::with_span(
                    format!("'{}' is not an open {} endpoint", name, wanted),
                    name.span,
                ))
            }
        }
    }

    /// Resolve one `select` statement end to end.
    fn resolve_select(
        &mut self,
        stmt_index: usize,
        select: &SelectStmt,
    ) -> Result<ResolvedSelect, CompilerError> {
        let query = &select.query;

        // FROM source
        let from_name = &query.from.name;
        let input = match self.symbols.get(&from_name.text) {
            Some(entry) => match &entry.symbol {
                Symbol::StreamVar {
                    kind,
                    dict,
                    stream_name,
                    table,
                } => InputBinding {
                    var_name: entry.name.clone(),
                    kind: *kind,
                    dict: *dict,
                    stream_name: stream_name.clone(),
                    table: *table,
                },
                _ => {
                    return Err(CompilerError::with_span(
                        format!("'{}' is not a declared stream or table", from_name),
                        from_name.span,
                    ));
                }
            },
            None => {
                return Err(CompilerError::with_span(
                    format!("unknown name '{}'", from_name),
                    from_name.span,
                ));
            }
        };

        // Single-use rule for streamed inputs
        if input.kind == DeclKind::Stream {
            let key = from_name.key();
            if !self.consumed.insert(key) {
                return Err(CompilerError::with_span(
                    format!(
                        "The stream '{}' has already been processed. Streams may only be used once.",
                        input.var_name
                    ),
                    from_name.span,
                ));
            }
        }
        self.handled_sources.insert(input.stream_name.clone());
        if let Some(table) = input.table {
            self.tables[table].used = true;
        }

        let input_stream = self.dictionaries[input.dict]
            .stream(&input.stream_name)
            .cloned()
            .ok_or_else(|| {
                CompilerError::new(format!(
                    "dictionary stream '{}' disappeared during analysis",
                    input.stream_name
                ))
            })?;

        // JOIN clause
        let mut join_scope: Option<(String, StreamDefinition, usize)> = None;
        let join = match &query.join {
            Some(clause) => {
                let (table_index, table_stream) = match self.symbols.get(&clause.table.text) {
                    Some(entry) => match &entry.symbol {
                        Symbol::StreamVar {
                            kind: DeclKind::Table,
                            dict,
                            stream_name,
                            table: Some(table),
                        } => {
                            let stream = self.dictionaries[*dict]
                                .stream(stream_name)
                                .cloned()
                                .ok_or_else(|| {
                                    CompilerError::new(format!(
                                        "dictionary stream '{}' disappeared during analysis",
                                        stream_name
                                    ))
                                })?;
                            (*table, stream)
                        }
                        Symbol::StreamVar { .. } => {
                            return Err(CompilerError::with_span(
                                "the right-hand side of a JOIN must be declared as a TABLE",
                                clause.table.span,
                            ));
                        }
                        _ => {
                            return Err(CompilerError::with_span(
                                format!("'{}' is not a declared stream or table", clause.table),
                                clause.table.span,
                            ));
                        }
                    },
                    None => {
                        return Err(CompilerError::with_span(
                            format!("unknown name '{}'", clause.table),
                            clause.table.span,
                        ));
                    }
                };
                self.tables[table_index].used = true;
                join_scope = Some((clause.alias.key(), table_stream, table_index));

                let scope = Scope {
                    input_name: query.from.binding_name().key(),
                    input_stream: &input_stream,
                    join: join_scope
                        .as_ref()
                        .map(|(alias, stream, _)| (alias.clone(), stream)),
                };
                let left = scope.resolve_column(&clause.left)?;
                let right = scope.resolve_column(&clause.right)?;
                let (probe, key_side) = match (left.origin, right.origin) {
                    (ColumnOrigin::Input, ColumnOrigin::Join) => (left, (&clause.right, right)),
                    (ColumnOrigin::Join, ColumnOrigin::Input) => (right, (&clause.left, left)),
                    _ => {
                        return Err(CompilerError::with_span(
                            "JOIN condition must relate an input column to the joined table's key",
                            clause.span,
                        ));
                    }
                };
                let table = &self.tables[table_index];
                let key_ordinal = table.key_ordinal.ok_or_else(|| {
                    CompilerError::with_span(
                        format!(
                            "table '{}' does not have a single-field primary key",
                            table.var_name
                        ),
                        clause.span,
                    )
                })?;
                if key_side.1.ordinal != key_ordinal {
                    return Err(CompilerError::with_span(
                        format!(
                            "JOIN key '{}' does not match the primary key of table '{}'",
                            key_side.0.column, table.var_name
                        ),
                        key_side.0.span(),
                    ));
                }
                Some(ResolvedJoin {
                    table: table_index,
                    probe,
                })
            }
            None => None,
        };

        let scope = Scope {
            input_name: query.from.binding_name().key(),
            input_stream: &input_stream,
            join: join_scope
                .as_ref()
                .map(|(alias, stream, _)| (alias.clone(), stream)),
        };

        // Ordering rule
        if !query.order_by.is_empty() && input.kind == DeclKind::Stream {
            return Err(CompilerError::with_span(
                "ORDER BY is not supported for queries involving a STREAM input.",
                query.span,
            ));
        }
        let mut order_by = Vec::new();
        for column in &query.order_by {
            let binding = scope.resolve_column(column)?;
            if binding.origin != ColumnOrigin::Input {
                return Err(CompilerError::with_span(
                    "ORDER BY must reference columns of the input",
                    column.span(),
                ));
            }
            order_by.push(binding);
        }

        let mut bindings = HashMap::new();

        // WHERE predicate: bind columns, reject aggregates
        if let Some(pred) = &query.where_clause {
            if pred.contains_call() {
                return Err(CompilerError::with_span(
                    "aggregate functions are not allowed in WHERE",
                    pred.span,
                ));
            }
            bind_columns(pred, &scope, &mut bindings)?;
        }

        // GROUP BY key
        let group_key = match query.group_by.as_slice() {
            [] => None,
            [column] => {
                let binding = scope.resolve_column(column)?;
                if binding.origin != ColumnOrigin::Input {
                    return Err(CompilerError::with_span(
                        "GROUP BY must reference a column of the input",
                        column.span(),
                    ));
                }
                Some(binding)
            }
            [_, second, ..] => {
                return Err(CompilerError::with_span(
                    "GROUP BY supports a single grouping column",
                    second.span(),
                ));
            }
        };

        let mut aggregates: Vec<ResolvedAggregate> = Vec::new();
        let mut agg_index: HashMap<ExprId, usize> = HashMap::new();

        // Select columns
        let has_aggregates = query.columns.iter().any(|c| c.expr.contains_call());
        if has_aggregates && group_key.is_none() {
            return Err(CompilerError::with_span(
                "aggregate functions require GROUP BY",
                query.span,
            ));
        }

        let mut columns = Vec::new();
        for (index, column) in query.columns.iter().enumerate() {
            let resolved = if group_key.is_some() {
                self.classify_aggregated_column(
                    index,
                    &column.expr,
                    &scope,
                    group_key.as_ref().map(|k| k.ordinal),
                    &mut aggregates,
                    &mut agg_index,
                    &mut bindings,
                )?
            } else {
                classify_plain_column(&column.expr, &scope, &mut bindings)?
            };
            columns.push(resolved);
        }

        // HAVING predicate
        if let Some(having) = &query.having {
            let key = group_key.as_ref().ok_or_else(|| {
                CompilerError::with_span("HAVING requires GROUP BY", having.span)
            })?;
            resolve_having(
                having,
                &scope,
                key.ordinal,
                &mut aggregates,
                &mut agg_index,
                &mut bindings,
            )?;
        }

        if group_key.is_some() && aggregates.is_empty() {
            return Err(CompilerError::with_span(
                "GROUP BY requires at least one aggregate in the select list",
                query.span,
            ));
        }

        // `into` target
        let into = &select.into;
        let output = match self.symbols.get(&into.text) {
            Some(entry) => match &entry.symbol {
                Symbol::StreamVar {
                    dict, stream_name, ..
                } => OutputBinding {
                    var_name: entry.name.clone(),
                    dict: *dict,
                    stream_name: stream_name.clone(),
                },
                _ => {
                    return Err(CompilerError::with_span(
                        format!("'{}' is not a declared stream or table", into),
                        into.span,
                    ));
                }
            },
            None => {
                return Err(CompilerError::with_span(
                    format!("unknown name '{}'", into),
                    into.span,
                ));
            }
        };

        // Projection validation against the destination stream
        let dest_stream = self.dictionaries[output.dict]
            .stream(&output.stream_name)
            .cloned()
            .ok_or_else(|| {
                CompilerError::new(format!(
                    "dictionary stream '{}' disappeared during analysis",
                    output.stream_name
                ))
            })?;
        let slots = check_projection(select, &query.columns, &columns, &dest_stream)?;

        Ok(ResolvedSelect {
            stmt_index,
            query: query.clone(),
            input,
            output,
            columns,
            slots,
            bindings,
            join,
            group_key,
            aggregates,
            agg_index,
            order_by,
        })
    }

    /// Classify a select column of an aggregation query: the grouping
    /// column, an aggregate call, or a literal.
    #[allow(clippy::too_many_arguments)]
    fn classify_aggregated_column(
        &self,
        index: usize,
        expr: &Expr,
        scope: &Scope<'_>,
        key_ordinal: Option<usize>,
        aggregates: &mut Vec<ResolvedAggregate>,
        agg_index: &mut HashMap<ExprId, usize>,
        bindings: &mut HashMap<ExprId, ColumnBinding>,
    ) -> Result<ResolvedColumn, CompilerError> {
        match &expr.kind {
            ExprKind::Column(column) => {
                let binding = scope.resolve_column(column)?;
                if binding.origin != ColumnOrigin::Input || Some(binding.ordinal) != key_ordinal {
                    return Err(CompilerError::with_span(
                        format!(
                            "select column {} must be the grouping column, an aggregate, or a literal",
                            index + 1
                        ),
                        expr.span,
                    ));
                }
                bindings.insert(expr.id, binding.clone());
                Ok(ResolvedColumn {
                    ty: Some(binding.ty.clone()),
                    value: ColumnValue::GroupKey,
                })
            }
            ExprKind::Call { .. } => {
                let agg =
                    resolve_aggregate_call(expr, scope, aggregates, agg_index, bindings)?;
                let ty = aggregates[agg].result_type();
                Ok(ResolvedColumn {
                    value: ColumnValue::Aggregate(agg),
                    ty: Some(ty),
                })
            }
            _ => match classify_literal(expr) {
                Some(resolved) => Ok(resolved),
                None => Err(CompilerError::with_span(
                    format!(
                        "select column {} must be the grouping column, an aggregate, or a literal",
                        index + 1
                    ),
                    expr.span,
                )),
            },
        }
    }

    /// Resolve an explicit `map` statement and record its stream pair.
    fn resolve_map(
        &mut self,
        map: &pansql_ast::MapStmt,
    ) -> Result<ResolvedMap, CompilerError> {
        let source_dict = self.expect_dict(&map.source.dict)?;
        let source_stream = self.expect_stream(source_dict, &map.source.item)?.clone();
        let dest_dict = self.expect_dict(&map.dest.dict)?;
        let dest_stream = self.expect_stream(dest_dict, &map.dest.item)?.clone();

        if !self.handled_sources.insert(source_stream.name.clone()) {
            return Err(CompilerError::with_span(
                format!("duplicate map for stream '{}'", source_stream.name),
                map.span,
            ));
        }
        if source_stream.name == dest_stream.name {
            self.warnings.push(format!(
                "map from '{}' to '{}' is redundant",
                map.source, map.dest
            ));
        }

        // Field-level correspondence: explicit renames (dest = source)
        // first, then same-named fields.
        let mut renames: HashMap<String, &pansql_ast::Ident> = HashMap::new();
        for entry in &map.fields {
            let (_, dest_field) = dest_stream
                .field_insensitive(&entry.dest.text)
                .ok_or_else(|| {
                    CompilerError::with_span(
                        format!(
                            "stream '{}' has no field named '{}'",
                            dest_stream.name, entry.dest
                        ),
                        entry.dest.span,
                    )
                })?;
            if renames
                .insert(dest_field.name.clone(), &entry.source)
                .is_some()
            {
                return Err(CompilerError::with_span(
                    format!(
                        "field '{}' on stream '{}' is assigned more than once",
                        entry.dest, dest_stream.name
                    ),
                    entry.dest.span,
                ));
            }
        }

        let mut missing = Vec::new();
        for dest_field in &dest_stream.fields {
            let source_field = match renames.get(&dest_field.name) {
                Some(source_name) => {
                    let (_, field) = source_stream
                        .field_insensitive(&source_name.text)
                        .ok_or_else(|| {
                            CompilerError::with_span(
                                format!(
                                    "stream '{}' has no field named '{}'",
                                    source_stream.name, source_name
                                ),
                                source_name.span,
                            )
                        })?;
                    Some(field)
                }
                None => source_stream
                    .field_insensitive(&dest_field.name)
                    .map(|(_, f)| f),
            };
            match source_field {
                Some(field) => {
                    if !field.ty.assignable_to(&dest_field.ty) {
                        return Err(CompilerError::with_span(
                            format!(
                                "field '{}' of type {} is not assignable to field '{}' of type {} on stream '{}'",
                                field.name, field.ty, dest_field.name, dest_field.ty, dest_stream.name
                            ),
                            map.span,
                        ));
                    }
                }
                None => {
                    if !dest_field.ty.nullable {
                        missing.push(dest_field.name.clone());
                    }
                }
            }
        }
        if !missing.is_empty() {
            return Err(CompilerError::with_span(
                format!(
                    "The following field(s) on {} are not nullable, but are not assigned a value: {}",
                    dest_stream.name,
                    missing.join(", ")
                ),
                map.span,
            ));
        }

        Ok(ResolvedMap {
            source_stream: source_stream.name,
            dest_stream: dest_stream.name,
        })
    }
}

/// Column resolution scope: the input stream plus an optional joined
/// table, each addressed by its (case-folded) binding name.
struct Scope<'a> {
    input_name: String,
    input_stream: &'a StreamDefinition,
    join: Option<(String, &'a StreamDefinition)>,
}

impl<'a> Scope<'a> {
    fn resolve_column(&self, column: &ColumnRef) -> Result<ColumnBinding, CompilerError> {
        match &column.qualifier {
            Some(qualifier) => {
                let key = qualifier.key();
                if key == self.input_name {
                    self.lookup(self.input_stream, ColumnOrigin::Input, column)
                } else if let Some((alias, stream)) = &self.join {
                    if key == *alias {
                        self.lookup(stream, ColumnOrigin::Join, column)
                    } else {
                        Err(CompilerError::with_span(
                            format!("unknown table alias '{}'", qualifier),
                            qualifier.span,
                        ))
                    }
                } else {
                    Err(CompilerError::with_span(
                        format!("unknown table alias '{}'", qualifier),
                        qualifier.span,
                    ))
                }
            }
            None => {
                if let Ok(binding) = self.lookup(self.input_stream, ColumnOrigin::Input, column) {
                    return Ok(binding);
                }
                if let Some((_, stream)) = &self.join {
                    if let Ok(binding) = self.lookup(stream, ColumnOrigin::Join, column) {
                        return Ok(binding);
                    }
                }
                Err(CompilerError::with_span(
                    format!("no field named '{}' in scope", column.column),
                    column.column.span,
                ))
            }
        }
    }

    fn lookup(
        &self,
        stream: &StreamDefinition,
        origin: ColumnOrigin,
        column: &ColumnRef,
    ) -> Result<ColumnBinding, CompilerError> {
        let (ordinal, field) = stream.field(&column.column.text).ok_or_else(|| {
            CompilerError::with_span(
                format!(
                    "stream '{}' has no field named '{}'",
                    stream.name, column.column
                ),
                column.column.span,
            )
        })?;
        Ok(ColumnBinding {
            origin,
            ordinal,
            ty: field.ty.clone(),
        })
    }
}

/// Bind every column reference inside a predicate expression.
fn bind_columns(
    expr: &Expr,
    scope: &Scope<'_>,
    bindings: &mut HashMap<ExprId, ColumnBinding>,
) -> Result<(), CompilerError> {
    match &expr.kind {
        ExprKind::Column(column) => {
            let binding = scope.resolve_column(column)?;
            bindings.insert(expr.id, binding);
            Ok(())
        }
        ExprKind::Unary { operand, .. } => bind_columns(operand, scope, bindings),
        ExprKind::Binary { left, right, .. } => {
            bind_columns(left, scope, bindings)?;
            bind_columns(right, scope, bindings)
        }
        ExprKind::Star => Err(CompilerError::with_span(
            "'*' is only valid in count(*)",
            expr.span,
        )),
        ExprKind::Call { func, .. } => Err(CompilerError::with_span(
            format!("'{}' is not allowed here", func),
            expr.span,
        )),
        _ => Ok(()),
    }
}

/// Classify a select column of a plain (non-aggregated) query.
fn classify_plain_column(
    expr: &Expr,
    scope: &Scope<'_>,
    bindings: &mut HashMap<ExprId, ColumnBinding>,
) -> Result<ResolvedColumn, CompilerError> {
    match &expr.kind {
        ExprKind::Column(column) => {
            let binding = scope.resolve_column(column)?;
            bindings.insert(expr.id, binding.clone());
            Ok(ResolvedColumn {
                ty: Some(binding.ty.clone()),
                value: ColumnValue::Column(binding),
            })
        }
        ExprKind::Call { .. } => Err(CompilerError::with_span(
            "aggregate functions require GROUP BY",
            expr.span,
        )),
        _ => classify_literal(expr).ok_or_else(|| {
            CompilerError::with_span("unsupported expression in the select list", expr.span)
        }),
    }
}

/// Classify a literal select column, folding a leading minus.
fn classify_literal(expr: &Expr) -> Option<ResolvedColumn> {
    match &expr.kind {
        ExprKind::Int(value) => Some(ResolvedColumn {
            value: ColumnValue::LiteralInt(*value),
            ty: Some(FieldType::plain(TypeTag::Int)),
        }),
        ExprKind::Decimal(text) => Some(ResolvedColumn {
            value: ColumnValue::LiteralDecimal(text.clone()),
            ty: Some(FieldType::plain(TypeTag::Decimal)),
        }),
        ExprKind::Str(text) => Some(ResolvedColumn {
            value: ColumnValue::LiteralString(text.clone()),
            ty: Some(FieldType::plain(TypeTag::Varchar)),
        }),
        ExprKind::Null => Some(ResolvedColumn {
            value: ColumnValue::LiteralNull,
            ty: None,
        }),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ExprKind::Int(value) => Some(ResolvedColumn {
                value: ColumnValue::LiteralInt(-value),
                ty: Some(FieldType::plain(TypeTag::Int)),
            }),
            ExprKind::Decimal(text) => Some(ResolvedColumn {
                value: ColumnValue::LiteralDecimal(format!("-{}", text)),
                ty: Some(FieldType::plain(TypeTag::Decimal)),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Resolve an aggregate call, reusing a structurally identical aggregator
/// when one exists.
fn resolve_aggregate_call(
    expr: &Expr,
    scope: &Scope<'_>,
    aggregates: &mut Vec<ResolvedAggregate>,
    agg_index: &mut HashMap<ExprId, usize>,
    bindings: &mut HashMap<ExprId, ColumnBinding>,
) -> Result<usize, CompilerError> {
    let (func, args) = match &expr.kind {
        ExprKind::Call { func, args } => (func, args),
        _ => {
            return Err(CompilerError::with_span(
                "expected an aggregate call",
                expr.span,
            ));
        }
    };
    let kind = AggKind::from_name(&func.text).ok_or_else(|| {
        CompilerError::with_span(format!("unknown function '{}'", func), func.span)
    })?;

    let value = match args.as_slice() {
        [arg] => match &arg.kind {
            ExprKind::Star => {
                if kind != AggKind::Count {
                    return Err(CompilerError::with_span(
                        "'*' is only valid in count(*)",
                        arg.span,
                    ));
                }
                None
            }
            ExprKind::Column(column) => {
                let binding = scope.resolve_column(column)?;
                bindings.insert(arg.id, binding.clone());
                Some(binding)
            }
            _ => {
                return Err(CompilerError::with_span(
                    "aggregate functions take a single column argument",
                    arg.span,
                ));
            }
        },
        _ => {
            return Err(CompilerError::with_span(
                "aggregate functions take a single column argument",
                expr.span,
            ));
        }
    };

    let existing = aggregates.iter().position(|agg| {
        agg.kind == kind
            && match (&agg.value, &value) {
                (None, None) => true,
                (Some(a), Some(b)) => a.origin == b.origin && a.ordinal == b.ordinal,
                _ => false,
            }
    });
    let index = match existing {
        Some(index) => index,
        None => {
            aggregates.push(ResolvedAggregate { kind, value });
            aggregates.len() - 1
        }
    };
    agg_index.insert(expr.id, index);
    Ok(index)
}

/// Resolve a HAVING predicate: aggregates and the grouping column only.
fn resolve_having(
    expr: &Expr,
    scope: &Scope<'_>,
    key_ordinal: usize,
    aggregates: &mut Vec<ResolvedAggregate>,
    agg_index: &mut HashMap<ExprId, usize>,
    bindings: &mut HashMap<ExprId, ColumnBinding>,
) -> Result<(), CompilerError> {
    match &expr.kind {
        ExprKind::Call { .. } => {
            resolve_aggregate_call(expr, scope, aggregates, agg_index, bindings)?;
            Ok(())
        }
        ExprKind::Column(column) => {
            let binding = scope.resolve_column(column)?;
            if binding.origin != ColumnOrigin::Input || binding.ordinal != key_ordinal {
                return Err(CompilerError::with_span(
                    format!(
                        "HAVING may only reference the grouping column and aggregates, not '{}'",
                        column
                    ),
                    column.span(),
                ));
            }
            bindings.insert(expr.id, binding);
            Ok(())
        }
        ExprKind::Unary { operand, .. } => {
            resolve_having(operand, scope, key_ordinal, aggregates, agg_index, bindings)
        }
        ExprKind::Binary { left, right, .. } => {
            resolve_having(left, scope, key_ordinal, aggregates, agg_index, bindings)?;
            resolve_having(right, scope, key_ordinal, aggregates, agg_index, bindings)
        }
        ExprKind::Star => Err(CompilerError::with_span(
            "'*' is only valid in count(*)",
            expr.span,
        )),
        _ => Ok(()),
    }
}

/// Validate the projection against the destination stream and compute the
/// destination-ordered slot assignments.
fn check_projection(
    select: &SelectStmt,
    query_columns: &[pansql_ast::SelectColumn],
    columns: &[ResolvedColumn],
    dest: &StreamDefinition,
) -> Result<Vec<SlotAssign>, CompilerError> {
    let mut assigned: Vec<Option<usize>> = vec![None; dest.fields.len()];

    for (index, (query_column, resolved)) in query_columns.iter().zip(columns).enumerate() {
        let name = query_column.output_name().ok_or_else(|| {
            CompilerError::with_span(
                format!(
                    "column {} of select into '{}' requires an alias",
                    index + 1,
                    select.into
                ),
                query_column.expr.span,
            )
        })?;
        let (ordinal, dest_field) = dest.field_insensitive(name).ok_or_else(|| {
            CompilerError::with_span(
                format!(
                    "the destination stream '{}' has no field named '{}'",
                    dest.name, name
                ),
                query_column.expr.span,
            )
        })?;
        if assigned[ordinal].is_some() {
            return Err(CompilerError::with_span(
                format!(
                    "field '{}' on stream '{}' is assigned more than once",
                    dest_field.name, dest.name
                ),
                query_column.expr.span,
            ));
        }

        match &resolved.ty {
            Some(ty) => {
                if !ty.assignable_to(&dest_field.ty) {
                    return Err(CompilerError::with_span(
                        format!(
                            "column '{}' of type {} is not assignable to field '{}' of type {} on stream '{}'",
                            name, ty, dest_field.name, dest_field.ty, dest.name
                        ),
                        query_column.expr.span,
                    ));
                }
            }
            // NULL literal: destination must admit it.
            None => {
                if !dest_field.ty.nullable {
                    return Err(CompilerError::with_span(
                        format!(
                            "cannot assign NULL to non-nullable field '{}' on stream '{}'",
                            dest_field.name, dest.name
                        ),
                        query_column.expr.span,
                    ));
                }
            }
        }
        assigned[ordinal] = Some(index);
    }

    let mut missing = Vec::new();
    let mut slots = Vec::with_capacity(dest.fields.len());
    for (field, slot) in dest.fields.iter().zip(&assigned) {
        match slot {
            Some(index) => slots.push(SlotAssign::Column(*index)),
            None => {
                if field.ty.nullable {
                    slots.push(SlotAssign::Null);
                } else {
                    missing.push(field.name.clone());
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(CompilerError::with_span(
            format!(
                "The following field(s) on {} are not nullable, but are not assigned a value: {}",
                dest.name,
                missing.join(", ")
            ),
            select.span,
        ));
    }

    Ok(slots)
}
