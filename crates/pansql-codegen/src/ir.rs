//! Transformer and program IR.
//!
//! Built once by the transformation builder and consumed only by the
//! emitter. Slot emission order is syntactic; aggregators are numbered in
//! declaration order; constant slots are hoisted out of the row loop.

use pansql_analyze::AggKind;
use pansql_ast::{BinaryOp, Direction, UnaryOp};
use pansql_dict::TypeTag;

/// A literal value carried into the emitted program verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    /// Source-form decimal text
    Decimal(String),
    Str(String),
    /// The null sentinel (`DBNull`)
    Null,
}

/// Access to one column of the transformer's input row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAccess {
    pub ordinal: usize,
    pub tag: TypeTag,
    pub nullable: bool,
}

/// Which half of an aggregator's `(key, value)` output a slot reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggPart {
    Key,
    Value,
}

/// One output slot of a transformer, in destination-field order.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Read from the input row with a typed accessor
    ReaderColumn(ColumnAccess),
    /// Constant, assigned once before the row loop
    ConstLiteral(Literal),
    /// Read from the joined table's bound tuple
    JoinColumn {
        field: usize,
        tag: TypeTag,
        nullable: bool,
    },
    /// Read from an aggregator's output
    AggregatorOutput { index: usize, part: AggPart },
}

/// Predicate / scalar expression over transformer inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum PredExpr {
    ReaderColumn(ColumnAccess),
    JoinColumn {
        field: usize,
        tag: TypeTag,
        nullable: bool,
    },
    AggregatorOutput { index: usize, part: AggPart },
    Const(Literal),
    Unary {
        op: UnaryOp,
        operand: Box<PredExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<PredExpr>,
        right: Box<PredExpr>,
    },
}

/// How a join treats a missing probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Inner join: rows without a matching tuple are skipped
    InnerSkipIfMissing,
}

/// A unique-index probe against a materialized table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinIr {
    /// Index into `ProgramIr::tables`
    pub table: usize,
    /// Input column whose value probes the index
    pub probe: ColumnAccess,
    pub policy: JoinPolicy,
}

/// One aggregator of an aggregation plan.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorIr {
    pub kind: AggKind,
    /// The shared group key column
    pub key: ColumnAccess,
    /// The aggregated column; `None` for `count(*)`
    pub value: Option<ColumnAccess>,
}

/// A streaming aggregation plan: ordered aggregators plus the combine
/// rule (pairs are yielded in the first aggregator's key order).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationIr {
    pub aggregators: Vec<AggregatorIr>,
    pub having: Option<PredExpr>,
}

/// Where a row transformer reads its rows from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputIr {
    /// The stream's data reader
    Reader,
    /// A materialized table (random access; supports ordering)
    Table {
        table: usize,
        /// Field ordinals to order the iteration by
        order_by: Vec<usize>,
    },
}

/// A per-row transformation plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPlan {
    pub input: InputIr,
    /// Destination arity (slot count)
    pub arity: usize,
    pub slots: Vec<Slot>,
    /// Indices of slots assigned once before the row loop
    pub hoisted: Vec<usize>,
    pub filter: Option<PredExpr>,
    pub join: Option<JoinIr>,
    pub aggregation: Option<AggregationIr>,
}

/// What a transformer does with its input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformerKind {
    /// Load the input stream into a table's unique index; yield no rows
    TableLoad { table: usize },
    /// Produce output rows per the plan
    Rows(RowPlan),
}

/// One registered transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerIr {
    /// Qualified input stream name used for registration
    pub input_stream: String,
    /// Output stream name; `None` for table loaders
    pub output_stream: Option<String>,
    pub kind: TransformerKind,
}

/// One field of a materialized table's row record.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFieldIr {
    pub name: String,
    pub tag: TypeTag,
    pub nullable: bool,
}

/// A materialized table: row record type plus a primary-key index.
#[derive(Debug, Clone, PartialEq)]
pub struct TableIr {
    pub var_name: String,
    /// Emitted record type name
    pub record_name: String,
    /// Emitted index field name
    pub index_field: String,
    pub fields: Vec<TableFieldIr>,
    /// Key field ordinal
    pub key: usize,
    /// Whether any transformer references this table
    pub used: bool,
}

/// One `open` endpoint record.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenIr {
    pub var_name: String,
    pub connector: String,
    pub direction: Direction,
    pub conn_str: String,
    /// Network handoff file, set by the multi-script network pass
    pub dict_file: Option<String>,
}

/// The sync edge: indices into `ProgramIr::opens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncIr {
    pub reader: usize,
    pub writer: usize,
}

/// Whole-script program IR.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramIr {
    pub script_name: String,
    pub tables: Vec<TableIr>,
    pub transformers: Vec<TransformerIr>,
    /// `source -> destination` renames registered on the Sync class
    pub name_maps: Vec<(String, String)>,
    /// Identity pass-through pairs (validated; no code emitted)
    pub auto_maps: Vec<(String, String)>,
    pub opens: Vec<OpenIr>,
    pub sync: SyncIr,
    /// Compressed wire form of the source dictionary
    pub source_dict: String,
    /// Compressed wire form of the destination dictionary
    pub dest_dict: String,
    /// Referenced connector names, first-reference order, deduplicated
    pub connectors: Vec<String>,
}
