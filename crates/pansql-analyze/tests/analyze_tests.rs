//! Semantic analysis tests over in-memory fixture dictionaries.

use pansql_analyze::{analyze, link, AggKind, Analysis, ColumnOrigin, SlotAssign};
use pansql_ast::CompilerError;
use pansql_dict::{DataDictionary, FieldDefinition, FieldType, StreamDefinition, TypeTag};
use pansql_parser::{lex, parse_script};
use tempfile::TempDir;

fn field(name: &str, tag: TypeTag) -> FieldDefinition {
    FieldDefinition {
        name: name.into(),
        ty: FieldType::plain(tag),
    }
}

fn nullable_field(name: &str, tag: TypeTag) -> FieldDefinition {
    FieldDefinition {
        name: name.into(),
        ty: FieldType::nullable(tag),
    }
}

fn stream(name: &str, fields: Vec<FieldDefinition>, key: &[&str]) -> StreamDefinition {
    StreamDefinition {
        name: name.into(),
        schema: None,
        fields,
        primary_key: key.iter().map(|k| k.to_string()).collect(),
    }
}

/// The source dictionary used by most tests.
fn source_dict() -> DataDictionary {
    DataDictionary {
        name: "src".into(),
        streams: vec![
            stream(
                "users",
                vec![
                    field("id", TypeTag::Int),
                    field("name", TypeTag::Varchar),
                    nullable_field("address", TypeTag::Varchar),
                    field("typeId", TypeTag::Int),
                ],
                &["id"],
            ),
            stream(
                "UserTypes",
                vec![field("Id", TypeTag::Int), field("Name", TypeTag::Varchar)],
                &["Id"],
            ),
            stream(
                "Orders",
                vec![field("Id", TypeTag::Int), field("Amount", TypeTag::Decimal)],
                &["Id"],
            ),
            stream(
                "products",
                vec![
                    field("Id", TypeTag::Int),
                    field("Name", TypeTag::Varchar),
                    field("Vendor", TypeTag::Int),
                    nullable_field("Price", TypeTag::Decimal),
                ],
                &["Id"],
            ),
        ],
    }
}

/// The destination dictionary used by most tests.
fn dest_dict() -> DataDictionary {
    DataDictionary {
        name: "dst".into(),
        streams: vec![
            stream(
                "users2",
                vec![
                    field("Id", TypeTag::Int),
                    field("Name", TypeTag::Varchar),
                    nullable_field("Address", TypeTag::Varchar),
                    nullable_field("Type", TypeTag::Varchar),
                    nullable_field("Extra1", TypeTag::Varchar),
                    nullable_field("Extra2", TypeTag::Varchar),
                ],
                &["Id"],
            ),
            stream(
                "OrderData",
                vec![field("Id", TypeTag::Int), field("Amount", TypeTag::Decimal)],
                &["Id"],
            ),
            stream(
                "products2",
                vec![
                    field("Vendor", TypeTag::Int),
                    nullable_field("MaxPrice", TypeTag::Decimal),
                    nullable_field("Quantity", TypeTag::Int),
                ],
                &["Vendor"],
            ),
        ],
    }
}

/// Write the fixture dictionaries and analyze a script against them.
fn run(source: &str) -> Result<Analysis, CompilerError> {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("src.json"), source_dict().to_json()).unwrap();
    std::fs::write(dir.path().join("dst.json"), dest_dict().to_json()).unwrap();
    let tokens = lex(source).expect("lexing failed");
    let script = parse_script("test.pansql", &tokens, 0).expect("parse failed");
    analyze(&script, dir.path())
}

const PRELUDE: &str = "\
load src 'src.json'
load dst 'dst.json'
open r as MSSQL for read with src, 'cs'
open w as Postgres for write with dst, 'cd'
";

#[test]
fn test_clean_join_select_resolves() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
table types as src.UserTypes
stream users2 as dst.users2
select u.id, u.name, u.address, t.name as type from users u join types t on u.typeId = t.Id into users2
sync r to w
"
    );
    let analysis = run(&script).expect("analysis should succeed");
    assert_eq!(analysis.selects.len(), 1);

    let select = &analysis.selects[0];
    assert_eq!(select.input.stream_name, "users");
    assert_eq!(select.output.stream_name, "users2");

    let join = select.join.as_ref().expect("join should resolve");
    assert_eq!(join.probe.origin, ColumnOrigin::Input);
    assert_eq!(join.probe.ordinal, 3); // typeId
    assert!(analysis.tables[join.table].used);

    // Slots: 4 projected columns plus two trailing nullable fillers.
    assert_eq!(select.slots.len(), 6);
    assert_eq!(select.slots[0], SlotAssign::Column(0));
    assert_eq!(select.slots[3], SlotAssign::Column(3));
    assert_eq!(select.slots[4], SlotAssign::Null);
    assert_eq!(select.slots[5], SlotAssign::Null);
}

#[test]
fn test_missing_non_nullable_field() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
table types as src.UserTypes
stream users2 as dst.users2
select u.name, u.address, t.name as type from users u join types t on u.typeId = t.Id into users2
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(
        err.message,
        "The following field(s) on users2 are not nullable, but are not assigned a value: Id"
    );
}

#[test]
fn test_duplicate_stream_consumption() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
stream users2 as dst.users2
select u.id, u.name from users u into users2
select u.id, u.name from users u into users2
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(
        err.message,
        "The stream 'users' has already been processed. Streams may only be used once."
    );
}

#[test]
fn test_table_declaration_allows_reuse() {
    let script = format!(
        "{PRELUDE}\
table users as src.users
stream users2 as dst.users2
select u.id, u.name from users u into users2
select u.id, u.name from users u into users2
sync r to w
"
    );
    let analysis = run(&script).expect("table inputs may be consumed twice");
    assert_eq!(analysis.selects.len(), 2);
}

#[test]
fn test_order_by_rejected_on_stream_input() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor from products p order by p.Vendor into products2
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(
        err.message,
        "ORDER BY is not supported for queries involving a STREAM input."
    );
}

#[test]
fn test_order_by_allowed_on_table_input() {
    let script = format!(
        "{PRELUDE}\
table products as src.products
stream products2 as dst.products2
select p.Vendor from products p order by p.Vendor into products2
sync r to w
"
    );
    let analysis = run(&script).expect("table inputs support ORDER BY");
    assert_eq!(analysis.selects[0].order_by.len(), 1);
    assert_eq!(analysis.selects[0].order_by[0].ordinal, 2);
}

#[test]
fn test_join_against_stream_rejected() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
stream types as src.UserTypes
stream users2 as dst.users2
select u.id, u.name from users u join types t on u.typeId = t.Id into users2
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(
        err.message,
        "the right-hand side of a JOIN must be declared as a TABLE"
    );
}

#[test]
fn test_join_key_must_match_primary_key() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
table types as src.UserTypes
stream users2 as dst.users2
select u.id, u.name from users u join types t on u.typeId = t.Name into users2
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(
        err.message,
        "JOIN key 'Name' does not match the primary key of table 'types'"
    );
}

#[test]
fn test_duplicate_declaration() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
stream Users as src.users
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(err.message, "the name 'Users' has already been declared");
}

#[test]
fn test_unknown_dictionary_stream() {
    let script = format!(
        "{PRELUDE}\
stream nope as src.Nope
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(err.message, "dictionary 'src' has no stream named 'Nope'");
}

#[test]
fn test_group_by_with_multiple_aggregates() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, max(p.Price) as MaxPrice, count(p.Price) as Quantity from products p group by Vendor into products2
sync r to w
"
    );
    let analysis = run(&script).expect("aggregation should resolve");
    let select = &analysis.selects[0];
    assert_eq!(select.aggregates.len(), 2);
    assert_eq!(select.aggregates[0].kind, AggKind::Max);
    assert_eq!(select.aggregates[1].kind, AggKind::Count);
    assert_eq!(select.group_key.as_ref().unwrap().ordinal, 2);
}

#[test]
fn test_having_reuses_matching_aggregate() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, count(*) as Quantity from products p group by Vendor having count(*) > 5 into products2
sync r to w
"
    );
    let analysis = run(&script).expect("having should resolve");
    // count(*) in the projection and in HAVING share one aggregator.
    assert_eq!(analysis.selects[0].aggregates.len(), 1);
}

#[test]
fn test_having_introduces_new_aggregate() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, max(p.Price) as MaxPrice from products p group by Vendor having count(*) > 5 into products2
sync r to w
"
    );
    let analysis = run(&script).expect("having should resolve");
    let select = &analysis.selects[0];
    assert_eq!(select.aggregates.len(), 2);
    assert_eq!(select.aggregates[1].kind, AggKind::Count);
    assert!(select.aggregates[1].value.is_none());
}

#[test]
fn test_aggregate_without_group_by_rejected() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, max(p.Price) as MaxPrice from products p into products2
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(err.message, "aggregate functions require GROUP BY");
}

#[test]
fn test_abort_statement_fails_compilation() {
    let err = run("abort 'fixture failure'").unwrap_err();
    assert_eq!(err.message, "fixture failure");
}

#[test]
fn test_missing_sync_rejected() {
    let err = run(PRELUDE).unwrap_err();
    assert_eq!(err.message, "script declares no sync command");
}

#[test]
fn test_explicit_map_and_auto_map() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
table types as src.UserTypes
stream users2 as dst.users2
select u.id, u.name, u.address, t.name as type from users u join types t on u.typeId = t.Id into users2
map src.Orders to dst.OrderData
sync r to w
"
    );
    let analysis = run(&script).expect("analysis should succeed");
    let linkage = link(&analysis).expect("link should succeed");

    assert_eq!(
        linkage.name_maps,
        vec![
            ("users".to_string(), "users2".to_string()),
            ("Orders".to_string(), "OrderData".to_string()),
        ]
    );
    // `products` has no output counterpart: warned, not mapped.
    assert!(linkage.auto_maps.is_empty());
    assert!(linkage
        .warnings
        .iter()
        .any(|w| w.contains("'products'")));
}

#[test]
fn test_duplicate_map_rejected() {
    let script = format!(
        "{PRELUDE}\
map src.Orders to dst.OrderData
map src.Orders to dst.OrderData
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(err.message, "duplicate map for stream 'Orders'");
}

#[test]
fn test_map_field_rename_resolves() {
    let script = format!(
        "{PRELUDE}\
map src.Orders to dst.OrderData with (Amount = Amount, Id = Id)
sync r to w
"
    );
    let analysis = run(&script).expect("map with renames should resolve");
    assert_eq!(analysis.maps[0].source_stream, "Orders");
    assert_eq!(analysis.maps[0].dest_stream, "OrderData");
}

#[test]
fn test_top_level_names_are_case_insensitive() {
    let script = format!(
        "{PRELUDE}\
stream users as SRC.users
stream users2 as DST.users2
select u.id, u.name from USERS u into USERS2
sync R to W
"
    );
    let analysis = run(&script).expect("case-insensitive resolution should succeed");
    assert_eq!(analysis.selects.len(), 1);
}

#[test]
fn test_dictionary_stream_names_are_case_sensitive() {
    let script = format!(
        "{PRELUDE}\
stream users as src.USERS
sync r to w
"
    );
    let err = run(&script).unwrap_err();
    assert_eq!(err.message, "dictionary 'src' has no stream named 'USERS'");
}
