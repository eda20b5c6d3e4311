//! End-to-end compilation tests over fixture dictionaries.

use pansql_compiler::{
    compile, compile_files, compile_sources, load_sources, render_error, CompileOutput,
};
use pansql_dict::{DataDictionary, FieldDefinition, FieldType, StreamDefinition, TypeTag};
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

/// Write the fixture dictionaries into a temp dir and compile the script.
fn run(source: &str) -> Result<(CompileOutput, TempDir), pansql_compiler::CompilerError> {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("src.json"), source_dict().to_json()).unwrap();
    std::fs::write(dir.path().join("dst.json"), dest_dict().to_json()).unwrap();
    let script_name = dir.path().join("test.pansql").display().to_string();
    compile(&script_name, source).map(|output| (output, dir))
}

const PRELUDE: &str = "\
load src 'src.json'
load dst 'dst.json'
open r as MSSQL for read with src, 'Server=.;Database=demo'
open w as Postgres for write with dst, 'Host=localhost'
";

const JOIN_SCRIPT: &str = "\
stream users as src.users
table types as src.UserTypes
stream users2 as dst.users2
select u.id, u.name, u.address, t.name as type from users u join types t on u.typeId = t.Id into users2
map src.Orders to dst.OrderData
sync r to w
";

#[test]
fn test_clean_join_emission() {
    let script = format!("{PRELUDE}{JOIN_SCRIPT}");
    let (output, _dir) = run(&script).expect("compilation should succeed");
    let code = &output.code;

    // Row-record loader and primary-key unique index for the table.
    assert!(code.contains("private sealed record UserTypes_(int Id, string Name);"));
    assert!(code.contains("private readonly Dictionary<int, UserTypes_> _tbl_types = new();"));

    // Loader inserts rows; the join transformer probes the index and
    // skips on miss.
    assert!(code.contains("private IEnumerable<object?[]> Transformer__1(IDataReader r)"));
    assert!(code.contains("private IEnumerable<object?[]> Transformer__2(IDataReader r)"));
    assert!(code.contains("if (!_tbl_types.TryGetValue(r.GetInt32(3), out var types__3))"));

    // A 6-slot record with the null sentinel for trailing nullable fields.
    assert!(code.contains("var result = new object?[6];"));
    assert!(code.contains("result[4] = DBNull.Value;"));
    assert!(code.contains("result[5] = DBNull.Value;"));
    assert!(code.contains("result[3] = types__3.Name;"));

    // Registrations and name maps.
    assert!(code.contains("_streamDict.Add(StreamDescription.Parse(\"UserTypes\"), Transformer__1);"));
    assert!(code.contains("_streamDict.Add(StreamDescription.Parse(\"users\"), Transformer__2);"));
    assert!(code.contains(
        "_nameMap.Add(StreamDescription.Parse(\"users\"), StreamDescription.Parse(\"users2\"));"
    ));
    assert!(code.contains(
        "_nameMap.Add(StreamDescription.Parse(\"Orders\"), StreamDescription.Parse(\"OrderData\"));"
    ));
}

#[test]
fn test_manifests_list_referenced_connectors() {
    let script = format!("{PRELUDE}{JOIN_SCRIPT}");
    let (output, _dir) = run(&script).expect("compilation should succeed");

    assert!(output
        .project_file
        .contains("<PackageReference Include=\"Pansynchro.Core\" Version=\"*\" />"));
    assert!(output
        .project_file
        .contains("Pansynchro.Connectors.MSSQL"));
    assert!(output
        .project_file
        .contains("Pansynchro.Connectors.Postgres"));

    assert!(output.connectors.contains("\"name\": \"MSSQL\""));
    assert!(output.connectors.contains("\"name\": \"Postgres\""));
    assert!(output.connectors.contains("\"Queryable\""));
}

#[test]
fn test_emission_is_deterministic() {
    let script = format!("{PRELUDE}{JOIN_SCRIPT}");
    let (first, _dir1) = run(&script).expect("first compilation");
    let (second, _dir2) = run(&script).expect("second compilation");
    assert_eq!(first.code, second.code);
    assert_eq!(first.project_file, second.project_file);
    assert_eq!(first.connectors, second.connectors);
}

#[test]
fn test_emitted_source_is_structurally_balanced() {
    let script = format!("{PRELUDE}{JOIN_SCRIPT}");
    let (output, _dir) = run(&script).expect("compilation should succeed");
    let opens = output.code.matches('{').count();
    let closes = output.code.matches('}').count();
    assert_eq!(opens, closes);
    assert!(output.code.ends_with("}\n"));
}

#[test]
fn test_unmapped_stream_warning() {
    let script = format!("{PRELUDE}{JOIN_SCRIPT}");
    let (output, _dir) = run(&script).expect("compilation should succeed");
    assert!(output.warnings.iter().any(|w| w.contains("'products'")));
}

#[test]
fn test_missing_non_nullable_field_fails() {
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
fn test_duplicate_stream_consumption_fails() {
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
fn test_order_by_on_stream_fails() {
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
fn test_filter_over_int_column() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor from products p where p.Vendor = 1 into products2
sync r to w
"
    );
    let (output, _dir) = run(&script).expect("compilation should succeed");
    assert!(output.code.contains("if (!(r.GetInt32(2) == 1))"));
    assert!(output.code.contains("continue;"));
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
    let (output, _dir) = run(&script).expect("compilation should succeed");
    let code = &output.code;

    // Two aggregators in declaration order, combined deterministically.
    assert!(code.contains("var aggregator__2 = new MaxAggregator<int, decimal>();"));
    assert!(code.contains("var aggregator__3 = new CountAggregator<int>();"));
    assert!(code.contains("AggregateHelper.Combine(aggregator__2, aggregator__3)"));

    // Slots assigned in declaration order from the combined tuple.
    assert!(code.contains("result[0] = key__4;"));
    assert!(code.contains("result[1] = values__5.Item1;"));
    assert!(code.contains("result[2] = values__5.Item2;"));

    // count over a nullable column only counts present values.
    assert!(code.contains("if (!r.IsDBNull(3))"));
}

#[test]
fn test_having_skips_small_groups() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, max(p.Price) as MaxPrice from products p group by Vendor having count(*) > 5 into products2
sync r to w
"
    );
    let (output, _dir) = run(&script).expect("compilation should succeed");
    assert!(output.code.contains("if (!(values__5.Item2 > 5))"));
}

#[test]
fn test_literal_slot_hoisted_out_of_aggregation() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, max(p.Price) as MaxPrice, 10 Quantity from products p group by Vendor into products2
sync r to w
"
    );
    let (output, _dir) = run(&script).expect("compilation should succeed");
    let code = &output.code;
    let hoist = code.find("result[2] = 10;").expect("literal slot hoisted");
    let row_loop = code.find("while (r.Read())").expect("row loop present");
    assert!(
        hoist < row_loop,
        "literal must be assigned once, before the row loop"
    );
}

#[test]
fn test_single_aggregate_uses_results_directly() {
    let script = format!(
        "{PRELUDE}\
stream products as src.products
stream products2 as dst.products2
select p.Vendor, max(p.Price) as MaxPrice from products p group by Vendor into products2
sync r to w
"
    );
    let (output, _dir) = run(&script).expect("compilation should succeed");
    assert!(output.code.contains("aggregator__2.Results()"));
    assert!(!output.code.contains("AggregateHelper.Combine"));
}

#[test]
fn test_network_pair_shares_handoff_file() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("src.json"), source_dict().to_json()).unwrap();
    std::fs::write(dir.path().join("dst.json"), dest_dict().to_json()).unwrap();

    let writer_script = "\
load src 'src.json'
load dst 'dst.json'
open r as MSSQL for read with src, 'Server=.;Database=demo'
open w as Network for write with dst, '127.0.0.1'
sync r to w
";
    let reader_script = "\
load near 'dst.json'
load far 'dst.json'
open r as Network for read with near, '127.0.0.1'
open w as Postgres for write with far, 'Host=elsewhere'
sync r to w
";
    std::fs::write(dir.path().join("writer.pansql"), writer_script).unwrap();
    std::fs::write(dir.path().join("reader.pansql"), reader_script).unwrap();

    let outputs = compile_files(dir.path(), &["writer.pansql", "reader.pansql"])
        .expect("network pair should compile");
    assert_eq!(outputs.len(), 2);

    let writer_code = &outputs[0].code;
    let reader_code = &outputs[1].code;

    // Both sides carry the handoff file path as their first generated
    // local.
    let extract_filename = |code: &str| -> String {
        let start = code.find("var filename__1 = ").expect("filename local") + 18;
        let end = code[start..].find(';').expect("terminated") + start;
        code[start..end].to_string()
    };
    let writer_path = extract_filename(writer_code);
    let reader_path = extract_filename(reader_code);
    assert_eq!(writer_path, reader_path);

    // Writer saves the destination dictionary; reader receives it and
    // passes it downstream.
    assert!(writer_code.contains(".ToCompressedString());"));
    assert!(reader_code.contains("File.ReadAllText(filename__1)"));
    assert!(writer_code.contains("127.0.0.1;"));
    assert!(reader_code.contains("127.0.0.1;"));

    // The handoff file already carries the destination dictionary.
    let path = writer_path.trim_matches('"').replace("\\\\", "\\");
    let blob = std::fs::read_to_string(&path).expect("handoff file written");
    let dict = DataDictionary::from_compressed_string(&blob).expect("valid wire form");
    assert_eq!(dict.name, "dst");
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_multi_script_error_reports_the_failing_script() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("src.json"), source_dict().to_json()).unwrap();
    std::fs::write(dir.path().join("dst.json"), dest_dict().to_json()).unwrap();

    let good_script = "\
load src 'src.json'
load dst 'dst.json'
open r as MSSQL for read with src, 'Server=.'
open w as Postgres for write with dst, 'Host=x'
sync r to w
";
    // The error sits in the second script, on line 2.
    let bad_script = "\
load src 'src.json'
stream nope as src.Nope
sync r to w
";
    std::fs::write(dir.path().join("good.pansql"), good_script).unwrap();
    std::fs::write(dir.path().join("bad.pansql"), bad_script).unwrap();

    let sources = load_sources(dir.path(), &["good.pansql", "bad.pansql"])
        .expect("scripts should load");
    let err = compile_sources(&sources).unwrap_err();
    assert_eq!(err.message, "dictionary 'src' has no stream named 'Nope'");

    let rendered = render_error(&sources, &err);
    assert!(
        rendered.contains("bad.pansql:2:"),
        "error should name the failing script and line, got: {}",
        rendered
    );
    assert!(rendered.contains("has no stream named 'Nope'"));
}

#[test]
fn test_unpaired_network_writer_fails() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("src.json"), source_dict().to_json()).unwrap();
    std::fs::write(dir.path().join("dst.json"), dest_dict().to_json()).unwrap();

    let writer_script = "\
load src 'src.json'
load dst 'dst.json'
open r as MSSQL for read with src, 'Server=.'
open w as Network for write with dst, '127.0.0.1'
sync r to w
";
    let other_script = "\
load src 'src.json'
load dst 'dst.json'
open r as MSSQL for read with src, 'Server=.'
open w as Postgres for write with dst, 'Host=x'
sync r to w
";
    std::fs::write(dir.path().join("writer.pansql"), writer_script).unwrap();
    std::fs::write(dir.path().join("other.pansql"), other_script).unwrap();

    let err = compile_files(dir.path(), &["writer.pansql", "other.pansql"]).unwrap_err();
    assert_eq!(err.message, "no matching Network reader found for writer 'w'");
}

#[test]
fn test_typed_accessors_match_field_tags() {
    let script = format!(
        "{PRELUDE}\
stream users as src.users
stream users2 as dst.users2
select u.id, u.name, u.address from users u into users2
sync r to w
"
    );
    let (output, _dir) = run(&script).expect("compilation should succeed");
    let code = &output.code;
    assert!(code.contains("result[0] = r.GetInt32(0);"));
    assert!(code.contains("result[1] = r.GetString(1);"));
    assert!(code.contains("result[2] = r.IsDBNull(2) ? (object?)DBNull.Value : r.GetString(2);"));
}
