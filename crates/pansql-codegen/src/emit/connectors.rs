//! Connectors manifest emitter.
//!
//! The compiler never loads connectors; it only records their names,
//! capabilities, and assembly references so the emitted program's host
//! can resolve them.

use crate::ir::ProgramIr;
use serde::Serialize;

#[derive(Serialize)]
struct ConnectorsManifest<'a> {
    connectors: Vec<ConnectorEntry<'a>>,
}

#[derive(Serialize)]
struct ConnectorEntry<'a> {
    name: &'a str,
    capabilities: Vec<&'static str>,
    assembly: String,
}

/// Capabilities and assembly for the connectors this compiler knows
/// about. Unknown connectors default to reader/writer support with a
/// conventional assembly name.
struct ConnectorInfo {
    name: &'static str,
    assembly: &'static str,
    capabilities: &'static [&'static str],
}

const ALL: &[&str] = &["Analyzer", "Reader", "Writer", "Configurator", "Queryable"];
const READ_WRITE: &[&str] = &["Reader", "Writer"];

const KNOWN_CONNECTORS: &[ConnectorInfo] = &[
    ConnectorInfo {
        name: "MSSQL",
        assembly: "Pansynchro.Connectors.MSSQL",
        capabilities: ALL,
    },
    ConnectorInfo {
        name: "Postgres",
        assembly: "Pansynchro.Connectors.Postgres",
        capabilities: ALL,
    },
    ConnectorInfo {
        name: "MySQL",
        assembly: "Pansynchro.Connectors.MySQL",
        capabilities: &["Analyzer", "Reader", "Writer", "Queryable"],
    },
    ConnectorInfo {
        name: "SQLite",
        assembly: "Pansynchro.Connectors.Sqlite",
        capabilities: ALL,
    },
    ConnectorInfo {
        name: "CSV",
        assembly: "Pansynchro.Connectors.TextFile",
        capabilities: &["Reader", "Writer", "Configurator"],
    },
    ConnectorInfo {
        name: "Files",
        assembly: "Pansynchro.Connectors.Files",
        capabilities: &["Reader", "Writer", "Configurator"],
    },
    ConnectorInfo {
        name: "Network",
        assembly: "Pansynchro.Connectors.Network",
        capabilities: READ_WRITE,
    },
];

fn lookup(name: &str) -> Option<&'static ConnectorInfo> {
    KNOWN_CONNECTORS
        .iter()
        .find(|info| info.name.eq_ignore_ascii_case(name))
}

/// The assembly backing a connector name.
pub fn connector_assembly(name: &str) -> String {
    match lookup(name) {
        Some(info) => info.assembly.to_string(),
        None => format!("Pansynchro.Connectors.{}", name),
    }
}

/// Render the connectors manifest as pretty-printed JSON.
pub fn emit_connectors(ir: &ProgramIr) -> String {
    let manifest = ConnectorsManifest {
        connectors: ir
            .connectors
            .iter()
            .map(|name| ConnectorEntry {
                name,
                capabilities: match lookup(name) {
                    Some(info) => info.capabilities.to_vec(),
                    None => READ_WRITE.to_vec(),
                },
                assembly: connector_assembly(name),
            })
            .collect(),
    };
    let mut out = serde_json::to_string_pretty(&manifest)
        .expect("connectors manifest serialization cannot fail");
    out.push('\n');
    out
}
