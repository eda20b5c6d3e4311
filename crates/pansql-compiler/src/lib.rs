//! PanSQL compiler driver.
//!
//! Runs the full pipeline over one script (`compile`) or a script set
//! (`compile_files`, which also runs the multi-script network pass) and
//! returns the three text artifacts per script: program source, project
//! manifest, connectors manifest.
//!
//! All scripts of a compilation live in one [`SourceMap`]; every span
//! carries its file id, so an error from any script of a set resolves to
//! that script's path and line/col through [`render_error`].
//!
//! Every error is fatal to the current compilation; the first one is
//! reported. Warnings (unused streams, redundant maps) accumulate and are
//! delivered alongside success.

mod network;

use pansql_analyze::{analyze, link};
use pansql_codegen::ir::ProgramIr;
use pansql_codegen::{build_program, emit_connectors, emit_program, emit_project};
use pansql_parser::{lex, parse_script};
use std::path::{Path, PathBuf};
use tracing::debug;

pub use pansql_ast::foundation::SourceMap;
pub use pansql_ast::CompilerError;

/// The three artifacts produced per script, plus collected warnings.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Generated program source (C#)
    pub code: String,
    /// Project/build manifest (`.csproj`)
    pub project_file: String,
    /// Connectors manifest (JSON)
    pub connectors: String,
    pub warnings: Vec<String>,
}

/// A compiled-but-not-yet-emitted script.
pub(crate) struct Unit {
    pub(crate) ir: ProgramIr,
    pub(crate) warnings: Vec<String>,
}

/// Compile a single script.
///
/// Dictionary paths in `load` statements resolve relative to the
/// script's directory (the parent of `script_name`, when it has one).
pub fn compile(script_name: &str, script_text: &str) -> Result<CompileOutput, CompilerError> {
    let mut sources = SourceMap::new();
    let file_id = sources.add_file(PathBuf::from(script_name), script_text.to_string());
    let unit = frontend(&sources, file_id)?;
    Ok(emit_unit(unit))
}

/// Read a script set into a source map, in the given order.
///
/// Paths resolve relative to `root`; file ids are assigned in order and
/// appear in every span the compilation produces.
pub fn load_sources<P: AsRef<Path>>(root: &Path, paths: &[P]) -> Result<SourceMap, CompilerError> {
    let mut sources = SourceMap::new();
    for path in paths {
        let full = root.join(path.as_ref());
        let text = std::fs::read_to_string(&full).map_err(|e| {
            CompilerError::new(format!(
                "failed to read script '{}': {}",
                full.display(),
                e
            ))
        })?;
        sources.add_file(full, text);
    }
    Ok(sources)
}

/// Compile every script in a source map.
///
/// With two or more scripts, the network pass pairs `Network` writers
/// with downstream readers and injects the shared dictionary-handoff
/// file.
pub fn compile_sources(sources: &SourceMap) -> Result<Vec<CompileOutput>, CompilerError> {
    let mut units = Vec::new();
    for file_id in 0..sources.file_count() {
        units.push(frontend(sources, file_id as u16)?);
    }
    if units.len() >= 2 {
        network::run_network_pass(&mut units)?;
    }
    Ok(units.into_iter().map(emit_unit).collect())
}

/// Compile a script set from disk: [`load_sources`] + [`compile_sources`].
pub fn compile_files<P: AsRef<Path>>(
    root: &Path,
    paths: &[P],
) -> Result<Vec<CompileOutput>, CompilerError> {
    let sources = load_sources(root, paths)?;
    compile_sources(&sources)
}

/// Format an error with its source location, for driver output.
///
/// The span's file id selects the failing script from the map, so
/// multi-script compilations report the right file.
pub fn render_error(sources: &SourceMap, error: &CompilerError) -> String {
    match error.span {
        Some(span) => format!("{}: {}", sources.location(&span), error.message),
        None => error.message.clone(),
    }
}

fn script_base_dir(script: &Path) -> PathBuf {
    match script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Lex, parse, analyze, link, and lower one script of the map.
fn frontend(sources: &SourceMap, file_id: u16) -> Result<Unit, CompilerError> {
    let file = sources
        .get(file_id)
        .ok_or_else(|| CompilerError::new("internal error: unknown source file"))?;
    let script_name = file.path.display().to_string();
    let base_dir = script_base_dir(&file.path);

    debug!(script = %script_name, "lexing and parsing");
    let tokens = lex(&file.source)
        .map_err(|e| CompilerError::new(format!("{}: {}", script_name, e)))?;
    let script = parse_script(&script_name, &tokens, file_id)
        .map_err(|e| CompilerError::with_span(e.message.clone(), e.span))?;

    debug!(script = %script_name, "analyzing");
    let analysis = analyze(&script, &base_dir)?;
    let linkage = link(&analysis)?;

    debug!(
        script = %script_name,
        selects = analysis.selects.len(),
        auto_maps = linkage.auto_maps.len(),
        "lowering"
    );
    let mut warnings = analysis.warnings.clone();
    warnings.extend(linkage.warnings.iter().cloned());
    let ir = build_program(&script_name, &analysis, &linkage)?;
    Ok(Unit { ir, warnings })
}

fn emit_unit(unit: Unit) -> CompileOutput {
    CompileOutput {
        code: emit_program(&unit.ir),
        project_file: emit_project(&unit.ir),
        connectors: emit_connectors(&unit.ir),
        warnings: unit.warnings,
    }
}
