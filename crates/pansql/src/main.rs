//! PanSQL compiler CLI.
//!
//! Compiles one or more PanSQL scripts into their three artifacts each
//! (program source, project manifest, connectors manifest). Multi-script
//! invocations run the network pass across the set.

use anyhow::Context;
use clap::Parser;
use pansql_compiler::{compile_sources, load_sources, render_error, CompileOutput};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pansql")]
#[command(about = "Compile PanSQL data-synchronization scripts")]
struct Cli {
    /// PanSQL script file(s); two or more enable the network pass
    #[arg(required = true)]
    scripts: Vec<PathBuf>,

    /// Directory to write artifacts into (default: next to each script)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pansql=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let sources = match load_sources(&PathBuf::from("."), &cli.scripts) {
        Ok(sources) => sources,
        Err(err) => {
            error!("{}", err.message);
            std::process::exit(1);
        }
    };
    let outputs = match compile_sources(&sources) {
        Ok(outputs) => outputs,
        Err(err) => {
            error!("{}", render_error(&sources, &err));
            std::process::exit(1);
        }
    };

    for (script, output) in cli.scripts.iter().zip(&outputs) {
        for warning in &output.warnings {
            warn!("{}: {}", script.display(), warning);
        }
        if let Err(err) = write_artifacts(script, cli.out.as_deref(), output) {
            error!("{:#}", err);
            std::process::exit(1);
        }
    }
    info!("compiled {} script(s)", outputs.len());
}

fn write_artifacts(
    script: &std::path::Path,
    out: Option<&std::path::Path>,
    output: &CompileOutput,
) -> anyhow::Result<()> {
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());
    let dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;

    let write = |name: String, content: &str| -> anyhow::Result<()> {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!("wrote {}", path.display());
        Ok(())
    };
    write(format!("{}.cs", stem), &output.code)?;
    write(format!("{}.csproj", stem), &output.project_file)?;
    write(format!("{}.connectors.json", stem), &output.connectors)?;
    Ok(())
}
