//! CLI entry point for bnd-ctypes.

use std::path::PathBuf;

use anyhow::Result;
use bnd_ctypes::{Mode, Options};
use clap::Parser;

/// bnd-ctypes — generate Python ctypes bindings from C headers.
#[derive(Parser, Debug)]
#[command(name = "bnd-ctypes", version, about)]
struct Cli {
    /// Header files, or directories of `*.h` files (replace the configured list).
    inputs: Vec<PathBuf>,

    /// Path to a bnd-ctypes.toml configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check mode: parse and report consistency problems, generate nothing.
    #[arg(short, long, conflicts_with_all = ["debug", "structs"])]
    check: bool,

    /// Debug mode: dump parsed entities and derived name maps.
    #[arg(short, long, conflicts_with = "structs")]
    debug: bool,

    /// Emit only the enum and struct definitions.
    #[arg(short, long)]
    structs: bool,

    /// Output file path, `-` for stdout (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Version string for the `__version__` global (overrides config).
    #[arg(short = 'v', long)]
    set_version: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bnd_ctypes=info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.config.is_none() && cli.inputs.is_empty() {
        anyhow::bail!("nothing to do: pass --config or at least one header input");
    }

    let mode = if cli.check {
        Mode::Check
    } else if cli.debug {
        Mode::Debug
    } else if cli.structs {
        Mode::Structs
    } else {
        Mode::Generate
    };
    let options = Options {
        inputs: cli.inputs,
        output: cli.output,
        version: cli.set_version,
        mode,
    };

    let outcome = bnd_ctypes::run(cli.config.as_deref(), &options)?;
    print!("{}", outcome.report);
    std::process::exit(outcome.diagnostics.exit_code());
}
