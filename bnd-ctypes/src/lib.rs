//! bnd-ctypes — C header → documented Python ctypes wrapper generator.
//!
//! Scans OpenNI-style C headers (export-macro prototypes, enums, structs,
//! typedefs, callback typedefs, `#define` constants, Doxygen comments) and
//! emits a Python module of enum classes, `ctypes.Structure`s, per-class
//! method wrappers and lazily bound raw functions.
//!
//! # Quick start
//!
//! Generate the module described by a config file and write it out:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let outcome = bnd_ctypes::run(Some(Path::new("bnd-ctypes.toml")), &Default::default()).unwrap();
//! std::process::exit(outcome.diagnostics.exit_code());
//! ```
//!
//! Or get the module text without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let outcome = bnd_ctypes::generate(Path::new("bnd-ctypes.toml")).unwrap();
//! print!("{}", outcome.output.unwrap_or_default());
//! ```

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

pub mod config;
pub mod diag;
pub mod docs;
pub mod emit;
pub mod extract;
pub mod model;
pub mod overrides;
pub mod param;
pub mod scan;
pub mod typemap;

use diag::Diagnostics;

/// Output path meaning "standard output".
pub const STDOUT: &str = "-";

/// What a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Full module (default).
    #[default]
    Generate,
    /// Parse plus consistency report; nothing emitted.
    Check,
    /// Dump parsed entities and derived name maps; nothing emitted.
    Debug,
    /// Enum and struct sections only.
    Structs,
}

/// Command-line style overrides applied on top of a loaded config.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Header files or directories replacing the configured list.
    pub inputs: Vec<PathBuf>,
    /// Output path replacing the configured one.
    pub output: Option<PathBuf>,
    /// Version string replacing the configured one.
    pub version: Option<String>,
    pub mode: Mode,
}

/// Result of one generation run.
#[derive(Debug)]
pub struct Outcome {
    /// Generated module text. `None` in check/debug mode, and when
    /// unresolved types suppressed emission.
    pub output: Option<String>,
    /// Human-readable check or debug report.
    pub report: String,
    pub diagnostics: Diagnostics,
}

/// Run the full pipeline: load config, parse headers, emit, and write the
/// output file (or stdout for `-`).
///
/// `config_path` of `None` runs with built-in defaults relative to the
/// current directory; `options.inputs` must then name the headers.
pub fn run(config_path: Option<&Path>, options: &Options) -> Result<Outcome> {
    let (mut cfg, base_dir) = match config_path {
        Some(path) => {
            let cfg = config::load_config(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            (cfg, base_dir)
        }
        None => (config::Config::default(), PathBuf::from(".")),
    };

    if !options.inputs.is_empty() {
        let cwd = std::env::current_dir().context("resolving current directory")?;
        cfg.headers = options
            .inputs
            .iter()
            .map(|p| config::resolve_path(p, &cwd))
            .collect();
    }
    if let Some(version) = &options.version {
        cfg.output.version = version.clone();
    }

    let outcome = generate_from_config(&cfg, &base_dir, options.mode)?;

    if let Some(text) = &outcome.output {
        let target = match &options.output {
            Some(p) => p.clone(),
            None => config::resolve_path(&cfg.output.file, &base_dir),
        };
        if target.as_os_str() == STDOUT {
            std::io::stdout()
                .write_all(text.as_bytes())
                .context("writing output to stdout")?;
        } else {
            std::fs::write(&target, text)
                .with_context(|| format!("writing output to {}", target.display()))?;
            info!(path = %target.display(), size = text.len(), "wrote bindings");
        }
    }

    Ok(outcome)
}

/// Load a config file and run the default generation mode without writing
/// anything.
pub fn generate(config_path: &Path) -> Result<Outcome> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir, Mode::Generate)
}

/// Run one mode over an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which header and template paths
/// in the config are resolved (typically the parent directory of the TOML
/// file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path, mode: Mode) -> Result<Outcome> {
    let paths = config::expand_headers(&cfg.headers, base_dir)?;
    if paths.is_empty() {
        anyhow::bail!("no header files to parse");
    }
    info!(headers = paths.len(), ?mode, "loaded configuration");

    let grammar = extract::Grammar::new(&cfg.library)?;
    let mut diagnostics = Diagnostics::new();
    let headers = extract::parse_headers(&paths, &grammar, &cfg.output.version, &mut diagnostics)?;

    if mode == Mode::Check {
        extract::check(&headers, &mut diagnostics);
        let report = check_report(&headers, &diagnostics);
        return Ok(Outcome {
            output: None,
            report,
            diagnostics,
        });
    }

    let types = typemap::TypeMap::build(&headers, &cfg.library, &cfg.type_map);

    if mode == Mode::Debug {
        let report = format!("{}{}", headers.dump(), types.dump(&headers.version));
        return Ok(Outcome {
            output: None,
            report,
            diagnostics,
        });
    }

    let overrides = match &cfg.templates.overrides {
        Some(p) => overrides::Overrides::load(&config::resolve_path(p, base_dir))?,
        None => overrides::Overrides::default(),
    };
    let emitter = emit::Emitter::new(&headers, &types, &overrides, &cfg.library);

    if mode == Mode::Structs {
        let output = emitter.structs_document().render();
        return Ok(Outcome {
            output: Some(output),
            report: String::new(),
            diagnostics,
        });
    }

    // Everything is derived before anything is judged, so one pass reports
    // every missing conversion.
    if !types.validate(&headers, &mut diagnostics) {
        let unresolved = diagnostics.unresolved_types().join(", ");
        error!(%unresolved, "type conversion(s) missing, no bindings written");
        return Ok(Outcome {
            output: None,
            report: String::new(),
            diagnostics,
        });
    }

    let prologue = read_template(cfg.templates.prologue.as_deref(), base_dir)?;
    let epilogue = read_template(cfg.templates.epilogue.as_deref(), base_dir)?;
    let output = emitter
        .document(prologue.as_deref(), epilogue.as_deref())
        .render();

    info!(
        size = output.len(),
        diagnostics = diagnostics.len(),
        "generated bindings"
    );

    Ok(Outcome {
        output: Some(output),
        report: String::new(),
        diagnostics,
    })
}

fn read_template(path: Option<&Path>, base_dir: &Path) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let path = config::resolve_path(path, base_dir);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading template {}", path.display()))?;
    Ok(Some(text))
}

/// Diagnostics, then the distinct first-parameter types.
fn check_report(headers: &model::Headers, diagnostics: &Diagnostics) -> String {
    let mut report = String::new();
    for d in diagnostics.iter() {
        let _ = writeln!(report, "{d}");
    }
    let _ = writeln!(report, "{} error(s) reported", diagnostics.len());
    let _ = writeln!(report, "=========== INSTANCES ===========");
    for ty in extract::instances(headers) {
        let _ = writeln!(report, "{ty}");
    }
    report
}
