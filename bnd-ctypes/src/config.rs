//! Configuration types for `bnd-ctypes.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header files, or directories whose `*.h` files are all parsed.
    pub headers: Vec<PathBuf>,
    pub output: OutputConfig,
    pub templates: TemplatesConfig,
    pub library: LibraryConfig,
    /// Extra native type → ctypes descriptor entries. These win over the
    /// built-in primitive table.
    pub type_map: BTreeMap<String, String>,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path; `-` writes to stdout.
    pub file: PathBuf,
    /// Version string injected into the prologue.
    pub version: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("bindings.py"),
            version: String::new(),
        }
    }
}

/// Verbatim text blocks merged into the generated module.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Copied before the generated code. May carry `# GENERATED_ENUMS`,
    /// `# GENERATED_STRUCTS` and `build_date =` marker lines.
    pub prologue: Option<PathBuf>,
    /// Copied after the generated code.
    pub epilogue: Option<PathBuf>,
    /// Hand-written class bodies that take precedence over generated ones.
    pub overrides: Option<PathBuf>,
}

/// Library conventions the scanner and mapper key on.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Token marking an exported function prototype.
    pub export_macro: String,
    /// Prototypes containing this token are skipped.
    pub deprecated_marker: String,
    /// Calling-convention token inside callback typedefs.
    pub callback_tag: String,
    /// `#define` names must start with this to be collected.
    pub define_prefix: String,
    /// Define groups emitted as constant classes (`PROP` → `Prop` holding
    /// every `<define_prefix>PROP_*`).
    pub define_groups: Vec<String>,
    /// Prefixes stripped from native names when deriving class names.
    pub type_prefixes: Vec<String>,
    /// Prefix stripped from function names when deriving method names.
    pub function_prefix: String,
    /// Classes that receive method wrappers for the functions whose first
    /// parameter maps to them.
    pub defined_classes: Vec<String>,
    /// Functions never wrapped.
    pub blacklist: Vec<String>,
    /// Native types that are output parameters by convention.
    pub out_types: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            export_macro: "XN_C_API".to_string(),
            deprecated_marker: "DEPRECATED".to_string(),
            callback_tag: "XN_CALLBACK_TYPE".to_string(),
            define_prefix: "XN_".to_string(),
            define_groups: vec!["PROP".to_string(), "CAPABILITY".to_string()],
            type_prefixes: vec!["Xn".to_string(), "XN".to_string()],
            function_prefix: "xn".to_string(),
            defined_classes: Vec::new(),
            blacklist: Vec::new(),
            out_types: vec![
                "int*".to_string(),
                "unsigned*".to_string(),
                "XnEnumerationErrors*".to_string(),
            ],
        }
    }
}

/// Resolve a configured path against `base_dir` unless it is absolute.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Expand header inputs: files are kept as given, directories contribute
/// every `*.h` directly inside them, sorted by name.
pub fn expand_headers(inputs: &[PathBuf], base_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut headers = Vec::new();
    for input in inputs {
        let path = resolve_path(input, base_dir);
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(&path)
                .map_err(|e| anyhow::anyhow!("failed to list {}: {}", path.display(), e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "h"))
                .collect();
            found.sort();
            headers.extend(found);
        } else {
            headers.push(path);
        }
    }
    Ok(headers)
}

/// Load and parse a `bnd-ctypes.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
