//! Extraction — header text → intermediate model types.
//!
//! Every declaration kind supplies the block matcher with a start predicate,
//! a body pattern and an end pattern, then decomposes the captured body.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::LibraryConfig;
use crate::diag::{Diagnostic, Diagnostics};
use crate::docs::DocTransformer;
use crate::model::*;
use crate::param::{self, ParamParser, Parsed};
use crate::scan::{self, Block};

/// Name given to an enum with neither a tag nor a typedef name.
pub const ANONYMOUS_ENUM: &str = "Anonymous";

/// Compiled declaration grammar for one library's conventions.
pub struct Grammar {
    params: ParamParser,
    docs: DocTransformer,
    export_macro: String,
    deprecated_marker: String,
    blacklist: BTreeSet<String>,
    out_types: Vec<String>,
    re_semicolon_end: Regex,
    re_paren_end: Regex,
    re_enum_start: Regex,
    re_enum: Regex,
    re_struct_start: Regex,
    re_struct: Regex,
    re_struct_end: Regex,
    re_api: Regex,
    re_callback_start: Regex,
    re_callback: Regex,
    re_typedef: Regex,
    re_define: Regex,
    re_const: Regex,
}

impl Grammar {
    pub fn new(lib: &LibraryConfig) -> Result<Self> {
        let tag = regex::escape(&lib.callback_tag);
        Ok(Self {
            params: ParamParser::new(&lib.callback_tag)?,
            docs: DocTransformer::new()?,
            export_macro: lib.export_macro.clone(),
            deprecated_marker: lib.deprecated_marker.clone(),
            blacklist: lib.blacklist.iter().cloned().collect(),
            out_types: lib.out_types.clone(),
            re_semicolon_end: Regex::new(r";$")?,
            re_paren_end: Regex::new(r"\)\s*;$")?,
            re_enum_start: Regex::new(r"^(?:typedef\s+)?enum\b")?,
            re_enum: Regex::new(r"^(?:typedef\s+)?enum\s*(\w*)\s*\{(.*)\}\s*(\w*)\s*;$")?,
            re_struct_start: Regex::new(r"^(?:typedef\s+)?struct\s+\w+\s*(?:\{.*)?$")?,
            re_struct: Regex::new(r"^(?:typedef\s+)?struct\s+(\w+)\s*\{(.*)\}\s*(\w*)\s*;$")?,
            re_struct_end: Regex::new(
                r"^\}\s*\w*\s*;$|^(?:typedef\s+)?struct\b.*\}\s*\w*\s*;$",
            )?,
            re_api: Regex::new(&format!(
                r"^{}\s+(.+?)\s*\((.*)\)\s*;$",
                regex::escape(&lib.export_macro)
            ))?,
            re_callback_start: Regex::new(&format!(r"^typedef\b.*\(\s*{tag}\b"))?,
            re_callback: Regex::new(&format!(
                r"^typedef\s+(.+?)\s*\(\s*{tag}\s*\*\s*(\w+)\s*\)\s*\((.*)\)\s*;$"
            ))?,
            re_typedef: Regex::new(
                r"^typedef\s+(?:(?:struct|enum|union)\s+)?([\w\s\*]+?)\s*\b(\w+)\s*;$",
            )?,
            re_define: Regex::new(&format!(
                r"^\s*#\s*define\s+({}\w*)\s+(.+?)\s*(?://.*|/\*.*)?$",
                regex::escape(&lib.define_prefix)
            ))?,
            re_const: Regex::new(r"\bconst\b")?,
        })
    }

    fn normalize_type(&self, text: &str) -> String {
        let mut ty = self.re_const.replace_all(text, "").into_owned();
        ty.retain(|c| !c.is_whitespace());
        ty
    }
}

/// Parse every header, in order, into one [`Headers`] collection.
pub fn parse_headers(
    paths: &[PathBuf],
    grammar: &Grammar,
    version: &str,
    diags: &mut Diagnostics,
) -> Result<Headers> {
    let mut headers = Headers {
        version: version.to_string(),
        ..Headers::default()
    };

    for path in paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading header {}", path.display()))?;
        let file = path.display().to_string();
        debug!(header = %file, "parsing header");

        headers.typedefs.extend(parse_typedefs(grammar, &file, &text));
        headers.enums.extend(parse_enums(grammar, &file, &text));
        let funcs = parse_funcs(grammar, &file, &text, &mut headers.blacklisted, diags);
        headers.funcs.extend(funcs);
        headers.structs.extend(parse_structs(grammar, &file, &text, diags));
        headers.callbacks.extend(parse_callbacks(grammar, &file, &text, diags));
        headers.defines.extend(parse_defines(grammar, &text));
    }

    headers.privates = private_objects(&headers);

    info!(
        headers = paths.len(),
        enums = headers.enums.len(),
        structs = headers.structs.len(),
        functions = headers.funcs.len(),
        callbacks = headers.callbacks.len(),
        typedefs = headers.typedefs.len(),
        privates = headers.privates.len(),
        defines = headers.defines.len(),
        "header extraction complete"
    );

    Ok(headers)
}

/// Self-named typedefs (`typedef struct X X;`) whose type is never defined
/// in the parsed headers. Forward declarations of a parsed struct or enum are
/// not private.
pub fn private_objects(headers: &Headers) -> Vec<PrivateObject> {
    let defined: BTreeSet<&str> = headers
        .structs
        .iter()
        .map(|s| s.name.as_str())
        .chain(headers.enums.iter().map(|e| e.name.as_str()))
        .collect();
    headers
        .typedefs
        .iter()
        .filter(|(new, original)| new == original && !defined.contains(new.as_str()))
        .map(|(new, _)| PrivateObject { name: new.clone() })
        .collect()
}

fn loc(file: &str, block: &Block) -> SourceLoc {
    SourceLoc {
        file: file.to_string(),
        line: block.line,
    }
}

// ---------------------------------------------------------------------------
// Enum extraction
// ---------------------------------------------------------------------------

/// Parse enum definitions. Members without `=` take the previous value + 1,
/// starting at 0; explicit values are decimal or `0x` hex.
pub fn parse_enums(grammar: &Grammar, file: &str, text: &str) -> Vec<EnumDef> {
    let start = |t: &str| grammar.re_enum_start.is_match(t);
    let mut enums = Vec::new();

    for block in scan::blocks(file, text, start, &grammar.re_enum, &grammar.re_semicolon_end) {
        let (tag, body, alias) = (&block.groups[0], &block.groups[1], &block.groups[2]);
        let name = [tag, alias]
            .into_iter()
            .find(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| ANONYMOUS_ENUM.to_string());

        let mut vals: Vec<Val> = Vec::new();
        let mut value: i64 = -1;
        for member in body.split(',').map(str::trim) {
            if member.is_empty() || member.starts_with("/*") {
                continue;
            }
            match member.split_once('=') {
                Some((n, v)) => {
                    let (n, v) = (n.trim(), v.trim());
                    value = match parse_enum_value(v, &vals) {
                        Some(parsed) => parsed,
                        None => {
                            warn!(enum_name = %name, member = n, value = v, "unparsable enum value, counting on");
                            count_on(&name, n, value)
                        }
                    };
                    vals.push(Val::new(n, value));
                }
                None => {
                    value = count_on(&name, member, value);
                    vals.push(Val::new(member, value));
                }
            }
        }

        debug!(name = %name, values = vals.len(), "extracted enum");
        enums.push(EnumDef {
            name,
            vals,
            docs: grammar.docs.type_doc(&block.doc),
            source: loc(file, &block),
        });
    }
    enums
}

/// Value of a member without an explicit one. Saturates at `i64::MAX`.
fn count_on(enum_name: &str, member: &str, previous: i64) -> i64 {
    previous.checked_add(1).unwrap_or_else(|| {
        warn!(enum_name, member, "enum value overflows, repeating the previous one");
        previous
    })
}

fn parse_enum_value(text: &str, previous: &[Val]) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    text.parse::<i64>()
        .ok()
        .or_else(|| previous.iter().find(|v| v.native == text).map(|v| v.value))
}

// ---------------------------------------------------------------------------
// Struct extraction
// ---------------------------------------------------------------------------

/// Parse struct definitions. Constructor remnants (`Name()`) never become
/// fields; unparsable field declarators are dropped with a diagnostic.
pub fn parse_structs(
    grammar: &Grammar,
    file: &str,
    text: &str,
    diags: &mut Diagnostics,
) -> Vec<StructDef> {
    let start = |t: &str| grammar.re_struct_start.is_match(t);
    let mut structs = Vec::new();

    for block in scan::blocks(file, text, start, &grammar.re_struct, &grammar.re_struct_end) {
        let name = block.groups[0].clone();
        let source = loc(file, &block);
        let ctor = format!("{name}(");

        let mut fields = Vec::new();
        for entry in param::split_top_level(&block.groups[1], ';') {
            if entry.contains(&ctor) {
                continue;
            }
            match grammar.params.parse(entry) {
                Parsed::Par(p) if !p.name.is_empty() => fields.push(p),
                Parsed::Nothing => {}
                Parsed::Par(_) | Parsed::Unparsable => diags.push(Diagnostic::UnparsableParameter {
                    text: entry.trim().to_string(),
                    decl: format!("struct {name}"),
                    location: source.to_string(),
                }),
            }
        }

        debug!(name = %name, fields = fields.len(), "extracted struct");
        structs.push(StructDef {
            name,
            fields,
            docs: grammar.docs.type_doc(&block.doc),
            source,
        });
    }
    structs
}

// ---------------------------------------------------------------------------
// Function extraction
// ---------------------------------------------------------------------------

/// Parse exported function prototypes. Blacklisted functions are recorded in
/// `blacklisted` instead of being returned.
pub fn parse_funcs(
    grammar: &Grammar,
    file: &str,
    text: &str,
    blacklisted: &mut BTreeMap<String, String>,
    diags: &mut Diagnostics,
) -> Vec<Func> {
    let start = |t: &str| {
        t.starts_with(grammar.export_macro.as_str()) && !t.contains(grammar.deprecated_marker.as_str())
    };
    let mut funcs = Vec::new();

    for block in scan::blocks(file, text, start, &grammar.re_api, &grammar.re_paren_end) {
        let source = loc(file, &block);
        let head = match grammar.params.parse(&block.groups[0]) {
            Parsed::Par(p) if !p.name.is_empty() => p,
            _ => {
                diags.push(Diagnostic::MissingParameterName {
                    ty: block.groups[0].clone(),
                    decl: "function declaration".to_string(),
                    location: source.to_string(),
                });
                continue;
            }
        };
        if grammar.blacklist.contains(&head.name) {
            debug!(name = %head.name, "skipping blacklisted function");
            blacklisted.insert(head.name, head.ty);
            continue;
        }

        let Some(pars) = parse_param_list(grammar, &block.groups[1], &head.name, &source, diags)
        else {
            continue;
        };
        let doc = grammar.docs.transform(&block.doc);
        debug!(name = %head.name, params = pars.len(), "extracted function");
        funcs.push(Func::new(
            head.name,
            head.ty,
            pars,
            block.doc,
            doc,
            source,
            &grammar.out_types,
        ));
    }
    funcs
}

/// Parse a comma-separated parameter list. A lone `void` means no
/// parameters; a parameter without a name rejects the whole declaration.
fn parse_param_list(
    grammar: &Grammar,
    text: &str,
    decl: &str,
    source: &SourceLoc,
    diags: &mut Diagnostics,
) -> Option<Vec<Par>> {
    let mut pars = Vec::new();
    for piece in param::split_top_level(text, ',') {
        match grammar.params.parse(piece) {
            Parsed::Par(p) => pars.push(p),
            Parsed::Nothing => {}
            Parsed::Unparsable => diags.push(Diagnostic::UnparsableParameter {
                text: piece.trim().to_string(),
                decl: decl.to_string(),
                location: source.to_string(),
            }),
        }
    }

    if pars.len() == 1 && pars[0].ty == "void" {
        pars.clear();
    }
    if let Some(missing) = pars.iter().find(|p| p.name.is_empty()) {
        diags.push(Diagnostic::MissingParameterName {
            ty: missing.ty.clone(),
            decl: decl.to_string(),
            location: source.to_string(),
        });
        return None;
    }
    Some(pars)
}

// ---------------------------------------------------------------------------
// Callback extraction
// ---------------------------------------------------------------------------

/// Parse `typedef ret (TAG* Name)(params);` callback signatures.
pub fn parse_callbacks(
    grammar: &Grammar,
    file: &str,
    text: &str,
    diags: &mut Diagnostics,
) -> Vec<Func> {
    let start = |t: &str| grammar.re_callback_start.is_match(t);
    let mut callbacks = Vec::new();

    for block in scan::blocks(file, text, start, &grammar.re_callback, &grammar.re_paren_end) {
        let source = loc(file, &block);
        let ty = grammar.normalize_type(&block.groups[0]);
        let name = block.groups[1].clone();
        let Some(pars) = parse_param_list(grammar, &block.groups[2], &name, &source, diags) else {
            continue;
        };
        let doc = grammar.docs.transform(&block.doc);
        debug!(name = %name, params = pars.len(), "extracted callback");
        callbacks.push(Func::new(
            name,
            ty,
            pars,
            block.doc,
            doc,
            source,
            &grammar.out_types,
        ));
    }
    callbacks
}

// ---------------------------------------------------------------------------
// Typedef / define extraction
// ---------------------------------------------------------------------------

/// Parse one-line `typedef original alias;` declarations into alias → original.
pub fn parse_typedefs(grammar: &Grammar, file: &str, text: &str) -> BTreeMap<String, String> {
    let start = |t: &str| grammar.re_typedef.is_match(t);
    scan::blocks(file, text, start, &grammar.re_typedef, &grammar.re_semicolon_end)
        .map(|block| {
            let original = grammar.normalize_type(&block.groups[0]);
            (block.groups[1].clone(), original)
        })
        .collect()
}

/// Collect `#define PREFIX_NAME value` lines. Single-line only.
pub fn parse_defines(grammar: &Grammar, text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| grammar.re_define.captures(line))
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Consistency checks
// ---------------------------------------------------------------------------

/// Record missing documentation and `@param` count mismatches.
pub fn check(headers: &Headers, diags: &mut Diagnostics) {
    for e in &headers.enums {
        if e.docs.is_empty() {
            diags.push(Diagnostic::MissingDocumentation {
                kind: "enum",
                name: e.name.clone(),
                location: e.source.to_string(),
            });
        }
    }
    for f in &headers.funcs {
        if f.docs.is_empty() {
            diags.push(Diagnostic::MissingDocumentation {
                kind: "function",
                name: f.name.clone(),
                location: f.source.to_string(),
            });
        } else if f.pars.len() != f.nparams() {
            diags.push(Diagnostic::DocParamCountMismatch {
                name: f.name.clone(),
                documented: f.nparams(),
                declared: f.pars.len(),
                location: f.source.to_string(),
            });
        }
    }
    for s in &headers.structs {
        if s.docs.is_empty() {
            diags.push(Diagnostic::MissingDocumentation {
                kind: "struct",
                name: s.name.clone(),
                location: s.source.to_string(),
            });
        }
    }
}

/// Distinct native types of every function's first parameter, sorted.
pub fn instances(headers: &Headers) -> BTreeSet<&str> {
    headers
        .funcs
        .iter()
        .filter_map(|f| f.pars.first())
        .map(|p| p.ty.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        Grammar::new(&LibraryConfig::default()).unwrap()
    }

    #[test]
    fn enum_values_count_on_from_explicit() {
        let text = "typedef enum Sample\n{\n\tSAMPLE_A = 0x10,\n\tSAMPLE_B,\n\tSAMPLE_C,\n} Sample;\n";
        let enums = parse_enums(&grammar(), "t.h", text);
        assert_eq!(enums.len(), 1);
        let vals: Vec<(&str, i64)> = enums[0].vals.iter().map(|v| (v.native.as_str(), v.value)).collect();
        assert_eq!(vals, vec![("SAMPLE_A", 16), ("SAMPLE_B", 17), ("SAMPLE_C", 18)]);
    }

    #[test]
    fn enum_count_on_saturates() {
        let text = "enum Big { BIG_MAX = 9223372036854775807, BIG_NEXT };\n";
        let enums = parse_enums(&grammar(), "t.h", text);
        let vals: Vec<i64> = enums[0].vals.iter().map(|v| v.value).collect();
        assert_eq!(vals, vec![i64::MAX, i64::MAX]);
    }

    #[test]
    fn forward_declared_types_are_not_private() {
        let g = grammar();
        let text = "typedef struct XnVersion XnVersion;\n\
                    typedef enum XnMode XnMode;\n\
                    typedef struct XnNodeInfo XnNodeInfo;\n\
                    struct XnVersion\n{\n\tXnUInt32 nMajor;\n};\n\
                    enum XnMode { XN_MODE_A, XN_MODE_B };\n";
        let mut diags = Diagnostics::new();
        let headers = Headers {
            typedefs: parse_typedefs(&g, "t.h", text),
            enums: parse_enums(&g, "t.h", text),
            structs: parse_structs(&g, "t.h", text, &mut diags),
            ..Headers::default()
        };
        assert_eq!(headers.structs[0].name, "XnVersion");
        assert_eq!(headers.enums[0].name, "XnMode");
        let privates: Vec<String> = private_objects(&headers).into_iter().map(|p| p.name).collect();
        assert_eq!(privates, vec!["XnNodeInfo"]);
    }

    #[test]
    fn struct_constructor_entries_dropped() {
        let text = "typedef struct MyStruct\n{\n\tint x;\n\tMyStruct();\n\tchar* name;\n} MyStruct;\n";
        let mut diags = Diagnostics::new();
        let structs = parse_structs(&grammar(), "t.h", text, &mut diags);
        let fields: Vec<&str> = structs[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "name"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn function_with_unnamed_parameter_is_skipped() {
        let text = "XN_C_API XnStatus xnGood(XnContext* pContext);\nXN_C_API XnStatus xnBad(XnContext*);\n";
        let mut diags = Diagnostics::new();
        let mut blacklisted = BTreeMap::new();
        let funcs = parse_funcs(&grammar(), "t.h", text, &mut blacklisted, &mut diags);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "xnGood");
        assert!(matches!(
            diags.iter().next(),
            Some(Diagnostic::MissingParameterName { decl, .. }) if decl == "xnBad"
        ));
    }

    #[test]
    fn typedefs_and_defines() {
        let g = grammar();
        let text = "typedef struct XnContext XnContext;\ntypedef XnUInt32 XnStatus;\n#define XN_PROP_MIRROR \"Mirror\" // mirror\n#define OTHER 1\n";
        let typedefs = parse_typedefs(&g, "t.h", text);
        assert_eq!(typedefs.get("XnContext").map(String::as_str), Some("XnContext"));
        assert_eq!(typedefs.get("XnStatus").map(String::as_str), Some("XnUInt32"));
        let defines = parse_defines(&g, text);
        assert_eq!(defines.len(), 1);
        assert_eq!(defines["XN_PROP_MIRROR"], "\"Mirror\"");
    }
}
