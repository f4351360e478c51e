//! Intermediate model types — the bridge between header scanning and wrapper emission.
//!
//! Everything here is plain data: the scanner and declaration parsers produce
//! it, the type mapper and emitter only read it.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use crate::docs::FuncDoc;

const INDENT: &str = "    ";

/// Where a declaration was found (`file:line`, 1-based line).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLoc {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Everything parsed from one generation run's header set.
#[derive(Debug, Default)]
pub struct Headers {
    pub enums: Vec<EnumDef>,
    pub structs: Vec<StructDef>,
    pub funcs: Vec<Func>,
    pub callbacks: Vec<Func>,
    pub privates: Vec<PrivateObject>,
    /// alias → original native type name.
    pub typedefs: BTreeMap<String, String>,
    /// `#define` name → literal value text.
    pub defines: BTreeMap<String, String>,
    /// Blacklisted functions that were actually seen, name → return type.
    pub blacklisted: BTreeMap<String, String>,
    /// Version string injected into the prologue.
    pub version: String,
}

/// A C enum definition.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub vals: Vec<Val>,
    pub docs: String,
    pub source: SourceLoc,
}

/// A single enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Val {
    /// Native member name, e.g. `XN_STATUS_OK`.
    pub native: String,
    /// Derived wrapper name, e.g. `OK`.
    pub name: String,
    pub value: i64,
}

impl Val {
    /// Build a member, deriving the wrapper name from the native one: the last
    /// `_` segment, or the last two when that segment is a single character
    /// (`XN_RES_1_1` → `1_1`), with a `_` in front of a leading digit.
    pub fn new(native: &str, value: i64) -> Self {
        let segments: Vec<&str> = native.split('_').collect();
        let last = segments.last().copied().unwrap_or_default();
        let mut name = if last.chars().count() <= 1 && segments.len() > 1 {
            segments[segments.len() - 2..].join("_")
        } else {
            last.to_string()
        };
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        Self {
            native: native.to_string(),
            name,
            value,
        }
    }
}

/// A C struct definition.
#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Par>,
    pub docs: String,
    pub source: SourceLoc,
}

/// An opaque handle: `typedef struct X X;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateObject {
    pub name: String,
}

/// ctypes parameter direction flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Flag {
    #[default]
    In,
    Out,
    InOut,
    /// Input with a default of integer 0.
    InZero,
}

impl Flag {
    /// The numeric ctypes `paramflags` code.
    pub fn code(self) -> u8 {
        match self {
            Flag::In => 1,
            Flag::Out => 2,
            Flag::InOut => 3,
            Flag::InZero => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Flag::In => "",
            Flag::Out => "Out",
            Flag::InOut => "InOut",
            Flag::InZero => "InZero",
        }
    }
}

/// A function parameter or struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Par {
    pub name: String,
    /// Native type with pointer depth folded in, whitespace removed (`char**`).
    pub ty: String,
    pub flag: Flag,
}

impl Par {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            flag: Flag::In,
        }
    }

    /// Decide the direction of this parameter: documented `[out]` and
    /// `[in,out]` tags win, then the table of output-only native types.
    pub fn classify(&self, doc: &FuncDoc, out_types: &[String]) -> Flag {
        if doc.out.iter().any(|n| n == &self.name) {
            Flag::Out
        } else if doc.inout.iter().any(|n| n == &self.name) {
            Flag::InOut
        } else if out_types.iter().any(|t| t == &self.ty) {
            Flag::Out
        } else {
            Flag::In
        }
    }
}

/// A C function (exported API or callback signature).
#[derive(Debug, Clone)]
pub struct Func {
    pub name: String,
    /// Native return type.
    pub ty: String,
    pub pars: Vec<Par>,
    pub docs: String,
    pub doc: FuncDoc,
    pub source: SourceLoc,
}

impl Func {
    /// Assemble a function from its parsed pieces, classifying parameter
    /// directions from the transformed doc block.
    pub fn new(
        name: String,
        ty: String,
        mut pars: Vec<Par>,
        docs: String,
        doc: FuncDoc,
        source: SourceLoc,
        out_types: &[String],
    ) -> Self {
        for p in &mut pars {
            p.flag = p.classify(&doc, out_types);
        }
        Self {
            name,
            ty,
            pars,
            docs,
            doc,
            source,
        }
    }

    /// Parameter names callers pass positionally, i.e. everything but Out.
    pub fn args(&self, first: usize) -> Vec<&str> {
        self.pars
            .iter()
            .skip(first)
            .filter(|p| p.flag != Flag::Out)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Documented parameter count (`@param` lines, `[out]` ones included).
    pub fn nparams(&self) -> usize {
        self.doc.params.len() + self.doc.out.len()
    }

    /// Transformed doc lines, optionally without the first `@param`, joined
    /// with a newline plus `indent` spaces.
    pub fn epydocs(&self, first: usize, indent: usize) -> String {
        let sep = format!("\n{}", " ".repeat(indent));
        self.doc
            .heads
            .iter()
            .chain(self.doc.params.iter().skip(first))
            .chain(self.doc.tails.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// Closed view over every entity kind, used for debug dumps.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Enum(&'a EnumDef),
    Struct(&'a StructDef),
    Func(&'a Func),
    Par(&'a Par),
    Val(&'a Val),
    Private(&'a PrivateObject),
}

/// Render a human-readable dump of one entity (and its children).
pub fn dump(entity: Entity<'_>) -> String {
    let mut out = String::new();
    match entity {
        Entity::Enum(e) => {
            let _ = writeln!(out, "{} (enum): {}", e.name, e.source);
            for v in &e.vals {
                out.push_str(&dump(Entity::Val(v)));
            }
        }
        Entity::Struct(s) => {
            let _ = writeln!(out, "{} (struct): {}", s.name, s.source);
            for p in &s.fields {
                out.push_str(&dump(Entity::Par(p)));
            }
        }
        Entity::Func(f) => {
            let _ = writeln!(out, "{} ({}): {}", f.name, f.ty, f.source);
            for p in &f.pars {
                out.push_str(&dump(Entity::Par(p)));
            }
        }
        Entity::Par(p) => {
            let _ = writeln!(out, "{INDENT}{} ({}) {}", p.name, p.ty, p.flag.label());
        }
        Entity::Val(v) => {
            let _ = writeln!(out, "{INDENT}{} = {}", v.name, v.value);
        }
        Entity::Private(p) => {
            let _ = writeln!(out, "{} (private)", p.name);
        }
    }
    out
}

impl Headers {
    /// Dump every parsed table, headed by `==== kind ==== version` lines.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut section = |title: &str, items: Vec<Entity<'_>>| {
            let _ = writeln!(out, "\n==== {title} ==== {}", self.version);
            for item in items {
                out.push_str(&dump(item));
            }
        };
        section("enums", self.enums.iter().map(Entity::Enum).collect());
        section("structs", self.structs.iter().map(Entity::Struct).collect());
        section("funcs", self.funcs.iter().map(Entity::Func).collect());
        section("privates", self.privates.iter().map(Entity::Private).collect());
        section("callbacks", self.callbacks.iter().map(Entity::Func).collect());

        let _ = writeln!(out, "\n==== defines ==== {}", self.version);
        for (k, v) in &self.defines {
            let _ = writeln!(out, "{INDENT}{k} = {v}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn val_names_from_native() {
        assert_eq!(Val::new("XN_STATUS_OK", 0).name, "OK");
        assert_eq!(Val::new("XN_RES_1_1", 3).name, "_1_1");
        assert_eq!(Val::new("XN_CODEC_8Z", 1).name, "_8Z");
        assert_eq!(Val::new("PLAIN", 2).name, "PLAIN");
    }

    #[test]
    fn dump_shows_direction() {
        let mut p = Par::new("pContext", "XnContext**");
        p.flag = Flag::Out;
        assert_eq!(dump(Entity::Par(&p)), "    pContext (XnContext**) Out\n");
    }
}
