//! Type/class mapping — native type names → ctypes descriptors and wrapper
//! class names.
//!
//! The map is derived once, up front: configured and built-in entries first,
//! then a class name for every parsed enum, struct, private object and
//! callback, then typedef aliases and struct pointers. Only after all of
//! that is [`TypeMap::validate`] allowed to judge completeness.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::config::LibraryConfig;
use crate::diag::{Diagnostic, Diagnostics};
use crate::model::Headers;

/// Descriptor used where an unresolved type must still be rendered.
pub const OPAQUE: &str = "ctypes.c_void_p";

const POINTER_OPEN: &str = "ctypes.POINTER(";

/// Built-in primitive table. Multi-word C types appear with their
/// whitespace removed, the way the parameter parser normalizes them.
pub const BASE_TYPES: &[(&str, &str)] = &[
    ("CALLBACK", "ctypes.c_void_p"),
    ("bool", "ctypes.c_bool"),
    ("char", "ctypes.c_char"),
    ("char*", "ctypes.c_char_p"),
    ("char**", "ListPOINTER(ctypes.c_char_p)"),
    ("double", "ctypes.c_double"),
    ("double*", "ctypes.POINTER(ctypes.c_double)"),
    ("float", "ctypes.c_float"),
    ("float*", "ctypes.POINTER(ctypes.c_float)"),
    ("int", "ctypes.c_int"),
    ("int*", "ctypes.POINTER(ctypes.c_int)"),
    ("int16_t", "ctypes.c_int16"),
    ("int32_t", "ctypes.c_int32"),
    ("int64_t", "ctypes.c_int64"),
    ("int8_t", "ctypes.c_int8"),
    ("long", "ctypes.c_long"),
    ("longlong", "ctypes.c_longlong"),
    ("short", "ctypes.c_short"),
    ("size_t", "ctypes.c_size_t"),
    ("uint16_t", "ctypes.c_uint16"),
    ("uint32_t", "ctypes.c_uint32"),
    ("uint64_t", "ctypes.c_uint64"),
    ("uint8_t", "ctypes.c_uint8"),
    ("unsigned", "ctypes.c_uint"),
    ("unsigned*", "ctypes.POINTER(ctypes.c_uint)"),
    ("unsignedchar", "ctypes.c_ubyte"),
    ("unsignedchar*", "ctypes.POINTER(ctypes.c_ubyte)"),
    ("unsignedint", "ctypes.c_uint"),
    ("unsignedint*", "ctypes.POINTER(ctypes.c_uint)"),
    ("unsignedlong", "ctypes.c_ulong"),
    ("unsignedlonglong", "ctypes.c_ulonglong"),
    ("unsignedshort", "ctypes.c_ushort"),
    ("void", "None"),
    ("void*", "ctypes.c_void_p"),
    ("void**", "ListPOINTER(ctypes.c_void_p)"),
];

/// Result of looking a native type up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Resolved(&'a str),
    Unresolved,
}

/// Derived native-type → descriptor table plus the method-prefix tables of
/// the defined classes. Read-only once built.
#[derive(Debug, Default)]
pub struct TypeMap {
    map: BTreeMap<String, String>,
    /// Defined class → native prefix of its methods (`Context` → `xnContext`).
    prefixes: BTreeMap<String, String>,
    /// Native type name → class name, for doc cross-references.
    links: BTreeMap<String, String>,
    defined_classes: Vec<String>,
    function_prefix: String,
}

impl TypeMap {
    /// Derive the full table for one run.
    pub fn build(headers: &Headers, lib: &LibraryConfig, extra: &BTreeMap<String, String>) -> Self {
        let mut map: BTreeMap<String, String> = BASE_TYPES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        let declared = headers
            .enums
            .iter()
            .map(|e| &e.name)
            .chain(headers.structs.iter().map(|s| &s.name))
            .chain(headers.privates.iter().map(|p| &p.name))
            .chain(headers.callbacks.iter().map(|c| &c.name));
        for name in declared {
            if !map.contains_key(name) {
                let class = class_name(name, &lib.type_prefixes);
                debug!(native = %name, class = %class, "derived class name");
                map.insert(name.clone(), class);
            }
        }

        // Aliases inherit their original's mapping; repeat until chains settle.
        loop {
            let mut changed = false;
            for (alias, original) in &headers.typedefs {
                if map.contains_key(alias) {
                    continue;
                }
                if let Some(target) = map.get(original).cloned() {
                    map.entry(format!("{alias}*"))
                        .or_insert_with(|| pointer_to(&target));
                    map.insert(alias.clone(), target);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        for s in &headers.structs {
            if let Some(class) = map.get(&s.name).cloned() {
                map.entry(format!("{}*", s.name))
                    .or_insert_with(|| pointer_to(&class));
            }
        }

        let mut prefixes = BTreeMap::new();
        let mut links = BTreeMap::new();
        for (native, class) in &map {
            let native = native.trim_end_matches('*');
            if lib.defined_classes.contains(class) {
                links.insert(native.to_string(), class.clone());
                prefixes.insert(class.clone(), lower_first(native));
            } else if let Some(inner) = class.strip_prefix(POINTER_OPEN) {
                let inner = inner.trim_end_matches(')');
                if inner.starts_with(|c: char| c.is_ascii_uppercase()) {
                    links.insert(native.to_string(), inner.to_string());
                }
            }
        }

        Self {
            map,
            prefixes,
            links,
            defined_classes: lib.defined_classes.clone(),
            function_prefix: lib.function_prefix.clone(),
        }
    }

    /// Look a native type up.
    pub fn resolve(&self, native: &str) -> Resolution<'_> {
        match self.map.get(native) {
            Some(descriptor) => Resolution::Resolved(descriptor),
            None => Resolution::Unresolved,
        }
    }

    /// Descriptor for rendering positions that tolerate gaps (struct fields,
    /// callback signatures): unresolved types become [`OPAQUE`].
    pub fn descriptor_or_opaque(&self, native: &str, context: &str) -> &str {
        match self.resolve(native) {
            Resolution::Resolved(descriptor) => descriptor,
            Resolution::Unresolved => {
                warn!(native, context, "no type conversion, rendering as {OPAQUE}");
                OPAQUE
            }
        }
    }

    /// Whether `class` is one of the configured method-hosting classes.
    pub fn is_defined_class(&self, class: &str) -> bool {
        self.defined_classes.iter().any(|c| c == class)
    }

    pub fn defined_classes(&self) -> &[String] {
        &self.defined_classes
    }

    /// Method name for `func` when wrapped into `class`: the class-specific
    /// prefix (or else the library function prefix) stripped, first letter
    /// lower-cased.
    pub fn method_name(&self, class: &str, func: &str) -> String {
        let stripped = self
            .prefixes
            .get(class)
            .and_then(|p| func.strip_prefix(p.as_str()))
            .filter(|rest| !rest.is_empty())
            .or_else(|| func.strip_prefix(self.function_prefix.as_str()))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(func);
        lower_first(stripped)
    }

    /// Rewrite the native names in `text` that carry `class`'s method prefix
    /// to the method names they are wrapped as.
    pub fn link_methods(&self, class: &str, text: &str) -> String {
        let Some(prefix) = self.prefixes.get(class).filter(|p| !p.is_empty()) else {
            return text.to_string();
        };
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(i) = rest.find(prefix.as_str()) {
            out.push_str(&rest[..i]);
            let tail = &rest[i..];
            let end = tail.find(|c: char| !is_word(c)).unwrap_or(tail.len());
            let word = &tail[..end];
            if word.len() > prefix.len() && !out.ends_with(is_word) {
                out.push_str(&self.method_name(class, word));
            } else {
                out.push_str(word);
            }
            rest = &tail[end..];
        }
        out.push_str(rest);
        out
    }

    /// Check every function's return and parameter types, recording each
    /// unresolved one. Returns `true` when everything resolved.
    pub fn validate(&self, headers: &Headers, diags: &mut Diagnostics) -> bool {
        let before = diags.len();
        for f in &headers.funcs {
            if self.resolve(&f.ty) == Resolution::Unresolved {
                diags.push(Diagnostic::UnresolvedTypeMapping {
                    ty: f.ty.clone(),
                    context: f.name.clone(),
                    location: f.source.to_string(),
                });
            }
            for p in &f.pars {
                if self.resolve(&p.ty) == Resolution::Unresolved {
                    diags.push(Diagnostic::UnresolvedTypeMapping {
                        ty: p.ty.clone(),
                        context: format!("{} in {}", p.name, f.name),
                        location: f.source.to_string(),
                    });
                }
            }
        }
        diags.len() == before
    }

    /// Dump the derived tables, one `==== name ==== version` section each.
    pub fn dump(&self, version: &str) -> String {
        let mut out = String::new();
        for (title, table) in [
            ("type2class", &self.map),
            ("prefixes", &self.prefixes),
            ("links", &self.links),
        ] {
            if table.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n==== {title} ==== {version}");
            for (k, v) in table {
                let _ = writeln!(out, "    {k}: {v}");
            }
        }
        out
    }
}

/// Class name for a native enum/struct/typedef name: the first matching
/// prefix stripped, then `_`-separated segments title-cased and joined, or
/// else just the first letter upper-cased.
pub fn class_name(native: &str, type_prefixes: &[String]) -> String {
    let rest = type_prefixes
        .iter()
        .find_map(|p| native.strip_prefix(p.as_str()).filter(|r| !r.is_empty()))
        .unwrap_or(native);

    if rest.contains('_') {
        rest.split('_').map(title_case).collect()
    } else if rest.starts_with(|c: char| c.is_lowercase()) {
        upper_first(rest)
    } else {
        rest.to_string()
    }
}

fn pointer_to(descriptor: &str) -> String {
    format!("{POINTER_OPEN}{descriptor})")
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumDef, PrivateObject, SourceLoc, StructDef};

    fn prefixes() -> Vec<String> {
        vec!["Xn".to_string(), "XN".to_string()]
    }

    #[test]
    fn class_names() {
        assert_eq!(class_name("XN_STATUS", &prefixes()), "Status");
        assert_eq!(class_name("XnPixelFormat", &prefixes()), "PixelFormat");
        assert_eq!(class_name("XnSkeleton_Joint", &prefixes()), "SkeletonJoint");
        assert_eq!(class_name("timespec", &prefixes()), "Timespec");
    }

    #[test]
    fn typedef_chains_and_struct_pointers() {
        let mut headers = Headers::default();
        headers.structs.push(StructDef {
            name: "XnVersion".into(),
            fields: Vec::new(),
            docs: String::new(),
            source: SourceLoc::default(),
        });
        headers.enums.push(EnumDef {
            name: "XnPixelFormat".into(),
            vals: Vec::new(),
            docs: String::new(),
            source: SourceLoc::default(),
        });
        headers.privates.push(PrivateObject {
            name: "XnContext".into(),
        });
        headers.typedefs.insert("XnA".into(), "XnB".into());
        headers.typedefs.insert("XnB".into(), "uint32_t".into());

        let lib = LibraryConfig {
            defined_classes: vec!["Context".into()],
            ..LibraryConfig::default()
        };
        let map = TypeMap::build(&headers, &lib, &BTreeMap::new());

        assert_eq!(map.resolve("XnA"), Resolution::Resolved("ctypes.c_uint32"));
        assert_eq!(
            map.resolve("XnB*"),
            Resolution::Resolved("ctypes.POINTER(ctypes.c_uint32)")
        );
        assert_eq!(
            map.resolve("XnVersion*"),
            Resolution::Resolved("ctypes.POINTER(Version)")
        );
        assert_eq!(map.resolve("XnPixelFormat"), Resolution::Resolved("PixelFormat"));
        assert_eq!(map.resolve("XnMissing"), Resolution::Unresolved);
        assert_eq!(map.method_name("Context", "xnContextRegisterForShutdown"), "registerForShutdown");
        assert_eq!(map.method_name("Context", "xnStartGeneratingAll"), "startGeneratingAll");
        assert_eq!(
            map.link_methods("Context", "See xnContextRelease, xnInit and myxnContextOpen."),
            "See release, xnInit and myxnContextOpen."
        );
        assert_eq!(map.link_methods("Unknown", "xnContextRelease"), "xnContextRelease");
    }
}
