//! Emitter — model types → emission nodes → Python ctypes module text.
//!
//! Building and rendering are separate passes: [`Emitter`] turns the parsed
//! headers into a [`Document`] of [`Node`]s, and [`Document::render`] is the
//! only place that formats text.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use tracing::debug;

use crate::config::LibraryConfig;
use crate::docs;
use crate::model::*;
use crate::overrides::Overrides;
use crate::typemap::{Resolution, TypeMap};

/// Doc text used where a declaration has none.
pub const NOT_AVAILABLE: &str = "N/A";

/// Prologue line prefix replaced with the constant-group and enum sections.
pub const ENUMS_MARKER: &str = "# GENERATED_ENUMS";
/// Prologue line prefix replaced with the struct section.
pub const STRUCTS_MARKER: &str = "# GENERATED_STRUCTS";
/// Prologue line prefix replaced with the version lines.
pub const BUILD_DATE_MARKER: &str = "build_date =";

const ENUM_BASE: &str = r#"class _Enum(ctypes.c_ulong):
    '''(INTERNAL) Base class for generated enumerations.
    '''
    _enum_names_ = {}

    def __str__(self):
        n = self._enum_names_.get(self.value, '') or ('?(%r)' % (self.value,))
        return '.'.join((self.__class__.__name__, n))

    def __repr__(self):
        return '.'.join((self.__class__.__module__, self.__str__()))

    def __eq__(self, other):
        if isinstance(other, _Enum):
            return self.value == other.value
        return isinstance(other, int) and self.value == other

    def __ne__(self, other):
        return not self.__eq__(other)

    def __hash__(self):
        return hash(self.value)"#;

/// One wrapper method inside a [`Node::ClassDecl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    /// Positional parameters, `self` first.
    pub args: Vec<String>,
    pub doc: String,
    /// Native function the method forwards to.
    pub target: String,
    /// Class the call result is wrapped into, if any.
    pub wrap: Option<String>,
}

/// One `ctypes.CFUNCTYPE` signature inside [`Node::CallbackGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackDecl {
    pub name: String,
    /// Return descriptor first, then one per parameter.
    pub types: Vec<String>,
    pub doc: String,
}

/// Emission node. Every variant renders to one self-contained block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text copied as-is (templates, version lines).
    Verbatim(String),
    /// `# ` prefixed comment lines.
    Comment(Vec<String>),
    /// Constants sharing a `#define` prefix.
    ConstantGroup {
        name: String,
        prefix: String,
        constants: Vec<(String, String)>,
    },
    EnumDecl {
        name: String,
        doc: String,
        values: Vec<(String, i64)>,
    },
    StructDecl {
        name: String,
        doc: String,
        fields: Vec<(String, String)>,
    },
    /// `ctypes.c_void_p` shell (private objects, callback holders).
    OpaqueDecl { name: String, doc: String },
    /// Wrapper class with optional constructor, override body and methods.
    ClassDecl {
        name: String,
        doc: String,
        constructor: bool,
        body: String,
        methods: Vec<MethodDecl>,
    },
    /// Lazily bound low-level function.
    RawBinding {
        name: String,
        args: Vec<String>,
        doc: String,
        flags: Vec<u8>,
        types: Vec<String>,
    },
    CallbackGroup(Vec<CallbackDecl>),
}

/// Ordered emission nodes of one output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Render every node, blocks separated by one blank line.
    pub fn render(&self) -> String {
        let blocks: Vec<String> = self
            .nodes
            .iter()
            .map(render_node)
            .filter(|b| !b.is_empty())
            .collect();
        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }
}

/// Builds emission nodes from parsed headers. Everything it reads is
/// immutable for the lifetime of the emitter.
pub struct Emitter<'a> {
    headers: &'a Headers,
    types: &'a TypeMap,
    overrides: &'a Overrides,
    lib: &'a LibraryConfig,
}

impl<'a> Emitter<'a> {
    pub fn new(
        headers: &'a Headers,
        types: &'a TypeMap,
        overrides: &'a Overrides,
        lib: &'a LibraryConfig,
    ) -> Self {
        Self {
            headers,
            types,
            overrides,
            lib,
        }
    }

    /// Full module: prologue with its marker sections, wrappers, raw
    /// bindings, callbacks, the unwrapped report, epilogue.
    pub fn document(&self, prologue: Option<&str>, epilogue: Option<&str>) -> Document {
        let mut nodes = match prologue {
            Some(text) => self.expand_prologue(text),
            None => {
                let mut nodes = vec![Node::Verbatim("import ctypes".to_string())];
                nodes.extend(self.version_lines());
                nodes.extend(self.constant_groups());
                nodes.extend(self.enums());
                nodes.extend(self.structs());
                nodes
            }
        };

        let (wrappers, wrapped) = self.wrappers();
        nodes.extend(wrappers);
        nodes.extend(self.raw_bindings());
        nodes.extend(self.callbacks());
        nodes.extend(self.unwrapped(&wrapped));
        if let Some(text) = epilogue {
            nodes.push(Node::Verbatim(text.to_string()));
        }
        Document { nodes }
    }

    /// Enum and struct sections only.
    pub fn structs_document(&self) -> Document {
        let mut nodes = vec![Node::Verbatim("import ctypes".to_string())];
        nodes.extend(self.enums());
        nodes.extend(self.structs());
        Document { nodes }
    }

    /// Copy the prologue, replacing marker lines with their sections. Any
    /// section without a marker follows the prologue, in section order.
    fn expand_prologue(&self, prologue: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut chunk = String::new();
        let (mut versions, mut enums, mut structs) = (false, false, false);

        let flush = |chunk: &mut String, nodes: &mut Vec<Node>| {
            let text = chunk.trim_end();
            if !text.is_empty() {
                nodes.push(Node::Verbatim(text.to_string()));
            }
            chunk.clear();
        };

        for line in prologue.lines() {
            let marker = line.trim_start();
            if marker.starts_with(BUILD_DATE_MARKER) && !versions {
                flush(&mut chunk, &mut nodes);
                nodes.extend(self.version_lines());
                versions = true;
            } else if marker.starts_with(ENUMS_MARKER) && !enums {
                flush(&mut chunk, &mut nodes);
                nodes.extend(self.constant_groups());
                nodes.extend(self.enums());
                enums = true;
            } else if marker.starts_with(STRUCTS_MARKER) && !structs {
                flush(&mut chunk, &mut nodes);
                if !enums {
                    nodes.extend(self.constant_groups());
                    nodes.extend(self.enums());
                    enums = true;
                }
                nodes.extend(self.structs());
                structs = true;
            } else {
                chunk.push_str(line);
                chunk.push('\n');
            }
        }
        flush(&mut chunk, &mut nodes);

        if !versions {
            nodes.extend(self.version_lines());
        }
        if !enums {
            nodes.extend(self.constant_groups());
            nodes.extend(self.enums());
        }
        if !structs {
            nodes.extend(self.structs());
        }
        nodes
    }

    fn version_lines(&self) -> Vec<Node> {
        let version = match self.headers.version.as_str() {
            "" => NOT_AVAILABLE,
            v => v,
        };
        vec![Node::Verbatim(format!(
            "__version__ = \"{version}\"\nbuild_date = \"{version}\""
        ))]
    }

    /// One constant class per configured define group (`PROP` → `Prop`).
    pub fn constant_groups(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for group in &self.lib.define_groups {
            let prefix = format!("{}{}_", self.lib.define_prefix, group);
            let constants: Vec<(String, String)> = self
                .headers
                .defines
                .iter()
                .filter_map(|(k, v)| {
                    k.strip_prefix(prefix.as_str())
                        .filter(|rest| !rest.is_empty())
                        .map(|rest| (python_name(rest), v.clone()))
                })
                .collect();
            if constants.is_empty() {
                continue;
            }
            debug!(group = %group, constants = constants.len(), "emitting constant group");
            nodes.push(Node::ConstantGroup {
                name: title(group),
                prefix,
                constants,
            });
        }
        nodes
    }

    /// The `_Enum` base followed by one class per enum.
    pub fn enums(&self) -> Vec<Node> {
        if self.headers.enums.is_empty() {
            return Vec::new();
        }
        let mut nodes = vec![Node::Verbatim(ENUM_BASE.to_string())];
        for e in &self.headers.enums {
            let name = self.class_of(&e.name);
            debug!(class = %name, values = e.vals.len(), "emitting enum");
            nodes.push(Node::EnumDecl {
                name,
                doc: doc_or_na(&e.docs),
                values: e.vals.iter().map(|v| (v.name.clone(), v.value)).collect(),
            });
        }
        nodes
    }

    /// Struct classes, then private-object shells. Classes the override
    /// source defines are left to it.
    pub fn structs(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for s in &self.headers.structs {
            let name = self.class_of(&s.name);
            if self.overrides.contains(&name) {
                debug!(class = %name, "struct overridden");
                continue;
            }
            let fields = s
                .fields
                .iter()
                .map(|f| {
                    let context = format!("{} in struct {}", f.name, s.name);
                    (f.name.clone(), self.types.descriptor_or_opaque(&f.ty, &context).to_string())
                })
                .collect();
            nodes.push(Node::StructDecl {
                name,
                doc: doc_or_na(&s.docs),
                fields,
            });
        }
        for p in &self.headers.privates {
            let name = self.class_of(&p.name);
            if self.overrides.contains(&name) || self.types.is_defined_class(&name) {
                continue;
            }
            nodes.push(Node::OpaqueDecl {
                name,
                doc: "Private object.".to_string(),
            });
        }
        nodes
    }

    /// Wrapper classes for every defined class, with one method per function
    /// whose first parameter maps to it. Returns the nodes and the names of
    /// the functions that were attached to a class.
    pub fn wrappers(&self) -> (Vec<Node>, BTreeSet<String>) {
        let mut groups: BTreeMap<&str, Vec<&Func>> = self
            .types
            .defined_classes()
            .iter()
            .map(|c| (c.as_str(), Vec::new()))
            .collect();
        for f in &self.headers.funcs {
            let Some(first) = f.pars.first() else {
                continue;
            };
            if let Resolution::Resolved(class) = self.types.resolve(&first.ty) {
                if let Some(funcs) = groups.get_mut(class) {
                    funcs.push(f);
                }
            }
        }

        let mut wrapped = BTreeSet::new();
        let mut nodes = Vec::new();
        for (class, funcs) in groups {
            let code = self.overrides.code_for(class);
            let mut methods = Vec::new();
            for f in funcs {
                wrapped.insert(f.name.clone());
                let name = self.types.method_name(class, &f.name);
                if self.overrides.defines_method(class, &name) {
                    debug!(class, method = %name, "method overridden");
                    continue;
                }
                methods.push(self.method(class, f, name));
            }
            debug!(class, methods = methods.len(), "emitting wrapper class");
            nodes.push(Node::ClassDecl {
                name: class.to_string(),
                doc: doc_or_na(self.overrides.doc_for(class).trim()),
                constructor: !self.overrides.defines_method(class, "__new__"),
                body: trim_blank_lines(code).to_string(),
                methods,
            });
        }
        (nodes, wrapped)
    }

    fn method(&self, class: &str, f: &Func, name: String) -> MethodDecl {
        let descriptors: Vec<&str> = f
            .pars
            .iter()
            .map(|p| self.types.descriptor_or_opaque(&p.ty, &f.name))
            .collect();

        let mut doc = self.types.link_methods(class, &f.epydocs(1, 8));
        if !doc.is_empty() {
            doc.push_str("\n        ");
        }
        let _ = write!(doc, "Parameter types: {}", descriptors.join(", "));

        let references: Vec<&str> = descriptors
            .iter()
            .filter_map(|d| d.strip_prefix("ctypes.POINTER("))
            .filter_map(|d| d.strip_suffix("Reference)"))
            .collect();
        let wrap = match references.as_slice() {
            [single] => Some(single.to_string()),
            _ => None,
        };

        let mut args = vec!["self".to_string()];
        args.extend(f.args(1).into_iter().map(str::to_string));
        MethodDecl {
            name,
            args,
            doc,
            target: f.name.clone(),
            wrap,
        }
    }

    /// One lazily bound callable per function.
    pub fn raw_bindings(&self) -> Vec<Node> {
        let mut nodes = vec![Node::Comment(vec!["Decorated C API functions".to_string()])];
        for f in &self.headers.funcs {
            let types = std::iter::once(&f.ty)
                .chain(f.pars.iter().map(|p| &p.ty))
                .map(|t| self.types.descriptor_or_opaque(t, &f.name).to_string())
                .collect();
            nodes.push(Node::RawBinding {
                name: f.name.clone(),
                args: f.args(0).into_iter().map(str::to_string).collect(),
                doc: f.epydocs(0, 4),
                flags: f.pars.iter().map(|p| p.flag.code()).collect(),
                types,
            });
        }
        nodes
    }

    /// Holder classes plus the `CallbackDecorators` container.
    pub fn callbacks(&self) -> Vec<Node> {
        if self.headers.callbacks.is_empty() {
            return Vec::new();
        }
        let mut nodes = Vec::new();
        let mut decls = Vec::new();
        for f in &self.headers.callbacks {
            let name = self.class_of(&f.name);
            let doc = f.epydocs(0, 4);
            nodes.push(Node::OpaqueDecl {
                name: name.clone(),
                doc: doc_or_na(&doc),
            });
            let types = std::iter::once(&f.ty)
                .chain(f.pars.iter().map(|p| &p.ty))
                .map(|t| self.types.descriptor_or_opaque(t, &f.name).to_string())
                .collect();
            decls.push(CallbackDecl {
                name,
                types,
                doc: doc_or_na(&doc),
            });
        }
        nodes.push(Node::CallbackGroup(decls));
        nodes
    }

    /// Report blacklisted functions and functions attached to no class.
    pub fn unwrapped(&self, wrapped: &BTreeSet<String>) -> Vec<Node> {
        let blacklisted: Vec<String> = self.headers.blacklisted.keys().cloned().collect();
        let mut unwrapped: Vec<String> = self
            .headers
            .funcs
            .iter()
            .filter(|f| !wrapped.contains(&f.name))
            .map(|f| {
                let class = f
                    .pars
                    .first()
                    .and_then(|p| match self.types.resolve(&p.ty) {
                        Resolution::Resolved(c) => Some(c),
                        Resolution::Unresolved => None,
                    })
                    .unwrap_or("None");
                format!("{} ({})", f.name, class)
            })
            .collect();
        unwrapped.sort();

        let mut nodes = Vec::new();
        for (names, what) in [
            (blacklisted, "blacklisted"),
            (unwrapped, "not wrapped as methods"),
        ] {
            if names.is_empty() {
                continue;
            }
            let mut lines = vec![format!("{} function(s) {what}:", names.len())];
            lines.extend(names.into_iter().map(|n| format!(" {n}")));
            nodes.push(Node::Comment(lines));
        }
        nodes
    }

    fn class_of(&self, native: &str) -> String {
        match self.types.resolve(native) {
            Resolution::Resolved(class) => class.to_string(),
            Resolution::Unresolved => native.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_node(node: &Node) -> String {
    let mut out = String::new();
    match node {
        Node::Verbatim(text) => out.push_str(text.trim_end()),
        Node::Comment(lines) => {
            let lines: Vec<String> = lines.iter().map(|l| format!("# {l}")).collect();
            out.push_str(&lines.join("\n"));
        }
        Node::ConstantGroup {
            name,
            prefix,
            constants,
        } => {
            let _ = writeln!(out, "class {name}:");
            let _ = write!(out, "    '''{prefix}* constants.\n    '''");
            for (k, v) in constants {
                let _ = write!(out, "\n    {k} = {v}");
            }
        }
        Node::EnumDecl { name, doc, values } => {
            let _ = writeln!(out, "class {name}(_Enum):");
            let _ = writeln!(out, "    '''{doc}\n    '''");
            out.push_str("    _enum_names_ = {\n");
            for (n, v) in values {
                let _ = writeln!(out, "        {v}: '{n}',");
            }
            out.push_str("    }");

            let width = values.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
            let mut lines: Vec<String> = values
                .iter()
                .map(|(n, v)| format!("{name}.{n:<width$} = {name}({v})"))
                .collect();
            lines.sort();
            if !lines.is_empty() {
                out.push_str("\n\n");
                out.push_str(&lines.join("\n"));
            }
        }
        Node::StructDecl { name, doc, fields } => {
            let _ = writeln!(out, "class {name}(ctypes.Structure):");
            let _ = writeln!(out, "    '''{doc}\n    '''");
            out.push_str("    _fields_ = (\n");
            for (n, ty) in fields {
                let _ = writeln!(out, "        ('{n}', {ty}),");
            }
            out.push_str("    )");
        }
        Node::OpaqueDecl { name, doc } => {
            let _ = write!(
                out,
                "class {name}(ctypes.c_void_p):\n    '''{doc}\n    '''\n    pass"
            );
        }
        Node::ClassDecl {
            name,
            doc,
            constructor,
            body,
            methods,
        } => {
            let _ = write!(out, "class {name}(_Ctype):\n    '''{doc}\n    '''");
            if *constructor {
                out.push_str(
                    "\n\n    def __new__(cls, ptr=None):\n        '''(INTERNAL) ctypes wrapper constructor.\n        '''\n        return _Constructor(cls, ptr)",
                );
            }
            if !body.is_empty() {
                out.push_str("\n\n");
                out.push_str(body);
            }
            for m in methods {
                out.push_str("\n\n");
                render_method(&mut out, m);
            }
        }
        Node::RawBinding {
            name,
            args,
            doc,
            flags,
            types,
        } => {
            let args = args.join(", ");
            let mut flags: String = flags
                .iter()
                .map(|f| format!("({f},)"))
                .collect::<Vec<_>>()
                .join(", ");
            if !flags.is_empty() {
                flags.push(',');
            }
            let types = types.join(", ");
            let doc = doc_or_na(doc);
            let _ = write!(
                out,
                "def {name}({args}):
    '''{doc}
    '''
    f = _Cfunctions.get('{name}', None) or \\
        _Cfunction('{name}', ({flags}),
                    {types})
    if not __debug__:  # python -O or -OO
        global {name}
        {name} = f
    return f({args})"
            );
        }
        Node::CallbackGroup(decls) => {
            out.push_str("class CallbackDecorators(object):\n");
            out.push_str("    \"Class holding various method decorators for callback functions.\"");
            for d in decls {
                let _ = write!(
                    out,
                    "\n    {name} = ctypes.CFUNCTYPE({types})\n    {name}.__doc__ = '''{doc}\n    '''",
                    name = d.name,
                    types = d.types.join(", "),
                    doc = d.doc,
                );
            }
            out.push_str("\n\ncb = CallbackDecorators");
        }
    }
    out
}

fn render_method(out: &mut String, m: &MethodDecl) {
    let args = m.args.join(", ");
    let call = format!("{}({args})", m.target);
    let call = match &m.wrap {
        Some(class) => format!("{class}({call})"),
        None => call,
    };
    let _ = write!(
        out,
        "    def {name}({args}):\n        '''{doc}\n        '''\n        return {call}",
        name = m.name,
        doc = m.doc,
    );
}

fn doc_or_na(doc: &str) -> String {
    if doc.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        doc.to_string()
    }
}

/// `PROP` → `Prop`.
fn title(group: &str) -> String {
    docs::capitalize(&group.to_ascii_lowercase())
}

/// Constant names must be Python identifiers.
fn python_name(rest: &str) -> String {
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{rest}")
    } else {
        rest.to_string()
    }
}

/// Drop whitespace-only leading lines and all trailing whitespace, keeping
/// the indentation of the first real line.
fn trim_blank_lines(code: &str) -> &str {
    let mut start = 0;
    for line in code.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    code[start..].trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::DocTransformer;

    fn func(name: &str, pars: Vec<Par>, raw_doc: &str) -> Func {
        let doc = DocTransformer::new().unwrap().transform(raw_doc);
        Func::new(
            name.to_string(),
            "XnStatus".to_string(),
            pars,
            raw_doc.to_string(),
            doc,
            SourceLoc::default(),
            &[],
        )
    }

    fn fixture() -> (Headers, LibraryConfig) {
        let mut headers = Headers::default();
        headers.privates.push(PrivateObject {
            name: "XnContext".into(),
        });
        headers.typedefs.insert("XnContext".into(), "XnContext".into());
        headers.enums.push(EnumDef {
            name: "XN_STATUS".into(),
            vals: vec![Val::new("XN_STATUS_OK", 0), Val::new("XN_STATUS_ERROR", 1)],
            docs: "Status codes.".into(),
            source: SourceLoc::default(),
        });
        headers.funcs.push(func(
            "xnContextRelease",
            vec![Par::new("pContext", "XnContext*")],
            "Releases a context.\n@param pContext [in] the context.",
        ));
        headers.funcs.push(func(
            "xnPrint",
            vec![Par::new("strText", "char*")],
            "Prints.\n@param strText text.",
        ));
        headers
            .defines
            .insert("XN_PROP_MIRROR".into(), "\"Mirror\"".into());
        let lib = LibraryConfig {
            defined_classes: vec!["Context".into()],
            ..LibraryConfig::default()
        };
        (headers, lib)
    }

    fn type_map(headers: &Headers, lib: &LibraryConfig) -> TypeMap {
        let mut extra = BTreeMap::new();
        extra.insert("XnStatus".to_string(), "Status".to_string());
        extra.insert("XnContext*".to_string(), "Context".to_string());
        TypeMap::build(headers, lib, &extra)
    }

    #[test]
    fn enum_renders_aligned_sorted_values() {
        let (headers, lib) = fixture();
        let types = type_map(&headers, &lib);
        let overrides = Overrides::default();
        let emitter = Emitter::new(&headers, &types, &overrides, &lib);
        let text = Document {
            nodes: emitter.enums(),
        }
        .render();
        assert!(text.contains("class Status(_Enum):\n    '''Status codes.\n    '''"));
        assert!(text.contains("        0: 'OK',\n        1: 'ERROR',\n    }"));
        assert!(text.contains("Status.ERROR = Status(1)\nStatus.OK    = Status(0)"));
    }

    #[test]
    fn methods_strip_class_prefix() {
        let (headers, lib) = fixture();
        let types = type_map(&headers, &lib);
        let overrides = Overrides::default();
        let emitter = Emitter::new(&headers, &types, &overrides, &lib);
        let (nodes, wrapped) = emitter.wrappers();
        assert_eq!(wrapped.into_iter().collect::<Vec<_>>(), vec!["xnContextRelease"]);
        let Node::ClassDecl {
            name,
            constructor,
            methods,
            ..
        } = &nodes[0]
        else {
            panic!("expected a class, got {:?}", nodes[0]);
        };
        assert_eq!(name, "Context");
        assert!(*constructor);
        assert_eq!(methods[0].name, "release");
        assert_eq!(methods[0].args, vec!["self"]);
        assert!(methods[0].doc.ends_with("Parameter types: Context"));
    }

    #[test]
    fn defined_class_private_gets_no_shell() {
        let (headers, lib) = fixture();
        let types = type_map(&headers, &lib);
        let overrides = Overrides::default();
        let emitter = Emitter::new(&headers, &types, &overrides, &lib);
        assert!(emitter.structs().is_empty());
    }

    #[test]
    fn unwrapped_functions_reported() {
        let (headers, lib) = fixture();
        let types = type_map(&headers, &lib);
        let overrides = Overrides::default();
        let emitter = Emitter::new(&headers, &types, &overrides, &lib);
        let (_, wrapped) = emitter.wrappers();
        let text = Document {
            nodes: emitter.unwrapped(&wrapped),
        }
        .render();
        assert_eq!(
            text,
            "# 1 function(s) not wrapped as methods:\n#  xnPrint (ctypes.c_char_p)\n"
        );
    }

    #[test]
    fn raw_binding_flags_and_types() {
        let node = Node::RawBinding {
            name: "xnInit".into(),
            args: Vec::new(),
            doc: "Initializes.".into(),
            flags: vec![2],
            types: vec!["Status".into(), "ctypes.POINTER(Context)".into()],
        };
        let text = render_node(&node);
        assert!(text.starts_with("def xnInit():\n    '''Initializes.\n    '''"));
        assert!(text.contains("_Cfunction('xnInit', ((2,),),\n                    Status, ctypes.POINTER(Context))"));
        assert!(text.ends_with("return f()"));
    }

    #[test]
    fn prologue_markers_replaced() {
        let (mut headers, lib) = fixture();
        headers.version = "1.2".into();
        let types = type_map(&headers, &lib);
        let overrides = Overrides::default();
        let emitter = Emitter::new(&headers, &types, &overrides, &lib);
        let prologue = "import ctypes\nbuild_date = ''\n# GENERATED_ENUMS go here\n# GENERATED_STRUCTS go here\n";
        let text = emitter.document(Some(prologue), None).render();
        assert!(text.starts_with("import ctypes\n\n__version__ = \"1.2\"\nbuild_date = \"1.2\"\n\nclass Prop:"));
        assert!(!text.contains("GENERATED_"));
        let enums = text.find("class Status(_Enum)").unwrap();
        let wrappers = text.find("class Context(_Ctype)").unwrap();
        assert!(enums < wrappers);
    }
}
