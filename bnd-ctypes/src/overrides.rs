//! Override merger — hand-written class bodies that take precedence over
//! generated ones.
//!
//! The override source is a sequence of `class Name[(bases)]:` headers, each
//! followed by its raw body. A leading string literal in a body becomes the
//! class doc string; every `def name` inside the rest marks a method the
//! generator must not emit again.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

/// One hand-written class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassOverride {
    pub code: String,
    pub doc: String,
    pub methods: BTreeSet<String>,
}

/// Parsed override source, keyed by class name.
#[derive(Debug, Default)]
pub struct Overrides {
    classes: BTreeMap<String, ClassOverride>,
}

impl Overrides {
    /// Read and parse an override file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading overrides {}", path.display()))?;
        Self::parse(&text)
    }

    /// Parse override source text.
    pub fn parse(text: &str) -> Result<Self> {
        let re_class = Regex::new(r"^class\s+(\w+)(?:\(.+\))?:")?;
        let re_def = Regex::new(r"(?m)^\s+def\s+(\w+)")?;

        let mut bodies: Vec<(String, String)> = Vec::new();
        for line in text.split_inclusive('\n') {
            match re_class.captures(line) {
                Some(caps) => bodies.push((caps[1].to_string(), String::new())),
                None => {
                    // Text ahead of the first class header belongs to nobody.
                    if let Some((_, body)) = bodies.last_mut() {
                        body.push_str(line);
                    }
                }
            }
        }

        let mut classes = BTreeMap::new();
        for (name, body) in bodies {
            let (doc, code) = split_docstring(&body);
            let methods = re_def
                .captures_iter(&code)
                .map(|caps| caps[1].to_string())
                .collect::<BTreeSet<_>>();
            debug!(class = %name, methods = methods.len(), "parsed override");
            classes.insert(name, ClassOverride { code, doc, methods });
        }
        Ok(Self { classes })
    }

    /// Raw body of `class`, or empty.
    pub fn code_for(&self, class: &str) -> &str {
        self.classes.get(class).map_or("", |c| c.code.as_str())
    }

    /// Methods `class` already defines by hand.
    pub fn defined_methods(&self, class: &str) -> impl Iterator<Item = &str> {
        self.classes
            .get(class)
            .into_iter()
            .flat_map(|c| c.methods.iter().map(String::as_str))
    }

    pub fn defines_method(&self, class: &str, method: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|c| c.methods.contains(method))
    }

    /// Class-level doc string of `class`, or empty.
    pub fn doc_for(&self, class: &str) -> &str {
        self.classes.get(class).map_or("", |c| c.doc.as_str())
    }

    /// Whether `class` has a hand-written body at all.
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Lift a leading `"""` or `'''` literal out of `body`.
fn split_docstring(body: &str) -> (String, String) {
    let trimmed = body.trim_start();
    for quote in ["\"\"\"", "'''"] {
        let split = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.split_once(quote));
        if let Some((doc, code)) = split {
            return (doc.to_string(), code.to_string());
        }
    }
    (String::new(), body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"# helpers for the generated module
class Context(_Ctype):
    """Create a new Context instance.
    """
    def __new__(cls, *args):
        return _Cobject(cls, ctypes.c_void_p())

class User(_Ctype):
    def isCapabilitySupported(self, capability):
        return xnIsCapabilitySupported(self, capability)

    def _helper(self):
        pass
"#;

    #[test]
    fn docstring_lifted_and_methods_found() {
        let o = Overrides::parse(SOURCE).unwrap();
        assert_eq!(o.len(), 2);
        assert_eq!(o.doc_for("Context"), "Create a new Context instance.\n    ");
        assert!(!o.code_for("Context").contains("\"\"\""));
        assert!(o.defines_method("Context", "__new__"));

        let user: Vec<&str> = o.defined_methods("User").collect();
        assert_eq!(user, vec!["_helper", "isCapabilitySupported"]);
        assert_eq!(o.doc_for("User"), "");
    }

    #[test]
    fn unknown_class_is_empty() {
        let o = Overrides::parse(SOURCE).unwrap();
        assert_eq!(o.code_for("Player"), "");
        assert_eq!(o.defined_methods("Player").count(), 0);
        assert!(!o.contains("Player"));
    }
}
