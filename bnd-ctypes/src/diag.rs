//! Diagnostics — per-declaration problems, counted rather than thrown.

use thiserror::Error;
use tracing::warn;

/// Highest process exit status a run reports.
const MAX_EXIT_CODE: usize = 9;

/// One recorded problem. `location` is the `file:line` of the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("no comment for {kind} {name} ({location})")]
    MissingDocumentation {
        kind: &'static str,
        name: String,
        location: String,
    },

    #[error("doc parameters ({documented}) mismatch for function {name} ({declared}) ({location})")]
    DocParamCountMismatch {
        name: String,
        documented: usize,
        declared: usize,
        location: String,
    },

    #[error("no type conversion for {ty} {context} ({location})")]
    UnresolvedTypeMapping {
        ty: String,
        context: String,
        location: String,
    },

    #[error("cannot parse declarator `{text}` in {decl} ({location})")]
    UnparsableParameter {
        text: String,
        decl: String,
        location: String,
    },

    #[error("missing parameter name for type {ty} in {decl} ({location})")]
    MissingParameterName {
        ty: String,
        decl: String,
        location: String,
    },
}

/// Accumulator threaded through parsing, checking and validation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, logging it as it arrives.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Unresolved type names, deduplicated, in first-seen order.
    pub fn unresolved_types(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.items
            .iter()
            .filter_map(|d| match d {
                Diagnostic::UnresolvedTypeMapping { ty, .. } => Some(ty.as_str()),
                _ => None,
            })
            .filter(|ty| seen.insert(*ty))
            .collect()
    }

    /// `min(count, 9)`: 0 only when nothing was recorded.
    pub fn exit_code(&self) -> i32 {
        self.items.len().min(MAX_EXIT_CODE) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unresolved(ty: &str) -> Diagnostic {
        Diagnostic::UnresolvedTypeMapping {
            ty: ty.into(),
            context: "in xnFoo".into(),
            location: "a.h:1".into(),
        }
    }

    #[test]
    fn exit_code_saturates() {
        let mut diags = Diagnostics::new();
        assert_eq!(diags.exit_code(), 0);
        for _ in 0..12 {
            diags.push(unresolved("XnThing*"));
        }
        assert_eq!(diags.exit_code(), 9);
        assert_eq!(diags.unresolved_types(), vec!["XnThing*"]);
    }

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            unresolved("XnThing*").to_string(),
            "no type conversion for XnThing* in xnFoo (a.h:1)"
        );
    }
}
