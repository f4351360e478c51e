//! Doxygen → epydoc doc-string transformation.

use anyhow::Result;
use regex::Regex;

/// Phrase some headers put in front of `[out]` parameter docs.
const OUT_POINTER_PHRASE: &str = "pointer to get the ";

/// Inline markup rewrites applied before field splitting, in order.
const MARKUP: &[(&str, &str)] = &[
    ("@{", ""),
    ("@}", ""),
    ("\\ingroup", ""),
    ("{", ""),
    ("}", ""),
    ("<b>", "B{"),
    ("</b>", "}"),
    ("@see", "See"),
    ("\\see", "See"),
    ("\\bug", "@bug"),
    ("\\version", "@version"),
    ("\\note", "@note"),
    ("\\warning", "@warning"),
    ("\\param", "@param"),
    ("\\return", "@return"),
];

/// Structured doc fields of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncDoc {
    /// Leading description lines (everything before the first tag).
    pub heads: Vec<String>,
    /// `@param name: text.` lines, `[out]` parameters excluded.
    pub params: Vec<String>,
    /// Names of parameters tagged `[out]`, in doc order.
    pub out: Vec<String>,
    /// Names of parameters tagged `[in,out]`.
    pub inout: Vec<String>,
    /// `@return`, `@note`/`@warning`, `@version` and `@bug` lines.
    pub tails: Vec<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Param,
    Return,
    Note,
    Version,
    Bug,
    Dropped,
}

/// Doc transformer with its pre-compiled patterns.
pub struct DocTransformer {
    re_param: Regex,
    re_xref: Regex,
}

impl DocTransformer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_param: Regex::new(
                r"@param\s*(?:\[([^\]]*)\])?\s*([A-Za-z_]\w*|\.\.\.)\s*(?:\[([^\]]*)\])?\s*(.*)$",
            )?,
            re_xref: Regex::new(r"[@\\](?:ref|a|p|c|em|e|b)[ \t]+")?,
        })
    }

    /// Apply the markup rewrites and reduce cross-reference markers
    /// (`@ref name`, `\p name`) to the bare name.
    fn plain(&self, raw: &str) -> String {
        let text = MARKUP
            .iter()
            .fold(raw.to_string(), |acc, (from, to)| acc.replace(from, to));
        self.re_xref.replace_all(&text, "").into_owned()
    }

    /// Doc string of an enum or struct: plain markup, terminal period and a
    /// capitalized first letter.
    pub fn type_doc(&self, raw: &str) -> String {
        capitalize(&endot(&self.plain(raw)))
    }

    /// Split a raw doc block into description, parameter and trailing fields.
    ///
    /// Continuation lines (untagged lines after a tagged one) are appended to
    /// the last tagged field. Continuations of an `[out]` parameter are
    /// dropped: the out parameters are folded into one synthesized `@return`.
    pub fn transform(&self, raw: &str) -> FuncDoc {
        let text = self.plain(raw);

        let mut doc = FuncDoc::default();
        let mut outs: Vec<String> = Vec::new();
        let mut returns: Vec<String> = Vec::new();
        let mut notes: Vec<String> = Vec::new();
        let mut versions: Vec<String> = Vec::new();
        let mut bugs: Vec<String> = Vec::new();
        let mut current: Option<Field> = None;

        for line in text.lines() {
            if line.contains("@param") {
                current = Some(self.param_line(line, &mut doc, &mut outs));
            } else if line.contains("@return") {
                returns.push(tag_colon(line, "@return"));
                current = Some(Field::Return);
            } else if line.contains("@bug") {
                bugs.push(tag_colon(line, "@bug"));
                current = Some(Field::Bug);
            } else if line.contains("@version") {
                versions.push(tag_colon(line, "@version"));
                current = Some(Field::Version);
            } else if line.contains("@note") || line.contains("@warning") {
                notes.push(tag_colon(&tag_colon(line, "@note"), "@warning"));
                current = Some(Field::Note);
            } else if let Some(field) = current {
                let target = match field {
                    Field::Param => &mut doc.params,
                    Field::Return => &mut returns,
                    Field::Note => &mut notes,
                    Field::Version => &mut versions,
                    Field::Bug => &mut bugs,
                    Field::Dropped => continue,
                };
                let cont = line.trim();
                if let (Some(last), false) = (target.last_mut(), cont.is_empty()) {
                    last.push(' ');
                    last.push_str(cont);
                }
            } else {
                doc.heads.push(line.trim_end().to_string());
            }
        }

        while doc.heads.last().is_some_and(|h| h.trim().is_empty()) {
            doc.heads.pop();
        }
        if let Some(first) = doc.heads.iter_mut().find(|h| !h.trim().is_empty()) {
            *first = capitalize(first.as_str());
        }
        if let Some(last) = doc.heads.last_mut() {
            *last = endot(last);
        }
        if !outs.is_empty() {
            returns = vec![format!("@return: {}", outs.join(", "))];
        }
        doc.params = doc.params.iter().map(|p| endot(p)).collect();
        doc.tails = returns
            .into_iter()
            .chain(notes)
            .chain(versions)
            .chain(bugs)
            .map(|t| endot(&t))
            .collect();
        doc
    }

    fn param_line(&self, line: &str, doc: &mut FuncDoc, outs: &mut Vec<String>) -> Field {
        let Some(caps) = self.re_param.captures(line) else {
            doc.params.push(line.trim().to_string());
            return Field::Param;
        };
        let name = caps[2].to_string();
        let tag = caps
            .get(1)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().replace(' ', "").to_ascii_lowercase())
            .unwrap_or_default();
        let text = caps[4].trim();

        match tag.as_str() {
            "out" => {
                let text = text.replace(OUT_POINTER_PHRASE, "");
                let entry = format!("{name} {}", text.split_whitespace().collect::<Vec<_>>().join(" "));
                outs.push(entry.trim_end().to_string());
                doc.out.push(name);
                Field::Dropped
            }
            "in,out" | "inout" => {
                doc.params.push(format!("@param {name}: {text}"));
                doc.inout.push(name);
                Field::Param
            }
            _ => {
                doc.params.push(format!("@param {name}: {text}"));
                Field::Param
            }
        }
    }
}

/// Terminate text with a period unless it already ends in punctuation.
pub fn endot(text: &str) -> String {
    match text.chars().last() {
        Some(c) if !".,:;?!".contains(c) => format!("{text}."),
        _ => text.to_string(),
    }
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `@return\ttext` → `@return: text`.
fn tag_colon(line: &str, tag: &str) -> String {
    let Some(i) = line.find(tag) else {
        return line.to_string();
    };
    let rest = &line[i + tag.len()..];
    if rest.starts_with(char::is_whitespace) {
        format!("{}{tag}: {}", &line[..i], rest.trim_start())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xform(raw: &str) -> FuncDoc {
        DocTransformer::new().unwrap().transform(raw)
    }

    #[test]
    fn out_params_fold_into_return() {
        let doc = xform(
            "Initializes the context\n\
             @param pContext [out] pointer to get the context.\n\
             @return XN_STATUS_OK on success",
        );
        assert_eq!(doc.heads, vec!["Initializes the context."]);
        assert!(doc.params.is_empty());
        assert_eq!(doc.out, vec!["pContext"]);
        assert_eq!(doc.tails, vec!["@return: pContext context."]);
    }

    #[test]
    fn continuation_lines_join_last_field() {
        let doc = xform(
            "Adds a node\n\
             @param hNode [in] A handle to the node\n\
             \tthat is added\n\
             @param nCount [in,out] Number of entries\n\
             @note Not thread safe",
        );
        assert_eq!(
            doc.params,
            vec![
                "@param hNode: A handle to the node that is added.",
                "@param nCount: Number of entries.",
            ]
        );
        assert_eq!(doc.inout, vec!["nCount"]);
        assert_eq!(doc.tails, vec!["@note: Not thread safe."]);
    }

    #[test]
    fn backslash_tags_and_markup() {
        let doc = xform("Gets <b>all</b> nodes @{\n\\param p the list\n\\see xnFoo");
        assert_eq!(doc.heads, vec!["Gets B{all} nodes."]);
        assert_eq!(doc.params, vec!["@param p: the list See xnFoo."]);
    }

    #[test]
    fn type_doc_cleanup() {
        let docs = DocTransformer::new().unwrap();
        assert_eq!(docs.type_doc("status codes"), "Status codes.");
        assert_eq!(docs.type_doc("Ends here?"), "Ends here?");
        assert_eq!(docs.type_doc("modes, see @ref xnProbe"), "Modes, see xnProbe.");
    }

    #[test]
    fn cross_references_reduced_to_names() {
        let doc = xform(
            "Gets the version\n\
             @param pVersion [in] version, see \\ref XnVersion\n\
             @return @p pVersion filled in, see @ref xnInit",
        );
        assert_eq!(doc.params, vec!["@param pVersion: version, see XnVersion."]);
        assert_eq!(doc.tails, vec!["@return: pVersion filled in, see xnInit."]);
        assert!(doc.heads.iter().chain(&doc.params).chain(&doc.tails).all(|l| !l.contains("ref ")));
    }

    #[test]
    fn description_capitalized() {
        let doc = xform("gets the errors\nof the last run\n@param p [in] the list");
        assert_eq!(doc.heads, vec!["Gets the errors", "of the last run."]);
    }

    #[test]
    fn tab_separated_tags_get_colons() {
        let doc = xform("Checks.\n@return\t<b>TRUE</b> if supported");
        assert_eq!(doc.tails, vec!["@return: B{TRUE} if supported."]);
    }
}
