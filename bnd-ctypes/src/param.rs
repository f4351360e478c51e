//! Parameter parser — one `[const] type [*...] name[[]]` declarator at a time.

use anyhow::Result;
use regex::Regex;

use crate::model::Par;

/// Type given to every callback-pointer parameter.
pub const CALLBACK_TYPE: &str = "CALLBACK";
/// Name given to a `...` parameter.
pub const VARARGS_NAME: &str = "varargs";

/// Outcome of parsing one declarator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Par(Par),
    /// Empty input.
    Nothing,
    /// Text the parser cannot make sense of (embedded initializer lists).
    Unparsable,
}

/// Declarator parser, compiled for one library's callback tag.
pub struct ParamParser {
    re_const: Regex,
    re_storage: Regex,
    re_decl: Regex,
    re_callback: Regex,
}

impl ParamParser {
    pub fn new(callback_tag: &str) -> Result<Self> {
        Ok(Self {
            re_const: Regex::new(r"\bconst\b")?,
            re_storage: Regex::new(r"^(?:(?:struct|enum|union|extern|static|volatile|register)\s+)+")?,
            re_decl: Regex::new(
                r"^(?P<ty>.*?\S)(?P<sep>[\s\*]+)(?P<name>[A-Za-z_]\w*)\s*(?P<arr>\[[^\]]*\])?$",
            )?,
            re_callback: Regex::new(&format!(
                r"\(\s*{}\s*\*\s*(\w+)\s*\)",
                regex::escape(callback_tag)
            ))?,
        })
    }

    /// Parse a single declarator (already split on `,` or `;` by the caller).
    ///
    /// A declarator without a recognizable name yields a `Par` with an empty
    /// name; callers decide whether that is fatal for the declaration.
    pub fn parse(&self, text: &str) -> Parsed {
        let mut text = text.trim();
        if let Some(rest) = text.strip_prefix('}') {
            // Leftover of a multi-line struct with an inline body.
            text = rest.trim_start();
        }
        if text.is_empty() {
            return Parsed::Nothing;
        }
        if text.contains('{') {
            return Parsed::Unparsable;
        }

        let text = self.re_const.replace_all(text, "");
        let text = text.trim();

        if let Some(caps) = self.re_callback.captures(text) {
            let name = caps[1].to_string();
            return Parsed::Par(Par::new(name, CALLBACK_TYPE));
        }

        let text = self.re_storage.replace(text, "");
        let (mut ty, mut name, array) = match self.re_decl.captures(&text) {
            Some(caps) => {
                let stars = caps["sep"].matches('*').count();
                let ty = format!("{}{}", &caps["ty"], "*".repeat(stars));
                let array = caps.name("arr").is_some();
                (ty, caps["name"].to_string(), array)
            }
            // K&R style: only a type.
            None => (text.to_string(), String::new(), false),
        };

        ty.retain(|c| !c.is_whitespace());
        if ty == "..." {
            name = VARARGS_NAME.to_string();
        }
        if array {
            ty.push('*');
        }
        Parsed::Par(Par::new(name, ty))
    }
}

/// Split on `sep` outside of parentheses, so function-pointer declarators
/// keep their own parameter lists.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Parsed {
        ParamParser::new("XN_CALLBACK_TYPE").unwrap().parse(text)
    }

    fn par(name: &str, ty: &str) -> Parsed {
        Parsed::Par(Par::new(name, ty))
    }

    #[test]
    fn pointer_stars_fold_into_type() {
        assert_eq!(parse("char **argv"), par("argv", "char**"));
        assert_eq!(parse("const XnChar* strName"), par("strName", "XnChar*"));
        assert_eq!(parse("XnContext** ppContext"), par("ppContext", "XnContext**"));
        assert_eq!(parse("struct timespec *ts"), par("ts", "timespec*"));
    }

    #[test]
    fn multi_word_types_lose_whitespace() {
        assert_eq!(parse("unsigned int nCount"), par("nCount", "unsignedint"));
        assert_eq!(parse("unsigned* pnSize"), par("pnSize", "unsigned*"));
    }

    #[test]
    fn callback_and_varargs() {
        assert_eq!(
            parse("void (XN_CALLBACK_TYPE* handler)(XnStatus, void*)"),
            par("handler", CALLBACK_TYPE)
        );
        assert_eq!(parse("..."), par(VARARGS_NAME, "..."));
    }

    #[test]
    fn array_suffix_adds_pointer() {
        assert_eq!(parse("XnUInt32 anValues[]"), par("anValues", "XnUInt32*"));
        assert_eq!(parse("XnChar strName[XN_MAX_NAME_LENGTH]"), par("strName", "XnChar*"));
    }

    #[test]
    fn split_respects_parentheses() {
        assert_eq!(
            split_top_level("XnContext* pContext, void (XN_CALLBACK_TYPE* f)(int, int), void* pCookie", ','),
            vec!["XnContext* pContext", " void (XN_CALLBACK_TYPE* f)(int, int)", " void* pCookie"]
        );
    }

    #[test]
    fn edge_inputs() {
        assert_eq!(parse("   "), Parsed::Nothing);
        assert_eq!(parse("} "), Parsed::Nothing);
        assert_eq!(parse("union { int a"), Parsed::Unparsable);
        assert_eq!(parse("} XnUInt32 nLast"), par("nLast", "XnUInt32"));
        assert_eq!(parse("void"), par("", "void"));
        assert_eq!(parse("XnNodeHandle"), par("", "XnNodeHandle"));
    }
}
