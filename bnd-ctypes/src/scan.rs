//! Block matcher — line classification plus a small per-declaration state
//! machine that pairs declarations with the doc block preceding them.

use regex::Regex;
use tracing::debug;

/// One header line, classified before any grammar matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `/**` at column 0; carries the text after the opener.
    DocStart(&'a str),
    /// ` * text` (or a bare ` *`) inside a doc block.
    DocCont(&'a str),
    /// A lone `*/` closing a doc block.
    DocEnd,
    /// Preprocessor directive.
    Directive,
    Code(&'a str),
}

/// Classify a raw line. Doc lines are recognized by their column-0 shape
/// only; indented `/** ... */` member docs are plain code comments.
pub fn classify(raw: &str) -> Line<'_> {
    if let Some(rest) = raw.strip_prefix("/**") {
        Line::DocStart(rest.trim_end())
    } else if let Some(rest) = raw.strip_prefix(" * ") {
        Line::DocCont(rest.trim_end())
    } else if raw.trim_end() == " *" {
        Line::DocCont("")
    } else if raw.trim() == "*/" {
        Line::DocEnd
    } else if raw.trim_start().starts_with('#') {
        Line::Directive
    } else {
        Line::Code(raw)
    }
}

/// A matched declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Capture groups 1.. of the body regex (empty string for unmatched groups).
    pub groups: Vec<String>,
    /// The doc block that preceded the declaration, `*/` trimmed.
    pub doc: String,
    /// 1-based line number of the terminating line.
    pub line: usize,
}

#[derive(Debug)]
enum State {
    Idle,
    AccumulatingDoc,
    AccumulatingBlock(Vec<String>),
    Matched,
}

/// Lazy, single-pass iterator of [`Block`]s over one header's text.
pub struct BlockMatcher<'a, P> {
    file: &'a str,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    start: P,
    body: &'a Regex,
    end: &'a Regex,
    doc: Vec<String>,
    state: State,
    in_comment: bool,
}

/// Scan `text` for declarations: `start` decides whether a code line opens
/// one, `end` whether a line terminates it, and `body` must match the
/// space-joined declaration for it to be yielded.
pub fn blocks<'a, P>(
    file: &'a str,
    text: &'a str,
    start: P,
    body: &'a Regex,
    end: &'a Regex,
) -> BlockMatcher<'a, P>
where
    P: Fn(&str) -> bool,
{
    BlockMatcher {
        file,
        lines: text.lines().enumerate(),
        start,
        body,
        end,
        doc: Vec::new(),
        state: State::Idle,
        in_comment: false,
    }
}

impl<P> BlockMatcher<'_, P>
where
    P: Fn(&str) -> bool,
{
    /// Remove `//` and `/* */` comments, tracking comments that span lines.
    fn strip_comments(&mut self, raw: &str) -> String {
        let mut out = String::new();
        let mut rest = raw;
        loop {
            if self.in_comment {
                match rest.find("*/") {
                    Some(i) => {
                        self.in_comment = false;
                        rest = &rest[i + 2..];
                    }
                    None => break,
                }
            }
            let line_comment = rest.find("//");
            let block_comment = rest.find("/*");
            match (line_comment, block_comment) {
                (Some(l), b) if b.is_none_or(|b| l < b) => {
                    out.push_str(&rest[..l]);
                    break;
                }
                (_, Some(b)) => {
                    out.push_str(&rest[..b]);
                    out.push(' ');
                    rest = &rest[b + 2..];
                    self.in_comment = true;
                }
                _ => {
                    out.push_str(rest);
                    break;
                }
            }
        }
        out.trim().to_string()
    }

    fn try_match(&mut self, text: &str, line: usize) -> Option<Block> {
        let Some(caps) = self.body.captures(text) else {
            debug!(file = self.file, line, text, "declaration did not match body pattern");
            self.state = self.resting_state();
            return None;
        };
        let groups = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();

        let joined = self.doc.join("\n");
        let mut doc = joined.trim();
        if let Some(stripped) = doc.strip_suffix("*/") {
            doc = stripped.trim_end();
        }
        let doc = doc.to_string();
        self.doc.clear();
        self.state = State::Matched;
        Some(Block { groups, doc, line })
    }

    fn resting_state(&self) -> State {
        if self.doc.is_empty() {
            State::Idle
        } else {
            State::AccumulatingDoc
        }
    }
}

impl<P> Iterator for BlockMatcher<'_, P>
where
    P: Fn(&str) -> bool,
{
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if matches!(self.state, State::Matched) {
            self.state = State::Idle;
        }
        while let Some((idx, raw)) = self.lines.next() {
            let line = idx + 1;
            let code = match classify(raw) {
                Line::DocStart(text) if !self.in_comment => {
                    self.doc = vec![text.to_string()];
                    if !matches!(self.state, State::AccumulatingBlock(_)) {
                        self.state = State::AccumulatingDoc;
                    }
                    continue;
                }
                Line::DocCont(text) if !self.in_comment => {
                    self.doc.push(text.to_string());
                    continue;
                }
                Line::DocEnd if !self.in_comment => continue,
                Line::Directive => continue,
                Line::DocStart(_) | Line::DocCont(_) | Line::DocEnd | Line::Code(_) => {
                    self.strip_comments(raw)
                }
            };
            if code.is_empty() {
                continue;
            }

            match std::mem::replace(&mut self.state, State::Idle) {
                State::AccumulatingBlock(mut buf) => {
                    let ends = self.end.is_match(&code);
                    buf.push(code);
                    if ends {
                        let joined = buf.join(" ");
                        if let Some(block) = self.try_match(&joined, line) {
                            return Some(block);
                        }
                    } else {
                        self.state = State::AccumulatingBlock(buf);
                    }
                }
                previous => {
                    self.state = previous;
                    if (self.start)(&code) {
                        if self.end.is_match(&code) {
                            if let Some(block) = self.try_match(&code, line) {
                                return Some(block);
                            }
                        } else {
                            self.state = State::AccumulatingBlock(vec![code]);
                        }
                    } else {
                        // A doc block belongs to the declaration right after it.
                        self.doc.clear();
                        self.state = State::Idle;
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str, start: &str, body: &str, end: &str) -> Vec<Block> {
        let start = Regex::new(start).unwrap();
        let body = Regex::new(body).unwrap();
        let end = Regex::new(end).unwrap();
        blocks("t.h", text, |t| start.is_match(t), &body, &end).collect()
    }

    #[test]
    fn classify_lines() {
        assert_eq!(classify("/** Hello"), Line::DocStart(" Hello"));
        assert_eq!(classify(" * world  "), Line::DocCont("world"));
        assert_eq!(classify(" */"), Line::DocEnd);
        assert_eq!(classify("#define X 1"), Line::Directive);
        assert_eq!(classify("int x;"), Line::Code("int x;"));
    }

    #[test]
    fn multi_line_declaration_with_doc() {
        let text = "/**\n * Adds two numbers.\n */\nAPI int add(int a, // first\n    int b /* second */);\n";
        let found = scan(text, r"^API", r"^API\s+(\w+)\s+(\w+)\((.*?)\s*\);$", r"\);$");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].groups, vec!["int", "add", "int a, int b"]);
        assert_eq!(found[0].doc, "Adds two numbers.");
        assert_eq!(found[0].line, 5);
    }

    #[test]
    fn spanning_comment_and_directives_skipped() {
        let text = "/* API int hidden(void);\n   still comment */\n#ifdef X\nAPI int shown(void);\n#endif\n";
        let found = scan(text, r"^API", r"^API\s+(\w+)\s+(\w+)\((.*)\);$", r"\);$");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].groups[1], "shown");
        assert_eq!(found[0].doc, "");
    }

    #[test]
    fn single_line_doc_trims_terminator() {
        let text = "/** Status codes. */\ntypedef enum S { A, B } S;\n";
        let found = scan(text, r"^(?:typedef\s+)?enum", r"enum\s+(\w*)\s*\{(.*)\}", r";$");
        assert_eq!(found[0].doc, "Status codes.");
        assert_eq!(found[0].groups, vec!["S", " A, B "]);
    }

    #[test]
    fn multi_line_declaration_with_inner_directive() {
        let text = "/** Sums. */\nAPI int f(int a,\n#ifdef X\n    int b,\n#endif\n    /* spans\n       lines */ int c);\n";
        let found = scan(text, r"^API", r"^API\s+(\w+)\s+(\w+)\((.*?)\s*\);$", r"\);$");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].groups, vec!["int", "f", "int a, int b, int c"]);
        assert_eq!(found[0].doc, "Sums.");
        assert_eq!(found[0].line, 7);
    }

    #[test]
    fn doc_dropped_when_other_code_follows() {
        let text = "/** Orphaned. */\nint unrelated;\nAPI int g(void);\n/** Kept. */\n\nAPI int h(void);\n";
        let found = scan(text, r"^API", r"^API\s+(\w+)\s+(\w+)\((.*)\);$", r"\);$");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].groups[1], "g");
        assert_eq!(found[0].doc, "");
        assert_eq!(found[1].groups[1], "h");
        assert_eq!(found[1].doc, "Kept.");
    }

    #[test]
    fn body_mismatch_drops_declaration() {
        let text = "API broken;\nAPI int ok(void);\n";
        let found = scan(text, r"^API", r"^API\s+(\w+)\s+(\w+)\((.*)\);$", r";$");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].groups[1], "ok");
    }
}
