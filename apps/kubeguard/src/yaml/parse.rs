//! Line-oriented parser for the Kubernetes YAML subset.
//!
//! Supports block mappings, block sequences (dash at the parent key's
//! column or deeper), plain/quoted scalars, literal and folded block
//! scalars (`|`/`>` with chomping), empty flow collections (`{}`/`[]`),
//! simple one-line flow collections, full-line comments, and end-of-line
//! comments. Anchors, tags, and multi-doc streams are out of scope;
//! documents are split before parsing. Trailing whitespace on block
//! scalar content lines is not preserved.

use super::{Entry, Item, Scalar, Tree};
use std::fmt;

#[derive(Debug)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

fn err(line: usize, message: impl Into<String>) -> ParseError {
    ParseError {
        line,
        message: message.into(),
    }
}

struct Line {
    indent: usize,
    text: String,
    number: usize,
}

fn scan_lines(input: &str) -> Result<Vec<Line>, ParseError> {
    let mut lines = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        if raw.trim().is_empty() {
            // Blank lines carry no structure but block scalars keep them.
            lines.push(Line {
                indent: 0,
                text: String::new(),
                number,
            });
            continue;
        }
        if raw.starts_with('\t') {
            return Err(err(number, "tab indentation is not supported"));
        }
        let indent = raw.len() - raw.trim_start_matches(' ').len();
        let text = raw[indent..].trim_end().to_string();
        if text.starts_with('\t') {
            return Err(err(number, "tab indentation is not supported"));
        }
        lines.push(Line {
            indent,
            text,
            number,
        });
    }
    Ok(lines)
}

/// Split a value fragment into (value, end-of-line comment). The `#` must
/// be outside quotes and either at the start or preceded by whitespace.
fn split_comment(text: &str) -> (String, String) {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev_ws = true;
    for (idx, ch) in text.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double && prev_ws => {
                return (
                    text[..idx].trim_end().to_string(),
                    text[idx..].trim_end().to_string(),
                );
            }
            _ => {}
        }
        prev_ws = ch.is_whitespace();
    }
    (text.trim_end().to_string(), String::new())
}

/// Find the `key:` separator: a colon outside quotes followed by a space
/// or end of line. Returns (key, rest-after-colon).
fn try_split_key(text: &str) -> Option<(String, String)> {
    let mut in_single = false;
    let mut in_double = false;
    let bytes = text.as_bytes();
    for (idx, ch) in text.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ':' if !in_single && !in_double => {
                let at_end = idx + 1 == bytes.len();
                if at_end || bytes[idx + 1] == b' ' {
                    let key = text[..idx].trim().to_string();
                    let rest = if at_end {
                        String::new()
                    } else {
                        text[idx + 1..].trim_start().to_string()
                    };
                    return Some((key, rest));
                }
            }
            _ => {}
        }
    }
    None
}

fn is_sequence_line(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

#[derive(Clone, Copy)]
enum Chomp {
    Clip,
    Strip,
    Keep,
}

#[derive(Clone, Copy)]
struct BlockHeader {
    folded: bool,
    chomp: Chomp,
    explicit_indent: Option<usize>,
}

/// Recognize a block scalar header (`|`, `>`, with optional chomping and
/// indentation indicators). The fragment must already have its end-of-line
/// comment stripped.
fn parse_block_header(text: &str) -> Option<BlockHeader> {
    let mut chars = text.chars();
    let folded = match chars.next() {
        Some('|') => false,
        Some('>') => true,
        _ => return None,
    };
    let mut chomp = Chomp::Clip;
    let mut explicit_indent = None;
    for ch in chars {
        match ch {
            '-' => chomp = Chomp::Strip,
            '+' => chomp = Chomp::Keep,
            '1'..='9' => explicit_indent = Some(ch as usize - '0' as usize),
            _ => return None,
        }
    }
    Some(BlockHeader {
        folded,
        chomp,
        explicit_indent,
    })
}

/// Fold lines per the folded scalar rules: single line breaks between
/// plain lines become spaces, blank lines become newlines, and breaks
/// around more-indented lines are kept.
fn fold_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut pending_blanks = 0usize;
    let mut first = true;
    let mut prev_more_indented = false;
    for line in lines {
        if line.is_empty() {
            pending_blanks += 1;
            continue;
        }
        let more_indented = line.starts_with(' ');
        if first {
            first = false;
        } else if pending_blanks > 0 {
            for _ in 0..pending_blanks {
                out.push('\n');
            }
        } else if more_indented || prev_more_indented {
            out.push('\n');
        } else {
            out.push(' ');
        }
        pending_blanks = 0;
        out.push_str(line);
        prev_more_indented = more_indented;
    }
    out
}

fn unquote_double(s: &str) -> String {
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn looks_numeric(s: &str) -> bool {
    s.chars().next().map_or(false, |c| {
        c.is_ascii_digit() || c == '-' || c == '+' || c == '.'
    }) && s.chars().any(|c| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
}

pub(super) fn parse_scalar(s: &str) -> Scalar {
    let t = s.trim();
    if t.is_empty() || t == "~" || t == "null" {
        return Scalar::Null;
    }
    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        return Scalar::Str(unquote_double(t));
    }
    if t.len() >= 2 && t.starts_with('\'') && t.ends_with('\'') {
        return Scalar::Str(t[1..t.len() - 1].replace("''", "'"));
    }
    match t {
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }
    if looks_numeric(t) {
        if let Ok(i) = t.parse::<i64>() {
            return Scalar::Int(i);
        }
        if let Ok(f) = t.parse::<f64>() {
            return Scalar::Float(f);
        }
    }
    Scalar::Str(t.to_string())
}

/// Parse a one-line flow value (`{...}` or `[...]`), or a plain scalar.
fn parse_flow_or_scalar(text: &str, number: usize) -> Result<Tree, ParseError> {
    let t = text.trim();
    if t.starts_with('{') || t.starts_with('[') {
        let mut flow = FlowParser {
            chars: t.chars().collect(),
            pos: 0,
            line: number,
        };
        let value = flow.parse_value()?;
        flow.skip_ws();
        if flow.pos != flow.chars.len() {
            return Err(err(number, "trailing characters after flow collection"));
        }
        return Ok(value);
    }
    Ok(Tree::Scalar(parse_scalar(t)))
}

struct FlowParser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl FlowParser {
    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse_value(&mut self) -> Result<Tree, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.parse_mapping(),
            Some('[') => self.parse_sequence(),
            Some(_) => Ok(Tree::Scalar(parse_scalar(&self.take_scalar()))),
            None => Err(err(self.line, "unexpected end of flow collection")),
        }
    }

    fn parse_mapping(&mut self) -> Result<Tree, ParseError> {
        self.pos += 1; // consume '{'
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Tree::Mapping(entries));
                }
                None => return Err(err(self.line, "unterminated flow mapping")),
                Some(_) => {}
            }
            let key = parse_scalar(&self.take_until_colon()?);
            let value = self.parse_value()?;
            entries.push(Entry {
                key: Some(key),
                value: Some(value),
                comment: String::new(),
            });
            self.skip_ws();
            if self.peek() == Some(',') {
                self.pos += 1;
            }
        }
    }

    fn parse_sequence(&mut self) -> Result<Tree, ParseError> {
        self.pos += 1; // consume '['
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(Tree::Sequence(items));
                }
                None => return Err(err(self.line, "unterminated flow sequence")),
                Some(_) => {}
            }
            let value = self.parse_value()?;
            items.push(Item {
                value: Some(value),
                comment: String::new(),
            });
            self.skip_ws();
            if self.peek() == Some(',') {
                self.pos += 1;
            }
        }
    }

    fn take_until_colon(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        let mut in_single = false;
        let mut in_double = false;
        while let Some(ch) = self.peek() {
            match ch {
                '\'' if !in_double => in_single = !in_single,
                '"' if !in_single => in_double = !in_double,
                ':' if !in_single && !in_double => {
                    self.pos += 1;
                    return Ok(out.trim().to_string());
                }
                _ => {}
            }
            out.push(ch);
            self.pos += 1;
        }
        Err(err(self.line, "expected ':' in flow mapping"))
    }

    fn take_scalar(&mut self) -> String {
        let mut out = String::new();
        let mut in_single = false;
        let mut in_double = false;
        while let Some(ch) = self.peek() {
            match ch {
                '\'' if !in_double => in_single = !in_single,
                '"' if !in_single => in_double = !in_double,
                ',' | '}' | ']' if !in_single && !in_double => break,
                _ => {}
            }
            out.push(ch);
            self.pos += 1;
        }
        out.trim().to_string()
    }
}

struct Parser {
    lines: Vec<Line>,
    pos: usize,
}

/// Parse a single YAML document into its top-level mapping entries,
/// standalone comments included.
pub fn parse_document(input: &str) -> Result<Vec<Entry>, ParseError> {
    let lines = scan_lines(input)?;
    let mut parser = Parser { lines, pos: 0 };
    let entries = parser.parse_mapping(0)?;
    if let Some(line) = parser.next_content() {
        return Err(err(line.number, "unexpected content after document"));
    }
    Ok(entries)
}

impl Parser {
    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    /// The next non-blank line at or after the current position, without
    /// consuming anything.
    fn next_content(&self) -> Option<&Line> {
        self.lines[self.pos..].iter().find(|l| !l.text.is_empty())
    }

    /// True when the block starting at the current position with the given
    /// indent is a sequence, looking past any leading full-line comments
    /// and blank lines.
    fn block_is_sequence(&self, indent: usize) -> bool {
        let mut idx = self.pos;
        while let Some(line) = self.lines.get(idx) {
            if line.text.is_empty() {
                idx += 1;
                continue;
            }
            if line.indent != indent {
                return false;
            }
            if line.text.starts_with('#') {
                idx += 1;
                continue;
            }
            return is_sequence_line(&line.text);
        }
        false
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Vec<Entry>, ParseError> {
        let mut entries = Vec::new();
        while let Some(line) = self.peek() {
            if line.text.is_empty() {
                self.pos += 1;
                continue;
            }
            if line.indent < indent {
                break;
            }
            let number = line.number;
            if line.indent > indent {
                return Err(err(number, "unexpected indentation"));
            }
            if line.text.starts_with('#') {
                let text = line.text.clone();
                self.pos += 1;
                entries.push(Entry::comment(text));
                continue;
            }
            if is_sequence_line(&line.text) {
                return Err(err(number, "unexpected sequence item in mapping"));
            }
            let text = line.text.clone();
            let (key_part, rest) = try_split_key(&text)
                .ok_or_else(|| err(number, "expected \"key: value\""))?;
            self.pos += 1;
            let (value_text, comment) = split_comment(&rest);
            let value = self.parse_block_value(&value_text, indent, number)?;
            entries.push(Entry {
                key: Some(parse_scalar(&key_part)),
                value: Some(value),
                comment,
            });
        }
        Ok(entries)
    }

    /// Parse the value following `key:`. An empty fragment means a nested
    /// block (deeper mapping/sequence, or a sequence whose dashes sit at
    /// the key's own column) or null.
    fn parse_block_value(
        &mut self,
        value_text: &str,
        key_indent: usize,
        number: usize,
    ) -> Result<Tree, ParseError> {
        if !value_text.is_empty() {
            if let Some(header) = parse_block_header(value_text) {
                return self.parse_block_scalar(header, key_indent, number);
            }
            return parse_flow_or_scalar(value_text, number);
        }
        if let Some(next) = self.next_content() {
            if next.indent > key_indent {
                let indent = next.indent;
                if self.block_is_sequence(indent) {
                    return Ok(Tree::Sequence(self.parse_sequence(indent)?));
                }
                return Ok(Tree::Mapping(self.parse_mapping(indent)?));
            }
            if next.indent == key_indent && self.block_is_sequence(key_indent) {
                return Ok(Tree::Sequence(self.parse_sequence(key_indent)?));
            }
        }
        Ok(Tree::Scalar(Scalar::Null))
    }

    /// Consume the indented lines following a `|`/`>` header and rebuild
    /// the scalar's text. Content lines keep their indentation relative to
    /// the block indent; blank lines are part of the content.
    fn parse_block_scalar(
        &mut self,
        header: BlockHeader,
        parent_indent: usize,
        number: usize,
    ) -> Result<Tree, ParseError> {
        let mut collected: Vec<(usize, String)> = Vec::new();
        while let Some(line) = self.peek() {
            if line.text.is_empty() {
                collected.push((0, String::new()));
                self.pos += 1;
                continue;
            }
            if line.indent <= parent_indent {
                break;
            }
            collected.push((line.indent, line.text.clone()));
            self.pos += 1;
        }
        let block_indent = match header.explicit_indent {
            Some(n) => parent_indent + n,
            None => match collected.iter().find(|(_, t)| !t.is_empty()) {
                Some((ind, _)) => *ind,
                None => {
                    let text = match header.chomp {
                        Chomp::Keep => "\n".repeat(collected.len() + 1),
                        _ => String::new(),
                    };
                    return Ok(Tree::Scalar(Scalar::Str(text)));
                }
            },
        };
        let mut lines: Vec<String> = Vec::with_capacity(collected.len());
        for (ind, text) in &collected {
            if text.is_empty() {
                lines.push(String::new());
                continue;
            }
            if *ind < block_indent {
                return Err(err(number, "bad indentation in block scalar"));
            }
            let mut line = " ".repeat(ind - block_indent);
            line.push_str(text);
            lines.push(line);
        }
        let mut trailing = 0usize;
        while lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
            trailing += 1;
        }
        let body = if header.folded {
            fold_lines(&lines)
        } else {
            lines.join("\n")
        };
        let text = match header.chomp {
            Chomp::Strip => body,
            Chomp::Clip => {
                if body.is_empty() {
                    String::new()
                } else {
                    format!("{}\n", body)
                }
            }
            Chomp::Keep => format!("{}{}", body, "\n".repeat(trailing + 1)),
        };
        Ok(Tree::Scalar(Scalar::Str(text)))
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        // Comments at the sequence's indent are buffered; they belong to
        // the sequence only if another dash item follows, otherwise they
        // are rewound for the enclosing mapping to claim.
        let mut pending: Vec<usize> = Vec::new();
        loop {
            let line = match self.peek() {
                Some(line) => line,
                None => break,
            };
            if line.text.is_empty() {
                self.pos += 1;
                continue;
            }
            if line.indent < indent {
                break;
            }
            let number = line.number;
            if line.indent > indent {
                return Err(err(number, "unexpected indentation in sequence"));
            }
            if line.text.starts_with('#') {
                pending.push(self.pos);
                self.pos += 1;
                continue;
            }
            if !is_sequence_line(&line.text) {
                break;
            }
            for idx in pending.drain(..) {
                items.push(Item::comment(self.lines[idx].text.clone()));
            }
            let text = line.text.clone();
            self.pos += 1;
            let content = if text == "-" {
                String::new()
            } else {
                text[1..].trim_start().to_string()
            };
            items.push(self.parse_sequence_item(&content, indent, number)?);
        }
        if let Some(first) = pending.first() {
            self.pos = *first;
        }
        Ok(items)
    }

    fn parse_sequence_item(
        &mut self,
        content: &str,
        indent: usize,
        number: usize,
    ) -> Result<Item, ParseError> {
        let item_indent = indent + 2;
        if content.is_empty() {
            // Bare dash: value is a nested block on the following deeper
            // lines, or null.
            if let Some(next) = self.next_content() {
                if next.indent > indent {
                    let nested = next.indent;
                    let value = if self.block_is_sequence(nested) {
                        Tree::Sequence(self.parse_sequence(nested)?)
                    } else {
                        Tree::Mapping(self.parse_mapping(nested)?)
                    };
                    return Ok(Item {
                        value: Some(value),
                        comment: String::new(),
                    });
                }
            }
            return Ok(Item {
                value: Some(Tree::Scalar(Scalar::Null)),
                comment: String::new(),
            });
        }
        let (value_text, comment) = split_comment(content);
        if value_text.is_empty() {
            return Ok(Item {
                value: Some(Tree::Scalar(Scalar::Null)),
                comment,
            });
        }
        if let Some(header) = parse_block_header(&value_text) {
            // The item's content must be indented past the dash column.
            return Ok(Item {
                value: Some(self.parse_block_scalar(header, indent, number)?),
                comment,
            });
        }
        if value_text.starts_with('{') || value_text.starts_with('[') {
            return Ok(Item {
                value: Some(parse_flow_or_scalar(&value_text, number)?),
                comment,
            });
        }
        if is_sequence_line(&value_text) {
            // Nested sequence: the inner first item shares the dash line,
            // subsequent inner items sit at the item's indent.
            let inner_content = if value_text == "-" {
                String::new()
            } else {
                value_text[1..].trim_start().to_string()
            };
            let mut inner = vec![self.parse_sequence_item(&inner_content, item_indent, number)?];
            inner.extend(self.parse_sequence(item_indent)?);
            return Ok(Item {
                value: Some(Tree::Sequence(inner)),
                comment: String::new(),
            });
        }
        if let Some((key_part, rest)) = try_split_key(&value_text) {
            // Inline mapping start: the first entry sits on the dash line,
            // subsequent entries at the item's indent.
            let (rest_value, rest_comment) = split_comment(&rest);
            let first_value = self.parse_block_value(&rest_value, item_indent, number)?;
            let mut entries = vec![Entry {
                key: Some(parse_scalar(&key_part)),
                value: Some(first_value),
                comment: if comment.is_empty() {
                    rest_comment
                } else {
                    comment
                },
            }];
            entries.extend(self.parse_mapping(item_indent)?);
            return Ok(Item {
                value: Some(Tree::Mapping(entries)),
                comment: String::new(),
            });
        }
        Ok(Item {
            value: Some(Tree::Scalar(parse_scalar(&value_text))),
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::{find_entry_str, is_comment_entry, is_comment_item};

    #[test]
    fn test_parse_scalar_kinds() {
        assert_eq!(parse_scalar("null"), Scalar::Null);
        assert_eq!(parse_scalar("~"), Scalar::Null);
        assert_eq!(parse_scalar("true"), Scalar::Bool(true));
        assert_eq!(parse_scalar("42"), Scalar::Int(42));
        assert_eq!(parse_scalar("-7"), Scalar::Int(-7));
        assert_eq!(parse_scalar("1.5"), Scalar::Float(1.5));
        assert_eq!(parse_scalar("1.2.3"), Scalar::Str("1.2.3".into()));
        assert_eq!(parse_scalar("nginx"), Scalar::Str("nginx".into()));
        assert_eq!(parse_scalar("\"true\""), Scalar::Str("true".into()));
        assert_eq!(parse_scalar("'it''s'"), Scalar::Str("it's".into()));
    }

    #[test]
    fn test_parse_nested_mapping_and_sequence() {
        let doc = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
  - name: app
    image: nginx:1.25
  - name: sidecar
";
        let entries = parse_document(doc).unwrap();
        assert_eq!(entries.len(), 4);
        let spec = find_entry_str(&entries, "spec").unwrap();
        let spec_map = spec.value.as_ref().unwrap().as_mapping().unwrap();
        let containers = find_entry_str(spec_map, "containers").unwrap();
        let seq = containers.value.as_ref().unwrap().as_sequence().unwrap();
        assert_eq!(seq.len(), 2);
        let first = seq[0].value.as_ref().unwrap().as_mapping().unwrap();
        assert!(matches!(
            find_entry_str(first, "image").unwrap().value,
            Some(Tree::Scalar(Scalar::Str(ref s))) if s == "nginx:1.25"
        ));
    }

    #[test]
    fn test_parse_comments_standalone_and_eol() {
        let doc = "\
# leading comment
kind: Pod # inline comment
spec:
  containers:
  # container list
  - name: app
";
        let entries = parse_document(doc).unwrap();
        assert!(is_comment_entry(&entries[0]));
        assert_eq!(entries[0].comment, "# leading comment");
        assert_eq!(entries[1].comment, "# inline comment");
        let spec = find_entry_str(&entries, "spec").unwrap();
        let spec_map = spec.value.as_ref().unwrap().as_mapping().unwrap();
        let seq = find_entry_str(spec_map, "containers")
            .unwrap()
            .value
            .as_ref()
            .unwrap()
            .as_sequence()
            .unwrap();
        assert!(is_comment_item(&seq[0]));
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_trailing_comments_attach_to_top_level() {
        let doc = "\
spec:
  args:
  - x
# trailing one
# trailing two
";
        let entries = parse_document(doc).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(is_comment_entry(&entries[1]));
        assert!(is_comment_entry(&entries[2]));
    }

    #[test]
    fn test_parse_empty_flow_collections() {
        let doc = "\
status: {}
args: []
selector: {app: web}
ports: [80, 443]
";
        let entries = parse_document(doc).unwrap();
        assert!(matches!(
            entries[0].value,
            Some(Tree::Mapping(ref m)) if m.is_empty()
        ));
        assert!(matches!(
            entries[1].value,
            Some(Tree::Sequence(ref s)) if s.is_empty()
        ));
        let sel = entries[2].value.as_ref().unwrap().as_mapping().unwrap();
        assert_eq!(sel.len(), 1);
        let ports = entries[3].value.as_ref().unwrap().as_sequence().unwrap();
        assert!(matches!(
            ports[1].value,
            Some(Tree::Scalar(Scalar::Int(443)))
        ));
    }

    #[test]
    fn test_colon_in_scalar_is_not_a_key() {
        let doc = "image: nginx:1.25\n";
        let entries = parse_document(doc).unwrap();
        assert!(matches!(
            entries[0].value,
            Some(Tree::Scalar(Scalar::Str(ref s))) if s == "nginx:1.25"
        ));
    }

    #[test]
    fn test_null_value_for_bare_key() {
        let doc = "creationTimestamp:\nname: x\n";
        let entries = parse_document(doc).unwrap();
        assert!(matches!(
            entries[0].value,
            Some(Tree::Scalar(Scalar::Null))
        ));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_hash_inside_quotes_is_not_a_comment() {
        let doc = "note: \"a # b\"\n";
        let entries = parse_document(doc).unwrap();
        assert!(entries[0].comment.is_empty());
        assert!(matches!(
            entries[0].value,
            Some(Tree::Scalar(Scalar::Str(ref s))) if s == "a # b"
        ));
    }

    #[test]
    fn test_parse_literal_block_scalar_in_sequence() {
        let doc = "\
args:
- -c
- |
  echo hello
  echo world
";
        let entries = parse_document(doc).unwrap();
        let args = entries[0].value.as_ref().unwrap().as_sequence().unwrap();
        assert_eq!(args.len(), 2);
        assert!(matches!(
            args[1].value,
            Some(Tree::Scalar(Scalar::Str(ref s))) if s == "echo hello\necho world\n"
        ));
    }

    #[test]
    fn test_block_scalar_chomping_and_folding() {
        let doc = "\
strip: |-
  a
  b
keep: |+
  a

folded: >
  one
  two

  three
script: |
  if [ -x /bin/sh ]; then
    exec /bin/sh
  fi
";
        let entries = parse_document(doc).unwrap();
        let get = |name: &str| match find_entry_str(&entries, name).unwrap().value {
            Some(Tree::Scalar(Scalar::Str(ref s))) => s.clone(),
            ref other => panic!("{}: not a string: {:?}", name, other),
        };
        assert_eq!(get("strip"), "a\nb");
        assert_eq!(get("keep"), "a\n\n");
        assert_eq!(get("folded"), "one two\nthree\n");
        assert_eq!(
            get("script"),
            "if [ -x /bin/sh ]; then\n  exec /bin/sh\nfi\n"
        );
    }

    #[test]
    fn test_blank_lines_between_entries_are_skipped() {
        let doc = "\
kind: Pod

spec:

  restartPolicy: Always
";
        let entries = parse_document(doc).unwrap();
        assert_eq!(entries.len(), 2);
        let spec = find_entry_str(&entries, "spec").unwrap();
        assert_eq!(spec.value.as_ref().unwrap().as_mapping().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(parse_document("just a scalar line\n").is_err());
        assert!(parse_document("key: ok\n\tbad: tab\n").is_err());
    }
}
