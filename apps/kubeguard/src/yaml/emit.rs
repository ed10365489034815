//! Serializer for the YAML tree model.
//!
//! Emits block style with 2-space indentation and sequence dashes at the
//! parent key's column, matching `serde_yaml` output so that original and
//! fixed documents serialize uniformly. Empty collections are emitted in
//! flow style (`{}`/`[]`), multiline strings as literal block scalars,
//! and comments verbatim.

use super::{is_comment_entry, is_comment_item, parse::parse_scalar, Entry, Item, Scalar, Tree};

/// Serialize top-level mapping entries to document text.
pub fn emit_document(entries: &[Entry]) -> String {
    let mut out = String::new();
    emit_mapping(entries, 0, &mut out);
    out
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push(' ');
    }
}

fn push_eol_comment(out: &mut String, comment: &str) {
    if !comment.is_empty() {
        out.push(' ');
        out.push_str(comment);
    }
}

fn emit_mapping(entries: &[Entry], indent: usize, out: &mut String) {
    for entry in entries {
        if is_comment_entry(entry) {
            push_indent(out, indent);
            out.push_str(&entry.comment);
            out.push('\n');
            continue;
        }
        push_indent(out, indent);
        if let Some(key) = entry.key.as_ref() {
            out.push_str(&format_scalar(key));
            out.push(':');
        }
        match entry.value.as_ref() {
            Some(Tree::Mapping(m)) if !m.is_empty() => {
                push_eol_comment(out, &entry.comment);
                out.push('\n');
                emit_mapping(m, indent + 2, out);
            }
            Some(Tree::Mapping(_)) => {
                out.push_str(" {}");
                push_eol_comment(out, &entry.comment);
                out.push('\n');
            }
            Some(Tree::Sequence(s)) if !s.is_empty() => {
                push_eol_comment(out, &entry.comment);
                out.push('\n');
                emit_sequence(s, indent, out);
            }
            Some(Tree::Sequence(_)) => {
                out.push_str(" []");
                push_eol_comment(out, &entry.comment);
                out.push('\n');
            }
            Some(Tree::Scalar(Scalar::Str(s))) if s.contains('\n') => {
                emit_block_scalar(s, indent + 2, &entry.comment, out);
            }
            Some(Tree::Scalar(s)) => {
                out.push(' ');
                out.push_str(&format_scalar(s));
                push_eol_comment(out, &entry.comment);
                out.push('\n');
            }
            None => {
                out.push_str(" null");
                push_eol_comment(out, &entry.comment);
                out.push('\n');
            }
        }
    }
}

fn emit_sequence(items: &[Item], indent: usize, out: &mut String) {
    for item in items {
        if is_comment_item(item) {
            push_indent(out, indent);
            out.push_str(&item.comment);
            out.push('\n');
            continue;
        }
        match item.value.as_ref() {
            Some(Tree::Mapping(m)) if !m.is_empty() => {
                let mut block = String::new();
                emit_mapping(m, indent + 2, &mut block);
                emit_dashed_block(&block, indent, &item.comment, out);
            }
            Some(Tree::Mapping(_)) => {
                push_indent(out, indent);
                out.push_str("- {}");
                push_eol_comment(out, &item.comment);
                out.push('\n');
            }
            Some(Tree::Sequence(s)) if !s.is_empty() => {
                let mut block = String::new();
                emit_sequence(s, indent + 2, &mut block);
                emit_dashed_block(&block, indent, &item.comment, out);
            }
            Some(Tree::Sequence(_)) => {
                push_indent(out, indent);
                out.push_str("- []");
                push_eol_comment(out, &item.comment);
                out.push('\n');
            }
            Some(Tree::Scalar(Scalar::Str(s))) if s.contains('\n') => {
                push_indent(out, indent);
                out.push('-');
                emit_block_scalar(s, indent + 2, &item.comment, out);
            }
            Some(Tree::Scalar(s)) => {
                push_indent(out, indent);
                out.push_str("- ");
                out.push_str(&format_scalar(s));
                push_eol_comment(out, &item.comment);
                out.push('\n');
            }
            None => {
                push_indent(out, indent);
                out.push_str("- null");
                push_eol_comment(out, &item.comment);
                out.push('\n');
            }
        }
    }
}

/// Write a pre-rendered nested block, replacing the first line's leading
/// indentation with the item dash.
fn emit_dashed_block(block: &str, indent: usize, comment: &str, out: &mut String) {
    let mut first = true;
    for line in block.lines() {
        if first {
            push_indent(out, indent);
            out.push_str("- ");
            out.push_str(&line[(indent + 2).min(line.len())..]);
            push_eol_comment(out, comment);
            first = false;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
}

/// Emit a multiline string as a literal block scalar. The caller has
/// already written what precedes the header (`key:` or the item dash);
/// the chomping indicator is derived from the trailing newline shape.
fn emit_block_scalar(s: &str, indent: usize, comment: &str, out: &mut String) {
    let stripped = s.trim_end_matches('\n');
    let trailing = s.len() - stripped.len();
    let header = if stripped.is_empty() {
        " |+"
    } else {
        match trailing {
            0 => " |-",
            1 => " |",
            _ => " |+",
        }
    };
    out.push_str(header);
    push_eol_comment(out, comment);
    out.push('\n');
    if !stripped.is_empty() {
        for line in stripped.split('\n') {
            if !line.is_empty() {
                push_indent(out, indent);
                out.push_str(line);
            }
            out.push('\n');
        }
    }
    for _ in 1..trailing {
        out.push('\n');
    }
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{:.1}", f)
            } else {
                format!("{}", f)
            }
        }
        Scalar::Str(s) => {
            if needs_quoting(s) {
                quote(s)
            } else {
                s.clone()
            }
        }
    }
}

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    // Plain text that would reparse as a different scalar kind must be
    // quoted to survive a round trip.
    if !matches!(parse_scalar(s), Scalar::Str(_)) {
        return true;
    }
    if s.starts_with(' ') || s.ends_with(' ') {
        return true;
    }
    if s.contains('\n') || s.contains('\t') || s.contains(": ") || s.ends_with(':') {
        return true;
    }
    if s.contains(" #") {
        return true;
    }
    let first = s.chars().next().unwrap_or(' ');
    if matches!(
        first,
        '#' | '{' | '[' | '}' | ']' | '*' | '&' | '!' | '%' | '@' | '`' | '"' | '\'' | '>' | '|' | ','
    ) {
        return true;
    }
    s == "-" || s.starts_with("- ")
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::parse_document;

    fn round_trip(doc: &str) -> String {
        emit_document(&parse_document(doc).unwrap())
    }

    #[test]
    fn test_round_trip_preserves_structure_and_comments() {
        let doc = "\
# pod manifest
apiVersion: v1
kind: Pod
metadata:
  name: web # the name
spec:
  containers:
  # main container
  - name: app
    image: nginx:1.25
";
        assert_eq!(round_trip(doc), doc);
    }

    #[test]
    fn test_round_trip_empty_collections_and_nulls() {
        let doc = "\
status: {}
args: []
creationTimestamp: null
";
        assert_eq!(round_trip(doc), doc);
    }

    #[test]
    fn test_scalar_items_and_quoting() {
        let doc = "\
caps:
- ALL
- \"true\"
note: \"a: b\"
";
        assert_eq!(round_trip(doc), doc);
    }

    #[test]
    fn test_nested_sequence_items() {
        let doc = "\
matrix:
- - 1
  - 2
- - 3
";
        assert_eq!(round_trip(doc), doc);
    }

    #[test]
    fn test_round_trip_literal_block_scalars() {
        let doc = "\
containers:
- name: app
  args:
  - -c
  - |
    echo hello
    echo world
lifecycle: |-
  first line
  no trailing newline
";
        assert_eq!(round_trip(doc), doc);
    }

    #[test]
    fn test_folded_scalar_re_emits_as_literal_block() {
        let doc = "\
motd: >
  one
  two
";
        assert_eq!(round_trip(doc), "motd: |\n  one two\n");
    }

    #[test]
    fn test_dashed_block_keeps_inline_first_entry() {
        let doc = "\
containers:
- name: app
  securityContext:
    readOnlyRootFilesystem: true
";
        assert_eq!(round_trip(doc), doc);
    }
}
