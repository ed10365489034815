//! Comment-preserving YAML tree model.
//!
//! Represents the subset of YAML needed for Kubernetes manifests: scalars,
//! ordered mappings, sequences, and comments. Mapping entries and sequence
//! items carry an optional comment; an entry/item with no key and no value
//! but a non-empty comment is a *standalone comment* which is preserved
//! positionally but excluded from all semantic comparison and matching.
//!
//! `deep_equal` implements comment-aware structural equality: mapping order
//! is ignored (manifests commonly reorder keys without semantic change),
//! sequence order is significant, comments never participate.

pub mod emit;
pub mod parse;

pub use emit::emit_document;
pub use parse::{parse_document, ParseError};

/// A leaf value: string, number, boolean, or null.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A semantic document node.
#[derive(Clone, Debug)]
pub enum Tree {
    Scalar(Scalar),
    Mapping(Vec<Entry>),
    Sequence(Vec<Item>),
}

impl Tree {
    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match self {
            Tree::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Item]> {
        match self {
            Tree::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

/// One mapping entry. `key == None && value == None` with a non-empty
/// comment marks a standalone comment line.
#[derive(Clone, Debug)]
pub struct Entry {
    pub key: Option<Scalar>,
    pub value: Option<Tree>,
    pub comment: String,
}

impl Entry {
    pub fn comment(text: impl Into<String>) -> Self {
        Entry {
            key: None,
            value: None,
            comment: text.into(),
        }
    }
}

/// One sequence item. `value == None` with a non-empty comment marks a
/// standalone comment line.
#[derive(Clone, Debug)]
pub struct Item {
    pub value: Option<Tree>,
    pub comment: String,
}

impl Item {
    pub fn comment(text: impl Into<String>) -> Self {
        Item {
            value: None,
            comment: text.into(),
        }
    }
}

/// Returns true if the entry is a standalone comment (not an end-of-line
/// comment attached to a key-value pair).
pub fn is_comment_entry(entry: &Entry) -> bool {
    entry.key.is_none() && entry.value.is_none() && !entry.comment.is_empty()
}

/// Returns true if the item is a standalone comment.
pub fn is_comment_item(item: &Item) -> bool {
    item.value.is_none() && !item.comment.is_empty()
}

/// Find the semantic entry with the given key. Standalone comments have no
/// key and are never returned.
pub fn find_entry<'a>(entries: &'a [Entry], key: &Scalar) -> Option<&'a Entry> {
    entries.iter().find(|e| e.key.as_ref() == Some(key))
}

/// Find the semantic entry with the given string key.
pub fn find_entry_str<'a>(entries: &'a [Entry], key: &str) -> Option<&'a Entry> {
    entries
        .iter()
        .find(|e| matches!(e.key.as_ref(), Some(Scalar::Str(s)) if s == key))
}

/// Returns true if both mappings carry the given key with structurally
/// equal values. A key absent from either side is never a match.
pub fn equal_value_for_key(key: &str, a: &[Entry], b: &[Entry]) -> bool {
    match (find_entry_str(a, key), find_entry_str(b, key)) {
        (Some(ea), Some(eb)) => deep_equal_opt(ea.value.as_ref(), eb.value.as_ref()),
        _ => false,
    }
}

fn deep_equal_opt(a: Option<&Tree>, b: Option<&Tree>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => deep_equal(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Recursive structural equality ignoring mapping order and comments.
///
/// Sequences compare pairwise in position after discarding comment-only
/// items from each side; each side advances its own comment-skip cursor.
pub fn deep_equal(a: &Tree, b: &Tree) -> bool {
    match (a, b) {
        (Tree::Scalar(s1), Tree::Scalar(s2)) => s1 == s2,
        (Tree::Mapping(m1), Tree::Mapping(m2)) => {
            let n1 = m1.iter().filter(|e| !is_comment_entry(e)).count();
            let n2 = m2.iter().filter(|e| !is_comment_entry(e)).count();
            if n1 != n2 {
                return false;
            }
            for entry in m1 {
                if is_comment_entry(entry) {
                    continue;
                }
                let key = match entry.key.as_ref() {
                    Some(k) => k,
                    None => continue,
                };
                match find_entry(m2, key) {
                    Some(other) => {
                        if !deep_equal_opt(entry.value.as_ref(), other.value.as_ref()) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }
        (Tree::Sequence(s1), Tree::Sequence(s2)) => {
            let (mut i, mut j) = (0, 0);
            loop {
                while i < s1.len() && is_comment_item(&s1[i]) {
                    i += 1;
                }
                while j < s2.len() && is_comment_item(&s2[j]) {
                    j += 1;
                }
                match (i < s1.len(), j < s2.len()) {
                    (false, false) => return true,
                    (true, true) => {
                        if !deep_equal_opt(s1[i].value.as_ref(), s2[j].value.as_ref()) {
                            return false;
                        }
                        i += 1;
                        j += 1;
                    }
                    _ => return false,
                }
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: Tree) -> Entry {
        Entry {
            key: Some(Scalar::Str(key.into())),
            value: Some(value),
            comment: String::new(),
        }
    }

    fn s(v: &str) -> Tree {
        Tree::Scalar(Scalar::Str(v.into()))
    }

    #[test]
    fn test_mapping_equality_ignores_order_and_comments() {
        let a = Tree::Mapping(vec![
            entry("k", s("v")),
            Entry::comment("# noise"),
            entry("k2", s("v2")),
        ]);
        let b = Tree::Mapping(vec![entry("k2", s("v2")), entry("k", s("v"))]);
        assert!(deep_equal(&a, &b));
        assert!(deep_equal(&b, &a));
    }

    #[test]
    fn test_mapping_equality_counts_semantic_entries() {
        let a = Tree::Mapping(vec![entry("k", s("v"))]);
        let b = Tree::Mapping(vec![entry("k", s("v")), entry("k2", s("v2"))]);
        assert!(!deep_equal(&a, &b));
    }

    #[test]
    fn test_sequence_equality_is_positional() {
        let a = Tree::Sequence(vec![
            Item {
                value: Some(s("a")),
                comment: String::new(),
            },
            Item {
                value: Some(s("b")),
                comment: String::new(),
            },
        ]);
        let b = Tree::Sequence(vec![
            Item {
                value: Some(s("b")),
                comment: String::new(),
            },
            Item {
                value: Some(s("a")),
                comment: String::new(),
            },
        ]);
        assert!(!deep_equal(&a, &b));
    }

    #[test]
    fn test_sequence_equality_skips_comments_per_side() {
        // Comments in different positions on each side; each cursor must
        // skip its own side's comments independently.
        let a = Tree::Sequence(vec![
            Item::comment("# lead"),
            Item {
                value: Some(s("a")),
                comment: String::new(),
            },
            Item {
                value: Some(s("b")),
                comment: String::new(),
            },
        ]);
        let b = Tree::Sequence(vec![
            Item {
                value: Some(s("a")),
                comment: String::new(),
            },
            Item::comment("# mid"),
            Item {
                value: Some(s("b")),
                comment: String::new(),
            },
            Item::comment("# tail"),
        ]);
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn test_scalar_equality_is_literal() {
        assert!(deep_equal(
            &Tree::Scalar(Scalar::Int(1)),
            &Tree::Scalar(Scalar::Int(1))
        ));
        assert!(!deep_equal(
            &Tree::Scalar(Scalar::Int(1)),
            &Tree::Scalar(Scalar::Str("1".into()))
        ));
    }

    #[test]
    fn test_equal_value_for_key_requires_both_sides() {
        let a = vec![entry("name", s("web"))];
        let b = vec![entry("name", s("web")), entry("x", s("y"))];
        assert!(equal_value_for_key("name", &a, &b));
        assert!(!equal_value_for_key("x", &a, &b));
        assert!(!equal_value_for_key("missing", &a, &b));
    }
}
