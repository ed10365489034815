//! Structural merge of a fixed document into its original.
//!
//! The merge combines the original document's shape (key order, comments,
//! sequence item order) with the fixed document's corrected values:
//! - Keys/items present only in the original are dropped (the fixed side
//!   is authoritative about what exists).
//! - Keys/items present only in the fixed side are appended after all
//!   retained entries.
//! - Keys/items present in both recurse when both values are complex,
//!   otherwise the fixed value wins.
//!
//! Sequence items are matched across the two versions with the identity
//! rules from `identity`, never positionally.

use crate::identity::identity_match;
use crate::yaml::{
    emit_document, find_entry, is_comment_entry, is_comment_item, parse_document, Entry, Item,
    ParseError, Scalar, Tree,
};

/// Merge fixed mapping entries into original mapping entries.
///
/// Standalone comments from the original are always retained in position;
/// retained entries keep the original's relative order, new keys from the
/// fixed side are appended at the end.
pub fn merge_mapping(orig: &[Entry], fixed: &[Entry]) -> Vec<Entry> {
    let mut merged: Vec<Entry> = Vec::new();

    // Keep comments, and entries whose key survives in the fixed version
    for entry in orig {
        let keep = is_comment_entry(entry)
            || entry
                .key
                .as_ref()
                .map_or(false, |k| find_entry(fixed, k).is_some());
        if keep {
            merged.push(entry.clone());
        }
    }

    // Update retained entries from the fixed side, append new ones
    for fixed_entry in fixed {
        let key = match fixed_entry.key.as_ref() {
            Some(k) => k,
            None => {
                merged.push(fixed_entry.clone());
                continue;
            }
        };
        let pos = merged.iter().position(|e| e.key.as_ref() == Some(key));
        let pos = match pos {
            Some(p) => p,
            None => {
                merged.push(fixed_entry.clone());
                continue;
            }
        };
        let new_value = match (&merged[pos].value, &fixed_entry.value) {
            (Some(Tree::Mapping(om)), Some(Tree::Mapping(fm))) => {
                Some(Tree::Mapping(merge_mapping(om, fm)))
            }
            (Some(Tree::Sequence(os)), Some(Tree::Sequence(fs))) => {
                let field = match key {
                    Scalar::Str(s) => s.as_str(),
                    _ => "",
                };
                Some(Tree::Sequence(merge_sequence(field, os, fs)))
            }
            _ => fixed_entry.value.clone(),
        };
        merged[pos].value = new_value;
    }

    merged
}

/// Merge fixed sequence items into original sequence items, matching
/// items across versions via the identity rules for `sequence_key`.
pub fn merge_sequence(sequence_key: &str, orig: &[Item], fixed: &[Item]) -> Vec<Item> {
    let mut merged: Vec<Item> = Vec::new();

    for item in orig {
        let keep = is_comment_item(item)
            || fixed
                .iter()
                .any(|f| f.value.is_some() && identity_match(sequence_key, item, f));
        if keep {
            merged.push(item.clone());
        }
    }

    for fixed_item in fixed {
        let pos = merged
            .iter()
            .position(|m| m.value.is_some() && identity_match(sequence_key, fixed_item, m));
        let pos = match pos {
            Some(p) => p,
            None => {
                merged.push(fixed_item.clone());
                continue;
            }
        };
        let new_value = match (&merged[pos].value, &fixed_item.value) {
            (Some(Tree::Mapping(om)), Some(Tree::Mapping(fm))) => {
                Some(Tree::Mapping(merge_mapping(om, fm)))
            }
            _ => fixed_item.value.clone(),
        };
        merged[pos].value = new_value;
    }

    merged
}

/// Merge a fixed document into the original document text, preserving the
/// original's key order and comments. A trailing run of standalone
/// comments at the end of the original is detached before the merge (it
/// has no fixed-side counterpart) and reattached afterwards.
pub fn merge_document(orig: &str, fixed: &str) -> Result<String, ParseError> {
    let mut orig_doc = parse_document(orig)?;
    let fixed_doc = parse_document(fixed)?;

    let mut trailing: Vec<Entry> = Vec::new();
    while orig_doc.last().map_or(false, is_comment_entry) {
        trailing.push(orig_doc.pop().unwrap());
    }
    trailing.reverse();

    let mut merged = merge_mapping(&orig_doc, &fixed_doc);
    merged.extend(trailing);

    Ok(emit_document(&merged))
}

const CREATION_TS_ARTIFACTS: &[&str] = &[
    "\n  creationTimestamp: null\n",
    "\n      creationTimestamp: null\n",
    "\n          creationTimestamp: null\n",
];

const STATUS_ARTIFACTS: &[&str] = &[
    "\nstatus: {}\n",
    "\n    status: {}\n",
];

const STATUS_BLOCK_ARTIFACTS: &[&str] = &[
    "status:\n  replicas: 0\n",
    "status:\n  loadBalancer: {}\n",
];

/// Remove incidental serializer artifacts (null creation timestamps and
/// empty status blocks) unless the original document already contained
/// that exact text, keeping the final diff free of noise the user never
/// wrote.
pub fn cleanup_manifest(orig: Option<&str>, data: &str) -> String {
    let mut out = data.to_string();
    let present = |pat: &str| orig.map_or(false, |o| o.contains(pat));
    for pat in CREATION_TS_ARTIFACTS.iter().chain(STATUS_ARTIFACTS) {
        if !present(pat) {
            out = out.replace(pat, "\n");
        }
    }
    for pat in STATUS_BLOCK_ARTIFACTS {
        if !present(pat) {
            out = out.replace(pat, "");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::{find_entry_str, Scalar};

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

    fn i(v: i64) -> Tree {
        Tree::Scalar(Scalar::Int(v))
    }

    fn item(value: Tree) -> Item {
        Item {
            value: Some(value),
            comment: String::new(),
        }
    }

    #[test]
    fn test_merge_mapping_preserves_unrelated_keys() {
        let orig = vec![entry("a", i(1)), entry("b", i(2))];
        let fixed = vec![entry("a", i(1)), entry("b", i(2))];
        let merged = merge_mapping(&orig, &fixed);
        assert_eq!(merged.len(), 2);
        assert!(matches!(
            find_entry_str(&merged, "b").unwrap().value,
            Some(Tree::Scalar(Scalar::Int(2)))
        ));
    }

    #[test]
    fn test_merge_mapping_drops_removed_keys_and_keeps_comments() {
        let orig = vec![
            entry("keep", i(1)),
            Entry::comment("# a comment"),
            entry("gone", i(2)),
        ];
        let fixed = vec![entry("keep", i(1))];
        let merged = merge_mapping(&orig, &fixed);
        assert_eq!(merged.len(), 2);
        assert!(find_entry_str(&merged, "gone").is_none());
        assert_eq!(merged[1].comment, "# a comment");
    }

    #[test]
    fn test_merge_mapping_appends_new_keys_after_retained() {
        let orig = vec![entry("a", i(1))];
        let fixed = vec![entry("new", i(9)), entry("a", i(1))];
        let merged = merge_mapping(&orig, &fixed);
        let keys: Vec<_> = merged
            .iter()
            .filter_map(|e| match e.key.as_ref() {
                Some(Scalar::Str(s)) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec!["a", "new"]);
    }

    #[test]
    fn test_merge_mapping_fixed_scalar_wins() {
        let orig = vec![entry("x", Tree::Scalar(Scalar::Bool(true)))];
        let fixed = vec![entry("x", Tree::Scalar(Scalar::Bool(false)))];
        let merged = merge_mapping(&orig, &fixed);
        assert!(matches!(
            merged[0].value,
            Some(Tree::Scalar(Scalar::Bool(false)))
        ));
    }

    #[test]
    fn test_merge_sequence_identity_stability() {
        // containers are identified by name: "a" is dropped, "b" updated,
        // "c" appended.
        let orig = vec![
            item(Tree::Mapping(vec![entry("name", s("a")), entry("x", i(1))])),
            item(Tree::Mapping(vec![entry("name", s("b")), entry("x", i(2))])),
        ];
        let fixed = vec![
            item(Tree::Mapping(vec![entry("name", s("b")), entry("x", i(20))])),
            item(Tree::Mapping(vec![entry("name", s("c")), entry("x", i(3))])),
        ];
        let merged = merge_sequence("containers", &orig, &fixed);
        assert_eq!(merged.len(), 2);
        let first = merged[0].value.as_ref().unwrap().as_mapping().unwrap();
        assert!(matches!(
            find_entry_str(first, "name").unwrap().value,
            Some(Tree::Scalar(Scalar::Str(ref n))) if n == "b"
        ));
        assert!(matches!(
            find_entry_str(first, "x").unwrap().value,
            Some(Tree::Scalar(Scalar::Int(20)))
        ));
        let second = merged[1].value.as_ref().unwrap().as_mapping().unwrap();
        assert!(matches!(
            find_entry_str(second, "name").unwrap().value,
            Some(Tree::Scalar(Scalar::Str(ref n))) if n == "c"
        ));
    }

    #[test]
    fn test_merge_sequence_scalar_items_match_literally() {
        let orig = vec![item(s("NET_ADMIN")), item(s("SYS_TIME"))];
        let fixed = vec![item(s("SYS_TIME")), item(s("ALL"))];
        let merged = merge_sequence("drop", &orig, &fixed);
        let values: Vec<_> = merged
            .iter()
            .filter_map(|it| match it.value.as_ref() {
                Some(Tree::Scalar(Scalar::Str(s))) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec!["SYS_TIME", "ALL"]);
    }

    #[test]
    fn test_merge_document_adds_security_context_preserving_comments() {
        let orig = "\
# deployment for the web tier
apiVersion: v1
kind: Pod
metadata:
  name: web # prod name
spec:
  containers:
  - name: app
    image: nginx:1.25
# end of file
";
        let fixed = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
  - name: app
    image: nginx:1.25
    securityContext:
      allowPrivilegeEscalation: false
";
        let merged = merge_document(orig, fixed).unwrap();
        assert!(merged.starts_with("# deployment for the web tier\n"));
        assert!(merged.ends_with("# end of file\n"));
        assert!(merged.contains("name: web # prod name"));
        assert!(merged.contains("allowPrivilegeEscalation: false"));
        // original key order retained
        let api = merged.find("apiVersion").unwrap();
        let kind = merged.find("kind").unwrap();
        assert!(api < kind);
    }

    #[test]
    fn test_merge_document_round_trip_on_reordered_equivalent() {
        let orig = "\
kind: Pod
apiVersion: v1
metadata:
  name: web
";
        let fixed = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
";
        let merged = merge_document(orig, fixed).unwrap();
        assert_eq!(merged, orig);
    }

    #[test]
    fn test_merge_document_malformed_input_is_an_error() {
        assert!(merge_document("not yaml at all", "kind: Pod\n").is_err());
        assert!(merge_document("kind: Pod\n", "% nope").is_err());
    }

    #[test]
    fn test_cleanup_removes_artifacts_absent_from_original() {
        let merged = "\
kind: Pod
metadata:
  name: web
  creationTimestamp: null
status: {}
";
        let cleaned = cleanup_manifest(Some("kind: Pod\nmetadata:\n  name: web\n"), merged);
        assert!(!cleaned.contains("creationTimestamp"));
        assert!(!cleaned.contains("status: {}"));
    }

    #[test]
    fn test_cleanup_keeps_artifacts_present_in_original() {
        let orig = "\
kind: Pod
metadata:
  name: web
  creationTimestamp: null
status: {}
";
        let cleaned = cleanup_manifest(Some(orig), orig);
        assert!(cleaned.contains("creationTimestamp: null"));
        assert!(cleaned.contains("status: {}"));
    }
}
