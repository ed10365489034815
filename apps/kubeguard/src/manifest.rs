//! Manifest file handling.
//!
//! Splits multi-document manifests on `---` separators and decodes each
//! document into a typed `Resource`. Documents that hold nothing but
//! comments are passed through untouched by the callers.

use crate::models::resource::{
    Namespace, NetworkPolicy, Pod, Resource, Workload, WORKLOAD_KINDS,
};
use serde_yaml::Value;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while reading or decoding manifest files.
#[derive(Debug)]
pub enum ManifestError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: String, detail: String },
    Decode { path: String, detail: String },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            ManifestError::Parse { path, detail } => {
                write!(f, "{}: parse error: {}", path, detail)
            }
            ManifestError::Decode { path, detail } => {
                write!(f, "{}: decode error: {}", path, detail)
            }
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A manifest split into documents on `---` lines.
pub struct SplitManifest {
    /// True when the file opens with a `---` separator line.
    pub leading_separator: bool,
    pub documents: Vec<String>,
}

/// Split a manifest on document separator lines. Blank documents are
/// dropped; the text of each surviving document keeps its exact bytes.
pub fn split_documents(text: &str) -> SplitManifest {
    let mut documents = Vec::new();
    let mut current = String::new();
    let mut leading_separator = false;
    let mut seen_content = false;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == "---" {
            if !seen_content && current.trim().is_empty() {
                leading_separator = true;
            }
            if !current.trim().is_empty() {
                documents.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            seen_content = true;
        } else {
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        documents.push(current);
    }
    SplitManifest {
        leading_separator,
        documents,
    }
}

/// True when a document consists only of comment and blank lines.
pub fn is_comment_block(doc: &str) -> bool {
    doc.lines()
        .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'))
}

/// Decode one document into a typed resource. Kinds outside the audit
/// surface come back as `Resource::Unsupported` with the raw value.
pub fn decode_resource(path: &str, doc: &str) -> Result<Resource, ManifestError> {
    let value: Value = serde_yaml::from_str(doc).map_err(|e| ManifestError::Parse {
        path: path.to_string(),
        detail: e.to_string(),
    })?;
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let decode_err = |e: serde_yaml::Error| ManifestError::Decode {
        path: path.to_string(),
        detail: format!("{}: {}", kind, e),
    };
    let resource = if kind == "Pod" {
        Resource::Pod(Box::new(
            serde_yaml::from_value::<Pod>(value).map_err(decode_err)?,
        ))
    } else if WORKLOAD_KINDS.contains(&kind.as_str()) {
        Resource::Workload(Box::new(
            serde_yaml::from_value::<Workload>(value).map_err(decode_err)?,
        ))
    } else if kind == "Namespace" {
        Resource::Namespace(Box::new(
            serde_yaml::from_value::<Namespace>(value).map_err(decode_err)?,
        ))
    } else if kind == "NetworkPolicy" {
        Resource::NetworkPolicy(Box::new(
            serde_yaml::from_value::<NetworkPolicy>(value).map_err(decode_err)?,
        ))
    } else {
        Resource::Unsupported(Box::new(value))
    };
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_document() {
        let split = split_documents("kind: Pod\n");
        assert!(!split.leading_separator);
        assert_eq!(split.documents, vec!["kind: Pod\n"]);
    }

    #[test]
    fn test_split_multiple_documents() {
        let split = split_documents("kind: Pod\n---\nkind: Namespace\n");
        assert_eq!(split.documents.len(), 2);
        assert_eq!(split.documents[0], "kind: Pod\n");
        assert_eq!(split.documents[1], "kind: Namespace\n");
    }

    #[test]
    fn test_split_leading_separator() {
        let split = split_documents("---\nkind: Pod\n");
        assert!(split.leading_separator);
        assert_eq!(split.documents, vec!["kind: Pod\n"]);
    }

    #[test]
    fn test_split_drops_blank_documents() {
        let split = split_documents("kind: Pod\n---\n\n---\nkind: Namespace\n");
        assert_eq!(split.documents.len(), 2);
    }

    #[test]
    fn test_comment_block_detection() {
        assert!(is_comment_block("# a comment\n\n# another\n"));
        assert!(!is_comment_block("# a comment\nkind: Pod\n"));
    }

    #[test]
    fn test_decode_workload_kinds() {
        let doc = "\
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: db
spec:
  template:
    spec:
      containers:
      - name: db
";
        let resource = decode_resource("db.yaml", doc).unwrap();
        assert!(matches!(resource, Resource::Workload(_)));
        assert_eq!(resource.kind(), "StatefulSet");
        assert_eq!(resource.name(), "db");
    }

    #[test]
    fn test_decode_unsupported_kind() {
        let doc = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  key: value
";
        let resource = decode_resource("cm.yaml", doc).unwrap();
        assert!(!resource.is_supported());
        assert_eq!(resource.kind(), "ConfigMap");
    }

    #[test]
    fn test_decode_invalid_yaml_is_a_parse_error() {
        let err = decode_resource("bad.yaml", "kind: [unclosed\n").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
