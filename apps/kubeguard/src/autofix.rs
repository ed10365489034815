//! Autofix runner.
//!
//! For each manifest file: decode the documents, audit them, apply the
//! remediations to the typed resources, re-encode, and merge the result
//! back into the original text so comments and key order survive. New
//! resources created by fixes (default-deny NetworkPolicies) are appended
//! as extra documents. Files, and the documents within them, are
//! processed in parallel.

use crate::audit::collect_targets;
use crate::checks::{audit_resource, ManifestContext};
use crate::fix::fix_resource;
use crate::manifest::{decode_resource, is_comment_block, split_documents, ManifestError};
use crate::merge::{cleanup_manifest, merge_document};
use crate::models::resource::Resource;
use crate::models::Occurrence;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

pub struct AutofixResult {
    pub file: String,
    pub changed: bool,
    pub preview: Option<String>,
    pub original: Option<String>,
}

/// Fix manifest files matched by the patterns.
///
/// When `write` is false the fixed text is returned as a preview instead
/// of being written. `capture_old` keeps the original text on each result
/// for diff rendering. Checks named in `disabled` produce no fixes.
pub fn run_autofix(
    repo_root: &str,
    patterns: &[String],
    write: bool,
    capture_old: bool,
    disabled: &HashSet<String>,
) -> (Vec<AutofixResult>, Vec<String>) {
    let root = PathBuf::from(repo_root);
    let targets = collect_targets(&root, patterns);

    let per_file: Vec<(AutofixResult, Vec<String>)> = targets
        .par_iter()
        .map(|path| {
            let file = path.to_string_lossy().to_string();
            let data = match fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    let err = ManifestError::Io {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    return (
                        AutofixResult {
                            file,
                            changed: false,
                            preview: None,
                            original: None,
                        },
                        vec![err.to_string()],
                    );
                }
            };
            let (fixed, mut errors) = fix_file(&file, &data, disabled);
            let changed = fixed != data;
            if write && changed {
                if let Err(e) = fs::write(path, &fixed) {
                    let err = ManifestError::Io {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    errors.push(err.to_string());
                }
            }
            (
                AutofixResult {
                    file,
                    changed,
                    preview: if !write && changed { Some(fixed) } else { None },
                    original: if capture_old { Some(data) } else { None },
                },
                errors,
            )
        })
        .collect();

    let mut results: Vec<AutofixResult> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    for (result, file_errors) in per_file {
        results.push(result);
        errors.extend(file_errors);
    }
    results.sort_by(|a, b| a.file.cmp(&b.file));
    (results, errors)
}

/// Fix one manifest file's text. Returns the fixed text (identical to the
/// input when nothing applies) and any per-document errors.
fn fix_file(file: &str, data: &str, disabled: &HashSet<String>) -> (String, Vec<String>) {
    let split = split_documents(data);
    let mut errors: Vec<String> = Vec::new();

    // Decode everything first so cross-document checks see the whole file.
    let mut decoded: Vec<Option<Resource>> = Vec::with_capacity(split.documents.len());
    for doc in &split.documents {
        if is_comment_block(doc) {
            decoded.push(None);
            continue;
        }
        match decode_resource(file, doc) {
            Ok(resource) => decoded.push(Some(resource)),
            Err(e) => {
                errors.push(e.to_string());
                decoded.push(None);
            }
        }
    }
    let resources: Vec<Resource> = decoded.iter().flatten().cloned().collect();
    let ctx = ManifestContext::new(&resources);

    let occurrences: Vec<Vec<Occurrence>> = decoded
        .par_iter()
        .map(|resource| match resource {
            Some(r) => {
                let mut occ = audit_resource(r, &ctx);
                occ.retain(|o| !disabled.contains(o.kind.name()));
                occ
            }
            None => Vec::new(),
        })
        .collect();
    if occurrences.iter().all(Vec::is_empty) {
        return (data.to_string(), errors);
    }

    // Each document fixes and merges against its own original text, so
    // documents proceed in parallel and join in order.
    let per_doc: Vec<(String, Vec<Resource>, Vec<String>)> = split
        .documents
        .par_iter()
        .zip(decoded.into_par_iter())
        .zip(occurrences.par_iter())
        .map(|((doc, resource), occ)| fix_document(file, doc, resource, occ))
        .collect();

    let mut fixed_docs: Vec<String> = Vec::with_capacity(per_doc.len());
    let mut aux_resources: Vec<Resource> = Vec::new();
    for (fixed, aux, doc_errors) in per_doc {
        fixed_docs.push(fixed);
        aux_resources.extend(aux);
        errors.extend(doc_errors);
    }
    for aux in &aux_resources {
        match aux.to_yaml() {
            Ok(s) => fixed_docs.push(cleanup_manifest(None, &s)),
            Err(e) => errors.push(format!("{}: {}", file, e)),
        }
    }

    let mut out = String::new();
    if split.leading_separator {
        out.push_str("---\n");
    }
    for (i, doc) in fixed_docs.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(doc);
        if !doc.ends_with('\n') {
            out.push('\n');
        }
    }
    (out, errors)
}

/// Fix one decoded document against its original text. Returns the fixed
/// document text (the original when nothing applies or merging fails),
/// any auxiliary resources the fixes created, and errors.
fn fix_document(
    file: &str,
    doc: &str,
    resource: Option<Resource>,
    occurrences: &[Occurrence],
) -> (String, Vec<Resource>, Vec<String>) {
    let (Some(mut resource), false) = (resource, occurrences.is_empty()) else {
        return (doc.to_string(), Vec::new(), Vec::new());
    };
    let aux = fix_resource(&mut resource, occurrences);
    let fixed_yaml = match resource.to_yaml() {
        Ok(s) => s,
        Err(e) => {
            return (
                doc.to_string(),
                Vec::new(),
                vec![format!("{}: {}", file, e)],
            )
        }
    };
    match merge_document(doc, &fixed_yaml) {
        Ok(merged) => (cleanup_manifest(Some(doc), &merged), aux, Vec::new()),
        Err(e) => (
            doc.to_string(),
            Vec::new(),
            vec![format!("{}: {}", file, e)],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const BARE_POD: &str = "\
# production pod
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
  - name: app
    image: nginx:1.25
";

    #[test]
    fn test_write_mode_rewrites_the_file_and_keeps_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pod.yaml", BARE_POD);
        let (results, errors) = run_autofix(
            dir.path().to_str().unwrap(),
            &["pod.yaml".to_string()],
            true,
            false,
            &HashSet::new(),
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(results.len(), 1);
        assert!(results[0].changed);
        let fixed = fs::read_to_string(&path).unwrap();
        assert!(fixed.starts_with("# production pod\n"));
        assert!(fixed.contains("allowPrivilegeEscalation: false"));
        assert!(fixed.contains("image: nginx:1.25"));
    }

    #[test]
    fn test_preview_mode_leaves_the_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pod.yaml", BARE_POD);
        let (results, _) = run_autofix(
            dir.path().to_str().unwrap(),
            &["pod.yaml".to_string()],
            false,
            true,
            &HashSet::new(),
        );
        assert!(results[0].changed);
        assert!(results[0].preview.is_some());
        assert_eq!(results[0].original.as_deref(), Some(BARE_POD));
        assert_eq!(fs::read_to_string(&path).unwrap(), BARE_POD);
    }

    #[test]
    fn test_clean_manifest_is_unchanged() {
        let hardened = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
  annotations:
    container.apparmor.security.beta.kubernetes.io/app: runtime/default
    seccomp.security.alpha.kubernetes.io/pod: runtime/default
spec:
  serviceAccountName: web
  automountServiceAccountToken: false
  containers:
  - name: app
    securityContext:
      allowPrivilegeEscalation: false
      privileged: false
      readOnlyRootFilesystem: true
      runAsNonRoot: true
      capabilities:
        drop:
        - ALL
";
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pod.yaml", hardened);
        let (results, errors) = run_autofix(
            dir.path().to_str().unwrap(),
            &["pod.yaml".to_string()],
            true,
            false,
            &HashSet::new(),
        );
        assert!(errors.is_empty());
        assert!(!results[0].changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), hardened);
    }

    #[test]
    fn test_namespace_fix_appends_network_policy_document() {
        let ns = "\
apiVersion: v1
kind: Namespace
metadata:
  name: prod
";
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "ns.yaml", ns);
        let (results, errors) = run_autofix(
            dir.path().to_str().unwrap(),
            &["ns.yaml".to_string()],
            true,
            false,
            &HashSet::new(),
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(results[0].changed);
        let fixed = fs::read_to_string(&path).unwrap();
        assert!(fixed.contains("kind: NetworkPolicy"));
        assert!(fixed.contains("name: default-deny-prod"));
        assert!(fixed.contains("---\n"));
    }

    #[test]
    fn test_fix_pod_with_multiline_args_block() {
        let pod = "\
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
  - name: app
    image: busybox
    command:
    - /bin/sh
    args:
    - -c
    - |
      echo hello
      echo world
";
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pod.yaml", pod);
        let (results, errors) = run_autofix(
            dir.path().to_str().unwrap(),
            &["pod.yaml".to_string()],
            true,
            false,
            &HashSet::new(),
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(results[0].changed);
        let fixed = fs::read_to_string(&path).unwrap();
        assert!(fixed.contains("allowPrivilegeEscalation: false"));
        assert!(fixed.contains("- |\n      echo hello\n      echo world\n"));
    }

    #[test]
    fn test_multi_document_fixes_keep_document_order() {
        let pods = "\
apiVersion: v1
kind: Pod
metadata:
  name: first
spec:
  containers:
  - name: a
---
apiVersion: v1
kind: Pod
metadata:
  name: second
spec:
  containers:
  - name: b
";
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pods.yaml", pods);
        let (results, errors) = run_autofix(
            dir.path().to_str().unwrap(),
            &["pods.yaml".to_string()],
            true,
            false,
            &HashSet::new(),
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(results[0].changed);
        let fixed = fs::read_to_string(&path).unwrap();
        let first = fixed.find("name: first").unwrap();
        let second = fixed.find("name: second").unwrap();
        assert!(first < second);
        assert_eq!(fixed.matches("allowPrivilegeEscalation: false").count(), 2);
    }

    #[test]
    fn test_disabled_checks_produce_no_fixes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "ns.yaml", "\
apiVersion: v1
kind: Namespace
metadata:
  name: prod
");
        let disabled: HashSet<String> =
            ["MissingDefaultDenyIngressAndEgressNetworkPolicy".to_string()]
                .into_iter()
                .collect();
        let (results, _) = run_autofix(
            dir.path().to_str().unwrap(),
            &["ns.yaml".to_string()],
            true,
            false,
            &disabled,
        );
        assert!(!results[0].changed);
    }
}
