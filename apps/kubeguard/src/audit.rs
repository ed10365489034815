//! Audit runner over manifest files.
//!
//! Expands manifest glob patterns, decodes every document, runs the check
//! catalog, and aggregates a summary. Files, and the resources within
//! them, are processed in parallel; results are sorted for deterministic
//! output.

use crate::checks::{audit_resource, ManifestContext};
use crate::manifest::{decode_resource, is_comment_block, split_documents, ManifestError};
use crate::models::resource::Resource;
use crate::models::{AuditResult, Severity, Summary};
use glob::glob;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand manifest patterns relative to the repo root.
pub fn collect_targets(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = Vec::new();
    for pat in patterns {
        let abs_glob = root.join(pat);
        let pattern = abs_glob.to_string_lossy().to_string();
        if let Ok(entries) = glob(&pattern) {
            for entry in entries.flatten() {
                if entry.is_file() {
                    targets.push(entry);
                }
            }
        }
    }
    targets.sort();
    targets.dedup();
    targets
}

/// Run the audit across files matched by the patterns.
///
/// Checks named in `disabled` are filtered out of the results. Read and
/// decode failures do not abort the run; they come back as error strings
/// alongside the findings.
pub fn run_audit(
    repo_root: &str,
    patterns: &[String],
    disabled: &HashSet<String>,
) -> (Vec<AuditResult>, Summary, Vec<String>) {
    let root = PathBuf::from(repo_root);
    let targets = collect_targets(&root, patterns);

    let per_file: Vec<(Vec<AuditResult>, Vec<String>, usize)> = targets
        .par_iter()
        .map(|path| audit_file(path, disabled))
        .collect();

    let mut results: Vec<AuditResult> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    let mut resources = 0usize;
    for (file_results, file_errors, file_resources) in per_file {
        results.extend(file_results);
        errors.extend(file_errors);
        resources += file_resources;
    }
    results.sort_by(|a, b| a.file.cmp(&b.file).then(a.resource_name.cmp(&b.resource_name)));

    let mut errs = 0usize;
    let mut warns = 0usize;
    for result in &results {
        for occurrence in &result.occurrences {
            match occurrence.severity {
                Severity::Error => errs += 1,
                Severity::Warning => warns += 1,
            }
        }
    }
    let summary = Summary {
        errors: errs,
        warnings: warns,
        resources,
        files: targets.len(),
    };
    (results, summary, errors)
}

fn audit_file(path: &Path, disabled: &HashSet<String>) -> (Vec<AuditResult>, Vec<String>, usize) {
    let file = path.to_string_lossy().to_string();
    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let err = ManifestError::Io {
                path: path.to_path_buf(),
                source: e,
            };
            return (Vec::new(), vec![err.to_string()], 0);
        }
    };

    let mut resources: Vec<Resource> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    for doc in &split_documents(&data).documents {
        if is_comment_block(doc) {
            continue;
        }
        match decode_resource(&file, doc) {
            Ok(resource) => resources.push(resource),
            Err(e) => errors.push(e.to_string()),
        }
    }

    let supported = resources.iter().filter(|r| r.is_supported()).count();
    let ctx = ManifestContext::new(&resources);
    // The context is read-only from here on, so each resource audits
    // independently.
    let results: Vec<AuditResult> = resources
        .par_iter()
        .filter_map(|resource| {
            let mut occurrences = audit_resource(resource, &ctx);
            occurrences.retain(|o| !disabled.contains(o.kind.name()));
            if occurrences.is_empty() {
                return None;
            }
            Some(AuditResult {
                file: file.clone(),
                resource_kind: resource.kind().to_string(),
                resource_name: resource.name().to_string(),
                occurrences,
            })
        })
        .collect();
    (results, errors, supported)
}
