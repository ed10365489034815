//! Output rendering for audit and autofix commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-item fields and a top-level summary.

use crate::autofix::AutofixResult;
use crate::models::{AuditResult, Severity, Summary};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print audit results in the requested format.
pub fn print_audit(results: &[AuditResult], summary: &Summary, output: &str, errors: &[String]) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_audit_json(results, summary, errors)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for result in results {
                for occ in &result.occurrences {
                    let sev = match occ.severity {
                        Severity::Error => {
                            if color {
                                "⟦error⟧".red().bold().to_string()
                            } else {
                                "⟦error⟧".to_string()
                            }
                        }
                        Severity::Warning => {
                            if color {
                                "⟦warn⟧".yellow().bold().to_string()
                            } else {
                                "⟦warn⟧".to_string()
                            }
                        }
                    };
                    let icon = match occ.severity {
                        Severity::Error => "✖".red().to_string(),
                        Severity::Warning => "▲".yellow().to_string(),
                    };
                    let file = if color {
                        result.file.clone().bold().to_string()
                    } else {
                        result.file.clone()
                    };
                    println!(
                        "{} {} {} {}/{} ❲{}❳ — {}",
                        icon,
                        sev,
                        file,
                        result.resource_kind,
                        result.resource_name,
                        occ.kind.name(),
                        occ.message
                    );
                }
            }
            for e in errors {
                println!("{} {}", crate::utils::error_prefix(), e);
            }
            let line = format!(
                "— Summary — errors={} warnings={} resources={} files={}",
                summary.errors, summary.warnings, summary.resources, summary.files
            );
            if color {
                println!("{}", line.bold());
            } else {
                println!("{}", line);
            }
        }
    }
}

/// Print autofix results. When `write` is false, previews and diffs can
/// be emitted; otherwise only file statuses are shown.
pub fn print_autofix(
    results: &[AutofixResult],
    output: &str,
    write: bool,
    diff: bool,
    errors: &[String],
) {
    match output {
        "json" => {
            let out = compose_autofix_json(results, write, diff, errors);
            println!("{}", serde_json::to_string_pretty(&out).unwrap());
        }
        _ => {
            let color = use_colors(output);
            for r in results {
                if write {
                    if r.changed {
                        if color {
                            println!("{} {}", "✏️  fixed:".green().bold(), r.file.bold());
                        } else {
                            println!("✏️  fixed: {}", r.file);
                        }
                    }
                } else if r.changed {
                    if diff {
                        if let Some(d) =
                            build_naive_diff(r.original.as_deref(), r.preview.as_deref())
                        {
                            if color {
                                println!("{} {}\n{}", "---".cyan().bold(), r.file.bold(), d);
                            } else {
                                println!("--- {}\n{}", r.file, d);
                            }
                        } else if let Some(prev) = &r.preview {
                            if color {
                                println!("{} {}\n{}", "---".cyan().bold(), r.file.bold(), prev);
                            } else {
                                println!("--- {}\n{}", r.file, prev);
                            }
                        }
                    } else if let Some(prev) = &r.preview {
                        if color {
                            println!("{} {}\n{}", "---".cyan().bold(), r.file.bold(), prev);
                        } else {
                            println!("--- {}\n{}", r.file, prev);
                        }
                    }
                } else {
                    if color {
                        println!("{} {}", "no changes:".bright_black().to_string(), r.file);
                    } else {
                        println!("no changes: {}", r.file);
                    }
                }
            }
            for e in errors {
                println!("{} {}", crate::utils::error_prefix(), e);
            }
        }
    }
}

fn build_naive_diff(old: Option<&str>, new: Option<&str>) -> Option<String> {
    let old = old?;
    let new = new?;
    let mut out = String::new();
    out.push_str("+++ new\n");
    out.push_str(new);
    out.push('\n');
    out.push_str("--- old\n");
    out.push_str(old);
    Some(out)
}

/// Compose audit JSON object (pure) for testing/snapshot purposes.
pub fn compose_audit_json(results: &[AuditResult], summary: &Summary, errors: &[String]) -> JsonVal {
    json!({
        "results": serde_json::to_value(results).unwrap(),
        "errors": errors,
        "summary": serde_json::to_value(summary).unwrap(),
    })
}

/// Compose autofix JSON object (pure) for testing/snapshot purposes.
pub fn compose_autofix_json(
    results: &[AutofixResult],
    write: bool,
    diff: bool,
    errors: &[String],
) -> JsonVal {
    let items: Vec<_> = results
        .iter()
        .map(|r| {
            json!({
                "file": r.file,
                "changed": r.changed,
                "wrote": write && r.changed,
                "preview": if !write { r.preview.as_ref() } else { None },
                "diff": if diff && !write { build_naive_diff(r.original.as_deref(), r.preview.as_deref()) } else { None }
            })
        })
        .collect();
    let summary = json!({
        "changed": results.iter().filter(|r| r.changed).count(),
        "total": results.len(),
        "wrote": if write { results.iter().filter(|r| r.changed).count() } else { 0 },
    });
    json!({"results": items, "errors": errors, "summary": summary})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, Occurrence};

    #[test]
    fn test_compose_autofix_json_write_and_preview_diff() {
        let results = vec![
            AutofixResult {
                file: "a.yaml".into(),
                changed: true,
                preview: Some("kind: Pod\n".into()),
                original: Some("kind:  Pod\n".into()),
            },
            AutofixResult {
                file: "b.yaml".into(),
                changed: false,
                preview: None,
                original: Some("kind: Namespace\n".into()),
            },
        ];
        // Case: write=false, diff=true ⇒ previews and diffs present for changed item
        let out = compose_autofix_json(&results, false, true, &[]);
        assert_eq!(out["summary"]["changed"], 1);
        assert_eq!(out["summary"]["wrote"], 0);
        assert!(out["results"][0]["preview"].is_string());
        assert!(out["results"][0]["diff"].is_string());
        // Case: write=true ⇒ no preview/diff, wrote equals changed
        let out2 = compose_autofix_json(&results, true, false, &[]);
        assert_eq!(out2["summary"]["wrote"], 1);
        assert!(out2["results"][0]["preview"].is_null());
        assert!(out2["results"][0]["diff"].is_null());
    }

    #[test]
    fn test_compose_audit_json_shape() {
        let results = vec![AuditResult {
            file: "pod.yaml".into(),
            resource_kind: "Pod".into(),
            resource_name: "web".into(),
            occurrences: vec![Occurrence::warning(
                ErrorKind::PrivilegedNil,
                "privileged not set",
            )],
        }];
        let summary = Summary {
            errors: 0,
            warnings: 1,
            resources: 1,
            files: 1,
        };
        let out = compose_audit_json(&results, &summary, &[]);
        assert_eq!(out["summary"]["warnings"], 1);
        assert_eq!(out["results"][0]["resource_kind"], "Pod");
        assert_eq!(out["results"][0]["occurrences"][0]["severity"], "warning");
        assert_eq!(
            out["results"][0]["occurrences"][0]["kind"],
            "PrivilegedNil"
        );
    }
}
