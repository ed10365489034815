//! Kubeguard CLI binary entry point.
//! Delegates to modules for audit/autofix and prints results.

mod audit;
mod autofix;
mod checks;
mod cli;
mod config;
mod fix;
mod identity;
mod manifest;
mod merge;
mod models;
mod output;
mod utils;
mod yaml;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Audit {
            repo_root,
            manifest,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                &manifest,
                output.as_deref(),
                None,
                None,
                None,
            );
            // Friendly note if no kubeguard config was found
            if config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    crate::utils::note_prefix(),
                    "No kubeguard.toml found; using defaults."
                );
            }
            warn_unknown_disabled(&eff.disabled);
            if eff.output != "json" && !eff.manifests_configured {
                eprintln!(
                    "{} {}",
                    crate::utils::info_prefix(),
                    format!("Using default patterns: [{}]", eff.manifests.join(", "))
                );
            }
            let repo_root_str = eff.repo_root.to_string_lossy().to_string();
            let (results, summary, errors) =
                audit::run_audit(&repo_root_str, &eff.manifests, &eff.disabled);
            output::print_audit(&results, &summary, &eff.output, &errors);
            if summary.errors > 0 || !errors.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Autofix {
            repo_root,
            manifest,
            write,
            diff,
            check,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                &manifest,
                output.as_deref(),
                if write { Some(true) } else { None },
                if diff { Some(true) } else { None },
                if check { Some(true) } else { None },
            );
            if config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    crate::utils::note_prefix(),
                    "No kubeguard.toml found; using defaults."
                );
            }
            warn_unknown_disabled(&eff.disabled);
            if eff.output != "json" && !eff.manifests_configured {
                eprintln!(
                    "{} {}",
                    crate::utils::info_prefix(),
                    format!("Using default patterns: [{}]", eff.manifests.join(", "))
                );
            }
            // CLI/config precedence at runtime:
            // - If diff or check is enabled, force write=false for this run.
            // - Otherwise respect write.
            let eff_diff = eff.diff;
            let eff_check = eff.check;
            let eff_write = if eff_diff || eff_check {
                false
            } else {
                eff.write
            };
            let repo_root_str = eff.repo_root.to_string_lossy().to_string();
            let (results, errors) = autofix::run_autofix(
                &repo_root_str,
                &eff.manifests,
                eff_write,
                eff_diff || eff_check,
                &eff.disabled,
            );
            output::print_autofix(&results, &eff.output, eff_write, eff_diff, &errors);
            if !errors.is_empty() {
                std::process::exit(1);
            }
            if eff_check && results.iter().any(|r| r.changed) {
                std::process::exit(1);
            }
        }
    }
}

/// Warn about disabled check names that match no known check.
fn warn_unknown_disabled(disabled: &std::collections::HashSet<String>) {
    for name in disabled {
        if !models::ErrorKind::ALL.iter().any(|k| k.name() == name) {
            eprintln!(
                "{} {}",
                crate::utils::note_prefix(),
                format!("Unknown check name in [checks].disabled: {}", name)
            );
        }
    }
}
