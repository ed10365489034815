//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "kubeguard",
    version,
    about = "Kubeguard (Rust + YAML)",
    long_about = "Kubeguard — a tiny, fast CLI to audit Kubernetes manifests for security misconfigurations and fix them in place.\n\nConfiguration precedence: CLI > kubeguard.toml > defaults.",
    after_help = "Examples:\n  kubeguard audit --manifest 'deploy/**/*.yaml'\n  kubeguard audit --output json\n  kubeguard autofix --manifest 'deploy/**/*.yaml' --write\n  kubeguard autofix --diff",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for auditing and fixing manifests.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current kubeguard version."
    )]
    Version,
    /// Audit manifests for security misconfigurations
    #[command(
        about = "Run security checks",
        long_about = "Audit Kubernetes manifests matched by the patterns. Error-level findings contribute to CI exits.",
        after_help = "Examples:\n  kubeguard audit --manifest 'deploy/**/*.yaml'\n  kubeguard audit --output json"
    )]
    Audit {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Manifest glob pattern (repeatable)")]
        manifest: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Fix security misconfigurations in place
    #[command(
        about = "Apply security fixes",
        long_about = "Rewrite manifests so that every finding is remediated, preserving comments and key order. When --diff or --check is set, write is disabled.",
        after_help = "Examples:\n  kubeguard autofix --manifest 'deploy/**/*.yaml' --write\n  kubeguard autofix --diff\n  kubeguard autofix --check"
    )]
    Autofix {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Manifest glob pattern (repeatable)")]
        manifest: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write changes to files")]
        write: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Show diffs for changed files (implies write=false)")]
        diff: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero if changes would occur (implies write=false)")]
        check: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
