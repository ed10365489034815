//! Configuration discovery and effective settings resolution.
//!
//! Kubeguard reads `kubeguard.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `manifests`: `**/*.yaml` and `**/*.yml`
//! - `output`: `human`
//! - `checks.disabled`: empty
//! - `autofix.write|diff|check`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// Check-related configuration section under `[checks]`.
pub struct ChecksCfg {
    pub disabled: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Autofix-related configuration section under `[autofix]`.
pub struct AutofixCfg {
    pub write: Option<bool>,
    pub diff: Option<bool>,
    pub check: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `kubeguard.toml|yaml`.
pub struct KubeguardConfig {
    pub manifests: Option<Vec<String>>,
    pub output: Option<String>,
    pub checks: Option<ChecksCfg>,
    pub autofix: Option<AutofixCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub manifests: Vec<String>,
    pub manifests_configured: bool,
    pub output: String,
    pub disabled: HashSet<String>,
    pub write: bool,
    pub diff: bool,
    pub check: bool,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `kubeguard.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("kubeguard.toml").exists()
            || cur.join("kubeguard.yaml").exists()
            || cur.join("kubeguard.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `KubeguardConfig` from `kubeguard.toml` or `kubeguard.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<KubeguardConfig> {
    let toml_path = root.join("kubeguard.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: KubeguardConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["kubeguard.yaml", "kubeguard.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: KubeguardConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_manifests: &[String],
    cli_output: Option<&str>,
    cli_write: Option<bool>,
    cli_diff: Option<bool>,
    cli_check: Option<bool>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let manifests_src = if !cli_manifests.is_empty() {
        Some(cli_manifests.to_vec())
    } else {
        cfg.manifests
    };
    let (manifests, manifests_configured) = match manifests_src {
        Some(p) => (p, true),
        None => (
            vec!["**/*.yaml".to_string(), "**/*.yml".to_string()],
            false,
        ),
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let disabled: HashSet<String> = cfg
        .checks
        .as_ref()
        .and_then(|c| c.disabled.clone())
        .unwrap_or_default()
        .into_iter()
        .collect();

    let write = cli_write
        .or_else(|| cfg.autofix.as_ref().and_then(|a| a.write))
        .unwrap_or(false);
    let diff = cli_diff
        .or_else(|| cfg.autofix.as_ref().and_then(|a| a.diff))
        .unwrap_or(false);
    let check = cli_check
        .or_else(|| cfg.autofix.as_ref().and_then(|a| a.check))
        .unwrap_or(false);

    Effective {
        repo_root,
        manifests,
        manifests_configured,
        output,
        disabled,
        write,
        diff,
        check,
    }
}
