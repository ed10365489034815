//! Supporting helpers for terminal prefixes and path display.

use owo_colors::OwoColorize;
use std::path::Path;

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Red error prefix for stderr messages.
pub fn error_prefix() -> String {
    if use_colors() {
        "✖ ⟦error⟧".red().bold().to_string()
    } else {
        "✖ ⟦error⟧".to_string()
    }
}

/// Yellow note prefix for stderr messages.
pub fn note_prefix() -> String {
    if use_colors() {
        "▲ ⟦note⟧".yellow().bold().to_string()
    } else {
        "▲ ⟦note⟧".to_string()
    }
}

/// Blue info prefix for stderr messages.
pub fn info_prefix() -> String {
    if use_colors() {
        "◆ ⟦info⟧".blue().bold().to_string()
    } else {
        "◆ ⟦info⟧".to_string()
    }
}

/// Render a path relative to the repo root when possible.
pub fn display_path(root: &Path, path: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}
