//! Path and filter utilities

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Join path components with `/` regardless of platform, so recorded folders are portable.
pub fn path_to_slash_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Folder recorded for a series: `<dataset name>/<dir relative to dataset root>`.
/// `dir` outside `dataset_root` is recorded as-is.
pub fn series_folder(dataset_root: &Path, dir: &Path) -> String {
    let dataset = dataset_root
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    match path_relative_to(dir, dataset_root) {
        Some(rel) => path_to_slash_string(&dataset.join(rel)),
        None => path_to_slash_string(dir),
    }
}

/// Check if a file should be excluded based on OS-specific hidden files
pub fn is_os_hidden_file(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            matches!(
                name,
                ".DS_Store"
                    | ".AppleDouble"
                    | ".LSOverride"
                    | "Thumbs.db"
                    | "ehthumbs.db"
                    | "Desktop.ini"
                    | "$RECYCLE.BIN"
                    | ".directory"
            ) || name.starts_with("._")
                || name.starts_with(".Trash-")
        }
        None => false,
    }
}

/// Returns true if the walk should descend into or yield `path`. Excluded names are always
/// pruned. Hidden OS directories are pruned; hidden files are kept so they can be reported.
pub fn should_include_in_walk(path: &Path, is_dir: bool, exclude_patterns: &[String]) -> bool {
    if is_dir && is_os_hidden_file(path) {
        return false;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return true,
    };
    !exclude_patterns.iter().any(|p| glob_match(p, name))
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.strip_prefix('!').unwrap_or(pattern).chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|i| glob_match_chars(rest, &text[i..])),
        Some(('?', rest)) => !text.is_empty() && glob_match_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match_chars(rest, &text[1..]),
    }
}

/// Canonicalize the dataset root and make sure it is a directory.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("canonicalize dataset root {}", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("dataset root is not a directory: {}", root.display());
    }
    Ok(root)
}
