//! Load `.imgtools.toml` from the dataset root (CLI only). Lib callers pass [`CrawlOpts`](crate::CrawlOpts) directly.

use serde::Deserialize;
use std::path::Path;

use crate::utils::config::PackagePaths;
use crate::{MergePolicy, Opts};

#[derive(Debug, Default, Deserialize)]
pub struct ImgtoolsToml {
    #[serde(default)]
    crawl: CrawlSection,
}

#[derive(Debug, Default, Deserialize)]
struct CrawlSection {
    n_jobs: Option<usize>,
    merge_policy: Option<MergePolicy>,
    follow_links: Option<bool>,
    strict: Option<bool>,
    exclude: Option<Vec<String>>,
    verbose: Option<bool>,
    partial: Option<bool>,
}

/// Load the config file from `dir` if present. Returns None if missing, unreadable or invalid (invalid is warned).
pub fn load_imgtools_toml(dir: &Path) -> Option<ImgtoolsToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_imgtools_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_imgtools_toml(s: &str) -> Result<ImgtoolsToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $opts.$field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &ImgtoolsToml, opts: &mut Opts) {
    let section = &file.crawl;
    apply_file_opt!(section, opts, n_jobs);
    apply_file_opt!(section, opts, merge_policy);
    apply_file_opt!(section, opts, follow_links);
    apply_file_opt!(section, opts, strict);
    apply_file_opt!(section, opts, exclude);
    apply_file_opt!(section, opts, verbose);
    apply_file_opt!(section, opts, partial);
}
