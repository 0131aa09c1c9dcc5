//! Shared pipeline state: cancellation and the settings every case-folder worker gets a copy of.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::CrawlOpts;

/// Cooperative cancellation flag. Checked before each case folder starts and before each file.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Walk behaviour for one case folder.
#[derive(Clone, Debug, Default)]
pub struct WalkSettings {
    pub follow_links: bool,
    pub strict: bool,
    pub exclude: Vec<String>,
}

impl From<&CrawlOpts> for WalkSettings {
    fn from(o: &CrawlOpts) -> Self {
        WalkSettings {
            follow_links: o.follow_links,
            strict: o.strict,
            exclude: o.exclude.clone(),
        }
    }
}

/// Everything a worker needs to build one case folder's index. Owned, so it can move into the pool.
#[derive(Clone, Debug)]
pub struct CaseContext {
    /// Canonical dataset root; the parent of every case folder.
    pub dataset_root: PathBuf,
    pub walk: WalkSettings,
    pub cancel: CancelToken,
}

impl CaseContext {
    pub fn new(dataset_root: &Path, opts: &CrawlOpts) -> Self {
        CaseContext {
            dataset_root: dataset_root.to_path_buf(),
            walk: WalkSettings::from(opts),
            cancel: opts.cancel.clone(),
        }
    }
}
