use log::{error, warn};

use crate::types::{FolderFailure, SkippedFile};

/// Log the skip summary: count at warn, each file (path + reason) to stderr when verbose.
pub fn report_skipped_files(skipped: &[SkippedFile], verbose: bool) {
    if skipped.is_empty() {
        return;
    }
    warn!("Skipped {} files that could not be indexed", skipped.len());
    if verbose {
        for s in skipped {
            eprintln!("  skipped: {} ({})", s.path.display(), s.reason);
        }
    }
}

/// Log every failed case folder. Returns the number of failures.
pub fn report_failed_folders(failed: &[FolderFailure]) -> usize {
    for f in failed {
        error!("case folder {} failed: {}", f.folder.display(), f.error);
    }
    failed.len()
}
