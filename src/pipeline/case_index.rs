//! Per-case-folder index build: walk → extract → fold into a folder-local [`GlobalIndex`].

use log::debug;
use std::path::{Path, PathBuf};

use crate::engine::tools::series_folder;
use crate::error::{FolderError, SkipReason};
use crate::types::{GlobalIndex, InstanceRecord, SkippedFile};

use super::context::CaseContext;
use super::metadata::extract_instance;
use super::walk::{WalkOutcome, walk_case_folder};

/// Partial index produced by one case folder. Owned by its worker until handed to the merger.
#[derive(Debug, Default)]
pub struct CaseIndex {
    pub index: GlobalIndex,
    pub skipped: Vec<SkippedFile>,
}

/// Accumulates instances of one case folder.
#[derive(Default)]
pub struct CaseIndexBuilder {
    case: CaseIndex,
}

impl CaseIndexBuilder {
    pub fn new() -> Self {
        Self {
            case: CaseIndex::default(),
        }
    }

    pub fn add_instance(&mut self, instance: InstanceRecord) {
        self.case.index.insert_instance(instance);
    }

    pub fn skip(&mut self, path: PathBuf, reason: SkipReason) {
        debug!("skip {}: {}", path.display(), reason);
        self.case.skipped.push(SkippedFile { path, reason });
    }

    pub fn finish(self) -> CaseIndex {
        self.case
    }
}

/// Crawl one case folder. File-level problems are recorded as skips; walk errors fail the folder
/// only in strict mode. Cancellation is checked before every file.
pub fn build_case_index(folder: &Path, ctx: &CaseContext) -> Result<CaseIndex, FolderError> {
    let mut builder = CaseIndexBuilder::new();
    for outcome in walk_case_folder(folder, &ctx.walk) {
        if ctx.cancel.is_cancelled() {
            return Err(FolderError::Cancelled);
        }
        match outcome {
            WalkOutcome::Candidate(path) => {
                let dir = path.parent().unwrap_or(folder);
                let series_dir = series_folder(&ctx.dataset_root, dir);
                match extract_instance(&path, series_dir) {
                    Ok(instance) => builder.add_instance(instance),
                    Err(reason) => builder.skip(path, reason),
                }
            }
            WalkOutcome::NotDicom(path) => builder.skip(path, SkipReason::NotDicom),
            WalkOutcome::Hidden(path) => builder.skip(path, SkipReason::Hidden),
            WalkOutcome::Unreadable { path, msg } => {
                builder.skip(path, SkipReason::Unreadable(msg))
            }
            WalkOutcome::Err { msg, path } => {
                if ctx.walk.strict {
                    return Err(FolderError::Walk { msg, path });
                }
                let path = path.unwrap_or_else(|| folder.to_path_buf());
                builder.skip(path, SkipReason::Unreadable(msg));
            }
        }
    }
    let case = builder.finish();
    debug!(
        "{}: {} patients, {} series, {} skipped",
        folder.display(),
        case.index.len(),
        case.index.series_count(),
        case.skipped.len()
    );
    Ok(case)
}
