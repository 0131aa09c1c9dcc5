//! imgtools: parallel DICOM dataset crawler.
//!
//! Walks every case folder under a dataset root, groups files into patient → study → series,
//! resolves RT cross-references (dose → structure set → plan → image) and merges the per-folder
//! results into one [`GlobalIndex`], written out as a JSON tree and a CSV table.

pub mod engine;
pub mod error;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{FolderError, MergeError, SkipReason};
pub use merge::{GlobalIndexMerger, merge_indices};
pub use output::{OutputPaths, flat_rows, write_outputs};
pub use pipeline::CancelToken;
pub use types::*;

use log::{debug, info};
use std::path::Path;

use crate::engine::tools::canonicalize_root;
use crate::pipeline::{CaseContext, OnFolderDone, crawl_folders, list_case_folders, worker_count};

/// Result alias used by public imgtools API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Crawl the dataset at `root`: one task per immediate child directory, merged under
/// `opts.merge_policy`. Folders that fail are listed in [`CrawlReport::failed`] and left out of
/// the index. Errors only for run-level problems: unreadable root, pool setup, a
/// [`MergePolicy::Reject`] collision, or cancellation.
pub fn crawl(root: &Path, opts: &CrawlOpts) -> Result<CrawlReport> {
    crawl_with_progress(root, opts, None)
}

/// [`crawl`] with a callback invoked once per finished case folder.
pub fn crawl_with_progress(
    root: &Path,
    opts: &CrawlOpts,
    on_folder_done: Option<OnFolderDone>,
) -> Result<CrawlReport> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let root = canonicalize_root(root)?;
    let folders = list_case_folders(&root)?;
    let num_workers = worker_count(opts.n_jobs, folders.len());
    let ctx = CaseContext::new(&root, opts);

    let outcomes = crawl_folders(&folders, &ctx, num_workers, on_folder_done)?;
    if opts.cancel.is_cancelled() {
        anyhow::bail!("crawl cancelled");
    }

    let mut report = CrawlReport {
        folders: folders.len(),
        ..Default::default()
    };
    let mut parts = Vec::with_capacity(outcomes.len());
    for (folder, outcome) in outcomes {
        match outcome {
            Ok(case) => {
                report.skipped.extend(case.skipped);
                parts.push((folder, case.index));
            }
            Err(error) => report.failed.push(FolderFailure { folder, error }),
        }
    }
    report.index = merge_indices(parts, opts.merge_policy)?;
    info!(
        "Indexed {} patients / {} series from {} case folders ({} failed, {} files skipped)",
        report.index.len(),
        report.index.series_count(),
        report.folders,
        report.failed.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Crawl and write `.imgtools/imgtools_<dataset>.{json,csv}` next to `root`, like the CLI does
/// with `--partial`: outputs cover whatever folders succeeded.
pub fn crawl_and_save(root: &Path, opts: &CrawlOpts) -> Result<(CrawlReport, OutputPaths)> {
    let report = crawl(root, opts)?;
    let root = canonicalize_root(root)?;
    let paths = write_outputs(&root, &report.index)?;
    Ok((report, paths))
}
