//! Fan case folders out over a worker pool and collect one outcome per folder.
//!
//! Each folder is one task on a rayon pool; tasks report `(slot, outcome)` over a channel. The
//! channel closes once every task has dropped its sender, which is the join barrier: outcomes are
//! returned only after all dispatched folders finished or failed.

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use log::debug;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use crate::error::FolderError;
use crate::utils::fd_limit::cap_workers_by_fd_limit;

use super::case_index::{CaseIndex, build_case_index};
use super::context::CaseContext;

/// Result of crawling one case folder.
pub type FolderOutcome = (PathBuf, Result<CaseIndex, FolderError>);

/// Called with 1 each time a folder finishes (progress reporting).
pub type OnFolderDone = Box<dyn Fn(usize) + Send>;

/// Immediate child directories of `root`, sorted by name. Plain files are ignored.
pub fn list_case_folders(root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", root.display()))?;
        let path = entry.path();
        if path.is_dir() {
            folders.push(path);
        }
    }
    folders.sort();
    Ok(folders)
}

/// Worker count: requested (or all rayon threads), capped by the FD limit and the number of folders.
pub fn worker_count(requested: Option<usize>, folders: usize) -> usize {
    let requested = requested.unwrap_or_else(rayon::current_num_threads);
    cap_workers_by_fd_limit(requested).min(folders.max(1))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One unit of work. Never panics outward: a panic becomes [`FolderError::Panicked`].
fn crawl_one(folder: &Path, ctx: &CaseContext) -> Result<CaseIndex, FolderError> {
    if ctx.cancel.is_cancelled() {
        return Err(FolderError::Cancelled);
    }
    catch_unwind(AssertUnwindSafe(|| build_case_index(folder, ctx)))
        .unwrap_or_else(|payload| Err(FolderError::Panicked(panic_message(payload))))
}

/// Crawl `folders` on a pool of `num_workers` threads. Outcomes come back in `folders` order,
/// whatever order the workers finished in.
pub fn crawl_folders(
    folders: &[PathBuf],
    ctx: &CaseContext,
    num_workers: usize,
    on_done: Option<OnFolderDone>,
) -> Result<Vec<FolderOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .thread_name(|i| format!("{}-crawl-{i}", env!("CARGO_PKG_NAME")))
        .build()
        .context("build crawl worker pool")?;
    debug!(
        "Crawling {} case folders with {} workers",
        folders.len(),
        num_workers
    );

    let (tx, rx) = unbounded::<(usize, Result<CaseIndex, FolderError>)>();
    for (slot, folder) in folders.iter().enumerate() {
        let tx = tx.clone();
        let folder = folder.clone();
        let ctx = ctx.clone();
        pool.spawn(move || {
            let outcome = crawl_one(&folder, &ctx);
            let _ = tx.send((slot, outcome));
        });
    }
    // Dropping the last sender lets the receive loop end once every task has reported.
    drop(tx);

    let mut slots: Vec<Option<Result<CaseIndex, FolderError>>> =
        folders.iter().map(|_| None).collect();
    for (slot, outcome) in rx.iter() {
        slots[slot] = Some(outcome);
        if let Some(f) = on_done.as_ref() {
            f(1);
        }
    }

    Ok(folders
        .iter()
        .cloned()
        .zip(slots)
        .map(|(folder, outcome)| {
            let outcome = outcome.unwrap_or_else(|| {
                Err(FolderError::Panicked(
                    "worker exited without reporting".to_string(),
                ))
            });
            (folder, outcome)
        })
        .collect())
}
