//! Progress bar utilities for displaying crawl status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::pipeline::OnFolderDone;

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " folders"
    )))
}

/// Update progress bar if the lock is free; a skipped update is caught up by the next one.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Callback that advances `bar` by the number of finished folders.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<OnFolderDone> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as OnFolderDone
    })
}

/// Print a newline after the bar so following log lines start clean.
pub fn finish_progress_bar(bar: &Option<ProgressBar>) {
    if let Some(bar) = bar
        && let Ok(mut b) = bar.lock()
    {
        let _ = b.refresh();
        eprintln!();
    }
}
