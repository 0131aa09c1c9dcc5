use clap::Parser;
use std::path::PathBuf;

use crate::MergePolicy;

/// Parallel DICOM dataset crawler.
#[derive(Clone, Parser)]
#[command(name = "imgtools")]
#[command(about = "Dataset DICOM crawler: index case folders into a patient/study/series JSON tree and CSV table.")]
pub struct Cli {
    /// Top-level directory of the dataset (one subdirectory per case).
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Number of parallel workers. Default: 16, or `n_jobs` from .imgtools.toml.
    #[arg(long = "n_jobs", value_name = "N")]
    pub n_jobs: Option<usize>,

    /// What to do when two case folders contain the same patient ID. Default: deep-merge.
    #[arg(long, value_enum)]
    pub merge_policy: Option<MergePolicy>,

    /// Exclude patterns (glob syntax) matched against file and directory names. Can specify multiple: -e pattern1 pattern2
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Strict mode: an unreadable subdirectory fails its whole case folder instead of being skipped.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Write outputs even if some case folders failed (the process still exits non-zero).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub partial: Option<bool>,

    /// Verbose output: debug logging, progress bar and every skipped file.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
