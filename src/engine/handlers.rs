//! CLI command handler: crawl, report, write outputs.

use anyhow::{Context, Result};
use kdam::Animation;
use log::{debug, warn};

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{
    ProgressBarConfig, create_progress_bar, finish_progress_bar, progress_callback,
};
use crate::engine::tools::canonicalize_root;
use crate::pipeline::{
    CancelToken, list_case_folders, report_failed_folders, report_skipped_files,
};
use crate::utils::{DEFAULT_CLI_JOBS, apply_file_to_opts, load_imgtools_toml, setup_logging};
use crate::{Opts, crawl_with_progress, write_outputs};

/// Overwrite opts field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $cli.$field.clone() {
            $opts.$field = v;
        }
    };
}

/// Build Opts: defaults, then `.imgtools.toml` from the dataset root, then explicit CLI flags.
pub fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts {
        n_jobs: DEFAULT_CLI_JOBS,
        ..Default::default()
    };
    if let Some(file) = load_imgtools_toml(&cli.directory) {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_opt!(cli, opts, n_jobs);
    apply_cli_opt!(cli, opts, merge_policy);
    apply_cli_opt!(cli, opts, follow_links);
    apply_cli_opt!(cli, opts, strict);
    apply_cli_opt!(cli, opts, partial);
    apply_cli_opt!(cli, opts, verbose);
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    opts
}

/// Crawl `cli.directory`, write `.imgtools/imgtools_<dataset>.{json,csv}` and print the patient count.
/// Any failed case folder makes this return an error (outputs are still written with --partial).
pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.verbose.unwrap_or(false));
    let opts = setup_opts(cli);

    let cancel = CancelToken::new();
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || cancel_handler.cancel()).context("set Ctrl+C handler")?;

    let root = canonicalize_root(&cli.directory)?;
    let total = list_case_folders(&root)?.len();
    let bar = opts.verbose.then(|| {
        create_progress_bar(ProgressBarConfig::new(
            total,
            "Crawling",
            Animation::Classic,
        ))
    });

    debug!("Crawling {}...", root.display());
    let report = crawl_with_progress(&root, &opts.crawl_opts(cancel), progress_callback(&bar));
    finish_progress_bar(&bar);
    let report = report?;

    report_skipped_files(&report.skipped, opts.verbose);
    let failed = report_failed_folders(&report.failed);
    if failed == 0 || opts.partial {
        write_outputs(&root, &report.index)?;
    } else {
        warn!(
            "Outputs not written because some case folders failed; \
             rerun with --partial to write them anyway"
        );
    }

    println!("# patients: {}", report.index.len());
    if failed > 0 {
        anyhow::bail!("{} of {} case folders failed", failed, report.folders);
    }
    Ok(())
}
