//! imgtools CLI: crawl a DICOM dataset into `.imgtools/imgtools_<dataset>.{json,csv}`.

use anyhow::Result;
use clap::Parser;
use imgtools::engine::arg_parser::Cli;
use imgtools::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
