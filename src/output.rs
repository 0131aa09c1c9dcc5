//! Output projections of a [`GlobalIndex`]: the JSON tree and the flat CSV table, and writing both
//! next to the dataset.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::types::GlobalIndex;
use crate::utils::config::{CSV_COLUMNS, JSON_INDENT, PackagePaths};

/// One row of the flat table: one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    #[serde(rename = "patient_ID")]
    pub patient_id: String,
    pub study: String,
    pub study_description: String,
    pub series: String,
    pub series_description: String,
    pub modality: String,
    /// Number of instances, not the list.
    pub instances: usize,
    pub instance_uid: String,
    pub reference_ct: String,
    pub reference_rs: String,
    pub reference_pl: String,
    pub reference_frame: String,
    pub folder: String,
}

/// Flat projection, one row per series in index order.
pub fn flat_rows(index: &GlobalIndex) -> Vec<FlatRow> {
    index
        .iter_series()
        .map(|v| FlatRow {
            patient_id: v.patient_id.to_string(),
            study: v.study_uid.to_string(),
            study_description: v.study.description.clone(),
            series: v.series_uid.to_string(),
            series_description: v.series.description.clone(),
            modality: v.series.modality.clone(),
            instances: v.series.instance_count(),
            instance_uid: v.series.instance_uid.clone(),
            reference_ct: v.series.reference_ct.clone(),
            reference_rs: v.series.reference_rs.clone(),
            reference_pl: v.series.reference_pl.clone(),
            reference_frame: v.series.reference_frame.clone(),
            folder: v.series.folder.clone(),
        })
        .collect()
}

/// Write the hierarchical projection as 4-space indented JSON.
pub fn write_json<W: Write>(index: &GlobalIndex, writer: W) -> Result<()> {
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(JSON_INDENT));
    index.serialize(&mut ser).context("serialize index JSON")?;
    Ok(())
}

pub fn to_json_string(index: &GlobalIndex) -> Result<String> {
    let mut buf = Vec::new();
    write_json(index, &mut buf)?;
    String::from_utf8(buf).context("index JSON is not UTF-8")
}

/// Write the flat projection: header row, then one row per series. The header is written even
/// for an empty index.
pub fn write_csv<W: Write>(index: &GlobalIndex, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CSV_COLUMNS).context("write CSV header")?;
    for row in flat_rows(index) {
        wtr.serialize(&row).context("write CSV row")?;
    }
    wtr.flush().context("flush CSV")?;
    Ok(())
}

/// Where the outputs of a crawl of `root` go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl OutputPaths {
    /// `<parent of root>/.imgtools/imgtools_<root name>.{json,csv}`.
    pub fn for_dataset(root: &Path) -> Result<Self> {
        let dataset = root
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("dataset root has no usable name: {}", root.display()))?;
        let parent = root.parent().unwrap_or(Path::new("."));
        let paths = PackagePaths::get();
        let dir = parent.join(paths.output_dir_name());
        Ok(Self {
            json: dir.join(paths.json_filename(dataset)),
            csv: dir.join(paths.csv_filename(dataset)),
            dir,
        })
    }
}

fn create_output_file(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write both projections for the dataset at `root`. Failure here is fatal for the run.
pub fn write_outputs(root: &Path, index: &GlobalIndex) -> Result<OutputPaths> {
    let out = OutputPaths::for_dataset(root)?;
    std::fs::create_dir_all(&out.dir)
        .with_context(|| format!("create output directory {}", out.dir.display()))?;

    let mut json = create_output_file(&out.json)?;
    write_json(index, &mut json)?;
    json.flush()
        .with_context(|| format!("write {}", out.json.display()))?;

    let csv = create_output_file(&out.csv)?;
    write_csv(index, csv).with_context(|| format!("write {}", out.csv.display()))?;

    log::info!(
        "Wrote {} and {}",
        out.json.display(),
        out.csv.display()
    );
    Ok(out)
}
