//! Public types for the crawl API: per-file records, the patient/study/series index, options and report.

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::path::PathBuf;

use crate::error::{FolderError, SkipReason};
use crate::pipeline::context::CancelToken;

/// Default for reference UIDs that could not be resolved. A single space, so it stays
/// distinguishable from an empty value in the CSV.
pub const REFERENCE_SENTINEL: &str = " ";

/// Cross-series references resolved from one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct References {
    pub reference_ct: String,
    pub reference_rs: String,
    pub reference_pl: String,
    /// Empty string (not the sentinel) when no frame of reference is found.
    pub reference_frame: String,
}

impl Default for References {
    fn default() -> Self {
        Self {
            reference_ct: REFERENCE_SENTINEL.to_string(),
            reference_rs: REFERENCE_SENTINEL.to_string(),
            reference_pl: REFERENCE_SENTINEL.to_string(),
            reference_frame: String::new(),
        }
    }
}

/// One physical file. Built by the metadata extractor and consumed when folded into a [`SeriesRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceRecord {
    pub patient_id: String,
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub modality: String,
    pub study_description: String,
    pub series_description: String,
    pub references: References,
    /// Series directory as `<dataset>/<case>/<sub/dirs>`, `/`-separated.
    pub folder: String,
}

/// All instances sharing one series UID. Everything except `instances` is a snapshot of the
/// first instance that created the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeriesRecord {
    /// SOP UIDs in encounter order. Duplicates are kept.
    pub instances: Vec<String>,
    /// SOP UID of the instance that created this record.
    pub instance_uid: String,
    pub modality: String,
    pub description: String,
    pub reference_ct: String,
    pub reference_rs: String,
    pub reference_pl: String,
    pub reference_frame: String,
    pub folder: String,
}

impl SeriesRecord {
    /// Snapshot `first` without recording its SOP UID in `instances`; the caller appends it.
    pub fn from_first_instance(first: &InstanceRecord) -> Self {
        let refs = &first.references;
        Self {
            instances: Vec::new(),
            instance_uid: first.sop_uid.clone(),
            modality: first.modality.clone(),
            description: first.series_description.clone(),
            reference_ct: refs.reference_ct.clone(),
            reference_rs: refs.reference_rs.clone(),
            reference_pl: refs.reference_pl.clone(),
            reference_frame: refs.reference_frame.clone(),
            folder: first.folder.clone(),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// One study: its description and series keyed by series UID, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StudyRecord {
    pub description: String,
    pub series: IndexMap<String, SeriesRecord>,
}

impl StudyRecord {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            series: IndexMap::new(),
        }
    }

    pub fn series(&self, series_uid: &str) -> Option<&SeriesRecord> {
        self.series.get(series_uid)
    }
}

/// Serialized as `{"description": ..., "<series uid>": {...}, ...}` so the JSON tree keeps the
/// layout downstream loaders already read.
impl Serialize for StudyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len() + 1))?;
        map.serialize_entry("description", &self.description)?;
        for (uid, series) in &self.series {
            map.serialize_entry(uid, series)?;
        }
        map.end()
    }
}

/// Studies of one patient keyed by study UID, in insertion order.
pub type PatientIndex = IndexMap<String, StudyRecord>;

/// Patient ID → [`PatientIndex`]. Used both for one case folder's partial index and the merged result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GlobalIndex {
    pub patients: IndexMap<String, PatientIndex>,
}

/// One series as seen by [`GlobalIndex::iter_series`].
pub struct SeriesView<'a> {
    pub patient_id: &'a str,
    pub study_uid: &'a str,
    pub study: &'a StudyRecord,
    pub series_uid: &'a str,
    pub series: &'a SeriesRecord,
}

impl GlobalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one instance into the index, creating the patient/study/series chain on first sight.
    /// Only the SOP UID of later instances of an existing series is recorded.
    pub fn insert_instance(&mut self, instance: InstanceRecord) {
        let study = self
            .patients
            .entry(instance.patient_id.clone())
            .or_default()
            .entry(instance.study_uid.clone())
            .or_insert_with(|| StudyRecord::new(instance.study_description.clone()));
        let series = study
            .series
            .entry(instance.series_uid.clone())
            .or_insert_with(|| SeriesRecord::from_first_instance(&instance));
        series.instances.push(instance.sop_uid);
    }

    pub fn patient(&self, patient_id: &str) -> Option<&PatientIndex> {
        self.patients.get(patient_id)
    }

    /// Number of distinct patients.
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn series_count(&self) -> usize {
        self.patients
            .values()
            .flat_map(|studies| studies.values())
            .map(|study| study.series.len())
            .sum()
    }

    /// Every series in insertion order (patient, then study, then series).
    pub fn iter_series(&self) -> impl Iterator<Item = SeriesView<'_>> {
        self.patients.iter().flat_map(|(patient_id, studies)| {
            studies.iter().flat_map(move |(study_uid, study)| {
                study
                    .series
                    .iter()
                    .map(move |(series_uid, series)| SeriesView {
                        patient_id,
                        study_uid,
                        study,
                        series_uid,
                        series,
                    })
            })
        })
    }
}

/// How the merger resolves two case folders producing the same patient ID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Fail the run on the first collision.
    Reject,
    /// Keep the earlier folder's patient, drop the later one.
    KeepFirst,
    /// Replace with the later folder's patient (the historical crawler behaviour).
    KeepLast,
    /// Union studies; inside a shared study union series; inside a shared series append instances.
    #[default]
    DeepMerge,
}

/// A file that did not make it into the index, and why.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A case folder whose crawl failed as a whole.
#[derive(Debug)]
pub struct FolderFailure {
    pub folder: PathBuf,
    pub error: FolderError,
}

/// Result of [`crawl`](crate::crawl): merged index over the folders that succeeded, plus what was
/// skipped or failed along the way.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub index: GlobalIndex,
    /// Number of case folders dispatched.
    pub folders: usize,
    pub failed: Vec<FolderFailure>,
    pub skipped: Vec<SkippedFile>,
}

impl CrawlReport {
    /// True when every case folder contributed to the index.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lib options for [`crawl`](crate::crawl).
#[derive(Clone, Debug, Default)]
pub struct CrawlOpts {
    /// Worker pool size. When None, uses all rayon threads. Capped by the FD limit either way.
    pub n_jobs: Option<usize>,
    pub merge_policy: MergePolicy,
    /// Follow symbolic links while walking case folders.
    pub follow_links: bool,
    /// Strict mode: an unreadable subdirectory fails its case folder instead of being skipped.
    pub strict: bool,
    /// Exclude patterns (glob syntax) matched against file and directory names.
    pub exclude: Vec<String>,
    /// Trip to stop the crawl at the next file / folder boundary.
    pub cancel: CancelToken,
}

/// Full options (CLI). Lib callers use [`CrawlOpts`].
#[derive(Clone, Debug, Default)]
pub struct Opts {
    pub n_jobs: usize,
    pub merge_policy: MergePolicy,
    pub follow_links: bool,
    pub strict: bool,
    pub exclude: Vec<String>,
    /// Debug logging, per-file skip listing and a progress bar.
    pub verbose: bool,
    /// Write outputs even when some case folders failed.
    pub partial: bool,
}

impl Opts {
    pub fn crawl_opts(&self, cancel: CancelToken) -> CrawlOpts {
        CrawlOpts {
            n_jobs: Some(self.n_jobs),
            merge_policy: self.merge_policy,
            follow_links: self.follow_links,
            strict: self.strict,
            exclude: self.exclude.clone(),
            cancel,
        }
    }
}
