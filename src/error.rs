//! Error taxonomy: per-file skips, per-folder failures, merge conflicts.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single file was left out of the index. Recorded, never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("cannot read: {0}")]
    Unreadable(String),

    #[error("no DICOM header")]
    NotDicom,

    #[error("hidden OS file")]
    Hidden,

    #[error("malformed DICOM: {0}")]
    Parse(String),

    #[error("missing mandatory field {0}")]
    MissingField(&'static str),
}

/// Failure of one case folder as a whole. Its partial index is discarded.
#[derive(Error, Debug)]
pub enum FolderError {
    #[error("walk error at {path:?}: {msg}")]
    Walk { msg: String, path: Option<PathBuf> },

    #[error("crawl cancelled")]
    Cancelled,

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Raised by [`MergePolicy::Reject`](crate::MergePolicy::Reject).
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("patient {patient_id} found in both {} and {}", .first.display(), .second.display())]
    PatientCollision {
        patient_id: String,
        first: PathBuf,
        second: PathBuf,
    },
}
