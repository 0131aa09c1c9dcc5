//! Case-folder walk: recursive enumeration of candidate DICOM files, filtered by a header probe.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::engine::tools::{is_os_hidden_file, should_include_in_walk};
use crate::utils::config::{DICOM_MAGIC, DICOM_PREAMBLE_LEN};

use super::context::WalkSettings;

/// One result from walking a case folder.
#[derive(Debug)]
pub enum WalkOutcome {
    /// File carrying a DICOM header.
    Candidate(PathBuf),
    /// Regular file without the `DICM` magic.
    NotDicom(PathBuf),
    /// File named like OS metadata (`.DS_Store`, `._*`, ...). Never probed.
    Hidden(PathBuf),
    /// File whose header could not be read.
    Unreadable { path: PathBuf, msg: String },
    /// Directory (or entry) the walk could not enter.
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`WalkOutcome`]. Directories yield None.
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> Option<WalkOutcome> {
    match r {
        Ok(entry) if entry.file_type().is_dir() => None,
        Ok(entry) if is_os_hidden_file(entry.path()) => {
            Some(WalkOutcome::Hidden(entry.into_path()))
        }
        Ok(entry) => Some(probe_outcome(entry.into_path())),
        Err(err) => Some(WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        }),
    }
}

fn probe_outcome(path: PathBuf) -> WalkOutcome {
    match is_dicom_file(&path) {
        Ok(true) => WalkOutcome::Candidate(path),
        Ok(false) => WalkOutcome::NotDicom(path),
        Err(err) => WalkOutcome::Unreadable {
            path,
            msg: err.to_string(),
        },
    }
}

/// True if `path` starts with a 128-byte preamble followed by `DICM`. Short files are not DICOM.
pub fn is_dicom_file(path: &Path) -> std::io::Result<bool> {
    let mut header = [0u8; DICOM_PREAMBLE_LEN + 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut header) {
        Ok(()) => Ok(&header[DICOM_PREAMBLE_LEN..] == DICOM_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lazily walk `case_root` (sorted by name, depth-first) and probe every file.
/// Excluded names and hidden OS directories are pruned; hidden files come back as
/// [`WalkOutcome::Hidden`].
pub fn walk_case_folder<'a>(
    case_root: &Path,
    settings: &'a WalkSettings,
) -> impl Iterator<Item = WalkOutcome> + 'a {
    WalkDir::new(case_root)
        .follow_links(settings.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            e.depth() == 0
                || should_include_in_walk(e.path(), e.file_type().is_dir(), &settings.exclude)
        })
        .filter_map(to_outcome_walkdir)
}
