//! Application configuration constants.
//! Names, defaults and probe constants in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    output_dir_name: String,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                output_dir_name: format!(".{pkg}"),
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Directory created next to the dataset root to hold the outputs (`.imgtools`).
    pub fn output_dir_name(&self) -> &str {
        &self.output_dir_name
    }

    /// Optional per-dataset config read from the dataset root (`.imgtools.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// `imgtools_<dataset>.json`
    pub fn json_filename(&self, dataset: &str) -> String {
        format!("{}_{dataset}.json", self.pkg_name)
    }

    /// `imgtools_<dataset>.csv`
    pub fn csv_filename(&self, dataset: &str) -> String {
        format!("{}_{dataset}.csv", self.pkg_name)
    }
}

// ---- Worker threads ----

/// Worker pool size when the CLI is given no `--n_jobs` and the config file sets none.
pub const DEFAULT_CLI_JOBS: usize = 16;

// ---- DICOM probe ----

/// Bytes of preamble before the magic in a DICOM Part 10 file.
pub const DICOM_PREAMBLE_LEN: usize = 128;

/// Magic following the preamble.
pub const DICOM_MAGIC: &[u8; 4] = b"DICM";

// ---- Output ----

/// Indentation of the JSON tree.
pub const JSON_INDENT: &[u8] = b"    ";

/// Column order of the flat table.
pub const CSV_COLUMNS: [&str; 13] = [
    "patient_ID",
    "study",
    "study_description",
    "series",
    "series_description",
    "modality",
    "instances",
    "instance_uid",
    "reference_ct",
    "reference_rs",
    "reference_pl",
    "reference_frame",
    "folder",
];
