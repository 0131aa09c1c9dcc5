//! Crawl pipeline: walk, extract, resolve references, build per-folder indices in parallel.

pub mod case_index;
pub mod context;
pub mod error_handler;
pub mod metadata;
pub mod orchestrator;
pub mod references;
pub mod walk;

pub use case_index::{CaseIndex, CaseIndexBuilder, build_case_index};
pub use context::{CancelToken, CaseContext, WalkSettings};
pub use error_handler::{report_failed_folders, report_skipped_files};
pub use metadata::{extract_instance, instance_from_object, read_dicom};
pub use orchestrator::{
    FolderOutcome, OnFolderDone, crawl_folders, list_case_folders, worker_count,
};
pub use references::{TagPath, resolve_references};
pub use walk::{WalkOutcome, is_dicom_file, walk_case_folder};
