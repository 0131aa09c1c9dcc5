//! Per-file metadata extraction. Fail-open: anything wrong with a file becomes a [`SkipReason`].

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::{DefaultDicomObject, InMemDicomObject, OpenFileOptions};
use std::path::Path;

use crate::error::SkipReason;
use crate::types::InstanceRecord;

use super::references::{element_text, resolve_references};

/// Parse the file's meta group and data set up to (not including) Pixel Data.
pub fn read_dicom(path: &Path) -> Result<DefaultDicomObject, SkipReason> {
    OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
        .map_err(|e| SkipReason::Parse(e.to_string()))
}

/// A file missing any of PatientID, StudyInstanceUID, SeriesInstanceUID or SOPInstanceUID is skipped.
fn mandatory(obj: &InMemDicomObject, name: &'static str, tag: Tag) -> Result<String, SkipReason> {
    element_text(obj, tag).ok_or(SkipReason::MissingField(name))
}

/// Build an [`InstanceRecord`] from an already parsed data set. `folder` is recorded verbatim.
pub fn instance_from_object(
    obj: &InMemDicomObject,
    folder: String,
) -> Result<InstanceRecord, SkipReason> {
    Ok(InstanceRecord {
        patient_id: mandatory(obj, "PatientID", tags::PATIENT_ID)?,
        study_uid: mandatory(obj, "StudyInstanceUID", tags::STUDY_INSTANCE_UID)?,
        series_uid: mandatory(obj, "SeriesInstanceUID", tags::SERIES_INSTANCE_UID)?,
        sop_uid: mandatory(obj, "SOPInstanceUID", tags::SOP_INSTANCE_UID)?,
        modality: element_text(obj, tags::MODALITY).unwrap_or_default(),
        study_description: element_text(obj, tags::STUDY_DESCRIPTION).unwrap_or_default(),
        series_description: element_text(obj, tags::SERIES_DESCRIPTION).unwrap_or_default(),
        references: resolve_references(obj),
        folder,
    })
}

/// Read one candidate file into an [`InstanceRecord`].
pub fn extract_instance(path: &Path, folder: String) -> Result<InstanceRecord, SkipReason> {
    let obj = read_dicom(path)?;
    instance_from_object(&obj, folder)
}
