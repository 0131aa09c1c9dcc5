//! Synthetic DICOM builders shared by the integration tests.
#![allow(dead_code)]

use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{DataElement, Length, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use std::path::{Path, PathBuf};

/// Put a string element.
pub fn put_text(obj: &mut InMemDicomObject, tag: Tag, vr: VR, value: &str) {
    obj.put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
}

/// Put a sequence element holding `items`.
pub fn put_seq(obj: &mut InMemDicomObject, tag: Tag, items: Vec<InMemDicomObject>) {
    obj.put(DataElement::new(
        tag,
        VR::SQ,
        Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
    ));
}

/// Item carrying one `ReferencedSOPInstanceUID`.
pub fn sop_ref(uid: &str) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_text(&mut item, tags::REFERENCED_SOP_INSTANCE_UID, VR::UI, uid);
    item
}

/// Data set with the identifying fields of one instance.
pub fn instance(
    patient: &str,
    study: &str,
    series: &str,
    sop: &str,
    modality: &str,
) -> InMemDicomObject {
    let mut obj = InMemDicomObject::new_empty();
    put_text(&mut obj, tags::PATIENT_ID, VR::LO, patient);
    put_text(&mut obj, tags::STUDY_INSTANCE_UID, VR::UI, study);
    put_text(&mut obj, tags::SERIES_INSTANCE_UID, VR::UI, series);
    put_text(&mut obj, tags::SOP_INSTANCE_UID, VR::UI, sop);
    put_text(&mut obj, tags::MODALITY, VR::CS, modality);
    obj
}

/// Add the structure-set chain ReferencedFrameOfReference → RTReferencedStudy → RTReferencedSeries
/// pointing at `series`, with `frame` as the referenced frame of reference.
pub fn add_rtstruct_chain(obj: &mut InMemDicomObject, frame: &str, series: &str) {
    let mut series_item = InMemDicomObject::new_empty();
    put_text(&mut series_item, tags::SERIES_INSTANCE_UID, VR::UI, series);
    let mut study_item = InMemDicomObject::new_empty();
    put_seq(&mut study_item, tags::RT_REFERENCED_SERIES_SEQUENCE, vec![series_item]);
    let mut frame_item = InMemDicomObject::new_empty();
    put_text(&mut frame_item, tags::FRAME_OF_REFERENCE_UID, VR::UI, frame);
    put_seq(&mut frame_item, tags::RT_REFERENCED_STUDY_SEQUENCE, vec![study_item]);
    put_seq(obj, tags::REFERENCED_FRAME_OF_REFERENCE_SEQUENCE, vec![frame_item]);
}

/// Write `obj` as a Part 10 file (preamble, DICM, meta group) at `path`, creating parent dirs.
pub fn write_dicom(path: &Path, obj: InMemDicomObject) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.1"),
        )
        .unwrap();
    file.write_to_file(path).unwrap();
    path.to_path_buf()
}

/// File that passes the header probe but is not parseable.
pub fn write_corrupt_dicom(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend_from_slice(&[0xFF; 16]);
    std::fs::write(path, bytes).unwrap();
}
