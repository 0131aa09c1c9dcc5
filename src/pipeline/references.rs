//! Cross-series reference resolution.
//!
//! RT objects name the series they were derived from, but each kind keeps that link somewhere
//! different. Every lookup is a [`TagPath`]: a chain of sequences (first item of each) ending in a
//! text element. The file's role is guessed from which chain resolves:
//!
//! 1. Structure-set chain (`ReferencedFrameOfReferenceSequence` → `RTReferencedStudySequence` →
//!    `RTReferencedSeriesSequence` → `SeriesInstanceUID`). If it resolves, that is the reference CT
//!    and nothing else is looked up.
//! 2. Otherwise the structure set, image and plan references are tried independently.
//!
//! The frame of reference is resolved on its own with a separate fallback chain.

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use log::trace;

use crate::types::References;

/// Sequence chain ending in a text element.
#[derive(Clone, Copy, Debug)]
pub struct TagPath {
    /// Label used when logging a resolved lookup.
    pub name: &'static str,
    /// Sequences to descend through, taking the first item of each.
    pub sequences: &'static [Tag],
    pub leaf: Tag,
}

impl TagPath {
    /// Value of the leaf, or None if any step is absent, empty, or not of the expected kind.
    pub fn resolve(&self, obj: &InMemDicomObject) -> Option<String> {
        let mut current = obj;
        for seq in self.sequences {
            current = current.element(*seq).ok()?.items()?.first()?;
        }
        let value = element_text(current, self.leaf)?;
        trace!("{} -> {}", self.name, value);
        Some(value)
    }
}

/// Trimmed string value of `tag` in `obj`. Present-but-empty yields `Some("")`.
pub fn element_text(obj: &InMemDicomObject, tag: Tag) -> Option<String> {
    let value = obj.element(tag).ok()?.to_str().ok()?;
    Some(value.trim_end_matches([' ', '\0']).trim_start().to_string())
}

pub const STRUCTURE_SET_SERIES: TagPath = TagPath {
    name: "rtstruct referenced series",
    sequences: &[
        tags::REFERENCED_FRAME_OF_REFERENCE_SEQUENCE,
        tags::RT_REFERENCED_STUDY_SEQUENCE,
        tags::RT_REFERENCED_SERIES_SEQUENCE,
    ],
    leaf: tags::SERIES_INSTANCE_UID,
};

pub const REFERENCED_STRUCTURE_SET: TagPath = TagPath {
    name: "referenced structure set",
    sequences: &[tags::REFERENCED_STRUCTURE_SET_SEQUENCE],
    leaf: tags::REFERENCED_SOP_INSTANCE_UID,
};

pub const REFERENCED_IMAGE: TagPath = TagPath {
    name: "referenced image",
    sequences: &[tags::REFERENCED_IMAGE_SEQUENCE],
    leaf: tags::REFERENCED_SOP_INSTANCE_UID,
};

pub const REFERENCED_PLAN: TagPath = TagPath {
    name: "referenced rt plan",
    sequences: &[tags::REFERENCED_RT_PLAN_SEQUENCE],
    leaf: tags::REFERENCED_SOP_INSTANCE_UID,
};

/// Own frame of reference first, then the one named by the referenced frame-of-reference sequence.
pub const FRAME_OF_REFERENCE: [TagPath; 2] = [
    TagPath {
        name: "frame of reference",
        sequences: &[],
        leaf: tags::FRAME_OF_REFERENCE_UID,
    },
    TagPath {
        name: "referenced frame of reference",
        sequences: &[tags::REFERENCED_FRAME_OF_REFERENCE_SEQUENCE],
        leaf: tags::FRAME_OF_REFERENCE_UID,
    },
];

/// First path in `paths` that resolves.
pub fn first_resolved(obj: &InMemDicomObject, paths: &[TagPath]) -> Option<String> {
    paths.iter().find_map(|p| p.resolve(obj))
}

/// Resolve all reference fields of one file. Unresolved UIDs stay at the sentinel; an unresolved
/// frame of reference is empty.
pub fn resolve_references(obj: &InMemDicomObject) -> References {
    let mut refs = References::default();
    if let Some(ct) = STRUCTURE_SET_SERIES.resolve(obj) {
        refs.reference_ct = ct;
    } else {
        let fallbacks = [
            (&REFERENCED_STRUCTURE_SET, &mut refs.reference_rs),
            (&REFERENCED_IMAGE, &mut refs.reference_ct),
            (&REFERENCED_PLAN, &mut refs.reference_pl),
        ];
        for (path, slot) in fallbacks {
            if let Some(uid) = path.resolve(obj) {
                *slot = uid;
            }
        }
    }
    if let Some(frame) = first_resolved(obj, &FRAME_OF_REFERENCE) {
        refs.reference_frame = frame;
    }
    refs
}
