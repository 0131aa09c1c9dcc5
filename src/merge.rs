//! Merge per-folder indices into one [`GlobalIndex`] under an explicit [`MergePolicy`].

use indexmap::map::Entry;
use log::warn;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::MergeError;
use crate::types::{GlobalIndex, MergePolicy, PatientIndex};

/// Sequential merger. Feed partial indices in a stable order; "first"/"last" refer to that order.
pub struct GlobalIndexMerger {
    policy: MergePolicy,
    index: GlobalIndex,
    /// Folder whose data currently stands for each patient, for collision reports.
    origin: HashMap<String, PathBuf>,
}

impl GlobalIndexMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            index: GlobalIndex::new(),
            origin: HashMap::new(),
        }
    }

    /// Fold every patient of `partial` (produced by `folder`) into the merged index.
    pub fn merge_case(&mut self, folder: &Path, partial: GlobalIndex) -> Result<(), MergeError> {
        for (patient_id, studies) in partial.patients {
            match self.index.patients.entry(patient_id) {
                Entry::Vacant(slot) => {
                    self.origin.insert(slot.key().clone(), folder.to_path_buf());
                    slot.insert(studies);
                }
                Entry::Occupied(mut slot) => {
                    let first = self
                        .origin
                        .get(slot.key())
                        .cloned()
                        .unwrap_or_default();
                    if self.policy == MergePolicy::Reject {
                        return Err(MergeError::PatientCollision {
                            patient_id: slot.key().clone(),
                            first,
                            second: folder.to_path_buf(),
                        });
                    }
                    warn!(
                        "patient {} found in both {} and {} ({:?})",
                        slot.key(),
                        first.display(),
                        folder.display(),
                        self.policy
                    );
                    match self.policy {
                        MergePolicy::KeepFirst | MergePolicy::Reject => {}
                        MergePolicy::KeepLast => {
                            self.origin.insert(slot.key().clone(), folder.to_path_buf());
                            *slot.get_mut() = studies;
                        }
                        MergePolicy::DeepMerge => deep_merge_patient(slot.get_mut(), studies),
                    }
                }
            }
        }
        Ok(())
    }

    /// Folder credited with `patient_id` so far: the first contributor, or the latest one under
    /// [`MergePolicy::KeepLast`].
    pub fn origin_of(&self, patient_id: &str) -> Option<&Path> {
        self.origin.get(patient_id).map(PathBuf::as_path)
    }

    pub fn finish(self) -> GlobalIndex {
        self.index
    }
}

/// Union of studies; a shared study gets the union of series; a shared series keeps its existing
/// snapshot and gains the other side's instances.
pub fn deep_merge_patient(into: &mut PatientIndex, from: PatientIndex) {
    for (study_uid, study) in from {
        match into.entry(study_uid) {
            Entry::Vacant(slot) => {
                slot.insert(study);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                for (series_uid, series) in study.series {
                    match existing.series.entry(series_uid) {
                        Entry::Vacant(s) => {
                            s.insert(series);
                        }
                        Entry::Occupied(mut s) => s.get_mut().instances.extend(series.instances),
                    }
                }
            }
        }
    }
}

/// Merge `(folder, partial index)` pairs in iteration order.
pub fn merge_indices<I>(parts: I, policy: MergePolicy) -> Result<GlobalIndex, MergeError>
where
    I: IntoIterator<Item = (PathBuf, GlobalIndex)>,
{
    let mut merger = GlobalIndexMerger::new(policy);
    for (folder, partial) in parts {
        merger.merge_case(&folder, partial)?;
    }
    Ok(merger.finish())
}
