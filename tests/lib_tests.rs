mod common;

use common::{add_rtstruct_chain, instance, put_seq, put_text, sop_ref};
use dicom_core::VR;
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use imgtools::engine::{
    glob_match, is_os_hidden_file, path_relative_to, path_to_slash_string, series_folder,
    should_include_in_walk,
};
use imgtools::output::{flat_rows, to_json_string, write_csv};
use imgtools::pipeline::{instance_from_object, resolve_references};
use imgtools::utils::imgtools_toml::parse_imgtools_toml;
use imgtools::utils::{CSV_COLUMNS, apply_file_to_opts};
use imgtools::{
    CancelToken, GlobalIndex, GlobalIndexMerger, InstanceRecord, MergeError, MergePolicy, Opts,
    REFERENCE_SENTINEL, References, SkipReason, merge_indices,
};
use std::path::PathBuf;

fn record(patient: &str, study: &str, series: &str, sop: &str) -> InstanceRecord {
    InstanceRecord {
        patient_id: patient.to_string(),
        study_uid: study.to_string(),
        series_uid: series.to_string(),
        sop_uid: sop.to_string(),
        modality: "CT".to_string(),
        study_description: format!("{study} desc"),
        series_description: format!("{series} desc"),
        references: References::default(),
        folder: format!("data/{patient}"),
    }
}

fn index_of(records: &[InstanceRecord]) -> GlobalIndex {
    let mut index = GlobalIndex::new();
    for r in records {
        index.insert_instance(r.clone());
    }
    index
}

// --- path helpers ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/data/set");
    let path = PathBuf::from("/data/set/case1/ct");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("case1/ct"))
    );
}

#[test]
fn test_path_relative_not_under_base() {
    let base = PathBuf::from("/data/set");
    assert_eq!(path_relative_to(&PathBuf::from("/other"), &base), None);
}

#[test]
fn test_path_to_slash_string_joins_components() {
    assert_eq!(
        path_to_slash_string(&PathBuf::from("set").join("case1").join("ct")),
        "set/case1/ct"
    );
}

#[test]
fn test_series_folder_prefixes_dataset_name() {
    let root = PathBuf::from("/mnt/radcure");
    assert_eq!(
        series_folder(&root, &root.join("HN-001").join("CT")),
        "radcure/HN-001/CT"
    );
    assert_eq!(series_folder(&root, &root.join("HN-001")), "radcure/HN-001");
}

// --- glob_match / should_include_in_walk ---

#[test]
fn test_glob_match_literal_and_wildcards() {
    assert!(glob_match("DICOMDIR", "DICOMDIR"));
    assert!(!glob_match("DICOMDIR", "DICOMDIR2"));
    assert!(glob_match("*.txt", "notes.txt"));
    assert!(!glob_match("*.txt", "notes.txt.bak"));
    assert!(glob_match("IM?", "IM1"));
    assert!(!glob_match("IM?", "IM"));
    assert!(glob_match("!scratch*", "scratch_dir"));
}

#[test]
fn test_hidden_names() {
    assert!(is_os_hidden_file(&PathBuf::from("/d/c/.DS_Store")));
    assert!(is_os_hidden_file(&PathBuf::from("/d/c/._IM0001.dcm")));
    assert!(!is_os_hidden_file(&PathBuf::from("/d/c/IM0001.dcm")));
}

#[test]
fn test_should_include_prunes_hidden_dirs_only() {
    let trash = PathBuf::from("/d/c/.Trash-1000");
    assert!(!should_include_in_walk(&trash, true, &[]));
    assert!(should_include_in_walk(&PathBuf::from("/d/c/._IM0001.dcm"), false, &[]));
    assert!(should_include_in_walk(&PathBuf::from("/d/c/IM0001.dcm"), false, &[]));
}

#[test]
fn test_should_include_exclude_patterns() {
    let exclude = vec!["*.nii.gz".to_string(), "derived".to_string()];
    assert!(!should_include_in_walk(&PathBuf::from("/d/c/img.nii.gz"), false, &exclude));
    assert!(!should_include_in_walk(&PathBuf::from("/d/c/derived"), true, &exclude));
    assert!(should_include_in_walk(&PathBuf::from("/d/c/IM0001"), false, &exclude));
}

// --- reference resolution ---

#[test]
fn test_structure_set_chain_wins_and_stops() {
    let mut obj = instance("P1", "T1", "S2", "RS1", "RTSTRUCT");
    add_rtstruct_chain(&mut obj, "F1", "S1");
    // Present but ignored: the structure-set chain resolved first.
    put_seq(&mut obj, tags::REFERENCED_RT_PLAN_SEQUENCE, vec![sop_ref("PL1")]);
    put_seq(&mut obj, tags::REFERENCED_IMAGE_SEQUENCE, vec![sop_ref("IMG1")]);

    let refs = resolve_references(&obj);
    assert_eq!(refs.reference_ct, "S1");
    assert_eq!(refs.reference_rs, REFERENCE_SENTINEL);
    assert_eq!(refs.reference_pl, REFERENCE_SENTINEL);
    assert_eq!(refs.reference_frame, "F1");
}

#[test]
fn test_broken_chain_falls_back_to_independent_lookups() {
    let mut obj = instance("P1", "T1", "D1", "DOSE1", "RTDOSE");
    // Chain stops at the study level: no RTReferencedSeriesSequence.
    let mut frame_item = InMemDicomObject::new_empty();
    put_seq(
        &mut frame_item,
        tags::RT_REFERENCED_STUDY_SEQUENCE,
        vec![InMemDicomObject::new_empty()],
    );
    put_seq(&mut obj, tags::REFERENCED_FRAME_OF_REFERENCE_SEQUENCE, vec![frame_item]);
    put_seq(&mut obj, tags::REFERENCED_IMAGE_SEQUENCE, vec![sop_ref("IMG1")]);
    put_seq(&mut obj, tags::REFERENCED_RT_PLAN_SEQUENCE, vec![sop_ref("PL1")]);

    let refs = resolve_references(&obj);
    assert_eq!(refs.reference_ct, "IMG1");
    assert_eq!(refs.reference_pl, "PL1");
    assert_eq!(refs.reference_rs, REFERENCE_SENTINEL);
}

#[test]
fn test_dose_references_structure_set_and_plan() {
    let mut obj = instance("P1", "T1", "D1", "DOSE1", "RTDOSE");
    put_seq(&mut obj, tags::REFERENCED_STRUCTURE_SET_SEQUENCE, vec![sop_ref("RS1")]);
    put_seq(&mut obj, tags::REFERENCED_RT_PLAN_SEQUENCE, vec![sop_ref("PL1")]);

    let refs = resolve_references(&obj);
    assert_eq!(refs.reference_rs, "RS1");
    assert_eq!(refs.reference_pl, "PL1");
    assert_eq!(refs.reference_ct, REFERENCE_SENTINEL);
}

#[test]
fn test_empty_sequence_is_not_a_reference() {
    let mut obj = instance("P1", "T1", "D1", "DOSE1", "RTDOSE");
    put_seq(&mut obj, tags::REFERENCED_IMAGE_SEQUENCE, vec![]);
    assert_eq!(resolve_references(&obj).reference_ct, REFERENCE_SENTINEL);
}

#[test]
fn test_frame_of_reference_own_then_nested_then_empty() {
    let mut own = instance("P1", "T1", "S1", "I1", "CT");
    put_text(&mut own, tags::FRAME_OF_REFERENCE_UID, VR::UI, "F-OWN");
    add_rtstruct_chain(&mut own, "F-NESTED", "S0");
    assert_eq!(resolve_references(&own).reference_frame, "F-OWN");

    let mut nested = instance("P1", "T1", "S2", "I2", "RTSTRUCT");
    add_rtstruct_chain(&mut nested, "F-NESTED", "S1");
    assert_eq!(resolve_references(&nested).reference_frame, "F-NESTED");

    let bare = instance("P1", "T1", "S3", "I3", "CT");
    let refs = resolve_references(&bare);
    assert_eq!(refs.reference_frame, "");
    assert_eq!(refs.reference_ct, REFERENCE_SENTINEL);
}

// --- metadata extraction ---

#[test]
fn test_instance_from_object_reads_fields_and_defaults() {
    let mut obj = instance("P1", "T1", "S1", "I1", "CT");
    put_text(&mut obj, tags::SERIES_DESCRIPTION, VR::LO, "AXIAL ");
    let rec = instance_from_object(&obj, "set/case/ct".to_string()).unwrap();
    assert_eq!(rec.patient_id, "P1");
    assert_eq!(rec.sop_uid, "I1");
    assert_eq!(rec.modality, "CT");
    assert_eq!(rec.series_description, "AXIAL");
    assert_eq!(rec.study_description, "");
    assert_eq!(rec.folder, "set/case/ct");
}

#[test]
fn test_instance_from_object_missing_mandatory_field() {
    let mut obj = InMemDicomObject::new_empty();
    put_text(&mut obj, tags::PATIENT_ID, VR::LO, "P1");
    put_text(&mut obj, tags::STUDY_INSTANCE_UID, VR::UI, "T1");
    put_text(&mut obj, tags::SERIES_INSTANCE_UID, VR::UI, "S1");
    assert_eq!(
        instance_from_object(&obj, String::new()),
        Err(SkipReason::MissingField("SOPInstanceUID"))
    );
}

#[test]
fn test_instance_from_object_missing_modality_defaults_empty() {
    let mut obj = InMemDicomObject::new_empty();
    put_text(&mut obj, tags::PATIENT_ID, VR::LO, "P1");
    put_text(&mut obj, tags::STUDY_INSTANCE_UID, VR::UI, "T1");
    put_text(&mut obj, tags::SERIES_INSTANCE_UID, VR::UI, "S1");
    put_text(&mut obj, tags::SOP_INSTANCE_UID, VR::UI, "I1");
    let rec = instance_from_object(&obj, String::new()).unwrap();
    assert_eq!(rec.modality, "");
}

// --- index building ---

#[test]
fn test_series_instance_count_independent_of_order() {
    let records: Vec<_> = (0..5)
        .map(|i| record("P1", "T1", "S1", &format!("I{i}")))
        .collect();
    let forward = index_of(&records);
    let reversed: Vec<_> = records.iter().rev().cloned().collect();
    let backward = index_of(&reversed);

    for index in [&forward, &backward] {
        let series = &index.patient("P1").unwrap()["T1"].series["S1"];
        assert_eq!(series.instance_count(), 5);
    }
}

#[test]
fn test_series_snapshot_fixed_by_first_instance() {
    let first = record("P1", "T1", "S1", "I1");
    let mut later = record("P1", "T1", "S1", "I2");
    later.modality = "MR".to_string();
    later.references.reference_ct = "OTHER".to_string();
    later.folder = "elsewhere".to_string();

    let index = index_of(&[first, later]);
    let series = &index.patient("P1").unwrap()["T1"].series["S1"];
    assert_eq!(series.instance_uid, "I1");
    assert_eq!(series.modality, "CT");
    assert_eq!(series.reference_ct, REFERENCE_SENTINEL);
    assert_eq!(series.folder, "data/P1");
    assert_eq!(series.instances, vec!["I1", "I2"]);
}

#[test]
fn test_duplicate_instances_are_kept() {
    let r = record("P1", "T1", "S1", "I1");
    let index = index_of(&[r.clone(), r]);
    assert_eq!(index.series_count(), 1);
    assert_eq!(
        index.patient("P1").unwrap()["T1"].series["S1"].instance_count(),
        2
    );
}

// --- merge ---

fn parts(a: GlobalIndex, b: GlobalIndex) -> Vec<(PathBuf, GlobalIndex)> {
    vec![(PathBuf::from("case_a"), a), (PathBuf::from("case_b"), b)]
}

#[test]
fn test_merge_disjoint_patients_is_union() {
    let a = index_of(&[record("P1", "T1", "S1", "I1"), record("P1", "T2", "S2", "I2")]);
    let b = index_of(&[record("P2", "T3", "S3", "I3")]);
    for policy in [
        MergePolicy::Reject,
        MergePolicy::KeepFirst,
        MergePolicy::KeepLast,
        MergePolicy::DeepMerge,
    ] {
        let merged = merge_indices(parts(a.clone(), b.clone()), policy).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.patient("P1").unwrap().len(), 2);
        assert_eq!(merged.patient("P2").unwrap().len(), 1);
        assert_eq!(merged.series_count(), 3);
    }
}

#[test]
fn test_merge_default_policy_is_deep_merge() {
    assert_eq!(MergePolicy::default(), MergePolicy::DeepMerge);
}

#[test]
fn test_merge_keep_last_replaces_patient() {
    let a = index_of(&[record("P1", "T1", "S1", "I1")]);
    let b = index_of(&[record("P1", "T2", "S2", "I2")]);
    let merged = merge_indices(parts(a, b), MergePolicy::KeepLast).unwrap();
    let studies = merged.patient("P1").unwrap();
    assert_eq!(studies.keys().collect::<Vec<_>>(), vec!["T2"]);
}

#[test]
fn test_merge_keep_last_credits_latest_folder() {
    let mut merger = GlobalIndexMerger::new(MergePolicy::KeepLast);
    for (folder, uid) in [("case_a", "I1"), ("case_b", "I2"), ("case_c", "I3")] {
        let partial = index_of(&[record("P1", "T1", "S1", uid)]);
        merger.merge_case(&PathBuf::from(folder), partial).unwrap();
    }
    assert_eq!(merger.origin_of("P1"), Some(PathBuf::from("case_c").as_path()));
    assert_eq!(merger.origin_of("P2"), None);
    let merged = merger.finish();
    assert_eq!(merged.patient("P1").unwrap()["T1"].series["S1"].instances, vec!["I3"]);
}

#[test]
fn test_merge_keep_first_credits_first_folder() {
    let mut merger = GlobalIndexMerger::new(MergePolicy::KeepFirst);
    for (folder, uid) in [("case_a", "I1"), ("case_b", "I2")] {
        let partial = index_of(&[record("P1", "T1", "S1", uid)]);
        merger.merge_case(&PathBuf::from(folder), partial).unwrap();
    }
    assert_eq!(merger.origin_of("P1"), Some(PathBuf::from("case_a").as_path()));
}

#[test]
fn test_merge_keep_first_keeps_patient() {
    let a = index_of(&[record("P1", "T1", "S1", "I1")]);
    let b = index_of(&[record("P1", "T2", "S2", "I2")]);
    let merged = merge_indices(parts(a, b), MergePolicy::KeepFirst).unwrap();
    let studies = merged.patient("P1").unwrap();
    assert_eq!(studies.keys().collect::<Vec<_>>(), vec!["T1"]);
}

#[test]
fn test_merge_reject_reports_both_folders() {
    let a = index_of(&[record("P1", "T1", "S1", "I1")]);
    let b = index_of(&[record("P1", "T2", "S2", "I2")]);
    match merge_indices(parts(a, b), MergePolicy::Reject) {
        Err(MergeError::PatientCollision {
            patient_id,
            first,
            second,
        }) => {
            assert_eq!(patient_id, "P1");
            assert_eq!(first, PathBuf::from("case_a"));
            assert_eq!(second, PathBuf::from("case_b"));
        }
        other => panic!("expected collision, got {other:?}"),
    }
}

#[test]
fn test_merge_deep_merge_keeps_both_folders_data() {
    let a = index_of(&[record("P1", "T1", "S1", "I1"), record("P1", "T1", "S2", "I2")]);
    let b = index_of(&[
        record("P1", "T1", "S1", "I3"),
        record("P1", "T1", "S4", "I4"),
        record("P1", "T2", "S5", "I5"),
    ]);
    let merged = merge_indices(parts(a, b), MergePolicy::DeepMerge).unwrap();
    let studies = merged.patient("P1").unwrap();
    assert_eq!(studies.keys().collect::<Vec<_>>(), vec!["T1", "T2"]);
    let t1 = &studies["T1"];
    assert_eq!(t1.series.keys().collect::<Vec<_>>(), vec!["S1", "S2", "S4"]);
    assert_eq!(t1.series["S1"].instances, vec!["I1", "I3"]);
    assert_eq!(t1.series["S1"].instance_uid, "I1");
    assert_eq!(merged.series_count(), 4);
}

// --- output projections ---

#[test]
fn test_flat_rows_one_per_series_in_insertion_order() {
    let index = index_of(&[
        record("P2", "T9", "S9", "I1"),
        record("P1", "T1", "S1", "I2"),
        record("P1", "T1", "S1", "I3"),
        record("P1", "T1", "S2", "I4"),
    ]);
    let rows = flat_rows(&index);
    assert_eq!(rows.len(), index.series_count());
    let keys: Vec<_> = rows
        .iter()
        .map(|r| (r.patient_id.as_str(), r.series.as_str(), r.instances))
        .collect();
    assert_eq!(keys, vec![("P2", "S9", 1), ("P1", "S1", 2), ("P1", "S2", 1)]);
    assert_eq!(rows[1].instance_uid, "I2");
    assert_eq!(rows[1].study_description, "T1 desc");
}

#[test]
fn test_csv_header_and_sentinels() {
    let index = index_of(&[record("P1", "T1", "S1", "I1")]);
    let mut buf = Vec::new();
    write_csv(&index, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
    assert_eq!(
        lines.next().unwrap(),
        "P1,T1,T1 desc,S1,S1 desc,CT,1,I1, , , ,,data/P1"
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn test_csv_empty_index_has_header_only() {
    let mut buf = Vec::new();
    write_csv(&GlobalIndex::new(), &mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
}

#[test]
fn test_json_tree_layout() {
    let index = index_of(&[record("P1", "T1", "S1", "I1"), record("P1", "T1", "S1", "I2")]);
    let json = to_json_string(&index).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let study = &value["P1"]["T1"];
    assert_eq!(study["description"], "T1 desc");
    let series = &study["S1"];
    assert_eq!(series["instances"], serde_json::json!(["I1", "I2"]));
    assert_eq!(series["instance_uid"], "I1");
    assert_eq!(series["description"], "S1 desc");
    assert_eq!(series["reference_ct"], " ");
    assert_eq!(series["reference_frame"], "");
    assert_eq!(series["folder"], "data/P1");
    // 4-space indentation
    assert!(json.contains("\n    \"P1\""));
    // "description" comes before the series keys
    assert!(json.find("\"description\"").unwrap() < json.find("\"S1\"").unwrap());
}

// --- config file ---

#[test]
fn test_toml_applies_only_present_fields() {
    let file = parse_imgtools_toml(
        r#"
        [crawl]
        n_jobs = 4
        merge_policy = "keep_last"
        exclude = ["*.txt"]
        "#,
    )
    .unwrap();
    let mut opts = Opts {
        n_jobs: 16,
        strict: true,
        ..Default::default()
    };
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.n_jobs, 4);
    assert_eq!(opts.merge_policy, MergePolicy::KeepLast);
    assert_eq!(opts.exclude, vec!["*.txt".to_string()]);
    assert!(opts.strict);
}

#[test]
fn test_toml_rejects_unknown_policy() {
    assert!(parse_imgtools_toml("[crawl]\nmerge_policy = \"overwrite\"\n").is_err());
}

#[test]
fn test_cancel_token_shared_between_clones() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
}
