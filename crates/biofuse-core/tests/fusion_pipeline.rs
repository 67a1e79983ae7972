//! End-to-end pipeline: calibrate a model, persist it, initialize fusers
//! from the model directory, and run fusion, verification, search and DET
//! evaluation against it.

use std::sync::Arc;

use biofuse_core::{
    compute_det, Action, Candidate, Comparator, FuserType, FusionError, FusionModel, Observation,
    ScoreFuser, Status, StatusCode, TemplateFuser,
};

fn algorithm_names() -> Vec<String> {
    vec!["alpha".to_string(), "beta".to_string()]
}

/// Impostor observations whose per-algorithm mean/stddev come out at
/// exactly (3.0, 0.2) and (50.0, 2.0).
fn calibration_observations() -> Vec<Observation> {
    vec![
        Observation {
            identity_a: 1,
            identity_b: 2,
            scores: vec![2.8, 48.0],
        },
        Observation {
            identity_a: 2,
            identity_b: 3,
            scores: vec![3.2, 52.0],
        },
        Observation {
            identity_a: 7,
            identity_b: 7, // genuine, must not shift the calibration
            scores: vec![90.0, 900.0],
        },
    ]
}

fn write_model_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let model = FusionModel::fit(&algorithm_names(), &calibration_observations()).expect("fit");
    model.save(dir.path()).expect("save");
    dir
}

#[test]
fn calibrate_save_initialize_fuse() {
    let dir = write_model_dir();
    let fuser = ScoreFuser::initialize(dir.path(), FuserType::Verification).expect("initialize");

    assert_eq!(fuser.expected_inputs(), 2);
    // (3.5 - 3.0)/0.2 + (51.0 - 50.0)/2.0 = 2.5 + 0.5 = 3.0
    let fused = fuser.fuse_verification_scores(&[3.5, 51.0]).expect("fuse");
    assert!((fused - 3.0).abs() < 1e-9);
}

#[test]
fn initialize_from_missing_directory_reports_config_error() {
    let result = ScoreFuser::initialize("/definitely/not/a/model", FuserType::Verification);
    let status = Status::from_result(&result);
    assert_eq!(status.code, StatusCode::ConfigError);
    assert!(!status.is_success());
}

#[test]
fn template_pipeline_fuse_verify_search() {
    let dir = write_model_dir();

    // Fuse enrollment templates for three identities.
    let fuse = TemplateFuser::initialize(dir.path(), Action::Fuse).expect("initialize fuse");
    let enrolled: Vec<(u32, Vec<f64>)> = vec![
        (100, fuse.fuse_templates(&[vec![0.0, 0.0], vec![0.0]]).unwrap()),
        (101, fuse.fuse_templates(&[vec![2.0, 2.0], vec![2.0]]).unwrap()),
        (102, fuse.fuse_templates(&[vec![9.0, 9.0], vec![9.0]]).unwrap()),
    ];
    for (_, template) in &enrolled {
        assert_eq!(template.len(), 3); // 2 + 1, the concatenation law
    }

    // Verify against self scores exactly 100.
    let verify = TemplateFuser::initialize(dir.path(), Action::Verify).expect("initialize verify");
    let score = verify.verify(&enrolled[0].1, &enrolled[0].1).unwrap();
    assert_eq!(score, 100.0);

    // Build a gallery and search a probe near identity 101.
    let mut identify =
        TemplateFuser::initialize(dir.path(), Action::Identify).expect("initialize identify");
    let (ids, templates): (Vec<u32>, Vec<Vec<f64>>) = enrolled.into_iter().unzip();
    identify.create_gallery(templates, ids).expect("gallery");

    let probe = vec![2.1, 2.0, 2.0];
    let candidates = identify.search(&probe, 2).expect("search");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].identity, 101);
    assert!(candidates[0].score >= candidates[1].score);
}

#[test]
fn concurrent_search_after_gallery_build() {
    let dir = write_model_dir();
    let mut identify = TemplateFuser::initialize(dir.path(), Action::Identify).unwrap();
    let templates: Vec<Vec<f64>> = (0..64)
        .map(|i| vec![i as f64, (i % 7) as f64, (i % 3) as f64])
        .collect();
    let ids: Vec<u32> = (0..64).collect();
    identify.create_gallery(templates, ids).unwrap();

    // Once the gallery exists the fuser is read-only; shared references
    // from many threads are the supported batch workload.
    let shared = Arc::new(identify);
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let fuser = Arc::clone(&shared);
            std::thread::spawn(move || {
                let probe = vec![t as f64 * 10.0, 1.0, 1.0];
                fuser.search(&probe, 5).expect("concurrent search")
            })
        })
        .collect();
    for handle in handles {
        let candidates = handle.join().expect("join");
        assert_eq!(candidates.len(), 5);
    }

    // Batch search agrees with the sequential path.
    let probes: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, 0.0, 0.0]).collect();
    let batch = shared.search_batch(&probes, 3).unwrap();
    for (probe, result) in probes.iter().zip(batch) {
        assert_eq!(result.unwrap(), shared.search(probe, 3).unwrap());
    }
}

#[test]
fn identification_fuser_joins_candidate_lists() {
    let dir = write_model_dir();
    let fuser = ScoreFuser::initialize(dir.path(), FuserType::Identification).unwrap();

    let list_a = vec![Candidate::new(1, 0.9), Candidate::new(2, 0.4)];
    let list_b = vec![Candidate::new(2, 0.5), Candidate::new(3, 0.3)];
    let fused = fuser.fuse_candidate_lists(&[list_a, list_b]).unwrap();

    // Union of {1, 2} and {2, 3}.
    assert_eq!(fused.len(), 3);
    // Identity 1: 0.9 * neutral(1.0); identity 2: 0.4 * 0.5.
    assert_eq!(fused[0].identity, 1);
    assert!((fused[0].score - 0.9).abs() < 1e-12);
    for pair in fused.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn cosine_comparator_selected_through_model_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = FusionModel::fit(&algorithm_names(), &calibration_observations()).unwrap();
    model.comparator = Comparator::Cosine;
    model.save(dir.path()).unwrap();

    let verify = TemplateFuser::initialize(dir.path(), Action::Verify).unwrap();
    // Same direction, different magnitude: cosine scores 100, L1 would not.
    let score = verify.verify(&vec![1.0, 1.0], &vec![3.0, 3.0]).unwrap();
    assert!((score - 100.0).abs() < 1e-9);
}

#[test]
fn det_over_fused_scores() {
    let dir = write_model_dir();
    let fuser = ScoreFuser::initialize(dir.path(), FuserType::Verification).unwrap();

    // Fuse a small population: genuine pairs score high, impostors low.
    let mut scores = Vec::new();
    let mut mask = Vec::new();
    for i in 0..10 {
        let raw = [3.0 + 0.02 * f64::from(i), 50.0 + 0.2 * f64::from(i)];
        scores.push(fuser.fuse_verification_scores(&raw).unwrap());
        mask.push(false);
    }
    for i in 0..5 {
        let raw = [4.0 + 0.1 * f64::from(i), 56.0 + f64::from(i)];
        scores.push(fuser.fuse_verification_scores(&raw).unwrap());
        mask.push(true);
    }

    let points = compute_det(&scores, &mask, &[0.1, 0.5]).unwrap();
    assert_eq!(points.len(), 2);
    // Separable populations: at FMR 0.1 every genuine still matches.
    assert_eq!(points[0].fmr, 0.1);
    assert_eq!(points[0].fnmr, 0.0);
    assert!(points[1].threshold <= points[0].threshold);
}

#[test]
fn recoverable_errors_leave_the_instance_usable() {
    let dir = write_model_dir();
    let fuser = ScoreFuser::initialize(dir.path(), FuserType::Verification).unwrap();

    let err = fuser.fuse_verification_scores(&[1.0]).unwrap_err();
    assert!(matches!(err, FusionError::NumData { .. }));
    assert!(err.is_recoverable());

    // Retrying with corrected input succeeds on the same instance.
    assert!(fuser.fuse_verification_scores(&[3.0, 50.0]).is_ok());
}
