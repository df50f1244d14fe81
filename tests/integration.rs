//! End-to-end pipeline tests: raw records through feature extraction,
//! calibrated prediction, intervention search, and graph propagation.

use prever::prelude::*;
use std::sync::Arc;

/// Stable high-performer: flat high attendance, strong steady marks.
fn steady_student(i: usize) -> StudentRecord {
    let base = 84.0 + (i % 10) as f32;
    StudentRecord {
        attendance_history: (0..12)
            .map(|w| base + if w % 2 == 0 { 1.5 } else { -1.5 })
            .collect(),
        marks_history: vec![
            SubjectMarks::new("Math", vec![15.0, 16.0, 16.0, 17.0]),
            SubjectMarks::new("Physics", vec![16.0, 15.0, 17.0, 17.0]),
            SubjectMarks::new("Programming", vec![14.0, 15.0, 16.0, 16.0]),
        ],
        current_subjects: vec![
            "Math".to_string(),
            "Physics".to_string(),
            "Programming".to_string(),
        ],
        semester: 3,
        previous_failures: 0,
    }
}

/// Declining student: attendance sliding toward a low floor, marks
/// dropping, prior failures on record.
fn declining_student(i: usize) -> StudentRecord {
    let floor = 42.0 + (i % 12) as f32 * 2.0;
    StudentRecord {
        attendance_history: (0..12)
            .map(|w| 85.0 - (85.0 - floor) * w as f32 / 11.0)
            .collect(),
        marks_history: vec![
            SubjectMarks::new("Math", vec![13.0, 11.0, 9.0, 7.0]),
            SubjectMarks::new("Physics", vec![12.0, 10.0, 9.0, 7.0]),
            SubjectMarks::new("Programming", vec![11.0, 10.0, 8.0, 6.0]),
        ],
        current_subjects: vec![
            "Math".to_string(),
            "Physics".to_string(),
            "Programming".to_string(),
        ],
        semester: 3,
        previous_failures: 1 + (i % 2) as u32,
    }
}

fn trained_predictor() -> Arc<RiskPredictor> {
    let engineer = FeatureEngineer::new();
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..30 {
        rows.push(engineer.extract(&steady_student(i)).to_vec());
        labels.push(0_u8);
        rows.push(engineer.extract(&declining_student(i)).to_vec());
        labels.push(1_u8);
    }
    let x = Matrix::from_rows(&rows).expect("feature matrix");

    let predictor = RiskPredictor::with_base(
        GradientBoostingClassifier::new()
            .with_n_estimators(30)
            .with_random_state(42),
    );
    let report = predictor.train(&x, &labels).expect("train");
    assert!(report.train_accuracy > 0.9, "{}", report.train_accuracy);
    Arc::new(predictor)
}

#[test]
fn improving_student_assessed_low_risk() {
    let predictor = trained_predictor();
    let record = StudentRecord {
        // Strictly increasing attendance across 12 weeks.
        attendance_history: (0..12).map(|w| 78.0 + 1.5 * w as f32).collect(),
        marks_history: vec![
            SubjectMarks::new("Math", vec![16.0, 16.0, 17.0]),
            SubjectMarks::new("Physics", vec![15.0, 16.0, 16.0]),
        ],
        current_subjects: vec!["Math".to_string(), "Physics".to_string()],
        semester: 3,
        previous_failures: 0,
    };

    let features = FeatureEngineer::new().extract(&record);
    let result = predictor.predict(&features).expect("predict");
    assert_eq!(result.risk_level, RiskLevel::Low, "p = {}", result.failure_probability);
    assert_eq!(result.prediction, 0);
}

#[test]
fn declining_student_assessed_high_risk_with_recourse() {
    let predictor = trained_predictor();
    let record = StudentRecord {
        // Strictly decreasing from 85 to 45 across 12 weeks.
        attendance_history: (0..12)
            .map(|w| 85.0 - 40.0 * w as f32 / 11.0)
            .collect(),
        marks_history: vec![
            SubjectMarks::new("Math", vec![13.0, 10.0, 8.0]),
            SubjectMarks::new("Physics", vec![12.0, 10.0, 7.0]),
        ],
        current_subjects: vec!["Math".to_string(), "Physics".to_string()],
        semester: 3,
        previous_failures: 2,
    };

    let features = FeatureEngineer::new().extract(&record);
    let result = predictor.predict(&features).expect("predict");
    assert_eq!(
        result.risk_level,
        RiskLevel::High,
        "p = {}",
        result.failure_probability
    );

    let engine = CounterfactualEngine::new(Arc::clone(&predictor)).expect("catalog");
    let interventions = engine.simulate(&record).expect("simulate");
    assert!(!interventions.is_empty());
    assert!(interventions.iter().all(|i| i.risk_reduction > 0.0));
    assert!(interventions.len() <= 3);
}

#[test]
fn extract_predict_pipeline_is_bit_identical() {
    let predictor = trained_predictor();
    let engineer = FeatureEngineer::new();
    let record = declining_student(5);

    let first = predictor
        .predict(&engineer.extract(&record))
        .expect("predict");
    for _ in 0..5 {
        let again = predictor
            .predict(&engineer.extract(&record))
            .expect("predict");
        assert_eq!(
            first.failure_probability.to_bits(),
            again.failure_probability.to_bits()
        );
    }
}

#[test]
fn risk_flows_from_prediction_into_course_warnings() {
    let predictor = trained_predictor();
    let record = declining_student(3);
    let result = predictor
        .predict(&FeatureEngineer::new().extract(&record))
        .expect("predict");

    let graph = KnowledgeGraph::with_default_curriculum();
    let downstream = graph.propagate("Calculus I", result.failure_probability);

    assert!(downstream.contains_key("Calculus II"));
    assert!(!downstream.contains_key("Calculus I"));
    for risk in downstream.values() {
        assert!(*risk <= result.failure_probability * 0.8 + 1e-6);
    }
}

#[test]
fn minimal_path_end_to_end() {
    let predictor = trained_predictor();
    let engine = CounterfactualEngine::new(Arc::clone(&predictor)).expect("catalog");

    // Healthy record under a permissive target: short-circuits.
    match engine
        .find_minimal_path(&steady_student(0), 0.5)
        .expect("path")
    {
        MinimalPath::AlreadySafe { current_risk, .. } => assert!(current_risk <= 0.5),
        other => panic!("expected AlreadySafe, got {other:?}"),
    }

    // At-risk record under a strict target: must propose something.
    match engine
        .find_minimal_path(&declining_student(1), 0.3)
        .expect("path")
    {
        MinimalPath::Solution { step, .. } | MinimalPath::Partial { step, .. } => {
            assert!(step.risk_reduction > 0.0);
        }
        MinimalPath::NoSolution { current_risk } => {
            panic!("expected an intervention for risk {current_risk}")
        }
        MinimalPath::AlreadySafe { .. } => panic!("declining student cannot be safe at 0.3"),
    }
}

#[test]
fn model_roundtrip_preserves_pipeline_outputs() {
    let predictor = trained_predictor();
    let features = FeatureEngineer::new().extract(&declining_student(7));
    let before = predictor.predict(&features).expect("predict");

    let path = std::env::temp_dir().join("prever_integration_model.bin");
    predictor.save(&path).expect("save");

    let restored = RiskPredictor::new();
    restored.load(&path).expect("load");
    std::fs::remove_file(&path).ok();

    let after = restored.predict(&features).expect("predict");
    assert_eq!(
        before.failure_probability.to_bits(),
        after.failure_probability.to_bits()
    );
}
