//! # Prever
//!
//! Academic failure-risk prediction: feature engineering, a calibrated
//! gradient-boosting classifier, counterfactual intervention search,
//! and a prerequisite knowledge graph with forward risk propagation.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`features::FeatureEngineer`] turns a raw [`features::StudentRecord`]
//!    (attendance history, per-subject marks, course load, prior
//!    failures) into a fixed 22-slot [`features::FeatureVector`].
//! 2. [`predictor::RiskPredictor`] scores the vector with a
//!    sigmoid-calibrated gradient-boosting ensemble and reports a
//!    probability, confidence, and discretized risk level.
//! 3. [`counterfactual::CounterfactualEngine`] searches a catalog of
//!    actionable interventions for the cheapest perturbation that most
//!    reduces the predicted risk.
//! 4. [`graph::KnowledgeGraph`] propagates the risk forward through
//!    prerequisite edges to warn about downstream courses.
//!
//! Inference is deterministic: the same record always yields a
//! bit-identical prediction, and training is reproducible under a fixed
//! seed.
//!
//! ## Quick start
//!
//! ```
//! use prever::prelude::*;
//!
//! let record = StudentRecord {
//!     attendance_history: vec![85.0, 82.0, 80.0, 78.0, 75.0, 72.0],
//!     marks_history: vec![SubjectMarks::new("Math", vec![14.0, 12.0, 10.0])],
//!     current_subjects: vec!["Math".to_string(), "Physics".to_string()],
//!     semester: 3,
//!     previous_failures: 1,
//! };
//!
//! let features = FeatureEngineer::new().extract(&record);
//! assert_eq!(features.as_slice().len(), NUM_SLOTS);
//!
//! let graph = KnowledgeGraph::with_default_curriculum();
//! let downstream = graph.propagate("Calculus I", 0.9);
//! assert!(downstream.contains_key("Calculus II"));
//! ```

pub mod calibration;
pub mod counterfactual;
pub mod error;
pub mod features;
pub mod graph;
pub mod model_selection;
pub mod predictor;
pub mod prelude;
pub mod primitives;
pub mod stats;
pub mod tree;

pub use error::{PreverError, Result};
