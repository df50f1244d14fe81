//! Convenience re-exports for common usage.
//!
//! ```
//! use prever::prelude::*;
//! ```

pub use crate::counterfactual::{
    CombinedOutcome, CounterfactualEngine, InterventionResult, InterventionSpec, MinimalPath,
};
pub use crate::error::{PreverError, Result};
pub use crate::features::{
    FeatureEngineer, FeatureVector, StudentRecord, SubjectMarks, NUM_SLOTS, SLOT_NAMES,
};
pub use crate::graph::{
    CourseDependency, CriticalPrerequisite, CurriculumSpec, DependencySpec, GraphExport,
    KnowledgeGraph, PropagatedRisk,
};
pub use crate::predictor::{
    ModelSnapshot, PredictionResult, RiskLevel, RiskPredictor, TrainingReport,
};
pub use crate::primitives::Matrix;
pub use crate::tree::GradientBoostingClassifier;
