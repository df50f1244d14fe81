//! Counterfactual intervention search.
//!
//! Given a student's current feature vector and a trained predictor,
//! [`CounterfactualEngine`] asks "what is the cheapest change that most
//! reduces failure risk?" by perturbing named feature slots and
//! re-scoring. The catalog is configuration: each intervention names
//! the slots it touches and a monotone set of candidate magnitudes, and
//! slot names are resolved against the feature schema when the engine
//! is built, so drift between catalog and vector layout is a
//! construction failure rather than a silent no-op.

use crate::error::{PreverError, Result};
use crate::features::{slot_index, FeatureEngineer, FeatureVector, StudentRecord};
use crate::predictor::RiskPredictor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One actionable intervention: the slots it perturbs, the candidate
/// magnitudes to try, and a relative effort cost.
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionSpec {
    /// Short action name, unique within a catalog
    pub name: &'static str,
    /// Human-facing description of the action
    pub description: &'static str,
    /// Feature slots the action perturbs, by canonical name
    pub slots: Vec<&'static str>,
    /// Candidate magnitudes added to every targeted slot, mildest first
    pub delta_range: Vec<f32>,
    /// Relative effort on an arbitrary ordinal scale
    pub effort_cost: u32,
}

/// Catalog entry with slot names pre-resolved to vector positions.
#[derive(Debug, Clone)]
struct ResolvedSpec {
    spec: InterventionSpec,
    indices: Vec<usize>,
}

/// Outcome of simulating one intervention at its best magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionResult {
    /// Action name from the catalog
    pub action: String,
    /// Human-facing description
    pub description: String,
    /// Failure probability before the intervention
    pub current_risk: f32,
    /// Failure probability after applying the best magnitude
    pub predicted_risk: f32,
    /// `current_risk - predicted_risk`, always positive in results
    pub risk_reduction: f32,
    /// Effort cost copied from the catalog
    pub effort_cost: u32,
    /// `risk_reduction / effort_cost`, the ranking criterion
    pub effectiveness_score: f32,
    /// Decisiveness of the post-intervention estimate
    pub confidence: f32,
}

/// Outcome of applying several interventions at moderate magnitude to
/// the same working vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedOutcome {
    /// Failure probability before any intervention
    pub original_risk: f32,
    /// Failure probability after all applied interventions
    pub combined_risk: f32,
    /// `original_risk - combined_risk` (may be negative)
    pub total_risk_reduction: f32,
    /// Sum of effort costs of the applied interventions
    pub total_effort: u32,
    /// Names actually applied; unknown names are skipped
    pub applied: Vec<String>,
}

/// Result of searching for the cheapest way under a risk target.
///
/// The search scans the ranked single-intervention results only; it
/// does not enumerate combinations. When no single intervention reaches
/// the target, the best-ranked one is reported as a partial step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MinimalPath {
    /// Current risk already at or below the target; nothing simulated.
    AlreadySafe {
        current_risk: f32,
        target_risk: f32,
    },
    /// A single intervention reaches the target.
    Solution {
        step: InterventionResult,
        final_risk: f32,
        total_effort: u32,
    },
    /// Best available single step, target still unmet.
    Partial {
        step: InterventionResult,
        final_risk: f32,
        total_effort: u32,
        note: String,
    },
    /// No intervention produced any improvement.
    NoSolution { current_risk: f32 },
}

/// Reference intervention catalog.
///
/// Slot targets preserve the behavior of the deployed model: "Boost
/// Internal Marks" perturbs the performance aggregates and "Stabilize
/// Performance" reaches the subject-count slot alongside volatility.
/// Retargeting either would change which trained splits the deltas
/// cross, so any change here must be revalidated against the model.
#[must_use]
pub fn default_catalog() -> Vec<InterventionSpec> {
    vec![
        InterventionSpec {
            name: "Improve Attendance",
            description: "Attend classes regularly and catch up on missed sessions",
            slots: vec!["attendance_current", "attendance_trend"],
            delta_range: vec![0.05, 0.10, 0.15, 0.20],
            effort_cost: 2,
        },
        InterventionSpec {
            name: "Boost Internal Marks",
            description: "Focus on upcoming internal assessments and assignments",
            slots: vec!["avg_performance", "recent_performance"],
            delta_range: vec![0.10, 0.20, 0.30, 0.40],
            effort_cost: 3,
        },
        InterventionSpec {
            name: "Stabilize Performance",
            description: "Reduce variance across subjects with a steady study routine",
            slots: vec!["marks_volatility", "subject_count_marks"],
            delta_range: vec![-0.10, -0.20, -0.30],
            effort_cost: 2,
        },
        InterventionSpec {
            name: "Increase Engagement",
            description: "Participate in class and use available academic support",
            slots: vec!["engagement_score"],
            delta_range: vec![0.10, 0.20, 0.30],
            effort_cost: 2,
        },
    ]
}

/// Intervention search over a shared trained predictor.
#[derive(Debug)]
pub struct CounterfactualEngine {
    engineer: FeatureEngineer,
    predictor: Arc<RiskPredictor>,
    catalog: Vec<ResolvedSpec>,
}

impl CounterfactualEngine {
    /// Builds an engine with the reference catalog.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the catalog names an unknown slot.
    pub fn new(predictor: Arc<RiskPredictor>) -> Result<Self> {
        Self::with_catalog(predictor, default_catalog())
    }

    /// Builds an engine with a custom catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::ValidationError`] if any intervention
    /// names a slot absent from the feature schema, has an empty slot
    /// list or delta range, or has a zero effort cost.
    pub fn with_catalog(
        predictor: Arc<RiskPredictor>,
        catalog: Vec<InterventionSpec>,
    ) -> Result<Self> {
        let mut resolved = Vec::with_capacity(catalog.len());
        for spec in catalog {
            if spec.slots.is_empty() || spec.delta_range.is_empty() {
                return Err(PreverError::ValidationError {
                    message: format!("intervention '{}' has no slots or deltas", spec.name),
                });
            }
            if spec.effort_cost == 0 {
                return Err(PreverError::ValidationError {
                    message: format!("intervention '{}' has zero effort cost", spec.name),
                });
            }
            let indices = spec
                .slots
                .iter()
                .map(|&slot| {
                    slot_index(slot).ok_or_else(|| PreverError::ValidationError {
                        message: format!(
                            "intervention '{}' targets unknown slot '{slot}'",
                            spec.name
                        ),
                    })
                })
                .collect::<Result<Vec<usize>>>()?;
            resolved.push(ResolvedSpec { spec, indices });
        }
        Ok(Self {
            engineer: FeatureEngineer::new(),
            predictor,
            catalog: resolved,
        })
    }

    /// Catalog action names in declaration order.
    #[must_use]
    pub fn action_names(&self) -> Vec<&'static str> {
        self.catalog.iter().map(|r| r.spec.name).collect()
    }

    /// Simulates every catalog intervention independently and returns
    /// the top 3 by effectiveness.
    ///
    /// For each intervention, each candidate magnitude is applied to a
    /// copy of the feature vector (touched slots clipped to [0, 1]) and
    /// re-scored; the magnitude maximizing risk reduction per unit
    /// effort wins. Interventions with no improving magnitude are
    /// omitted.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] if the predictor has no
    /// published model.
    pub fn simulate(&self, record: &StudentRecord) -> Result<Vec<InterventionResult>> {
        let features = self.engineer.extract(record);
        let current_risk = self.predictor.predict(&features)?.failure_probability;

        let mut results = Vec::new();
        for resolved in &self.catalog {
            if let Some(best) = self.best_magnitude(resolved, &features, current_risk)? {
                results.push(best);
            }
        }

        results.sort_by(|a, b| {
            b.effectiveness_score
                .partial_cmp(&a.effectiveness_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(3);
        Ok(results)
    }

    /// Applies the named interventions simultaneously at moderate
    /// magnitude and reports the single resulting probability.
    ///
    /// "Moderate" is the second entry of each delta range, or the only
    /// entry when the range has one. Unknown names are skipped. Effects
    /// on shared slots stack; combination happens in feature space, not
    /// probability space.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] if the predictor has no
    /// published model.
    pub fn simulate_combined(
        &self,
        record: &StudentRecord,
        names: &[&str],
    ) -> Result<CombinedOutcome> {
        let features = self.engineer.extract(record);
        let original_risk = self.predictor.predict(&features)?.failure_probability;

        let mut working = features;
        let mut total_effort = 0;
        let mut applied = Vec::new();

        for &name in names {
            let Some(resolved) = self.catalog.iter().find(|r| r.spec.name == name) else {
                continue;
            };
            let delta = resolved
                .spec
                .delta_range
                .get(1)
                .or_else(|| resolved.spec.delta_range.first())
                .copied()
                .unwrap_or(0.0);
            apply_delta(&mut working, &resolved.indices, delta);
            total_effort += resolved.spec.effort_cost;
            applied.push(name.to_string());
        }

        let combined_risk = self.predictor.predict(&working)?.failure_probability;
        Ok(CombinedOutcome {
            original_risk,
            combined_risk,
            total_risk_reduction: original_risk - combined_risk,
            total_effort,
            applied,
        })
    }

    /// Finds the cheapest single intervention bringing risk at or below
    /// `target_risk`.
    ///
    /// Already-safe records short-circuit without simulating anything.
    /// When no single step reaches the target, the best-ranked step is
    /// returned as partial; combinations are not searched.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] if the predictor has no
    /// published model.
    pub fn find_minimal_path(
        &self,
        record: &StudentRecord,
        target_risk: f32,
    ) -> Result<MinimalPath> {
        let features = self.engineer.extract(record);
        let current_risk = self.predictor.predict(&features)?.failure_probability;

        if current_risk <= target_risk {
            return Ok(MinimalPath::AlreadySafe {
                current_risk,
                target_risk,
            });
        }

        let ranked = self.simulate(record)?;
        if let Some(step) = ranked
            .iter()
            .find(|result| result.predicted_risk <= target_risk)
        {
            return Ok(MinimalPath::Solution {
                final_risk: step.predicted_risk,
                total_effort: step.effort_cost,
                step: step.clone(),
            });
        }

        match ranked.into_iter().next() {
            Some(step) => Ok(MinimalPath::Partial {
                final_risk: step.predicted_risk,
                total_effort: step.effort_cost,
                note: "target not reachable with a single intervention; \
                       further interventions may be required"
                    .to_string(),
                step,
            }),
            None => Ok(MinimalPath::NoSolution { current_risk }),
        }
    }

    /// Best candidate magnitude for one intervention, or `None` when
    /// nothing improves on the current risk.
    fn best_magnitude(
        &self,
        resolved: &ResolvedSpec,
        features: &FeatureVector,
        current_risk: f32,
    ) -> Result<Option<InterventionResult>> {
        let mut best: Option<InterventionResult> = None;

        for &delta in &resolved.spec.delta_range {
            let mut perturbed = features.clone();
            apply_delta(&mut perturbed, &resolved.indices, delta);

            let outcome = self.predictor.predict(&perturbed)?;
            let risk_reduction = current_risk - outcome.failure_probability;
            if risk_reduction <= 0.0 {
                continue;
            }

            let effectiveness_score = risk_reduction / resolved.spec.effort_cost as f32;
            let better = best
                .as_ref()
                .map_or(true, |b| effectiveness_score > b.effectiveness_score);
            if better {
                best = Some(InterventionResult {
                    action: resolved.spec.name.to_string(),
                    description: resolved.spec.description.to_string(),
                    current_risk,
                    predicted_risk: outcome.failure_probability,
                    risk_reduction,
                    effort_cost: resolved.spec.effort_cost,
                    effectiveness_score,
                    confidence: outcome.confidence,
                });
            }
        }

        Ok(best)
    }
}

/// Adds `delta` to every targeted slot, clipping each to [0, 1].
fn apply_delta(features: &mut FeatureVector, indices: &[usize], delta: f32) {
    for &idx in indices {
        let value = (features.get(idx) + delta).clamp(0.0, 1.0);
        features.set(idx, value);
    }
}
