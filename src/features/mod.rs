//! Feature extraction from raw academic records.
//!
//! Turns a time-series [`StudentRecord`] into a fixed-length
//! [`FeatureVector`] with named slots. The layout deliberately weights
//! trend and volatility over instantaneous values: the intervention
//! engine later perturbs trend-like slots to simulate corrective action,
//! so the predictor has to respond to trajectory, not snapshots.

use crate::stats;
use serde::{Deserialize, Serialize};

/// Number of feature slots produced for every record.
pub const NUM_SLOTS: usize = 22;

/// Canonical slot names, in vector order.
///
/// The intervention catalog resolves slot names against this list at
/// construction time, so a misspelled slot is a construction failure
/// rather than a silent no-op.
pub const SLOT_NAMES: [&str; NUM_SLOTS] = [
    // Attendance (6)
    "attendance_current",
    "attendance_trend",
    "attendance_volatility",
    "attendance_decline",
    "decline_ratio",
    "min_attendance",
    // Marks (8)
    "marks_trend",
    "marks_volatility",
    "avg_performance",
    "recent_performance",
    "declining_subjects_ratio",
    "performance_range",
    "weak_subjects_ratio",
    "subject_count_marks",
    // Load (4)
    "subject_count",
    "semester_factor",
    "load_intensity",
    "avg_difficulty",
    // Historical (2)
    "previous_failures",
    "failure_rate",
    // Engagement (2)
    "engagement_score",
    "data_completeness",
];

/// Resolves a slot name to its position in the vector.
#[must_use]
pub fn slot_index(name: &str) -> Option<usize> {
    SLOT_NAMES.iter().position(|&n| n == name)
}

/// Per-subject ordered mark sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMarks {
    /// Subject name
    pub subject: String,
    /// Chronological internal marks (typically out of 20)
    pub marks: Vec<f32>,
}

impl SubjectMarks {
    /// Convenience constructor.
    #[must_use]
    pub fn new(subject: impl Into<String>, marks: Vec<f32>) -> Self {
        Self {
            subject: subject.into(),
            marks,
        }
    }
}

/// Raw time-series academic record for one student.
///
/// Supplied by an external data-access layer and read-only to the core.
/// No fixed history length is required; short histories degrade to
/// conservative default sub-vectors rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StudentRecord {
    /// Chronological attendance percentages, one per observation period
    pub attendance_history: Vec<f32>,
    /// Per-subject ordered mark sequences
    pub marks_history: Vec<SubjectMarks>,
    /// Currently enrolled subject names
    pub current_subjects: Vec<String>,
    /// Current semester index (1-based)
    pub semester: u32,
    /// Count of prior course failures
    pub previous_failures: u32,
}

/// Fixed-length feature vector with named, ordered semantic slots.
///
/// Length is a hard invariant: every record, regardless of history
/// length, produces exactly [`NUM_SLOTS`] values. Slots are scaled to be
/// roughly unit-scale but are not guaranteed to lie in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f32; NUM_SLOTS],
}

impl FeatureVector {
    /// Wraps a raw slot array.
    #[must_use]
    pub fn new(values: [f32; NUM_SLOTS]) -> Self {
        Self { values }
    }

    /// Returns the slot values as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Returns the slot values as an owned `Vec` (matrix-row form).
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }

    /// Value at a slot index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= NUM_SLOTS`.
    #[must_use]
    pub fn get(&self, idx: usize) -> f32 {
        self.values[idx]
    }

    /// Sets the value at a slot index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= NUM_SLOTS`.
    pub fn set(&mut self, idx: usize, value: f32) {
        self.values[idx] = value;
    }

    /// Value for a named slot, if the name is known.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<f32> {
        slot_index(name).map(|idx| self.values[idx])
    }
}

/// Estimated difficulty for a subject name, default 0.70 for unknown
/// names. The table is a static stand-in for institutional data.
#[must_use]
pub fn subject_difficulty(subject: &str) -> f32 {
    match subject {
        "Math" => 0.90,
        "Calculus" => 0.95,
        "Linear Algebra" => 0.85,
        "Physics" => 0.85,
        "Chemistry" => 0.80,
        "Programming" => 0.88,
        "Data Structures" => 0.90,
        "Algorithms" => 0.92,
        "Database" => 0.75,
        "Networks" => 0.78,
        _ => 0.70,
    }
}

/// Transforms raw academic data into model-ready features.
///
/// Pure: `extract` has no side effects and never fails for well-formed
/// input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Creates a new feature engineer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extracts the full feature vector for a single student.
    #[must_use]
    pub fn extract(&self, record: &StudentRecord) -> FeatureVector {
        let mut values = [0.0_f32; NUM_SLOTS];
        let mut cursor = 0;

        for v in attendance_features(&record.attendance_history) {
            values[cursor] = v;
            cursor += 1;
        }
        for v in marks_features(&record.marks_history) {
            values[cursor] = v;
            cursor += 1;
        }
        for v in load_features(&record.current_subjects, record.semester) {
            values[cursor] = v;
            cursor += 1;
        }
        values[cursor] = record.previous_failures as f32;
        values[cursor + 1] = record.previous_failures as f32 / record.semester.max(1) as f32;
        cursor += 2;
        for v in engagement_features(&record.attendance_history, &record.marks_history) {
            values[cursor] = v;
            cursor += 1;
        }
        debug_assert_eq!(cursor, NUM_SLOTS);

        FeatureVector { values }
    }
}

/// Temporal attendance patterns. All zeros when fewer than 2 points exist.
fn attendance_features(attendance: &[f32]) -> [f32; 6] {
    if attendance.len() < 2 {
        return [0.0; 6];
    }

    let current = attendance[attendance.len() - 1] / 100.0;
    let trend = stats::linreg_slope(attendance) / 10.0;
    let volatility = stats::std_dev(attendance) / 100.0;

    let (early_mean, recent_mean) = if attendance.len() >= 3 {
        (
            stats::mean(&attendance[..3]),
            stats::mean(&attendance[attendance.len() - 3..]),
        )
    } else {
        (attendance[0], attendance[attendance.len() - 1])
    };
    let decline = (early_mean - recent_mean) / 100.0;

    let declines = attendance.windows(2).filter(|w| w[1] < w[0]).count();
    let decline_ratio = declines as f32 / attendance.len() as f32;

    let min_attendance = attendance
        .iter()
        .copied()
        .fold(f32::INFINITY, f32::min)
        / 100.0;

    [current, trend, volatility, decline, decline_ratio, min_attendance]
}

/// Performance-trajectory aggregates across subjects with >= 2 scores.
/// All zeros when no subject qualifies.
fn marks_features(marks_history: &[SubjectMarks]) -> [f32; 8] {
    let mut trends = Vec::new();
    let mut volatilities = Vec::new();
    let mut means = Vec::new();
    let mut recents = Vec::new();

    for subject in marks_history {
        if subject.marks.len() < 2 {
            continue;
        }
        trends.push(stats::linreg_slope(&subject.marks));
        volatilities.push(stats::std_dev(&subject.marks));
        means.push(stats::mean(&subject.marks));
        recents.push(stats::mean(&subject.marks[subject.marks.len() - 2..]));
    }

    if trends.is_empty() {
        return [0.0; 8];
    }

    let avg_trend = stats::mean(&trends) / 10.0;
    let avg_volatility = stats::mean(&volatilities) / 20.0;
    let avg_performance = stats::mean(&means) / 20.0;
    let recent_performance = stats::mean(&recents) / 20.0;

    let n_subjects = marks_history.len().max(1) as f32;
    let declining_ratio = trends.iter().filter(|&&t| t < -0.5).count() as f32 / n_subjects;

    let max_mean = means.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min_mean = means.iter().copied().fold(f32::INFINITY, f32::min);
    let performance_range = (max_mean - min_mean) / 20.0;

    let median_perf = stats::median(&means);
    let weak_ratio = means.iter().filter(|&&m| m < median_perf).count() as f32 / n_subjects;

    [
        avg_trend,
        avg_volatility,
        avg_performance,
        recent_performance,
        declining_ratio,
        performance_range,
        weak_ratio,
        marks_history.len() as f32,
    ]
}

/// Academic load and estimated difficulty.
fn load_features(subjects: &[String], semester: u32) -> [f32; 4] {
    let subject_count = subjects.len() as f32;
    let semester_factor = semester as f32 / 8.0;
    let load_intensity = subject_count / 6.0;

    let avg_difficulty = if subjects.is_empty() {
        0.70
    } else {
        let difficulties: Vec<f32> = subjects.iter().map(|s| subject_difficulty(s)).collect();
        stats::mean(&difficulties)
    };

    [subject_count, semester_factor, load_intensity, avg_difficulty]
}

/// Cross-signal engagement proxy and data-completeness proxy.
fn engagement_features(attendance: &[f32], marks_history: &[SubjectMarks]) -> [f32; 2] {
    let engagement_score = if attendance.len() >= 3 && !marks_history.is_empty() {
        let recent_attendance = stats::mean(&attendance[attendance.len() - 3..]);
        let latest_marks: Vec<f32> = marks_history
            .iter()
            .filter_map(|s| s.marks.last().copied())
            .collect();
        let recent_marks = if latest_marks.is_empty() {
            0.0
        } else {
            stats::mean(&latest_marks)
        };
        (recent_attendance / 100.0) * (recent_marks / 20.0)
    } else {
        0.5
    };

    let data_completeness = (attendance.len() as f32 / 10.0).min(1.0);

    [engagement_score, data_completeness]
}
