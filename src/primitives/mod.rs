//! Core compute primitives.
//!
//! The [`Matrix`] type is the training-set container consumed by the
//! boosting ensemble and the model-selection utilities.

mod matrix;

pub use matrix::Matrix;
