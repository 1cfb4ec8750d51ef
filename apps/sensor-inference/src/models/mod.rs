//! Capability interface over fitted models.
//!
//! The engine never sees how a model was trained; it only needs `predict`
//! for the per-sensor regressors, `transform` for the scaler and a decision
//! score for the anomaly detector. Artifact-backed implementations live in
//! the submodules.

pub mod artifacts;
pub mod forecast;
pub mod isolation_forest;
pub mod scaler;
mod tree;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error("non-finite input at position {0}")]
    NonFiniteInput(usize),
    #[error("model produced a non-finite value")]
    NonFiniteOutput,
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

pub trait ForecastModel: Send + Sync {
    fn n_features(&self) -> usize;

    /// Next value given an oldest-first lag vector.
    fn predict(&self, lags: &[f64]) -> Result<f64, ModelError>;
}

pub trait Scaler: Send + Sync {
    fn n_features(&self) -> usize;

    fn transform(&self, reading: &[f64]) -> Result<Vec<f64>, ModelError>;
}

pub trait AnomalyModel: Send + Sync {
    fn n_features(&self) -> usize;

    /// Signed distance to the fitted boundary; negative means anomalous.
    fn decision(&self, standardized: &[f64]) -> Result<f64, ModelError>;
}

/// Verdict for a decision score produced by [`AnomalyModel::decision`].
pub fn is_anomalous(decision: f64) -> bool {
    decision < 0.0
}

impl ModelError {
    pub(crate) fn in_tree(self, idx: usize) -> Self {
        match self {
            ModelError::Invalid(msg) => ModelError::Invalid(format!("tree {idx}: {msg}")),
            other => other,
        }
    }
}

pub(crate) fn check_input(input: &[f64], expected: usize) -> Result<(), ModelError> {
    if input.len() != expected {
        return Err(ModelError::FeatureCount {
            expected,
            actual: input.len(),
        });
    }
    if let Some(pos) = input.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteInput(pos));
    }
    Ok(())
}

pub(crate) fn check_output(value: f64) -> Result<f64, ModelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::NonFiniteOutput)
    }
}
