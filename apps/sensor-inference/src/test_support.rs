use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use crate::engine::{EngineSettings, InferenceEngine};
use crate::models::artifacts::{ArtifactPaths, ModelSnapshot};
use crate::models::forecast::{ForecastBank, LinearRegressor};
use crate::models::scaler::StandardScaler;
use crate::models::{AnomalyModel, ModelError, Scaler};
use crate::registry::SensorRegistry;
use crate::state::AppState;

/// Anomaly model with a fixed decision value.
pub struct FixedDecision {
    pub n_features: usize,
    pub decision: f64,
}

impl AnomalyModel for FixedDecision {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn decision(&self, standardized: &[f64]) -> Result<f64, ModelError> {
        crate::models::check_input(standardized, self.n_features)?;
        Ok(self.decision)
    }
}

pub struct BrokenScaler;

impl Scaler for BrokenScaler {
    fn n_features(&self) -> usize {
        0
    }

    fn transform(&self, _reading: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::NonFiniteOutput)
    }
}

/// Predicts `last lag + step`.
pub fn step_model(n_lags: usize, step: f64) -> LinearRegressor {
    let mut coefficients = vec![0.0; n_lags];
    coefficients[n_lags - 1] = 1.0;
    LinearRegressor::new(coefficients, step)
}

pub fn identity_scaler(n: usize) -> StandardScaler {
    StandardScaler::new(vec![0.0; n], vec![1.0; n])
}

pub fn settings(n_lags: usize) -> EngineSettings {
    EngineSettings {
        n_lags,
        ..EngineSettings::default()
    }
}

/// Engine over `names` with step models for `forecast_for`, an identity
/// scaler and a fixed-decision anomaly model.
pub fn engine(names: &[&str], n_lags: usize, forecast_for: &[&str], decision: f64) -> InferenceEngine {
    let registry = SensorRegistry::new(names.iter().copied()).expect("registry");
    let mut forecasts = ForecastBank::new();
    for name in forecast_for {
        let sensor = registry.canonicalize(name).expect("registered sensor");
        forecasts.insert(sensor, Box::new(step_model(n_lags, 1.0)));
    }
    let snapshot = ModelSnapshot {
        forecasts,
        scaler: Some(Box::new(identity_scaler(registry.len()))),
        anomaly: Some(Box::new(FixedDecision {
            n_features: registry.len(),
            decision,
        })),
    };
    InferenceEngine::new(registry, settings(n_lags), snapshot)
}

pub fn app_state(engine: InferenceEngine) -> AppState {
    AppState {
        engine: Arc::new(engine),
    }
}

pub fn linear_forecast_json(n_lags: usize) -> Value {
    let mut coefficients = vec![0.0; n_lags];
    coefficients[n_lags - 1] = 1.0;
    json!({ "kind": "linear", "coefficients": coefficients, "intercept": 1.0 })
}

/// Single stump on feature 0 at 0.0: non-positive values land in a
/// one-sample leaf (score -0.5), positive values in a two-sample leaf
/// (score -0.25).
pub fn isolation_forest_json(n_features: usize, offset: f64) -> Value {
    json!({
        "n_features": n_features,
        "max_samples": 2,
        "offset": offset,
        "contamination": 0.1,
        "trees": [{
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [0.0, -2.0, -2.0],
            "n_node_samples": [3, 1, 2]
        }]
    })
}

pub fn write_artifacts(
    dir: &Path,
    registry: &SensorRegistry,
    n_lags: usize,
    forecast_for: &[&str],
) -> ArtifactPaths {
    let paths = ArtifactPaths {
        model_dir: dir.join("modelos_predicao"),
        scaler: dir.join("scaler.json"),
        anomaly_model: dir.join("isolation_forest.json"),
    };
    std::fs::create_dir_all(&paths.model_dir).expect("model dir");
    for name in forecast_for {
        let sensor = registry.canonicalize(name).expect("registered sensor");
        std::fs::write(
            paths.forecast_model(&sensor),
            linear_forecast_json(n_lags).to_string(),
        )
        .expect("write forecast model");
    }
    let names: Vec<&str> = registry.sensors().iter().map(|s| s.as_str()).collect();
    let scaler = json!({
        "mean": vec![0.0; registry.len()],
        "scale": vec![1.0; registry.len()],
        "feature_names": names,
    });
    std::fs::write(&paths.scaler, scaler.to_string()).expect("write scaler");
    std::fs::write(
        &paths.anomaly_model,
        isolation_forest_json(registry.len(), -0.4).to_string(),
    )
    .expect("write anomaly model");
    paths
}
