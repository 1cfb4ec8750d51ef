//! Inference orchestration.
//!
//! One request is one pure pass over the shared, read-only [`ModelSnapshot`]:
//! canonicalize columns, forecast every sensor that can be forecast, then run
//! the anomaly path on the current reading. Per-sensor forecast problems are
//! omissions; an incomplete current reading rejects the whole request.

pub mod attribution;
pub mod types;


use std::collections::BTreeMap;

use crate::error::InferenceError;
use crate::features;
use crate::models::artifacts::ModelSnapshot;
use crate::registry::{SensorId, SensorRegistry};

pub use types::{
    AnomalyVerdict, EngineStatus, FlaggedSensor, Forecasts, InferenceResult, MonitorReport,
    SensorDeviation,
};

pub const DEFAULT_N_LAGS: usize = 5;
pub const DEFAULT_ATTRIBUTION_THRESHOLD: f64 = 3.0;
pub const DEFAULT_DEVIATION_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub n_lags: usize,
    /// Absolute standardized value above which a sensor is flagged.
    pub attribution_threshold: f64,
    /// Absolute forecast error above which the monitor reports a deviation.
    pub deviation_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            n_lags: DEFAULT_N_LAGS,
            attribution_threshold: DEFAULT_ATTRIBUTION_THRESHOLD,
            deviation_threshold: DEFAULT_DEVIATION_THRESHOLD,
        }
    }
}

/// Raw request payload: external column name to oldest-first readings.
pub type RawHistories = BTreeMap<String, Vec<f64>>;

pub struct InferenceEngine {
    registry: SensorRegistry,
    settings: EngineSettings,
    models: ModelSnapshot,
}

impl InferenceEngine {
    pub fn new(registry: SensorRegistry, settings: EngineSettings, models: ModelSnapshot) -> Self {
        Self {
            registry,
            settings,
            models,
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn infer(&self, raw: &RawHistories) -> Result<InferenceResult, InferenceError> {
        let histories = self.registry.canonicalize_histories(raw);
        let forecasts = self.forecast(&histories);
        let reading = self.current_reading(&histories)?;
        let verdict = self.classify(&reading)?;
        let flagged = attribution::attribute(
            &self.registry,
            &verdict.standardized,
            &reading,
            self.settings.attribution_threshold,
        );
        Ok(InferenceResult {
            forecasts,
            anomaly: verdict.is_anomaly,
            flagged,
        })
    }

    /// Backtests each model on the latest reading and runs the anomaly path.
    pub fn monitor(&self, raw: &RawHistories) -> Result<MonitorReport, InferenceError> {
        let histories = self.registry.canonicalize_histories(raw);
        let mut deviations = Vec::new();
        let mut insufficient = Vec::new();
        for (sensor, history) in self.registry.sensors().iter().zip(&histories) {
            match history.and_then(|h| self.backtest(sensor, h)) {
                Some(deviation) => deviations.push(deviation),
                None => insufficient.push(sensor.clone()),
            }
        }

        let reading = self.current_reading(&histories)?;
        let verdict = self.classify(&reading)?;
        let flagged = attribution::attribute(
            &self.registry,
            &verdict.standardized,
            &reading,
            self.settings.attribution_threshold,
        );
        Ok(MonitorReport {
            anomaly: verdict.is_anomaly,
            flagged,
            deviations,
            insufficient,
        })
    }

    pub fn status(&self) -> EngineStatus {
        let (loaded, missing): (Vec<SensorId>, Vec<SensorId>) = self
            .registry
            .sensors()
            .iter()
            .cloned()
            .partition(|sensor| self.models.forecasts.contains(sensor));
        EngineStatus {
            n_lags: self.settings.n_lags,
            sensors: self.registry.sensors().to_vec(),
            forecast_models: loaded,
            missing_forecast_models: missing,
            scaler_loaded: self.models.scaler.is_some(),
            anomaly_model_loaded: self.models.anomaly.is_some(),
            anomaly_path_available: self.models.anomaly_path_available(),
        }
    }

    fn forecast(&self, histories: &[Option<&[f64]>]) -> Forecasts {
        let mut forecasts = Forecasts::default();
        for (sensor, history) in self.registry.sensors().iter().zip(histories) {
            let Some(lags) = history.and_then(|h| features::lag_window(h, self.settings.n_lags))
            else {
                continue;
            };
            match self.models.forecasts.predict(sensor, lags) {
                Some(Ok(value)) => forecasts.push(sensor.clone(), value),
                Some(Err(err)) => {
                    tracing::warn!(sensor = %sensor, error = %err, "forecast failed; omitting sensor");
                }
                None => {}
            }
        }
        forecasts
    }

    fn backtest(&self, sensor: &SensorId, history: &[f64]) -> Option<SensorDeviation> {
        let (lags, actual) = features::holdout_window(history, self.settings.n_lags)?;
        let predicted = match self.models.forecasts.predict(sensor, lags)? {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(sensor = %sensor, error = %err, "backtest forecast failed");
                return None;
            }
        };
        let error = (actual - predicted).abs();
        Some(SensorDeviation {
            sensor: sensor.clone(),
            actual,
            predicted,
            error,
            high_deviation: error > self.settings.deviation_threshold,
        })
    }

    /// Latest value of every registered sensor, in registry order.
    fn current_reading(&self, histories: &[Option<&[f64]>]) -> Result<Vec<f64>, InferenceError> {
        let mut reading = Vec::with_capacity(histories.len());
        let mut missing = Vec::new();
        for (sensor, history) in self.registry.sensors().iter().zip(histories) {
            match history.and_then(|h| h.last()) {
                Some(value) => reading.push(*value),
                None => missing.push(sensor.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(InferenceError::InsufficientData { missing });
        }
        Ok(reading)
    }

    fn classify(&self, reading: &[f64]) -> Result<AnomalyVerdict, InferenceError> {
        let scaler = self
            .models
            .scaler
            .as_deref()
            .ok_or(InferenceError::AnomalyPathUnavailable("scaler"))?;
        let detector = self
            .models
            .anomaly
            .as_deref()
            .ok_or(InferenceError::AnomalyPathUnavailable("anomaly model"))?;

        let standardized = scaler
            .transform(reading)
            .map_err(|source| InferenceError::Model {
                stage: "scaler",
                source,
            })?;
        let decision = detector
            .decision(&standardized)
            .map_err(|source| InferenceError::Model {
                stage: "anomaly model",
                source,
            })?;
        let is_anomaly = crate::models::is_anomalous(decision);
        tracing::debug!(decision, is_anomaly, "anomaly verdict");
        Ok(AnomalyVerdict {
            is_anomaly,
            decision,
            standardized,
        })
    }
}
