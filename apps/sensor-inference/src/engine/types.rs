use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::registry::SensorId;

/// Per-sensor forecasts in registry order. Partial: only sensors with enough
/// history and a loaded model appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecasts(Vec<(SensorId, f64)>);

impl Forecasts {
    pub(crate) fn push(&mut self, sensor: SensorId, value: f64) {
        self.0.push((sensor, value));
    }

    pub fn get(&self, sensor: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(id, _)| id.as_str() == sensor)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SensorId, f64)> {
        self.0.iter().map(|(id, value)| (id, *value))
    }
}

impl Serialize for Forecasts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (sensor, value) in &self.0 {
            map.serialize_entry(sensor, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedSensor {
    #[serde(rename = "variavel")]
    pub sensor: SensorId,
    #[serde(rename = "valor")]
    pub value: f64,
}

/// Classifier output over one standardized reading.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,
    pub decision: f64,
    pub standardized: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    #[serde(rename = "previsoes")]
    pub forecasts: Forecasts,
    #[serde(rename = "anomalia")]
    pub anomaly: bool,
    #[serde(rename = "variaveis_anomalas")]
    pub flagged: Vec<FlaggedSensor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDeviation {
    #[serde(rename = "variavel")]
    pub sensor: SensorId,
    #[serde(rename = "real")]
    pub actual: f64,
    #[serde(rename = "previsto")]
    pub predicted: f64,
    #[serde(rename = "erro")]
    pub error: f64,
    #[serde(rename = "alto_desvio")]
    pub high_deviation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    #[serde(rename = "anomalia")]
    pub anomaly: bool,
    #[serde(rename = "variaveis_anomalas")]
    pub flagged: Vec<FlaggedSensor>,
    #[serde(rename = "sensores")]
    pub deviations: Vec<SensorDeviation>,
    #[serde(rename = "insuficientes")]
    pub insufficient: Vec<SensorId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub n_lags: usize,
    pub sensors: Vec<SensorId>,
    pub forecast_models: Vec<SensorId>,
    pub missing_forecast_models: Vec<SensorId>,
    pub scaler_loaded: bool,
    pub anomaly_model_loaded: bool,
    pub anomaly_path_available: bool,
}
