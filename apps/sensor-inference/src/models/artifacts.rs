//! Startup loading of fitted artifacts into an immutable [`ModelSnapshot`].
//!
//! Missing or broken forecast artifacts only disable that sensor's forecast.
//! A missing scaler or anomaly model disables the anomaly path until the
//! process is restarted with valid artifacts.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::forecast::{ForecastArtifact, ForecastBank};
use super::isolation_forest::IsolationForest;
use super::scaler::StandardScaler;
use super::{AnomalyModel, ModelError, Scaler};
use crate::registry::{SensorId, SensorRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model_dir: PathBuf,
    pub scaler: PathBuf,
    pub anomaly_model: PathBuf,
}

impl ArtifactPaths {
    pub fn forecast_model(&self, sensor: &SensorId) -> PathBuf {
        self.model_dir.join(format!("{sensor}.json"))
    }
}

/// Everything the inference path reads. Built once, never mutated.
pub struct ModelSnapshot {
    pub forecasts: ForecastBank,
    pub scaler: Option<Box<dyn Scaler>>,
    pub anomaly: Option<Box<dyn AnomalyModel>>,
}

impl ModelSnapshot {
    pub fn empty() -> Self {
        Self {
            forecasts: ForecastBank::new(),
            scaler: None,
            anomaly: None,
        }
    }

    pub fn load(
        registry: &SensorRegistry,
        paths: &ArtifactPaths,
        n_lags: usize,
        contamination: f64,
    ) -> Self {
        let forecasts = load_forecast_bank(registry, paths, n_lags);
        tracing::info!(
            loaded = forecasts.len(),
            sensors = registry.len(),
            dir = %paths.model_dir.display(),
            "forecast models loaded"
        );

        let scaler = match load_scaler(&paths.scaler, registry) {
            Ok(scaler) => {
                tracing::info!(path = %paths.scaler.display(), "scaler loaded");
                Some(Box::new(scaler) as Box<dyn Scaler>)
            }
            Err(err) => {
                tracing::error!(error = %err, "scaler unavailable; anomaly detection disabled");
                None
            }
        };

        let anomaly = match load_anomaly_model(&paths.anomaly_model, registry) {
            Ok(model) => {
                if let Some(fitted) = model.contamination() {
                    if (fitted - contamination).abs() > 1e-9 {
                        tracing::warn!(
                            fitted,
                            configured = contamination,
                            "anomaly model was fitted with a different contamination; its fitted offset still applies"
                        );
                    }
                }
                tracing::info!(path = %paths.anomaly_model.display(), "anomaly model loaded");
                Some(Box::new(model) as Box<dyn AnomalyModel>)
            }
            Err(err) => {
                tracing::error!(error = %err, "anomaly model unavailable; anomaly detection disabled");
                None
            }
        };

        Self {
            forecasts,
            scaler,
            anomaly,
        }
    }

    pub fn anomaly_path_available(&self) -> bool {
        self.scaler.is_some() && self.anomaly.is_some()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(path: &Path, source: ModelError) -> ArtifactError {
    ArtifactError::Invalid {
        path: path.to_path_buf(),
        source,
    }
}

fn load_forecast_bank(registry: &SensorRegistry, paths: &ArtifactPaths, n_lags: usize) -> ForecastBank {
    let mut bank = ForecastBank::new();
    for sensor in registry.sensors() {
        let path = paths.forecast_model(sensor);
        let model = read_json::<ForecastArtifact>(&path).and_then(|artifact| {
            let model = artifact.into_model().map_err(|err| invalid(&path, err))?;
            if model.n_features() != n_lags {
                return Err(invalid(
                    &path,
                    ModelError::FeatureCount {
                        expected: n_lags,
                        actual: model.n_features(),
                    },
                ));
            }
            Ok(model)
        });
        match model {
            Ok(model) => bank.insert(sensor.clone(), model),
            Err(ArtifactError::NotFound(path)) => {
                tracing::warn!(sensor = %sensor, path = %path.display(), "no forecast model; sensor will not be forecast");
            }
            Err(err) => {
                tracing::warn!(sensor = %sensor, error = %err, "failed to load forecast model; sensor will not be forecast");
            }
        }
    }
    bank
}

pub fn load_scaler(path: &Path, registry: &SensorRegistry) -> Result<StandardScaler, ArtifactError> {
    let scaler: StandardScaler = read_json(path)?;
    scaler.validate(registry).map_err(|err| invalid(path, err))?;
    Ok(scaler)
}

pub fn load_anomaly_model(
    path: &Path,
    registry: &SensorRegistry,
) -> Result<IsolationForest, ArtifactError> {
    let model: IsolationForest = read_json(path)?;
    model.validate().map_err(|err| invalid(path, err))?;
    if model.n_features() != registry.len() {
        return Err(invalid(
            path,
            ModelError::FeatureCount {
                expected: registry.len(),
                actual: model.n_features(),
            },
        ));
    }
    Ok(model)
}
