use serde::Deserialize;

use super::{check_input, ModelError, Scaler};
use crate::registry::SensorRegistry;

/// Per-column `(x - mean) / scale`, fitted on registry-ordered readings.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean,
            scale,
            feature_names: None,
        }
    }

    /// Checks the artifact against the registry's column order.
    pub fn validate(&self, registry: &SensorRegistry) -> Result<(), ModelError> {
        if self.mean.len() != registry.len() || self.scale.len() != registry.len() {
            return Err(ModelError::Invalid(format!(
                "scaler fitted on {} columns ({} scales), registry has {}",
                self.mean.len(),
                self.scale.len(),
                registry.len()
            )));
        }
        if self
            .mean
            .iter()
            .chain(self.scale.iter())
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::Invalid("scaler has non-finite parameters".to_string()));
        }
        if let Some(names) = &self.feature_names {
            let matches = names.len() == registry.len()
                && names
                    .iter()
                    .zip(registry.sensors())
                    .all(|(name, sensor)| name == sensor.as_str());
            if !matches {
                return Err(ModelError::Invalid(
                    "scaler feature_names do not match registry order".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, reading: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_input(reading, self.mean.len())?;
        Ok(reading
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant columns were fitted with unit scale.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}
