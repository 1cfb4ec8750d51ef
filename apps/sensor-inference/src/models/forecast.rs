use serde::Deserialize;
use std::collections::HashMap;

use super::tree::NodeTable;
use super::{check_input, check_output, ForecastModel, ModelError};
use crate::registry::SensorId;

/// On-disk forecast model, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastArtifact {
    RandomForest(RandomForestRegressor),
    Linear(LinearRegressor),
}

impl ForecastArtifact {
    pub fn into_model(self) -> Result<Box<dyn ForecastModel>, ModelError> {
        match self {
            ForecastArtifact::RandomForest(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            ForecastArtifact::Linear(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegressionTree {
    #[serde(flatten)]
    nodes: NodeTable,
    value: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForestRegressor {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    fn validate(&self) -> Result<(), ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::Invalid("n_features must be positive".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.nodes
                .validate(self.n_features)
                .map_err(|err| err.in_tree(idx))?;
            if tree.value.len() != tree.nodes.len() {
                return Err(ModelError::Invalid(format!(
                    "tree {idx}: {} values for {} nodes",
                    tree.value.len(),
                    tree.nodes.len()
                )));
            }
        }
        Ok(())
    }
}

impl ForecastModel for RandomForestRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, lags: &[f64]) -> Result<f64, ModelError> {
        check_input(lags, self.n_features)?;
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| {
                let (leaf, _) = tree.nodes.descend(lags);
                tree.value[leaf]
            })
            .sum();
        check_output(total / self.trees.len() as f64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::Invalid("no coefficients".to_string()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid("non-finite coefficient".to_string()));
        }
        Ok(())
    }
}

impl ForecastModel for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, lags: &[f64]) -> Result<f64, ModelError> {
        check_input(lags, self.coefficients.len())?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(lags)
            .map(|(c, x)| c * x)
            .sum();
        check_output(dot + self.intercept)
    }
}

/// One regressor per sensor; sensors without an entry never forecast.
#[derive(Default)]
pub struct ForecastBank {
    models: HashMap<SensorId, Box<dyn ForecastModel>>,
}

impl ForecastBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sensor: SensorId, model: Box<dyn ForecastModel>) {
        self.models.insert(sensor, model);
    }

    pub fn contains(&self, sensor: &SensorId) -> bool {
        self.models.contains_key(sensor)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// `None` when no model is loaded for `sensor`.
    pub fn predict(&self, sensor: &SensorId, lags: &[f64]) -> Option<Result<f64, ModelError>> {
        self.models.get(sensor).map(|model| model.predict(lags))
    }
}
