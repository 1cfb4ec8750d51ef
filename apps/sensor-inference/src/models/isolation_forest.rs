use serde::Deserialize;

use super::tree::NodeTable;
use super::{check_input, check_output, AnomalyModel, ModelError};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: f64) -> f64 {
    if n <= 1.0 {
        0.0
    } else if n <= 2.0 {
        1.0
    } else {
        2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IsolationTree {
    #[serde(flatten)]
    nodes: NodeTable,
    n_node_samples: Vec<usize>,
}

impl IsolationTree {
    fn path_length(&self, x: &[f64]) -> f64 {
        let (leaf, depth) = self.nodes.descend(x);
        depth as f64 + average_path_length(self.n_node_samples[leaf] as f64)
    }
}

/// Fitted isolation forest. `offset` is the fitted contamination quantile of
/// the training scores; the decision is `score_samples - offset`.
#[derive(Debug, Clone, Deserialize)]
pub struct IsolationForest {
    n_features: usize,
    max_samples: usize,
    offset: f64,
    #[serde(default)]
    contamination: Option<f64>,
    trees: Vec<IsolationTree>,
}

impl IsolationForest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::Invalid("n_features must be positive".to_string()));
        }
        if self.max_samples == 0 {
            return Err(ModelError::Invalid("max_samples must be positive".to_string()));
        }
        if !self.offset.is_finite() {
            return Err(ModelError::Invalid("offset is not finite".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.nodes
                .validate(self.n_features)
                .map_err(|err| err.in_tree(idx))?;
            if tree.n_node_samples.len() != tree.nodes.len() {
                return Err(ModelError::Invalid(format!(
                    "tree {idx}: {} sample counts for {} nodes",
                    tree.n_node_samples.len(),
                    tree.nodes.len()
                )));
            }
        }
        Ok(())
    }

    /// Contamination recorded at fit time, if the exporter wrote it.
    pub fn contamination(&self) -> Option<f64> {
        self.contamination
    }

    /// Anomaly score in `[-1, 0)`; lower is more isolated.
    pub fn score_samples(&self, x: &[f64]) -> Result<f64, ModelError> {
        check_input(x, self.n_features)?;
        let mean_path = self
            .trees
            .iter()
            .map(|tree| tree.path_length(x))
            .sum::<f64>()
            / self.trees.len() as f64;
        let normalizer = average_path_length(self.max_samples as f64);
        // A single-sample fit has no expected path; every point is maximally isolated.
        let exponent = if normalizer > 0.0 {
            -mean_path / normalizer
        } else {
            0.0
        };
        check_output(-(2f64.powf(exponent)))
    }
}

impl AnomalyModel for IsolationForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn decision(&self, standardized: &[f64]) -> Result<f64, ModelError> {
        Ok(self.score_samples(standardized)? - self.offset)
    }
}
