use serde::Deserialize;

use super::ModelError;

const LEAF: i64 = -1;

/// Flat binary tree in the layout scikit-learn exports (`tree_.children_left`
/// and friends). Children always sit at higher indices than their parent.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NodeTable {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
}

impl NodeTable {
    pub(crate) fn len(&self) -> usize {
        self.children_left.len()
    }

    pub(crate) fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        let len = self.len();
        if len == 0 {
            return Err(ModelError::Invalid("tree has no nodes".to_string()));
        }
        if self.children_right.len() != len || self.feature.len() != len || self.threshold.len() != len
        {
            return Err(ModelError::Invalid(
                "tree node arrays have different lengths".to_string(),
            ));
        }
        for node in 0..len {
            let left = self.children_left[node];
            let right = self.children_right[node];
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(ModelError::Invalid(format!(
                        "node {node} has exactly one child"
                    )));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= len as i64 {
                    return Err(ModelError::Invalid(format!(
                        "node {node} points at child {child} outside ({node}, {len})"
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(ModelError::Invalid(format!(
                    "node {node} splits on feature {feature}, model has {n_features}"
                )));
            }
            if !self.threshold[node].is_finite() {
                return Err(ModelError::Invalid(format!(
                    "node {node} has a non-finite threshold"
                )));
            }
        }
        Ok(())
    }

    /// Walks to the leaf for `x`, returning `(leaf index, edges traversed)`.
    /// Requires a validated table and a correctly sized input.
    pub(crate) fn descend(&self, x: &[f64]) -> (usize, usize) {
        let mut node = 0usize;
        let mut depth = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return (node, depth);
            }
            let feature = self.feature[node] as usize;
            // Fitted trees compare single-precision inputs against f64 thresholds.
            let value = (x[feature] as f32) as f64;
            node = if value <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
            depth += 1;
        }
    }
}

#[cfg(test)]
pub(crate) fn stump(feature: i64, threshold: f64) -> NodeTable {
    NodeTable {
        children_left: vec![1, LEAF, LEAF],
        children_right: vec![2, LEAF, LEAF],
        feature: vec![feature, -2, -2],
        threshold: vec![threshold, -2.0, -2.0],
    }
}
