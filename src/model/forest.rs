//! Random forest in flat array form
//!
//! Each tree stores its nodes as parallel arrays (left child, right child,
//! split feature, split threshold, class weights). A node is a leaf when its
//! left child is -1. Samples go left when `x[feature] <= threshold`.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{ClassScore, Classifier};
use super::error::InferenceError;

/// Marker for "no child"
pub const TREE_LEAF: i64 = -1;

/// One binary decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights `[class 0, class 1]`
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF
    }

    /// Structural validation. Children must point forward, which also rules
    /// out cycles, so `leaf_probability` always terminates.
    pub fn check(&self, n_features: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree node arrays have different lengths".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);

            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", node));
                }
                let [w0, w1] = self.value[node];
                if !(w0.is_finite() && w1.is_finite()) || w0 < 0.0 || w1 < 0.0 || w0 + w1 <= 0.0 {
                    return Err(format!("leaf {} has invalid class weights", node));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {} points to invalid child {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(format!("node {} splits on unknown feature {}", node, feature));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {} has a non-finite threshold", node));
            }
        }

        Ok(())
    }

    /// P(class = 1) at the leaf reached by `row`
    pub fn leaf_probability(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0usize;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let [w0, w1] = self.value[node];
        w1 / (w0 + w1)
    }
}

/// Averaging ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Mean of the per-tree leaf probabilities
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.leaf_probability(row)).sum();
        total / self.trees.len() as f64
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn check(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn classify(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassScore>, InferenceError> {
        if x.ncols() != self.n_features {
            return Err(InferenceError(format!(
                "forest expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        x.rows()
            .into_iter()
            .map(|row| {
                let probability = self.predict_proba_row(row);
                // arg-max, ties go to class 0
                let label = if probability > 0.5 { 1 } else { 0 };
                ClassScore::checked(label, probability)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Split on feature 0 at 0.0: left leaf 20% positive, right leaf 70%.
    fn stump(p_left: f64, p_right: f64) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.0, -2.0, -2.0],
            value: vec![[5.0, 5.0], [1.0 - p_left, p_left], [1.0 - p_right, p_right]],
        }
    }

    fn forest() -> RandomForest {
        RandomForest {
            n_features: 2,
            trees: vec![stump(0.2, 0.7), stump(0.4, 0.9)],
        }
    }

    #[test]
    fn test_leaf_probability_goes_left_on_equal() {
        let tree = stump(0.2, 0.7);
        assert!((tree.leaf_probability(array![0.0, 9.0].view()) - 0.2).abs() < 1e-12);
        assert!((tree.leaf_probability(array![0.1, 9.0].view()) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_forest_averages_trees() {
        let scores = forest().classify(array![[-1.0, 0.0], [1.0, 0.0]].view()).unwrap();
        assert!((scores[0].probability - 0.3).abs() < 1e-12);
        assert_eq!(scores[0].label, 0);
        assert!((scores[1].probability - 0.8).abs() < 1e-12);
        assert_eq!(scores[1].label, 1);
    }

    #[test]
    fn test_tie_goes_to_class_zero() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![stump(0.5, 0.5)],
        };
        let scores = forest.classify(array![[1.0]].view()).unwrap();
        assert_eq!(scores[0].label, 0);
    }

    #[test]
    fn test_width_mismatch() {
        assert!(forest().classify(array![[1.0, 2.0, 3.0]].view()).is_err());
    }

    #[test]
    fn test_check_rejects_dangling_child() {
        let mut tree = stump(0.2, 0.7);
        tree.children_right[0] = 7;
        assert!(tree.check(2).unwrap_err().contains("invalid child"));
    }

    #[test]
    fn test_check_rejects_backward_child() {
        let mut tree = stump(0.2, 0.7);
        tree.children_left = vec![1, 0, -1];
        tree.children_right = vec![2, 2, -1];
        tree.feature[1] = 0;
        tree.threshold[1] = 0.0;
        assert!(tree.check(2).is_err());
    }

    #[test]
    fn test_check_rejects_unknown_feature() {
        let mut tree = stump(0.2, 0.7);
        tree.feature[0] = 5;
        assert!(tree.check(2).unwrap_err().contains("unknown feature"));
    }

    #[test]
    fn test_check_rejects_ragged_arrays() {
        let mut tree = stump(0.2, 0.7);
        tree.threshold.pop();
        assert!(tree.check(2).is_err());
    }

    #[test]
    fn test_empty_forest() {
        let forest = RandomForest {
            n_features: 13,
            trees: vec![],
        };
        assert!(forest.check().is_err());
    }
}
