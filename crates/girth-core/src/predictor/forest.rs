//! Native random forest regressor
//!
//! Evaluates a tree ensemble exported in the flat, array-per-node layout
//! used by scikit-learn's `tree_` objects. Node `i` of a tree is described by
//! `children_left[i]`, `children_right[i]`, `feature[i]`, `threshold[i]` and
//! `value[i]`; leaves have both children set to `-1`. A sample goes left when
//! `x <= threshold`.

use super::Regressor;
use crate::error::{GirthError, Result};
use serde::{Deserialize, Serialize};

/// Child index marking a leaf
const TREE_LEAF: i64 = -1;

/// Serialized form of a single tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Mean target of the training samples reaching each node
    pub value: Vec<f64>,
    /// Weighted training sample count per node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_node_samples: Option<Vec<f64>>,
    /// Node impurity (squared error for regression forests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impurity: Option<Vec<f64>>,
}

/// Serialized form of a forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSpec {
    pub n_features: usize,
    pub trees: Vec<TreeArrays>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
    samples: Option<Vec<f64>>,
    impurity: Option<Vec<f64>>,
}

impl DecisionTree {
    fn from_arrays(index: usize, arrays: TreeArrays, n_features: usize) -> Result<Self> {
        let invalid = |msg: String| GirthError::InvalidModel(format!("tree {}: {}", index, msg));

        let n = arrays.children_left.len();
        if n == 0 {
            return Err(invalid("tree has no nodes".to_string()));
        }
        let lengths = [
            arrays.children_right.len(),
            arrays.feature.len(),
            arrays.threshold.len(),
            arrays.value.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(invalid(format!(
                "node arrays have inconsistent lengths ({} vs {:?})",
                n, lengths
            )));
        }
        for (name, extra) in [("n_node_samples", &arrays.n_node_samples), ("impurity", &arrays.impurity)] {
            if let Some(values) = extra {
                if values.len() != n {
                    return Err(invalid(format!("{} has {} entries, expected {}", name, values.len(), n)));
                }
            }
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (arrays.children_left[i], arrays.children_right[i]);
            if left == TREE_LEAF && right == TREE_LEAF {
                nodes.push(TreeNode::Leaf {
                    value: arrays.value[i],
                });
                continue;
            }
            // Children always come after their parent, which also rules out cycles.
            let child = |c: i64| -> Result<usize> {
                if c <= i as i64 || c >= n as i64 {
                    return Err(invalid(format!("node {} has invalid child index {}", i, c)));
                }
                Ok(c as usize)
            };
            let feature = arrays.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(invalid(format!(
                    "node {} splits on feature {} but the model has {} features",
                    i, feature, n_features
                )));
            }
            nodes.push(TreeNode::Split {
                feature: feature as usize,
                threshold: arrays.threshold[i],
                left: child(left)?,
                right: child(right)?,
            });
        }

        Ok(Self {
            nodes,
            samples: arrays.n_node_samples,
            impurity: arrays.impurity,
        })
    }

    fn predict(&self, row: &[f32]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if f64::from(row[feature]) <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Unnormalised mean decrease in impurity per feature.
    ///
    /// Needs both sample counts and impurities.
    fn raw_importances(&self, n_features: usize) -> Option<Vec<f64>> {
        let samples = self.samples.as_ref()?;
        let imp = self.impurity.as_ref()?;
        let mut importances = vec![0.0; n_features];
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature, left, right, ..
            } = *node
            {
                importances[feature] +=
                    samples[i] * imp[i] - samples[left] * imp[left] - samples[right] * imp[right];
            }
        }
        Some(importances)
    }
}

/// Random forest regressor; the prediction is the mean over all trees
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn from_spec(spec: ForestSpec) -> Result<Self> {
        if spec.trees.is_empty() {
            return Err(GirthError::InvalidModel("forest has no trees".to_string()));
        }
        let n_features = spec.n_features;
        let trees = spec
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, arrays)| DecisionTree::from_arrays(i, arrays, n_features))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { trees, n_features })
    }

}

impl Regressor for RandomForestRegressor {
    fn predict_row(&self, row: &[f32]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(GirthError::SchemaMismatch(format!(
                "forest expects {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }

    /// Mean decrease in impurity, normalised per tree, averaged over the
    /// trees that split at least once, then normalised to sum to 1.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        let mut total = vec![0.0; self.n_features];
        let mut contributing = 0usize;

        for tree in &self.trees {
            if tree.nodes.len() <= 1 {
                continue;
            }
            let importances = tree.raw_importances(self.n_features)?;
            let sum: f64 = importances.iter().sum();
            if sum > 0.0 {
                for (t, v) in total.iter_mut().zip(&importances) {
                    *t += v / sum;
                }
            }
            contributing += 1;
        }

        if contributing == 0 {
            return Some(total);
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for v in &mut total {
                *v /= sum;
            }
        }
        Some(total)
    }
}
