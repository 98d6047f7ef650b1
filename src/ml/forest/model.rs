use serde::{Deserialize, Serialize};

/// Node of a decision tree stored in a flat arena; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        /// Feature index used for the split.
        feature_index: u16,
        /// Rows with `feature <= threshold` go left.
        threshold: f32,
        left: u32,
        right: u32,
    },
    Leaf {
        /// Class distribution of the training rows that reached this leaf.
        proba: Vec<f32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Class distribution of the leaf reached by `features`.
    ///
    /// Missing feature values read as `0.0`; the arena is validated on load,
    /// so child indices are in bounds.
    pub fn leaf_proba(&self, features: &[f32]) -> &[f32] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { proba } => return proba,
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature_index as usize).copied().unwrap_or(0.0);
                    let next = if value <= *threshold { *left } else { *right };
                    idx = next as usize;
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Children must point strictly forward so traversal always terminates.
    fn validate(&self, feature_len: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { proba } => {
                    if proba.len() != n_classes {
                        return Err(format!(
                            "leaf {idx} has {} probabilities but expected {n_classes}",
                            proba.len()
                        ));
                    }
                }
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature_index as usize >= feature_len {
                        return Err(format!(
                            "node {idx} splits on feature {feature_index} of {feature_len}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [*left as usize, *right as usize] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ensemble of decision trees; predictions average the leaf distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of `f32` values per feature vector.
    pub feature_len: usize,
    /// Ordered class identifiers; index = predicted class.
    pub classes: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.feature_len == 0 {
            return Err("Model must use at least one feature".to_string());
        }
        if self.feature_len > u16::MAX as usize + 1 {
            return Err(format!("Too many features: {}", self.feature_len));
        }
        if self.trees.is_empty() {
            return Err("Model has no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_len, self.classes.len())
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Mean class distribution over all trees.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        let mut sum = vec![0.0f32; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf_proba(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f32;
        sum.iter_mut().for_each(|p| *p /= n);
        sum
    }

    /// Most probable class; ties resolve to the lower index.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature_index: u16, threshold: f32, left: [f32; 2], right: [f32; 2]) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    proba: left.to_vec(),
                },
                TreeNode::Leaf {
                    proba: right.to_vec(),
                },
            ],
        }
    }

    fn model(trees: Vec<DecisionTree>) -> RandomForestModel {
        RandomForestModel {
            model_version: 1,
            feature_len: 2,
            classes: vec!["0".into(), "1".into()],
            trees,
        }
    }

    #[test]
    fn tree_routes_on_threshold() {
        let tree = stump(0, 0.5, [1.0, 0.0], [0.0, 1.0]);
        assert_eq!(tree.leaf_proba(&[0.5, 0.0]), &[1.0, 0.0]);
        assert_eq!(tree.leaf_proba(&[0.6, 0.0]), &[0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn forest_averages_trees_and_breaks_ties_low() {
        let forest = model(vec![
            stump(0, 0.5, [1.0, 0.0], [0.0, 1.0]),
            stump(1, 0.5, [1.0, 0.0], [0.0, 1.0]),
        ]);
        assert_eq!(forest.predict_proba(&[1.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(forest.predict_class_index(&[1.0, 0.0]), 0);
        assert_eq!(forest.predict_class_index(&[1.0, 1.0]), 1);
    }

    #[test]
    fn validate_rejects_backward_children_and_bad_features() {
        model(vec![stump(0, 0.5, [1.0, 0.0], [0.0, 1.0])])
            .validate()
            .unwrap();
        let mut cyclic = stump(0, 0.5, [1.0, 0.0], [0.0, 1.0]);
        cyclic.nodes[0] = TreeNode::Split {
            feature_index: 0,
            threshold: 0.5,
            left: 0,
            right: 2,
        };
        assert!(model(vec![cyclic]).validate().is_err());
        assert!(
            model(vec![stump(5, 0.5, [1.0, 0.0], [0.0, 1.0])])
                .validate()
                .is_err()
        );
        assert!(model(Vec::new()).validate().is_err());
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let forest = model(vec![stump(1, 0.25, [0.2, 0.8], [0.9, 0.1])]);
        let json = serde_json::to_string(&forest).unwrap();
        assert!(json.contains(r#""kind":"split""#));
        let back: RandomForestModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.predict_proba(&[0.0, 0.1]), forest.predict_proba(&[0.0, 0.1]));
    }
}
