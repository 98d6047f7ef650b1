use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use super::model::{DecisionTree, RandomForestModel, TreeNode};

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestOptions {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum rows required to split a node.
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split.
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means `sqrt(feature_len)`.
    pub max_features: Option<usize>,
    /// Seed for bootstrap sampling and feature selection.
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Number of `f32` values in each feature vector.
    pub feature_len: usize,
    /// Ordered list of class identifiers.
    pub classes: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

/// Train a random forest; identical inputs and seed give an identical model.
pub fn train_random_forest(
    dataset: &TrainDataset,
    options: &ForestOptions,
) -> Result<RandomForestModel, String> {
    validate_dataset(dataset)?;
    if options.n_trees == 0 {
        return Err("Need at least one tree".to_string());
    }

    let n = dataset.x.len();
    let d = dataset.feature_len;
    let max_features = options
        .max_features
        .unwrap_or_else(|| (d as f64).sqrt() as usize)
        .clamp(1, d);

    let mut seeder = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.n_trees);
    for _ in 0..options.n_trees {
        let mut rng = StdRng::seed_from_u64(seeder.random());
        let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
        let mut builder = TreeBuilder {
            x: &dataset.x,
            y: &dataset.y,
            n_classes: dataset.classes.len(),
            n_features: d,
            max_features,
            options,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(sample, 0);
        trees.push(DecisionTree {
            nodes: builder.nodes,
        });
    }

    Ok(RandomForestModel {
        model_version: 1,
        feature_len: d,
        classes: dataset.classes.clone(),
        trees,
    })
}

fn validate_dataset(dataset: &TrainDataset) -> Result<(), String> {
    if dataset.x.len() != dataset.y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if dataset.x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    if dataset.classes.len() < 2 {
        return Err("Need at least 2 classes".to_string());
    }
    if dataset.feature_len == 0 || dataset.feature_len > u16::MAX as usize + 1 {
        return Err(format!("Unsupported feature length {}", dataset.feature_len));
    }
    for (row_idx, (row, &label)) in dataset.x.iter().zip(&dataset.y).enumerate() {
        if row.len() != dataset.feature_len {
            return Err(format!(
                "Row {row_idx} has {} features but expected {}",
                row.len(),
                dataset.feature_len
            ));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(format!("Row {row_idx} has a non-finite feature"));
        }
        if label >= dataset.classes.len() {
            return Err(format!("Row {row_idx} has out-of-range label {label}"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f32,
    /// Weighted Gini impurity of the two children.
    score: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f32>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    options: &'a ForestOptions,
    rng: StdRng,
    nodes: Vec<TreeNode>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `rows` and return its node index.
    ///
    /// The parent slot is reserved before recursing, so children always get
    /// larger indices than their parent.
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> u32 {
        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { proba: Vec::new() });

        let counts = self.class_counts(&rows);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.options.max_depth.is_some_and(|max| depth >= max);
        let too_small = rows.len() < self.options.min_samples_split.max(2);
        let split = if pure || too_deep || too_small {
            None
        } else {
            self.best_split(&rows, &counts)
        };

        self.nodes[node_idx] = match split {
            None => leaf(&counts, rows.len()),
            Some(split) => {
                let (left, right): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .partition(|&&row| self.x[row][split.feature] <= split.threshold);
                let left = self.grow(left, depth + 1);
                let right = self.grow(right, depth + 1);
                TreeNode::Split {
                    feature_index: split.feature as u16,
                    threshold: split.threshold,
                    left,
                    right,
                }
            }
        };
        node_idx as u32
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &row in rows {
            counts[self.y[row]] += 1;
        }
        counts
    }

    fn best_split(&mut self, rows: &[usize], counts: &[usize]) -> Option<Split> {
        let n = rows.len();
        let min_leaf = self.options.min_samples_leaf.max(1);
        let candidates = index::sample(&mut self.rng, self.n_features, self.max_features);

        let mut best: Option<Split> = None;
        let mut sorted: Vec<(f32, usize)> = Vec::with_capacity(n);
        let mut left_counts = vec![0usize; self.n_classes];
        for feature in candidates.iter() {
            sorted.clear();
            sorted.extend(rows.iter().map(|&row| (self.x[row][feature], self.y[row])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
            left_counts.iter_mut().for_each(|c| *c = 0);

            for pos in 0..n - 1 {
                left_counts[sorted[pos].1] += 1;
                let (value, next) = (sorted[pos].0, sorted[pos + 1].0);
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let score = weighted_gini(&left_counts, counts, n_left, n_right);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(Split {
                        feature,
                        threshold: midpoint(value, next),
                        score,
                    });
                }
            }
        }
        best
    }
}

fn leaf(counts: &[usize], total: usize) -> TreeNode {
    let total = total.max(1) as f32;
    TreeNode::Leaf {
        proba: counts.iter().map(|&c| c as f32 / total).collect(),
    }
}

fn weighted_gini(left: &[usize], parent: &[usize], n_left: usize, n_right: usize) -> f64 {
    let mut left_sq = 0.0f64;
    let mut right_sq = 0.0f64;
    for (&l, &p) in left.iter().zip(parent) {
        let r = p - l;
        left_sq += (l as f64) * (l as f64);
        right_sq += (r as f64) * (r as f64);
    }
    let (nl, nr) = (n_left as f64, n_right as f64);
    let gini_left = 1.0 - left_sq / (nl * nl);
    let gini_right = 1.0 - right_sq / (nr * nr);
    (nl * gini_left + nr * gini_right) / (nl + nr)
}

/// Threshold strictly between `lo` and `hi` (or `lo` when they are adjacent floats).
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi { mid } else { lo }
}
