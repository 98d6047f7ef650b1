//! Deterministic random-forest classifier.
//!
//! Bootstrap-sampled CART trees with Gini splits over a random subset of
//! features at every node. Training is fully determined by the seed and the
//! input rows, and the model round-trips through JSON.

mod model;
mod train;

pub use model::{DecisionTree, RandomForestModel, TreeNode};
pub use train::{ForestOptions, TrainDataset, train_random_forest};
