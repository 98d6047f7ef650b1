//! Machine learning building blocks: the forest classifier, data splitting and metrics.

pub mod forest;
pub mod metrics;
pub mod split;
