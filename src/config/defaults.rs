use crate::features::{FeatureColumn, FeatureKind};

pub(super) const MAX_TREES: usize = 2_000;
pub(super) const MAX_TEST_FRACTION: f64 = 0.9;

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(super) fn default_port() -> u16 {
    5000
}

pub(super) fn default_max_payload_bytes() -> usize {
    4 * 1024 * 1024
}

pub(super) fn default_model_path() -> std::path::PathBuf {
    std::path::PathBuf::from("data/churn_prediction_model.json")
}

pub(super) fn default_dataset_path() -> std::path::PathBuf {
    std::path::PathBuf::from("data/customer_data.csv")
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_max_log_files() -> usize {
    10
}

pub(super) fn default_identifier_column() -> String {
    "Customer_ID".to_string()
}

pub(super) fn default_label_column() -> String {
    "Churn_Flag".to_string()
}

pub(super) fn default_seed() -> u64 {
    42
}

pub(super) fn default_test_fraction() -> f64 {
    0.2
}

pub(super) fn default_n_trees() -> usize {
    100
}

pub(super) fn default_min_samples_split() -> usize {
    2
}

pub(super) fn default_min_samples_leaf() -> usize {
    1
}

/// Feature columns of the customer dataset, in model input order.
pub(super) fn default_features() -> Vec<FeatureColumn> {
    vec![
        FeatureColumn::new("Segment", FeatureKind::Categorical),
        FeatureColumn::new("Retention_Rate", FeatureKind::Numeric),
        FeatureColumn::new("Engagement_Score", FeatureKind::Numeric),
        FeatureColumn::new("Region", FeatureKind::Categorical),
    ]
}
