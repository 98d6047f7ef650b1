//! Library exports shared by the service, the developer binaries, benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Serialized model artifact.
pub mod artifact;
/// Atomic file replacement.
pub mod atomic_file;
/// TOML configuration.
pub mod config;
/// Customer records, dataset loading and summaries.
pub mod dataset;
/// Feature schema and categorical encoders.
pub mod features;
/// Serving-time encoding and prediction.
pub mod inference;
/// Tracing setup.
pub mod logging;
/// Random forest, data splitting and metrics.
pub mod ml;
/// HTTP routes.
pub mod server;
/// Offline training pipeline.
pub mod training;
