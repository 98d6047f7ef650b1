//! Serving-time encoding and prediction over a loaded model artifact.

mod prediction;
mod service;

use serde::{Deserialize, Serialize};

pub use prediction::{PredictError, PredictionResult};
pub use service::InferenceService;

/// Where serving-time category encoders come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// Use the encoders stored in the artifact; nothing is mutated while serving.
    #[default]
    Frozen,
    /// Fit each column's encoder on the first batch that mentions it and keep it.
    ///
    /// Codes depend on request arrival order and generally differ from the
    /// training-time codes. Kept only for compatibility with older deployments.
    FitOnFirstBatch,
}
