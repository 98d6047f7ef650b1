use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{EncodeError, SchemaError};

/// Outcome for one input record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// `1` when the customer is predicted to churn.
    #[serde(rename = "Churn_Prediction")]
    pub churn: u8,
    /// Averaged forest probability of churn.
    #[serde(rename = "Churn_Probability")]
    pub probability: f32,
}

impl PredictionResult {
    pub fn from_proba(proba: &[f32], churn_class: usize) -> Self {
        let churn_p = proba.get(churn_class).copied().unwrap_or(0.0);
        let best_other = proba
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != churn_class)
            .map(|(_, p)| *p)
            .fold(f32::NEG_INFINITY, f32::max);
        Self {
            churn: u8::from(churn_p > best_other),
            probability: churn_p,
        }
    }

    pub fn churned(&self) -> bool {
        self.churn == 1
    }
}

/// A batch could not be predicted; nothing is returned for any of its records.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Schema(SchemaError),
    #[error(transparent)]
    Encoding(EncodeError),
    #[error("classifier failed: {0}")]
    Classifier(String),
}

impl PredictError {
    /// Whether the caller sent something unusable, as opposed to a service fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Encoding(_))
    }
}

impl From<SchemaError> for PredictError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<EncodeError> for PredictError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Schema(schema) => Self::Schema(schema),
            other => Self::Encoding(other),
        }
    }
}
