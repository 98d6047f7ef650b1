//! Model artifact: the trained forest together with the schema and encoders it expects.
//!
//! One JSON file carries everything serving needs, so the encoding used at
//! prediction time is exactly the one used at training time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atomic_file::atomic_write;
use crate::features::{FeatureEncoder, FeatureSchema};
use crate::ml::forest::RandomForestModel;
use crate::ml::metrics::EvaluationReport;

/// Current artifact format version.
pub const ARTIFACT_FORMAT_VERSION: i64 = 1;

/// Class labels of the churn classifier; index = predicted outcome.
pub const CHURN_CLASSES: [&str; 2] = ["0", "1"];

/// Index of the churn (positive) class.
pub const CHURN_CLASS: usize = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid artifact JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported artifact format_version {found} (expected {expected})")]
    UnsupportedVersion { found: i64, expected: i64 },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Provenance of a trained artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub rows_total: usize,
    pub rows_train: usize,
    pub rows_eval: usize,
    pub seed: u64,
    pub n_trees: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Held-out evaluation; absent when no rows were held out.
    #[serde(default)]
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: i64,
    /// RFC 3339 timestamp of the training run.
    pub created_at: String,
    pub features: FeatureEncoder,
    pub classifier: RandomForestModel,
    pub training: TrainingSummary,
}

impl ModelArtifact {
    pub fn schema(&self) -> &FeatureSchema {
        self.features.schema()
    }

    /// Check that schema, encoders and classifier agree with each other.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        self.features
            .validate()
            .map_err(|err| ArtifactError::Invalid(err.to_string()))?;
        self.classifier.validate().map_err(ArtifactError::Invalid)?;
        if self.classifier.feature_len != self.schema().len() {
            return Err(ArtifactError::Invalid(format!(
                "classifier expects {} features but schema has {}",
                self.classifier.feature_len,
                self.schema().len()
            )));
        }
        if self.classifier.classes != CHURN_CLASSES {
            return Err(ArtifactError::Invalid(format!(
                "classifier classes {:?} are not binary churn classes",
                self.classifier.classes
            )));
        }
        Ok(())
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse and validate an artifact from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact as pretty JSON, replacing `path` atomically.
    ///
    /// Returns the fingerprint of the written bytes.
    pub fn save_json(&self, path: &Path) -> Result<String, ArtifactError> {
        let bytes = self.to_json_bytes()?;
        atomic_write(path, &bytes).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(fingerprint(&bytes))
    }

    /// Load and validate an artifact, logging its fingerprint.
    pub fn load_json(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = Self::from_json_slice(&bytes)?;
        tracing::info!(
            "Loaded model artifact {} ({} trees, {} features, fingerprint {})",
            path.display(),
            artifact.classifier.trees.len(),
            artifact.schema().len(),
            fingerprint(&bytes)
        );
        Ok(artifact)
    }
}

/// Hex BLAKE3 digest identifying an artifact's exact bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
