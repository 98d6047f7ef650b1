use std::path::Path;
use std::sync::Arc;

use super::EncodingStrategy;
use super::prediction::{PredictError, PredictionResult};
use crate::artifact::{ArtifactError, CHURN_CLASS, ModelArtifact};
use crate::config::InferenceSettings;
use crate::dataset::CustomerRecord;
use crate::features::encoder::encode_row;
use crate::features::{FeatureSchema, LazyEncoderRegistry};

/// Loaded artifact plus serving options, shared by every request handler.
///
/// The artifact is never mutated after construction. With
/// [`EncodingStrategy::FitOnFirstBatch`] the only mutable state is the
/// encoder registry, which serializes its own updates.
#[derive(Debug)]
pub struct InferenceService {
    artifact: Arc<ModelArtifact>,
    settings: InferenceSettings,
    registry: LazyEncoderRegistry,
}

impl InferenceService {
    pub fn new(artifact: ModelArtifact, settings: InferenceSettings) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        if settings.encoding == EncodingStrategy::FitOnFirstBatch {
            tracing::warn!(
                "Serving with encoders fitted on first request batches; codes may differ from training"
            );
        }
        Ok(Self {
            artifact: Arc::new(artifact),
            settings,
            registry: LazyEncoderRegistry::new(),
        })
    }

    /// Load the artifact at `path`; any failure here is fatal for serving.
    pub fn load(path: &Path, settings: InferenceSettings) -> Result<Self, ArtifactError> {
        Self::new(ModelArtifact::load_json(path)?, settings)
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.artifact.schema()
    }

    pub fn settings(&self) -> InferenceSettings {
        self.settings
    }

    /// Validate and encode a batch into schema-ordered feature vectors.
    pub fn encode(&self, records: &[CustomerRecord]) -> Result<Vec<Vec<f32>>, PredictError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let policy = self.settings.unseen_category;
        match self.settings.encoding {
            EncodingStrategy::Frozen => Ok(self.artifact.features.encode_batch(records, policy)?),
            EncodingStrategy::FitOnFirstBatch => {
                let schema = self.schema();
                schema.validate_batch(records)?;
                let encoders = self.registry.resolve(schema, records);
                records
                    .iter()
                    .enumerate()
                    .map(|(row, record)| {
                        encode_row(schema, row, record, policy, |column| {
                            encoders.get(column).map(Arc::as_ref)
                        })
                        .map_err(PredictError::from)
                    })
                    .collect()
            }
        }
    }

    /// Predict every record of a batch, in input order; any failure rejects the batch.
    pub fn predict(&self, records: &[CustomerRecord]) -> Result<Vec<PredictionResult>, PredictError> {
        let features = self.encode(records)?;
        let classifier = &self.artifact.classifier;
        features
            .iter()
            .enumerate()
            .map(|(row, vector)| {
                if vector.len() != classifier.feature_len {
                    return Err(PredictError::Classifier(format!(
                        "record {row} encoded to {} features but the classifier expects {}",
                        vector.len(),
                        classifier.feature_len
                    )));
                }
                let proba = classifier.predict_proba(vector);
                if proba.iter().any(|p| !p.is_finite()) {
                    return Err(PredictError::Classifier(format!(
                        "non-finite probability for record {row}"
                    )));
                }
                Ok(PredictionResult::from_proba(&proba, CHURN_CLASS))
            })
            .collect()
    }

    /// Number of encoders fitted at serving time (always zero for the frozen strategy).
    pub fn fitted_encoder_count(&self) -> usize {
        self.registry.len()
    }
}
