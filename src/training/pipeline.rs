use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::labels::extract_labels;
use crate::artifact::{
    ARTIFACT_FORMAT_VERSION, ArtifactError, CHURN_CLASS, CHURN_CLASSES, ModelArtifact,
    TrainingSummary,
};
use crate::config::TrainingSettings;
use crate::dataset::CustomerRecord;
use crate::features::{EncodeError, FeatureEncoder, SchemaError, UnseenCategoryPolicy};
use crate::ml::forest::{TrainDataset, train_random_forest};
use crate::ml::metrics::evaluate;
use crate::ml::split::train_eval_split;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training dataset is empty")]
    EmptyDataset,
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Encoding(#[from] EncodeError),
    #[error("record {row} has label {value} in column {column}; expected 0/1, true/false or yes/no")]
    InvalidLabel {
        row: usize,
        column: String,
        value: String,
    },
    #[error("failed to split dataset: {0}")]
    Split(String),
    #[error("failed to fit random forest: {0}")]
    Forest(String),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Fit encoders and a random forest on `records`, returning a validated artifact.
///
/// Everything except `created_at` is a pure function of the records and settings.
pub fn train(
    records: &[CustomerRecord],
    settings: &TrainingSettings,
) -> Result<ModelArtifact, TrainError> {
    if records.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    let schema = settings.schema();
    let features = FeatureEncoder::fit(schema, records)?;
    let labels = extract_labels(records, &settings.label_column)?;
    let matrix = features.encode_batch(records, UnseenCategoryPolicy::Reject)?;
    for column in features.schema().categorical_columns() {
        if let Some(encoder) = features.encoder(column) {
            tracing::debug!("Encoded {column} with {} categories", encoder.len());
        }
    }

    let split = train_eval_split(records.len(), settings.test_fraction, settings.seed)
        .map_err(TrainError::Split)?;
    let gather = |rows: &[usize]| -> (Vec<Vec<f32>>, Vec<usize>) {
        rows.iter()
            .map(|&row| (matrix[row].clone(), labels[row]))
            .unzip()
    };
    let (train_x, train_y) = gather(&split.train);
    let (eval_x, eval_y) = gather(&split.eval);

    let dataset = TrainDataset {
        feature_len: features.schema().len(),
        classes: CHURN_CLASSES.iter().map(|class| class.to_string()).collect(),
        x: train_x,
        y: train_y,
    };
    let options = settings.forest_options();
    tracing::info!(
        "Training {} trees on {} rows ({} held out, seed {})",
        options.n_trees,
        dataset.x.len(),
        eval_x.len(),
        options.seed
    );
    let classifier = train_random_forest(&dataset, &options).map_err(TrainError::Forest)?;

    let evaluation = (!eval_x.is_empty()).then(|| {
        let report = evaluate(&classifier, &eval_x, &eval_y, CHURN_CLASS);
        tracing::info!(
            "Held-out accuracy {:.4}, precision {:.4}, recall {:.4}, f1 {:.4}",
            report.accuracy,
            report.precision,
            report.recall,
            report.f1
        );
        report
    });

    let artifact = ModelArtifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        created_at: now_rfc3339(),
        features,
        classifier,
        training: TrainingSummary {
            rows_total: records.len(),
            rows_train: split.train.len(),
            rows_eval: split.eval.len(),
            seed: options.seed,
            n_trees: options.n_trees,
            max_depth: options.max_depth,
            evaluation,
        },
    };
    artifact.validate()?;
    Ok(artifact)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureColumn, FeatureKind};

    fn settings() -> TrainingSettings {
        TrainingSettings {
            n_trees: 10,
            features: vec![
                FeatureColumn::new("Segment", FeatureKind::Categorical),
                FeatureColumn::new("Retention_Rate", FeatureKind::Numeric),
            ],
            ..TrainingSettings::default()
        }
    }

    fn records(n: usize) -> Vec<CustomerRecord> {
        (0..n)
            .map(|i| {
                let retention = (i % 10) as f64 / 10.0;
                CustomerRecord::new()
                    .with("Customer_ID", format!("C{i:03}"))
                    .with("Segment", ["A", "B", "C"][i % 3])
                    .with("Retention_Rate", retention)
                    .with("Churn_Flag", i32::from(retention < 0.5))
            })
            .collect()
    }

    #[test]
    fn produces_a_valid_artifact_with_evaluation() {
        let artifact = train(&records(50), &settings()).unwrap();
        assert_eq!(artifact.training.rows_total, 50);
        assert_eq!(artifact.training.rows_eval, 10);
        assert_eq!(artifact.training.rows_train, 40);
        assert_eq!(artifact.classifier.trees.len(), 10);
        assert_eq!(
            artifact.features.encoder("Segment").unwrap().categories(),
            ["A", "B", "C"]
        );
        let evaluation = artifact.training.evaluation.unwrap();
        assert_eq!(evaluation.rows, 10);
        assert!(evaluation.accuracy >= 0.8, "accuracy {}", evaluation.accuracy);
    }

    #[test]
    fn same_data_and_seed_give_identical_classifier() {
        let data = records(40);
        let a = train(&data, &settings()).unwrap();
        let b = train(&data, &settings()).unwrap();
        assert_eq!(a.classifier, b.classifier);
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn zero_test_fraction_skips_evaluation() {
        let settings = TrainingSettings {
            test_fraction: 0.0,
            ..settings()
        };
        let artifact = train(&records(20), &settings).unwrap();
        assert_eq!(artifact.training.rows_eval, 0);
        assert!(artifact.training.evaluation.is_none());
    }

    #[test]
    fn failures_name_the_offending_row() {
        assert!(matches!(
            train(&[], &settings()),
            Err(TrainError::EmptyDataset)
        ));

        let mut missing = records(5);
        missing[3].remove("Retention_Rate");
        assert!(matches!(
            train(&missing, &settings()),
            Err(TrainError::Schema(SchemaError::MissingColumn { row: 3, .. }))
        ));

        let mut overflowing = records(5);
        overflowing[4].insert("Retention_Rate", 1e39);
        assert!(matches!(
            train(&overflowing, &settings()),
            Err(TrainError::Schema(SchemaError::NotNumeric { row: 4, .. }))
        ));

        let mut bad_label = records(5);
        bad_label[2].insert("Churn_Flag", 7);
        assert!(matches!(
            train(&bad_label, &settings()),
            Err(TrainError::InvalidLabel { row: 2, .. })
        ));
    }
}
