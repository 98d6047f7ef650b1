use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::CustomerRecord;
use crate::dataset::record::{category_text, numeric_value};

/// Whether a feature column holds category text or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureColumn {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A record (or the schema itself) does not fit the feature layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("record {row} is missing required column {column}")]
    MissingColumn { row: usize, column: String },
    #[error("record {row} has a null value in column {column}")]
    NullValue { row: usize, column: String },
    #[error("record {row} has non-numeric value {value} in numeric column {column}")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
    #[error("record {row} has a non-scalar value in categorical column {column}")]
    NotCategorical { row: usize, column: String },
    #[error("invalid feature schema: {0}")]
    InvalidDefinition(String),
}

/// Ordered feature layout the classifier was trained on.
///
/// Column order is the model's input order. The identifier and label columns
/// are named so they can be excluded explicitly; neither is ever a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
    identifier_column: String,
    label_column: String,
}

impl FeatureSchema {
    pub fn new(
        columns: Vec<FeatureColumn>,
        identifier_column: impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            columns,
            identifier_column: identifier_column.into(),
            label_column: label_column.into(),
        }
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn identifier_column(&self) -> &str {
        &self.identifier_column
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|column| column.kind == FeatureKind::Categorical)
            .map(|column| column.name.as_str())
    }

    /// Check structural invariants: non-empty, unique names, no overlap with id/label.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::InvalidDefinition(
                "at least one feature column is required".to_string(),
            ));
        }
        for (idx, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(SchemaError::InvalidDefinition(format!(
                    "feature {idx} has an empty name"
                )));
            }
            if self.columns[..idx].iter().any(|prev| prev.name == column.name) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "duplicate feature column {}",
                    column.name
                )));
            }
            if column.name == self.identifier_column || column.name == self.label_column {
                return Err(SchemaError::InvalidDefinition(format!(
                    "{} cannot be both a feature and the identifier/label column",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// Check that `record` carries a usable value for every feature column.
    ///
    /// `row` is only used to label the error.
    pub fn validate_record(&self, row: usize, record: &CustomerRecord) -> Result<(), SchemaError> {
        for column in &self.columns {
            let value = record
                .get(&column.name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    row,
                    column: column.name.clone(),
                })?;
            if value.is_null() {
                return Err(SchemaError::NullValue {
                    row,
                    column: column.name.clone(),
                });
            }
            match column.kind {
                FeatureKind::Numeric if numeric_value(value).is_none() => {
                    return Err(SchemaError::NotNumeric {
                        row,
                        column: column.name.clone(),
                        value: value.to_string(),
                    });
                }
                FeatureKind::Categorical if category_text(value).is_none() => {
                    return Err(SchemaError::NotCategorical {
                        row,
                        column: column.name.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate a whole batch, stopping at the first offending record.
    pub fn validate_batch(&self, records: &[CustomerRecord]) -> Result<(), SchemaError> {
        records
            .iter()
            .enumerate()
            .try_for_each(|(row, record)| self.validate_record(row, record))
    }
}
