use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::{FeatureKind, FeatureSchema, SchemaError};
use crate::dataset::CustomerRecord;
use crate::dataset::record::{category_text, numeric_value};

/// What to do with a category value the encoder was never fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    /// Fail the whole batch with [`EncodeError::UnseenCategory`].
    #[default]
    Reject,
    /// Map unseen values to the code one past the last known category.
    ReservedCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("record {row} has unseen category {value:?} in column {column}")]
    UnseenCategory {
        row: usize,
        column: String,
        value: String,
    },
    #[error("no category encoder for column {column}")]
    MissingEncoder { column: String },
}

/// Category text to integer code for one column.
///
/// Codes follow the sorted order of the distinct values, so fitting the same
/// value set always yields the same mapping regardless of row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CategoryEncoder {
    categories: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .map(|value| value.as_ref().to_string())
            .collect();
        Self {
            categories: set.into_iter().collect(),
        }
    }

    /// Known categories, index = code.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn code(&self, value: &str) -> Option<u32> {
        self.categories
            .binary_search_by(|probe| probe.as_str().cmp(value))
            .ok()
            .map(|idx| idx as u32)
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.categories.get(code as usize).map(String::as_str)
    }

    /// Code reserved for unseen values under [`UnseenCategoryPolicy::ReservedCode`].
    pub fn reserved_code(&self) -> u32 {
        self.categories.len() as u32
    }

    fn encode(
        &self,
        row: usize,
        column: &str,
        value: &str,
        policy: UnseenCategoryPolicy,
    ) -> Result<u32, EncodeError> {
        match (self.code(value), policy) {
            (Some(code), _) => Ok(code),
            (None, UnseenCategoryPolicy::ReservedCode) => Ok(self.reserved_code()),
            (None, UnseenCategoryPolicy::Reject) => Err(EncodeError::UnseenCategory {
                row,
                column: column.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<Vec<String>> for CategoryEncoder {
    type Error = String;

    fn try_from(categories: Vec<String>) -> Result<Self, Self::Error> {
        if categories.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("categories must be sorted and unique".to_string());
        }
        Ok(Self { categories })
    }
}

impl From<CategoryEncoder> for Vec<String> {
    fn from(encoder: CategoryEncoder) -> Self {
        encoder.categories
    }
}

/// Schema plus one fitted encoder per categorical column.
///
/// Built once by training and carried inside the model artifact, so serving
/// reproduces the training-time encoding exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    encoders: BTreeMap<String, CategoryEncoder>,
}

impl FeatureEncoder {
    /// Validate `records` against `schema` and fit every categorical column over all of them.
    pub fn fit(schema: FeatureSchema, records: &[CustomerRecord]) -> Result<Self, SchemaError> {
        schema.validate()?;
        schema.validate_batch(records)?;
        let encoders = fit_columns(&schema, records);
        Ok(Self { schema, encoders })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self, column: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(column)
    }

    pub fn encoders(&self) -> &BTreeMap<String, CategoryEncoder> {
        &self.encoders
    }

    /// Check that encoders exist for exactly the categorical columns.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.schema.validate()?;
        for column in self.schema.categorical_columns() {
            if !self.encoders.contains_key(column) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "missing encoder for categorical column {column}"
                )));
            }
        }
        for column in self.encoders.keys() {
            let categorical = self
                .schema
                .columns()
                .iter()
                .any(|c| &c.name == column && c.kind == FeatureKind::Categorical);
            if !categorical {
                return Err(SchemaError::InvalidDefinition(format!(
                    "encoder for {column} does not match a categorical column"
                )));
            }
        }
        Ok(())
    }

    /// Validate then encode a batch; any failure rejects the whole batch.
    pub fn encode_batch(
        &self,
        records: &[CustomerRecord],
        policy: UnseenCategoryPolicy,
    ) -> Result<Vec<Vec<f32>>, EncodeError> {
        self.schema.validate_batch(records)?;
        records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                encode_row(&self.schema, row, record, policy, |column| {
                    self.encoders.get(column)
                })
            })
            .collect()
    }
}

/// Fit one encoder per categorical column over the given (validated) records.
pub(crate) fn fit_columns(
    schema: &FeatureSchema,
    records: &[CustomerRecord],
) -> BTreeMap<String, CategoryEncoder> {
    schema
        .categorical_columns()
        .map(|column| (column.to_string(), fit_column(column, records)))
        .collect()
}

pub(crate) fn fit_column(column: &str, records: &[CustomerRecord]) -> CategoryEncoder {
    CategoryEncoder::fit(
        records
            .iter()
            .filter_map(|record| record.get(column))
            .filter_map(category_text),
    )
}

/// Encode one validated record in schema order, resolving encoders through `lookup`.
pub(crate) fn encode_row<'a, F>(
    schema: &FeatureSchema,
    row: usize,
    record: &CustomerRecord,
    policy: UnseenCategoryPolicy,
    lookup: F,
) -> Result<Vec<f32>, EncodeError>
where
    F: Fn(&str) -> Option<&'a CategoryEncoder>,
{
    let mut features = Vec::with_capacity(schema.len());
    for column in schema.columns() {
        let value = record
            .get(&column.name)
            .ok_or_else(|| SchemaError::MissingColumn {
                row,
                column: column.name.clone(),
            })?;
        let encoded = match column.kind {
            FeatureKind::Numeric => {
                numeric_value(value).ok_or_else(|| SchemaError::NotNumeric {
                    row,
                    column: column.name.clone(),
                    value: value.to_string(),
                })? as f32
            }
            FeatureKind::Categorical => {
                let text = category_text(value).ok_or_else(|| SchemaError::NotCategorical {
                    row,
                    column: column.name.clone(),
                })?;
                let encoder = lookup(&column.name).ok_or_else(|| EncodeError::MissingEncoder {
                    column: column.name.clone(),
                })?;
                encoder.encode(row, &column.name, &text, policy)? as f32
            }
        };
        features.push(encoded);
    }
    Ok(features)
}
