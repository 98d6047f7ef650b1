//! Column-level summary of a dataset: names, missing counts, inferred types
//! and descriptive statistics.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::record::{CustomerRecord, category_text};

/// Inferred type of a column, from its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Values of more than one kind (numbers mixed with text, ...).
    Mixed,
    /// Only nulls.
    Empty,
}

/// Descriptive statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnStats {
    Numeric {
        count: usize,
        mean: f64,
        /// Sample standard deviation; `None` with fewer than two values.
        std: Option<f64>,
        min: f64,
        #[serde(rename = "25%")]
        p25: f64,
        #[serde(rename = "50%")]
        p50: f64,
        #[serde(rename = "75%")]
        p75: f64,
        max: f64,
    },
    Categorical {
        count: usize,
        unique: usize,
        top: Option<String>,
        freq: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub row_count: usize,
    /// Columns in first-seen order across rows.
    pub column_names: Vec<String>,
    pub missing_values: BTreeMap<String, usize>,
    pub data_types: BTreeMap<String, ColumnType>,
    pub basic_stats: BTreeMap<String, ColumnStats>,
}

/// Summarize `records`. A column absent from a row counts as missing there.
pub fn summarize(records: &[CustomerRecord]) -> DatasetSummary {
    let mut column_names: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !column_names.iter().any(|known| known == column) {
                column_names.push(column.to_string());
            }
        }
    }

    let mut missing_values = BTreeMap::new();
    let mut data_types = BTreeMap::new();
    let mut basic_stats = BTreeMap::new();
    for column in &column_names {
        let values: Vec<&Value> = records
            .iter()
            .filter_map(|record| record.get(column))
            .filter(|value| !value.is_null())
            .collect();
        missing_values.insert(column.clone(), records.len() - values.len());
        let column_type = infer_type(&values);
        data_types.insert(column.clone(), column_type);
        basic_stats.insert(column.clone(), column_stats(column_type, &values));
    }

    DatasetSummary {
        row_count: records.len(),
        column_names,
        missing_values,
        data_types,
        basic_stats,
    }
}

fn infer_type(values: &[&Value]) -> ColumnType {
    let mut kind: Option<ColumnType> = None;
    for value in values {
        let this = match value {
            Value::Number(number) if number.is_i64() || number.is_u64() => ColumnType::Integer,
            Value::Number(_) => ColumnType::Float,
            Value::Bool(_) => ColumnType::Boolean,
            _ => ColumnType::Text,
        };
        kind = Some(match (kind, this) {
            (None, this) => this,
            (Some(prev), this) if prev == this => prev,
            (Some(ColumnType::Integer), ColumnType::Float)
            | (Some(ColumnType::Float), ColumnType::Integer) => ColumnType::Float,
            _ => ColumnType::Mixed,
        });
    }
    kind.unwrap_or(ColumnType::Empty)
}

fn column_stats(column_type: ColumnType, values: &[&Value]) -> ColumnStats {
    match column_type {
        ColumnType::Integer | ColumnType::Float => {
            let mut numbers: Vec<f64> = values.iter().filter_map(|value| value.as_f64()).collect();
            numeric_stats(&mut numbers)
        }
        _ => categorical_stats(values),
    }
}

fn numeric_stats(numbers: &mut [f64]) -> ColumnStats {
    numbers.sort_by(|a, b| a.total_cmp(b));
    let count = numbers.len();
    let mean = numbers.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let sq: f64 = numbers.iter().map(|v| (v - mean).powi(2)).sum();
        (sq / (count - 1) as f64).sqrt()
    });
    ColumnStats::Numeric {
        count,
        mean,
        std,
        min: numbers[0],
        p25: quantile(numbers, 0.25),
        p50: quantile(numbers, 0.5),
        p75: quantile(numbers, 0.75),
        max: numbers[count - 1],
    }
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn categorical_stats(values: &[&Value]) -> ColumnStats {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        let text = category_text(value)
            .map(|text| text.into_owned())
            .unwrap_or_else(|| value.to_string());
        *counts.entry(text).or_default() += 1;
    }
    let mut top: Option<(&String, usize)> = None;
    for (text, &count) in &counts {
        if top.is_none_or(|(_, best)| count > best) {
            top = Some((text, count));
        }
    }
    ColumnStats::Categorical {
        count: values.len(),
        unique: counts.len(),
        top: top.map(|(text, _)| text.clone()),
        freq: top.map_or(0, |(_, count)| count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<CustomerRecord> {
        vec![
            CustomerRecord::new()
                .with("Segment", "A")
                .with("Retention_Rate", 0.5)
                .with("Engagement_Score", 10),
            CustomerRecord::new()
                .with("Segment", "B")
                .with("Retention_Rate", Value::Null)
                .with("Engagement_Score", 20),
            CustomerRecord::new()
                .with("Segment", "A")
                .with("Retention_Rate", 1.0)
                .with("Engagement_Score", 30),
            CustomerRecord::new().with("Segment", "C").with("Engagement_Score", 40),
        ]
    }

    #[test]
    fn counts_missing_values_including_absent_columns() {
        let summary = summarize(&records());
        assert_eq!(summary.row_count, 4);
        assert_eq!(
            summary.column_names,
            ["Engagement_Score", "Retention_Rate", "Segment"]
        );
        assert_eq!(summary.missing_values["Retention_Rate"], 2);
        assert_eq!(summary.missing_values["Segment"], 0);
    }

    #[test]
    fn infers_column_types() {
        let summary = summarize(&records());
        assert_eq!(summary.data_types["Segment"], ColumnType::Text);
        assert_eq!(summary.data_types["Retention_Rate"], ColumnType::Float);
        assert_eq!(summary.data_types["Engagement_Score"], ColumnType::Integer);
        let mixed = summarize(&[
            CustomerRecord::new().with("x", 1),
            CustomerRecord::new().with("x", "one"),
            CustomerRecord::new().with("y", Value::Null),
        ]);
        assert_eq!(mixed.data_types["x"], ColumnType::Mixed);
        assert_eq!(mixed.data_types["y"], ColumnType::Empty);
    }

    #[test]
    fn numeric_stats_use_interpolated_quartiles() {
        let summary = summarize(&records());
        let ColumnStats::Numeric {
            count,
            mean,
            std,
            min,
            p25,
            p50,
            p75,
            max,
        } = summary.basic_stats["Engagement_Score"].clone()
        else {
            panic!("expected numeric stats");
        };
        assert_eq!(count, 4);
        assert_eq!(mean, 25.0);
        assert!((std.unwrap() - 12.909_944).abs() < 1e-5);
        assert_eq!((min, p25, p50, p75, max), (10.0, 17.5, 25.0, 32.5, 40.0));
    }

    #[test]
    fn categorical_stats_report_most_frequent_value() {
        let summary = summarize(&records());
        assert_eq!(
            summary.basic_stats["Segment"],
            ColumnStats::Categorical {
                count: 4,
                unique: 3,
                top: Some("A".to_string()),
                freq: 2,
            }
        );
    }

    #[test]
    fn summary_serializes_with_describe_style_keys() {
        let summary = summarize(&records());
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["basic_stats"]["Engagement_Score"]["50%"], json!(25.0));
        assert_eq!(value["data_types"]["Segment"], json!("text"));
    }
}
