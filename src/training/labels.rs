use serde_json::Value;

use crate::dataset::CustomerRecord;

use super::TrainError;

/// Read a churn label as a class index (`0` stays, `1` churned).
///
/// Accepts `0`/`1` numbers, booleans and the strings `0`, `1`, `true`,
/// `false`, `yes`, `no` in any case.
pub fn parse_label(value: &Value) -> Option<usize> {
    match value {
        Value::Bool(flag) => Some(usize::from(*flag)),
        Value::Number(number) => match number.as_f64() {
            Some(v) if v == 0.0 => Some(0),
            Some(v) if v == 1.0 => Some(1),
            _ => None,
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "no" => Some(0),
            "1" | "true" | "yes" => Some(1),
            _ => None,
        },
        _ => None,
    }
}

/// Labels of every record, failing on the first missing or unreadable one.
pub fn extract_labels(records: &[CustomerRecord], column: &str) -> Result<Vec<usize>, TrainError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let value = record.get(column).unwrap_or(&Value::Null);
            parse_label(value).ok_or_else(|| TrainError::InvalidLabel {
                row,
                column: column.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_common_binary_spellings() {
        for value in [json!(1), json!(1.0), json!(true), json!("1"), json!("Yes"), json!(" TRUE ")] {
            assert_eq!(parse_label(&value), Some(1), "{value}");
        }
        for value in [json!(0), json!(false), json!("0"), json!("no"), json!("False")] {
            assert_eq!(parse_label(&value), Some(0), "{value}");
        }
        for value in [json!(2), json!(0.5), json!("maybe"), Value::Null, json!([1])] {
            assert_eq!(parse_label(&value), None, "{value}");
        }
    }

    #[test]
    fn extract_reports_row_of_bad_label() {
        let records = vec![
            CustomerRecord::new().with("Churn_Flag", 1),
            CustomerRecord::new().with("Churn_Flag", "unknown"),
        ];
        match extract_labels(&records, "Churn_Flag") {
            Err(TrainError::InvalidLabel { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "\"unknown\"");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let missing = vec![CustomerRecord::new()];
        assert!(matches!(
            extract_labels(&missing, "Churn_Flag"),
            Err(TrainError::InvalidLabel { row: 0, .. })
        ));
    }
}
