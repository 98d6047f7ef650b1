use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One row of customer data: column name to JSON scalar.
///
/// Rows coming from HTTP callers and rows loaded from disk share this shape,
/// so extra columns (identifiers, dates, free text) travel along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerRecord(Map<String, Value>);

impl CustomerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for CustomerRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for CustomerRecord {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Interpret a raw CSV cell as a JSON scalar.
///
/// Empty cells and non-finite numbers become `null`; integers stay integers.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return Number::from_f64(float).map_or(Value::Null, Value::Number);
    }
    Value::String(trimmed.to_string())
}

/// Canonical text of a scalar used as a category, `None` for null and containers.
pub fn category_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Borrowed(if *flag { "true" } else { "false" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric reading of a scalar; numeric strings are accepted.
///
/// Values outside the finite `f32` range are rejected, since features are
/// encoded as `f32`.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number as f32).is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_parse_to_typed_scalars() {
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("  "), Value::Null);
        assert_eq!(parse_cell("12"), json!(12));
        assert_eq!(parse_cell("0.75"), json!(0.75));
        assert_eq!(parse_cell("NaN"), Value::Null);
        assert_eq!(parse_cell(" East "), json!("East"));
        assert_eq!(parse_cell("2023-01-05"), json!("2023-01-05"));
    }

    #[test]
    fn category_text_is_canonical() {
        assert_eq!(category_text(&json!("A")).as_deref(), Some("A"));
        assert_eq!(category_text(&json!(3)).as_deref(), Some("3"));
        assert_eq!(category_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(category_text(&Value::Null), None);
        assert_eq!(category_text(&json!(["A"])), None);
    }

    #[test]
    fn numeric_value_accepts_numbers_and_numeric_text() {
        assert_eq!(numeric_value(&json!(50)), Some(50.0));
        assert_eq!(numeric_value(&json!("0.8")), Some(0.8));
        assert_eq!(numeric_value(&json!("high")), None);
        assert_eq!(numeric_value(&json!(true)), None);
    }

    #[test]
    fn numeric_value_rejects_values_beyond_f32_range() {
        assert_eq!(numeric_value(&json!(1e39)), None);
        assert_eq!(numeric_value(&json!("-1e39")), None);
        assert_eq!(numeric_value(&json!("inf")), None);
        assert_eq!(numeric_value(&json!(3.0e38)), Some(3.0e38));
    }

    #[test]
    fn record_round_trips_through_json_as_plain_object() {
        let record = CustomerRecord::new()
            .with("Customer_ID", "C1")
            .with("Retention_Rate", 0.5);
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"Customer_ID":"C1","Retention_Rate":0.5}"#);
        let back: CustomerRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
