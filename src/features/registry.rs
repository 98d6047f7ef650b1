use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::encoder::{CategoryEncoder, fit_column};
use super::schema::FeatureSchema;
use crate::dataset::CustomerRecord;

/// Process-wide encoders fitted lazily from the first batch that mentions a column.
///
/// Each column is fitted exactly once, over that batch's distinct values
/// only, and then reused unchanged for the lifetime of the registry. The
/// resulting mapping depends on which batch arrived first, so it generally
/// differs from the training-time mapping.
#[derive(Debug, Default)]
pub struct LazyEncoderRegistry {
    encoders: Mutex<BTreeMap<String, Arc<CategoryEncoder>>>,
}

impl LazyEncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an encoder for every categorical column, fitting missing ones on `records`.
    ///
    /// Get-or-fit happens under one lock, so concurrent batches never race on
    /// creating the same column's encoder.
    pub fn resolve(
        &self,
        schema: &FeatureSchema,
        records: &[CustomerRecord],
    ) -> BTreeMap<String, Arc<CategoryEncoder>> {
        let mut encoders = self.encoders.lock().unwrap_or_else(|err| err.into_inner());
        schema
            .categorical_columns()
            .map(|column| {
                let encoder = encoders
                    .entry(column.to_string())
                    .or_insert_with(|| {
                        let fitted = fit_column(column, records);
                        tracing::info!(
                            "Fitted serving-time encoder for {column} with {} categories",
                            fitted.len()
                        );
                        Arc::new(fitted)
                    })
                    .clone();
                (column.to_string(), encoder)
            })
            .collect()
    }

    /// Copy of the current column → encoder map.
    pub fn snapshot(&self) -> BTreeMap<String, Arc<CategoryEncoder>> {
        self.encoders
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.encoders
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureColumn, FeatureKind};

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            vec![FeatureColumn::new("Segment", FeatureKind::Categorical)],
            "Customer_ID",
            "Churn_Flag",
        )
    }

    fn batch(segments: &[&str]) -> Vec<CustomerRecord> {
        segments
            .iter()
            .map(|segment| CustomerRecord::new().with("Segment", *segment))
            .collect()
    }

    #[test]
    fn first_batch_fixes_the_encoder() {
        let registry = LazyEncoderRegistry::new();
        assert!(registry.is_empty());
        let first = registry.resolve(&schema(), &batch(&["B", "C"]));
        let second = registry.resolve(&schema(), &batch(&["A", "B", "C"]));
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&first["Segment"], &second["Segment"]));
        assert_eq!(second["Segment"].categories(), ["B", "C"]);
        assert_eq!(second["Segment"].code("A"), None);
    }

    #[test]
    fn concurrent_batches_share_one_encoder_per_column() {
        let registry = Arc::new(LazyEncoderRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|idx| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let values = if idx % 2 == 0 { ["A", "B"] } else { ["C", "D"] };
                    registry.resolve(&schema(), &batch(&values))["Segment"].clone()
                })
            })
            .collect();
        let encoders: Vec<Arc<CategoryEncoder>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(encoders.iter().all(|e| Arc::ptr_eq(e, &encoders[0])));
        assert_eq!(registry.snapshot().len(), 1);
    }
}
