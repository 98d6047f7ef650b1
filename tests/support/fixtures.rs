use std::path::{Path, PathBuf};

use churnlens::config::TrainingSettings;
use churnlens::dataset::CustomerRecord;

const SEGMENTS: [&str; 3] = ["A", "B", "C"];
const REGIONS: [&str; 2] = ["East", "West"];

/// Labeled customers over segments A/B/C and regions East/West.
///
/// Churn follows low retention combined with low engagement, so a small
/// forest learns it reliably.
pub fn customer_records(n: usize) -> Vec<CustomerRecord> {
    (0..n)
        .map(|i| {
            let retention = ((i * 7) % 20) as f64 / 20.0;
            let engagement = ((i * 13) % 100) as i64;
            let churned = retention < 0.5 && engagement < 60;
            CustomerRecord::new()
                .with("Customer_ID", format!("CUST{i:04}"))
                .with("Segment", SEGMENTS[i % SEGMENTS.len()])
                .with("Region", REGIONS[(i / 3) % REGIONS.len()])
                .with("Retention_Rate", retention)
                .with("Engagement_Score", engagement)
                .with("Signup_Date", format!("2023-{:02}-01", i % 12 + 1))
                .with("Churn_Flag", i64::from(churned))
        })
        .collect()
}

/// Unlabeled record with every feature column set.
pub fn customer(segment: &str, region: &str, retention: f64, engagement: i64) -> CustomerRecord {
    CustomerRecord::new()
        .with("Customer_ID", "NEW0001")
        .with("Segment", segment)
        .with("Region", region)
        .with("Retention_Rate", retention)
        .with("Engagement_Score", engagement)
}

/// Default schema with a forest small enough for tests.
pub fn training_settings() -> TrainingSettings {
    TrainingSettings {
        n_trees: 25,
        ..TrainingSettings::default()
    }
}

/// Write the fixture records as a CSV file under `dir`.
pub fn write_customer_csv(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join("customer_data.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    let columns = [
        "Customer_ID",
        "Segment",
        "Region",
        "Retention_Rate",
        "Engagement_Score",
        "Signup_Date",
        "Churn_Flag",
    ];
    writer.write_record(columns).unwrap();
    for record in customer_records(n) {
        let row: Vec<String> = columns
            .iter()
            .map(|column| match record.get(column) {
                Some(serde_json::Value::String(text)) => text.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            })
            .collect();
        writer.write_record(&row).unwrap();
    }
    writer.flush().unwrap();
    path
}
