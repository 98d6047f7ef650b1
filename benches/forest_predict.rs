use std::hint::black_box;

use churnlens::config::{InferenceSettings, TrainingSettings};
use churnlens::dataset::CustomerRecord;
use churnlens::inference::InferenceService;
use churnlens::training::train;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const TRAIN_ROWS: usize = 2_000;
const BATCH_SIZE: usize = 500;

fn records(n: usize, labeled: bool) -> Vec<CustomerRecord> {
    (0..n)
        .map(|i| {
            let retention = ((i * 7) % 100) as f64 / 100.0;
            let engagement = ((i * 13) % 100) as i64;
            let mut record = CustomerRecord::new()
                .with("Customer_ID", format!("CUST{i:05}"))
                .with("Segment", ["A", "B", "C"][i % 3])
                .with("Region", ["East", "West"][(i / 3) % 2])
                .with("Retention_Rate", retention)
                .with("Engagement_Score", engagement);
            if labeled {
                record.insert("Churn_Flag", i64::from(retention < 0.4 && engagement < 50));
            }
            record
        })
        .collect()
}

fn service() -> InferenceService {
    let artifact = train(&records(TRAIN_ROWS, true), &TrainingSettings::default())
        .expect("train forest");
    InferenceService::new(artifact, InferenceSettings::default()).expect("service")
}

fn bench_predict_batch(c: &mut Criterion) {
    let service = service();
    let batch = records(BATCH_SIZE, false);
    c.bench_with_input(
        BenchmarkId::new("predict_batch", BATCH_SIZE),
        &batch,
        |b, batch| {
            b.iter(|| {
                service.predict(black_box(batch)).expect("predict");
            });
        },
    );
}

fn bench_forest_proba(c: &mut Criterion) {
    let service = service();
    let features = service
        .encode(&records(BATCH_SIZE, false))
        .expect("encode");
    let forest = &service.artifact().classifier;
    c.bench_function("forest_predict_proba", |b| {
        b.iter(|| {
            for row in &features {
                black_box(forest.predict_proba(black_box(row)));
            }
        });
    });
}

criterion_group!(benches, bench_predict_batch, bench_forest_proba);
criterion_main!(benches);
