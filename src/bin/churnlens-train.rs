//! Developer utility to train the churn classifier and write the model artifact.

use std::path::PathBuf;

use churnlens::config::{self, AppSettings};
use churnlens::dataset::load_records;
use churnlens::logging;
use churnlens::training::train;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = config::load(options.config.as_deref()).map_err(|err| err.to_string())?;
    options.apply(&mut settings);
    let settings = settings.normalized();
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let records = load_records(&settings.paths.dataset).map_err(|err| err.to_string())?;
    let artifact = train(&records, &settings.training).map_err(|err| err.to_string())?;
    let fingerprint = artifact
        .save_json(&settings.paths.model)
        .map_err(|err| err.to_string())?;

    let summary = &artifact.training;
    println!("model: {}", settings.paths.model.display());
    println!("fingerprint: {fingerprint}");
    println!(
        "rows: {} total, {} train, {} eval",
        summary.rows_total, summary.rows_train, summary.rows_eval
    );
    for column in artifact.schema().categorical_columns() {
        if let Some(encoder) = artifact.features.encoder(column) {
            println!("{column}: {}", encoder.categories().join(", "));
        }
    }
    match &summary.evaluation {
        Some(report) => {
            println!("eval accuracy: {:.4}", report.accuracy);
            println!(
                "churn precision={:.3}  recall={:.3}  f1={:.3}",
                report.precision, report.recall, report.f1
            );
            println!("confusion matrix (rows=true, cols=pred):");
            for row in &report.confusion {
                let line: String = row.iter().map(|count| format!("{count:6}")).collect();
                println!("{line}");
            }
        }
        None => println!("no rows held out; evaluation skipped"),
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    dataset: Option<PathBuf>,
    out: Option<PathBuf>,
    trees: Option<usize>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
    max_depth: Option<usize>,
}

impl CliOptions {
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(dataset) = &self.dataset {
            settings.paths.dataset = dataset.clone();
        }
        if let Some(out) = &self.out {
            settings.paths.model = out.clone();
        }
        if let Some(trees) = self.trees {
            settings.training.n_trees = trees;
        }
        if let Some(seed) = self.seed {
            settings.training.seed = seed;
        }
        if let Some(fraction) = self.test_fraction {
            settings.training.test_fraction = fraction;
        }
        if let Some(depth) = self.max_depth {
            settings.training.max_depth = Some(depth);
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.out = Some(PathBuf::from(value));
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                options.trees = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --trees value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--test-fraction" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--test-fraction requires a value".to_string())?;
                options.test_fraction = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --test-fraction value: {value}"))?,
                );
            }
            "--max-depth" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-depth requires a value".to_string())?;
                options.max_depth = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --max-depth value: {value}"))?,
                );
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "churnlens-train",
        "",
        "Trains the churn random forest and writes the model artifact.",
        "",
        "Usage:",
        "  churnlens-train [--dataset <file>] [--out <file>] [options]",
        "",
        "Options:",
        "  --config <file>        Config file (default: config.toml in the app directory).",
        "  --dataset <file>       Labeled CSV or JSON dataset (default: paths.dataset).",
        "  --out <file>           Output artifact path (default: paths.model).",
        "  --trees <n>            Number of trees (default: 100).",
        "  --seed <u64>           RNG seed for split and forest (default: 42).",
        "  --test-fraction <f64>  Share of rows held out for evaluation (default: 0.2).",
        "  --max-depth <n>        Maximum tree depth (default: unlimited).",
    ]
    .join("\n")
}
