//! Developer utility to score a model artifact against a labeled dataset.

use std::path::PathBuf;

use churnlens::artifact::{CHURN_CLASS, ModelArtifact};
use churnlens::dataset::load_records;
use churnlens::features::UnseenCategoryPolicy;
use churnlens::ml::metrics::evaluate;
use churnlens::training::extract_labels;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_path: PathBuf,
    dataset_path: PathBuf,
    unseen: UnseenCategoryPolicy,
    json: bool,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let artifact = ModelArtifact::load_json(&options.model_path).map_err(|err| err.to_string())?;
    let records = load_records(&options.dataset_path).map_err(|err| err.to_string())?;

    let x = artifact
        .features
        .encode_batch(&records, options.unseen)
        .map_err(|err| err.to_string())?;
    let y = extract_labels(&records, artifact.schema().label_column())
        .map_err(|err| err.to_string())?;
    let report = evaluate(&artifact.classifier, &x, &y, CHURN_CLASS);

    if options.json {
        let text = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("{text}");
        return Ok(());
    }
    println!("rows: {}", report.rows);
    println!("accuracy: {:.4}", report.accuracy);
    println!(
        "churn precision={:.3}  recall={:.3}  f1={:.3}",
        report.precision, report.recall, report.f1
    );
    println!("confusion matrix (rows=true, cols=pred):");
    for row in &report.confusion {
        let line: String = row.iter().map(|count| format!("{count:6}")).collect();
        println!("{line}");
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model_path: Option<PathBuf> = None;
    let mut dataset_path: Option<PathBuf> = None;
    let mut unseen = UnseenCategoryPolicy::Reject;
    let mut json = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                dataset_path = Some(PathBuf::from(value));
            }
            "--reserve-unseen" => unseen = UnseenCategoryPolicy::ReservedCode,
            "--json" => json = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        model_path: model_path.ok_or_else(help_text)?,
        dataset_path: dataset_path.ok_or_else(help_text)?,
        unseen,
        json,
    })
}

fn help_text() -> String {
    [
        "churnlens-eval",
        "",
        "Scores a model artifact against a labeled dataset.",
        "",
        "Usage:",
        "  churnlens-eval --model <file> --dataset <file> [--reserve-unseen] [--json]",
        "",
        "Options:",
        "  --model <file>     Model artifact (required).",
        "  --dataset <file>   Labeled CSV or JSON dataset (required).",
        "  --reserve-unseen   Map unseen categories to the reserved code instead of failing.",
        "  --json             Print the report as JSON.",
    ]
    .join("\n")
}
