//! Entry point for the churn inference service.

use std::path::PathBuf;

use actix_web::web;
use churnlens::config::{self, AppSettings};
use churnlens::inference::InferenceService;
use churnlens::logging;
use churnlens::server::{self, AppState};

#[actix_web::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = config::load(options.config.as_deref()).map_err(|err| err.to_string())?;
    options.apply(&mut settings);

    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }

    if options.write_config {
        let path = match &options.config {
            Some(path) => path.clone(),
            None => config::config_path().map_err(|err| err.to_string())?,
        };
        config::save_to_path(&settings, &path).map_err(|err| err.to_string())?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let service = InferenceService::load(&settings.paths.model, settings.inference)
        .map_err(|err| format!("Failed to load model {}: {err}", settings.paths.model.display()))?;
    let state = web::Data::new(AppState::new(service, settings.paths.dataset.clone()));
    server::run(&settings.server, state)
        .await
        .map_err(|err| format!("Server error: {err}"))
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    dataset: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    write_config: bool,
}

impl CliOptions {
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(model) = &self.model {
            settings.paths.model = model.clone();
        }
        if let Some(dataset) = &self.dataset {
            settings.paths.dataset = dataset.clone();
        }
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
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
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                options.model = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset = Some(PathBuf::from(value));
            }
            "--host" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--host requires a value".to_string())?;
                options.host = Some(value.clone());
            }
            "--port" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--port requires a value".to_string())?;
                options.port = Some(
                    value
                        .parse::<u16>()
                        .map_err(|_| format!("Invalid --port value: {value}"))?,
                );
            }
            "--write-config" => options.write_config = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "churnlens",
        "",
        "Serves churn predictions over HTTP from a trained model artifact.",
        "",
        "Usage:",
        "  churnlens [--config <file>] [--model <file>] [--dataset <file>] [options]",
        "",
        "Options:",
        "  --config <file>   Config file (default: config.toml in the app directory).",
        "  --model <file>    Model artifact path (overrides paths.model).",
        "  --dataset <file>  Dataset served by GET /get_data (overrides paths.dataset).",
        "  --host <addr>     Bind address (default: 0.0.0.0).",
        "  --port <n>        Bind port (default: 5000).",
        "  --write-config    Write the effective settings to the config file and exit.",
    ]
    .join("\n")
}
