//! HTTP surface of the inference service.
//!
//! Two routes: `GET /get_data` returns the historical dataset, `POST
//! /predict_churn` predicts a batch of records. Handlers receive all state
//! through [`AppState`]; there are no globals.

mod handlers;

use std::path::PathBuf;

use actix_web::{App, HttpServer, web};

use crate::config::ServerSettings;
use crate::inference::InferenceService;

pub use handlers::{ErrorBody, get_data, predict_churn};

/// Shared, read-only state handed to every worker.
#[derive(Debug)]
pub struct AppState {
    pub service: InferenceService,
    /// Dataset served by `GET /get_data`, read on every request.
    pub dataset_path: PathBuf,
}

impl AppState {
    pub fn new(service: InferenceService, dataset_path: PathBuf) -> Self {
        Self {
            service,
            dataset_path,
        }
    }
}

/// Register the service routes; shared by [`run`] and handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/get_data", web::get().to(get_data))
        .route("/predict_churn", web::post().to(predict_churn));
}

/// Bind and serve until the server is stopped.
pub async fn run(settings: &ServerSettings, state: web::Data<AppState>) -> std::io::Result<()> {
    let payload_limit = settings.max_payload_bytes;
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .configure(configure)
    });
    if settings.workers > 0 {
        server = server.workers(settings.workers);
    }
    let server = server.bind((settings.host.as_str(), settings.port))?;
    tracing::info!("Listening on {}:{}", settings.host, settings.port);
    server.run().await
}
