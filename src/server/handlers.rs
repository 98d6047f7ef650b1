use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::dataset::{CustomerRecord, load_records};

/// JSON body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody { error: message })
}

/// `GET /get_data`: the historical dataset as a JSON array of records.
pub async fn get_data(state: web::Data<AppState>) -> HttpResponse {
    let path = state.dataset_path.clone();
    match web::block(move || load_records(&path)).await {
        Ok(Ok(records)) => {
            tracing::debug!("Serving {} dataset records", records.len());
            HttpResponse::Ok().json(records)
        }
        Ok(Err(err)) => {
            tracing::error!("Failed to load dataset: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// `POST /predict_churn`: one prediction per record, in request order.
pub async fn predict_churn(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let records: Vec<CustomerRecord> = match serde_json::from_slice(&body) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!("Rejected prediction request with malformed body: {err}");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("request body must be a JSON array of records: {err}"),
            );
        }
    };
    let batch_len = records.len();
    let worker_state = state.clone();
    match web::block(move || worker_state.service.predict(&records)).await {
        Ok(Ok(results)) => {
            tracing::debug!("Predicted {batch_len} records");
            HttpResponse::Ok().json(results)
        }
        Ok(Err(err)) if err.is_client_error() => {
            tracing::warn!("Rejected batch of {batch_len} records: {err}");
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Ok(Err(err)) => {
            tracing::error!("Prediction failed for batch of {batch_len} records: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
