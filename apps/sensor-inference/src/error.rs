use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::ModelError;
use crate::registry::SensorId;

pub const INSUFFICIENT_DATA_DETAIL: &str = "Dados insuficientes para análise de anomalia.";
pub const INTERNAL_DETAIL: &str = "Erro ao processar os dados.";
pub const INVALID_BODY_DETAIL: &str = "Corpo da requisição inválido.";

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The current reading does not cover every registered sensor.
    #[error("insufficient data for anomaly analysis: {} sensor(s) without a current reading", .missing.len())]
    InsufficientData { missing: Vec<SensorId> },
    #[error("anomaly detection unavailable: {0} not loaded")]
    AnomalyPathUnavailable(&'static str),
    #[error("{stage} failed: {source}")]
    Model {
        stage: &'static str,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL)
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InsufficientData { ref missing } => {
                tracing::info!(missing = ?missing, "rejecting request: incomplete current reading");
                Self::new(StatusCode::BAD_REQUEST, INSUFFICIENT_DATA_DETAIL)
            }
            other => {
                tracing::error!(error = %other, "inference failed");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
