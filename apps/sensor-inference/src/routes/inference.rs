use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::engine::{InferenceResult, MonitorReport, RawHistories};
use crate::error::{AppError, AppResult, INVALID_BODY_DETAIL};
use crate::state::AppState;

/// Series members stay untyped until the handler converts them, so a bad
/// value inside `historico` is a processing failure rather than a body
/// validation failure.
#[derive(Debug, Deserialize)]
pub(crate) struct SensorHistoryRequest {
    historico: BTreeMap<String, Vec<Value>>,
}

fn parse(payload: Result<Json<SensorHistoryRequest>, JsonRejection>) -> AppResult<RawHistories> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejecting malformed request body");
            return Err(AppError::unprocessable(INVALID_BODY_DETAIL));
        }
    };
    request
        .historico
        .into_iter()
        .map(|(name, values)| {
            let series = numeric_series(&name, &values)?;
            Ok((name, series))
        })
        .collect()
}

fn numeric_series(name: &str, values: &[Value]) -> AppResult<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            value.as_f64().ok_or_else(|| {
                tracing::error!(
                    sensor = name,
                    index = idx,
                    value = %value,
                    "non-numeric reading in history"
                );
                AppError::internal()
            })
        })
        .collect()
}

pub(crate) async fn predict_and_detect(
    State(state): State<AppState>,
    payload: Result<Json<SensorHistoryRequest>, JsonRejection>,
) -> AppResult<Json<InferenceResult>> {
    let histories = parse(payload)?;
    let result = state.engine.infer(&histories)?;
    tracing::debug!(
        forecasts = result.forecasts.len(),
        anomaly = result.anomaly,
        flagged = result.flagged.len(),
        "inference complete"
    );
    Ok(Json(result))
}

pub(crate) async fn monitor(
    State(state): State<AppState>,
    payload: Result<Json<SensorHistoryRequest>, JsonRejection>,
) -> AppResult<Json<MonitorReport>> {
    let histories = parse(payload)?;
    Ok(Json(state.engine.monitor(&histories)?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prever_e_detectar", post(predict_and_detect))
        .route("/monitorar", post(monitor))
}
