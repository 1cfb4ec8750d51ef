pub mod health;
pub mod inference;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(inference::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{INSUFFICIENT_DATA_DETAIL, INTERNAL_DETAIL, INVALID_BODY_DETAIL};
    use crate::test_support;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(decision: f64) -> Router {
        router(test_support::app_state(test_support::engine(
            &["Temp_Estator_Fase_U", "Corrente"],
            2,
            &["Temp_Estator_Fase_U"],
            decision,
        )))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn predicts_and_detects() {
        let (status, body) = post_json(
            app(-0.1),
            "/prever_e_detectar",
            json!({
                "historico": {
                    "Temp. Estator Fase U": [70.0, 71.0, 72.0],
                    "Corrente": [1.0, 2.0],
                    "Horario": [1.0]
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "previsoes": { "Temp_Estator_Fase_U": 73.0 },
                "anomalia": true,
                "variaveis_anomalas": [ { "variavel": "Temp_Estator_Fase_U", "valor": 72.0 } ]
            })
        );
    }

    #[tokio::test]
    async fn incomplete_reading_is_a_bad_request() {
        let (status, body) = post_json(
            app(0.1),
            "/prever_e_detectar",
            json!({ "historico": { "Temp. Estator Fase U": [70.0, 71.0, 72.0] } }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": INSUFFICIENT_DATA_DETAIL }));
    }

    #[tokio::test]
    async fn unavailable_anomaly_model_is_a_generic_500() {
        let registry = crate::registry::SensorRegistry::new(["Corrente"]).unwrap();
        let engine = crate::engine::InferenceEngine::new(
            registry,
            test_support::settings(2),
            crate::models::artifacts::ModelSnapshot::empty(),
        );
        let (status, body) = post_json(
            router(test_support::app_state(engine)),
            "/prever_e_detectar",
            json!({ "historico": { "Corrente": [1.0] } }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": INTERNAL_DETAIL }));
    }

    #[tokio::test]
    async fn non_numeric_readings_are_a_generic_500() {
        for bad in [json!("1,5"), Value::Null, json!([1.0]), json!({ "v": 1.0 })] {
            let (status, body) = post_json(
                app(0.1),
                "/prever_e_detectar",
                json!({ "historico": { "Corrente": [1.0, bad] } }),
            )
            .await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({ "detail": INTERNAL_DETAIL }));
        }
    }

    #[tokio::test]
    async fn non_numeric_readings_fail_the_monitor_too() {
        let (status, body) = post_json(
            app(0.1),
            "/monitorar",
            json!({ "historico": { "Corrente": [null] } }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": INTERNAL_DETAIL }));
    }

    #[tokio::test]
    async fn body_without_history_is_unprocessable() {
        for body in [
            json!({}),
            json!({ "historico": [1.0] }),
            json!({ "historico": { "Corrente": 1.0 } }),
        ] {
            let (status, resp) = post_json(app(0.1), "/prever_e_detectar", body).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(resp, json!({ "detail": INVALID_BODY_DETAIL }));
        }
    }

    #[tokio::test]
    async fn unparseable_body_is_unprocessable_without_parser_detail() {
        let resp = app(0.1)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/prever_e_detectar")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"historico\": {"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "detail": INVALID_BODY_DETAIL }));
    }

    #[tokio::test]
    async fn monitor_reports_deviations() {
        let (status, body) = post_json(
            app(0.1),
            "/monitorar",
            json!({
                "historico": {
                    "Temp. Estator Fase U": [70.0, 71.0, 80.0],
                    "Corrente": [1.0, 2.0]
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["anomalia"], json!(false));
        assert_eq!(
            body["sensores"],
            json!([{
                "variavel": "Temp_Estator_Fase_U",
                "real": 80.0,
                "previsto": 72.0,
                "erro": 8.0,
                "alto_desvio": true
            }])
        );
        assert_eq!(body["insuficientes"], json!(["Corrente"]));
    }

    #[tokio::test]
    async fn status_reports_loaded_models() {
        let resp = app(0.1)
            .oneshot(
                Request::builder()
                    .uri("/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["forecast_models"], json!(["Temp_Estator_Fase_U"]));
        assert_eq!(body["missing_forecast_models"], json!(["Corrente"]));
        assert_eq!(body["anomaly_path_available"], json!(true));
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let resp = app(0.1)
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
