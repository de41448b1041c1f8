pub mod aqi;
pub mod error;
pub mod forecast;
pub mod health;
pub mod train;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::service::AppState;

pub fn router(state: AppState) -> Router {
    let cfg = state.cfg.clone();

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/forecast", post(forecast::forecast))
        .route("/train", post(train::retrain))
        .route("/aqi", post(aqi::calculate_aqi))
        .with_state(state);

    if cfg.server.enable_cors {
        use tower_http::cors::Any;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                // Training payloads can carry a year of hourly records
                .layer(axum::extract::DefaultBodyLimit::max(16 * 1024 * 1024))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(cfg.server.request_timeout_secs),
                )),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::service::tests::test_config;

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn conditions() -> Value {
        json!({
            "temperature": 22.5,
            "humidity": 65.0,
            "wind_speed": 8.0,
            "pressure": 1010.0,
            "hour": 7,
            "day_of_week": 1,
            "month": 10,
            "season": 3,
            "location": "Harbor"
        })
    }

    fn app(dir: &std::path::Path) -> Router {
        let state = AppState::bootstrap(test_config(dir)).unwrap();
        router(state)
    }

    #[tokio::test]
    async fn test_health_reports_trained_pollutants() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["trained_pollutants"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_health_degraded_without_models() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_models(test_config(dir.path()), Default::default()).unwrap();
        let (status, body) = send(router(state), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_forecast_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = conditions();
        request["hours_ahead"] = json!(30);

        let (status, body) = send(app(dir.path()), "POST", "/forecast", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"], "Harbor");
        assert_eq!(body["forecasts"]["pm25"].as_array().unwrap().len(), 30);
        assert_eq!(body["hourly_aqi"].as_array().unwrap().len(), 24);
        assert_eq!(body["daily_summary"].as_array().unwrap().len(), 2);
        assert!(body["hourly_aqi"][0]["level"].is_string());
        assert_eq!(body["current_conditions"]["hour"], 7);
    }

    #[tokio::test]
    async fn test_forecast_rejects_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = conditions();
        request.as_object_mut().unwrap().remove("pressure");

        let (status, body) = send(app(dir.path()), "POST", "/forecast", Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("pressure"));
    }

    #[tokio::test]
    async fn test_train_with_records() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<Value> = (0..48)
            .map(|h| {
                json!({
                    "datetime": format!("2023-06-{:02}T{:02}:00:00", 1 + h / 24, h % 24),
                    "temperature": 20.0,
                    "humidity": 50.0,
                    "wind_speed": 5.0 + (h % 5) as f64,
                    "pressure": 1012.0,
                    "pm25": 10.0 + h as f64,
                    "co2": 420.0
                })
            })
            .collect();

        let (status, body) = send(
            app(dir.path()),
            "POST",
            "/train",
            Some(json!({ "training_data": records })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["report"]["trained"].as_array().unwrap().len(), 2);
        assert_eq!(body["report"]["skipped"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_train_without_body_uses_simulation() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path()), "POST", "/train", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["trained"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_train_rejects_oversized_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_models(test_config(dir.path()), Default::default()).unwrap();

        for n_samples in [0_u64, 1 << 42] {
            let (status, body) = send(
                router(state.clone()),
                "POST",
                "/train",
                Some(json!({ "n_samples": n_samples })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["message"].as_str().unwrap().contains("n_samples"));
        }
        assert!(state.service.models().is_empty());
    }

    #[tokio::test]
    async fn test_request_timeout_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.server.request_timeout_secs = 0;
        let state = AppState::with_models(cfg, Default::default()).unwrap();

        let (status, _) = send(router(state), "POST", "/train", Some(json!({ "n_samples": 500 }))).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_aqi_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_models(test_config(dir.path()), Default::default()).unwrap();

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/aqi",
            Some(json!({ "concentrations": { "pm25": 10.0, "no2": 2049.0 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aqi"], 500);
        assert_eq!(body["level"], "Hazardous");
        assert_eq!(body["dominant_pollutant"], "no2");

        let (status, _) = send(
            router(state),
            "POST",
            "/aqi",
            Some(json!({ "concentrations": { "pm25": -3.0 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
