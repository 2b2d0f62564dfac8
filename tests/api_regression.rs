use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use argo_mld::api::{router, AppState};
use argo_mld::PipelineConfig;

fn app() -> Router {
    router(AppState::new(PipelineConfig::default()))
}

fn profile_records(depths: &[f64], temps: &[f64]) -> Value {
    let records: Vec<Value> = depths
        .iter()
        .zip(temps)
        .map(|(d, t)| {
            json!({
                "platform_number": "2902746",
                "cycle_number": 12,
                "date_time": "2019-07-01T12:00:00Z",
                "latitude": 15.0,
                "longitude": 88.5,
                "pres_adjusted": d,
                "temp_adjusted": t,
                "psal_adjusted": 34.2,
                "temp_adjusted_qc": "1"
            })
        })
        .collect();
    Value::Array(records)
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn features_endpoint_returns_matrix_and_target() {
    let body = json!({ "records": profile_records(&[5.0, 10.0, 20.0], &[20.0, 20.0, 18.0]) });
    let (status, out) = post(app(), "/api/features", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["n_rows"], 3);
    assert_eq!(out["y"], json!([20.0, 20.0, 20.0]));
    assert_eq!(out["feature_names"][0], "temperature");
    assert_eq!(out["x"][0].as_array().map(Vec::len), Some(7));
}

#[tokio::test]
async fn request_config_overrides_defaults() {
    let body = json!({
        "records": profile_records(&[5.0, 10.0, 20.0], &[20.0, 19.8, 19.7]),
        "config": { "threshold": 0.1, "features": ["depth", "temperature"] }
    });
    let (status, out) = post(app(), "/api/features", body).await;

    assert_eq!(status, StatusCode::OK);
    // |19.7 - 19.8| = 0.1 не превышает порог, |20.0 - 19.8| = 0.2 превышает
    assert_eq!(out["y"], json!([5.0, 5.0, 5.0]));
    assert_eq!(out["feature_names"], json!(["temperature", "depth"]));
}

#[tokio::test]
async fn mld_endpoint_summarises_profiles() {
    let body = json!({ "records": profile_records(&[5.0, 10.0, 20.0], &[20.0, 20.0, 18.0]) });
    let (status, out) = post(app(), "/api/mld", body).await;

    assert_eq!(status, StatusCode::OK);
    let profiles = out["profiles"].as_array().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["mixed_layer_depth"], 20.0);
    assert_eq!(profiles[0]["n_observations"], 3);
}

#[tokio::test]
async fn sequences_endpoint_windows_scaled_rows() {
    let depths: Vec<f64> = (1..=6).map(|i| i as f64 * 10.0).collect();
    let temps: Vec<f64> = depths.iter().map(|d| 26.0 - d * 0.005).collect();
    let body = json!({
        "records": profile_records(&depths, &temps),
        "time_steps": 3
    });
    let (status, out) = post(app(), "/api/sequences", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["n_windows"], 3);
    assert_eq!(out["x"][0].as_array().map(Vec::len), Some(3));
    assert_eq!(out["target_range"], json!([60.0, 60.0]));
}

#[tokio::test]
async fn schema_errors_are_unprocessable() {
    let mut records = profile_records(&[5.0, 10.0], &[20.0, 20.0]);
    for record in records.as_array_mut().unwrap() {
        record.as_object_mut().unwrap().remove("latitude");
    }
    let (status, out) = post(app(), "/api/features", json!({ "records": records })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(out["error"].as_str().unwrap().contains("latitude"));
}

#[tokio::test]
async fn oversized_window_returns_no_windows() {
    let body = json!({
        "records": profile_records(&[5.0, 10.0, 20.0], &[20.0, 20.0, 18.0]),
        "time_steps": usize::MAX / 2
    });
    let (status, out) = post(app(), "/api/sequences", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["n_windows"], 0);
    assert_eq!(out["x"], json!([]));
}
