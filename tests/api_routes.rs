use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use valuation::api::router;

async fn post_raw(uri: &str, body: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request");

    let response = router().oneshot(request).await.expect("infallible router");
    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, cache_control, json)
}

#[tokio::test]
async fn wrongly_typed_field_is_a_json_bad_request() {
    let (status, cache_control, json) = post_raw("/api/validate", r#"{"wacc": "ten"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    let error = json["error"].as_str().expect("error message");
    assert!(error.starts_with("Invalid payload"), "{error}");
}

#[tokio::test]
async fn malformed_json_is_a_json_bad_request() {
    for uri in ["/api/validate", "/api/growth", "/api/sensitivity"] {
        let (status, cache_control, json) = post_raw(uri, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(cache_control.as_deref(), Some("no-store"), "{uri}");
        assert!(json["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn validate_route_returns_findings() {
    let (status, cache_control, json) = post_raw(
        "/api/validate",
        r#"{"revenueGrowthRate": 30, "wacc": 12, "terminalGrowthRate": 3}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert_eq!(json["findings"][0]["severity"], "error");
    assert_eq!(json["blocking"], true);
}

#[tokio::test]
async fn growth_route_rejects_horizon_past_limit() {
    let (status, _, json) = post_raw(
        "/api/growth",
        r#"{"stages": [{"label": "Long", "startYear": 1, "endYear": 4000000000,
             "driverRate": 5, "confidence": "low"}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some_and(|e| e.contains("stages")));
}

#[tokio::test]
async fn unknown_path_is_json_not_found() {
    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .expect("valid request");
    let response = router().oneshot(request).await.expect("infallible router");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
        Some(&b"no-store"[..])
    );
}
