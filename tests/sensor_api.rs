mod common;

use admin_gate::app::build_router;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{
    ADMIN_TOKEN, FakeAdmin, SENSOR_READER_TOKEN, SENSOR_WRITER_TOKEN, read_json, state_with,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    build_router(state_with(std::sync::Arc::new(FakeAdmin::default())))
}

fn call(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn reading(status: &str) -> Value {
    json!({
        "robotId": "robot-001",
        "position": { "x": 12, "y": 40.5 },
        "taskStatus": status,
        "timestamp": "1999-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn sensor_api_requires_a_token() {
    let resp = app()
        .oneshot(call(Method::GET, "/api/v1/sensors", None, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "Authentication required to access sensor management API"
    );
}

#[tokio::test]
async fn realm_admin_is_not_a_sensor_reader() {
    let resp = app()
        .oneshot(call(Method::GET, "/api/v1/sensors", Some(ADMIN_TOKEN), None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = read_json(resp).await;
    assert_eq!(body["error"]["code"], "AUTHORIZATION_ERROR");
    assert_eq!(
        body["error"]["message"],
        "Sensor writer privileges required to manage sensors"
    );
}

#[tokio::test]
async fn reader_cannot_write() {
    let router = app();

    for uri in ["/api/v1/sensors", "/api/v1/sensors/connect", "/api/v1/sensors/disconnect"] {
        let body = (uri == "/api/v1/sensors").then(|| reading("assigned"));
        let resp = router
            .clone()
            .oneshot(call(Method::POST, uri, Some(SENSOR_READER_TOKEN), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn writer_records_and_reader_sees_latest() {
    let router = app();

    let resp = router
        .clone()
        .oneshot(call(Method::GET, "/api/v1/sensors", Some(SENSOR_READER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = router
        .clone()
        .oneshot(call(
            Method::POST,
            "/api/v1/sensors",
            Some(SENSOR_WRITER_TOKEN),
            Some(reading("in_progress")),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let recorded = read_json(resp).await;
    assert_eq!(recorded["data"]["taskStatus"], "in_progress");
    // server-side timestamp wins
    assert_ne!(recorded["data"]["timestamp"], "1999-01-01T00:00:00Z");

    let resp = router
        .oneshot(call(Method::GET, "/api/v1/sensors", Some(SENSOR_READER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["data"]["robotId"], "robot-001");
    assert_eq!(body["data"]["position"]["y"], 40.5);
}

#[tokio::test]
async fn invalid_reading_is_a_validation_error() {
    let router = app();

    for body in [
        reading("lost"),
        json!({ "robotId": "robot-001", "position": { "x": "left", "y": 1 }, "taskStatus": "assigned" }),
        json!({ "robotId": " ", "position": { "x": 1, "y": 1 }, "taskStatus": "assigned" }),
    ] {
        let resp = router
            .clone()
            .oneshot(call(Method::POST, "/api/v1/sensors", Some(SENSOR_WRITER_TOKEN), Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn history_returns_readings_in_range() {
    let router = app();
    for status in ["assigned", "completed"] {
        router
            .clone()
            .oneshot(call(
                Method::POST,
                "/api/v1/sensors",
                Some(SENSOR_WRITER_TOKEN),
                Some(reading(status)),
            ))
            .await
            .unwrap();
    }

    let resp = router
        .clone()
        .oneshot(call(
            Method::GET,
            "/api/v1/sensors/history?robotId=robot-001",
            Some(SENSOR_READER_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["data"]["robotId"], "robot-001");
    assert_eq!(body["data"]["readings"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["readings"][1]["taskStatus"], "completed");

    let resp = router
        .oneshot(call(
            Method::GET,
            "/api/v1/sensors/history?startTime=2024-05-02T00:00:00Z&endTime=2024-05-01T00:00:00Z",
            Some(SENSOR_READER_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn writer_connects_and_disconnects_the_feed() {
    let router = app();

    let resp = router
        .clone()
        .oneshot(call(Method::POST, "/api/v1/sensors/connect", Some(SENSOR_WRITER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["message"], "Connected to sensor service");

    let resp = router
        .oneshot(call(Method::POST, "/api/v1/sensors/disconnect", Some(SENSOR_WRITER_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(read_json(resp).await["message"], "Disconnected from sensor service");
}
