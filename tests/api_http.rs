// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use prediction_stabilizer::api::{self, AppState};
use prediction_stabilizer::config::AppConfig;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router() -> Router {
    api::router(AppState::from_config(&AppConfig::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(req.body(body).expect("build request"))
        .await
        .expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Json::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, v)
}

async fn train_all(app: &Router) {
    for i in 0..3 {
        let (st, _) = send(app, "POST", &format!("/classes/{i}/examples"), None).await;
        assert_eq!(st, StatusCode::OK);
    }
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router();
    let (st, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn predict_returns_stabilized_shape() {
    let app = test_router();
    let frame = json!({ "classIndex": 0, "confidences": { "0": 0.9, "1": 0.05, "2": 0.05 } });

    let (st, v) = send(&app, "POST", "/predict", Some(frame)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["prediction"]["classIndex"], json!(0));
    assert!(v["prediction"]["confidences"].is_object());
    assert_eq!(v["outputEnabled"], json!(false));
    assert!(v.get("selection").is_none(), "no selection before training completes");
}

#[tokio::test]
async fn malformed_frames_pass_through_unchanged() {
    let app = test_router();
    for body in [json!(null), json!({ "foo": 1 }), json!({ "confidences": "nope" })] {
        let (st, v) = send(&app, "POST", "/predict", Some(body.clone())).await;
        assert_eq!(st, StatusCode::OK);
        assert_eq!(v, body);
    }
}

#[tokio::test]
async fn non_json_bodies_are_echoed_back() {
    let app = test_router();
    for raw in ["not json", "{\"confidences\": ", ""] {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .body(Body::from(raw))
                    .expect("build request"),
            )
            .await
            .expect("oneshot");
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
        assert_eq!(&bytes[..], raw.as_bytes());
    }
}

#[tokio::test]
async fn oversized_class_keys_pass_through() {
    let app = test_router();
    train_all(&app).await;
    let frame = json!({ "confidences": { "0": 0.0, "4294967296": 0.95 } });
    let (st, v) = send(&app, "POST", "/predict", Some(frame.clone())).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v, frame);
}

#[tokio::test]
async fn indices_past_the_class_limit_do_not_win() {
    let app = test_router();
    train_all(&app).await;
    let (_, v) = send(&app, "POST", "/predict", Some(json!({ "confidences": { "0": 0.0, "6": 0.95 } }))).await;
    assert_eq!(v["prediction"]["classIndex"], json!(-1));
    assert!(v["prediction"]["confidences"].get("6").is_none());
    assert!(v.get("selection").is_none());
}

#[tokio::test]
async fn selection_fires_after_training_and_only_on_decisions() {
    let app = test_router();
    train_all(&app).await;

    let (_, v) = send(&app, "POST", "/predict", Some(json!({ "confidences": [0.3, 0.4, 0.3] }))).await;
    assert_eq!(v["prediction"]["classIndex"], json!(-1));
    assert!(v.get("selection").is_none());

    let mut last = Json::Null;
    for _ in 0..10 {
        last = send(&app, "POST", "/predict", Some(json!({ "confidences": [0.05, 0.9, 0.05] })))
            .await
            .1;
    }
    assert_eq!(last["prediction"]["classIndex"], json!(1));
    assert_eq!(last["selection"]["className"], json!("purple"));
    assert_eq!(last["selection"]["classIndex"], json!(1));
    assert_eq!(last["outputEnabled"], json!(true));
}

#[tokio::test]
async fn deleting_examples_resets_class_history() {
    let app = test_router();
    for _ in 0..5 {
        send(&app, "POST", "/predict", Some(json!({ "confidences": [0.1, 0.9, 0.0] }))).await;
    }

    let (st, _) = send(&app, "DELETE", "/classes/1/examples", None).await;
    assert_eq!(st, StatusCode::NO_CONTENT);

    // history for class 1 is empty, so its smoothed value equals the new raw value
    let (_, v) = send(&app, "POST", "/predict", Some(json!({ "confidences": { "1": 0.3 } }))).await;
    let c1 = v["prediction"]["confidences"]["1"].as_f64().unwrap();
    assert!((c1 - 0.3).abs() < 1e-6, "got {c1}");

    let (st, _) = send(&app, "DELETE", "/classes/9/examples", None).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn classes_grow_until_limit() {
    let app = test_router();
    let (_, v) = send(&app, "GET", "/classes", None).await;
    assert_eq!(v["classes"].as_array().unwrap().len(), 3);
    assert_eq!(v["maxClasses"], json!(6));

    for name in ["red", "blue", "yellow"] {
        let (st, c) = send(&app, "POST", "/classes", None).await;
        assert_eq!(st, StatusCode::CREATED);
        assert_eq!(c["name"], json!(name));
    }
    let (st, err) = send(&app, "POST", "/classes", None).await;
    assert_eq!(st, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("maximum"));

    // a new class is accepted by /predict right away
    let (_, v) = send(&app, "POST", "/predict", Some(json!({ "confidences": { "5": 0.95 } }))).await;
    assert_eq!(v["prediction"]["classIndex"], json!(5));
}

#[tokio::test]
async fn emoji_update_is_reflected_in_selection() {
    let app = test_router();
    let (st, c) = send(&app, "PUT", "/classes/0/emoji", Some(json!({ "emoji": "🥑" }))).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(c["emoji"], json!("🥑"));

    let (st, _) = send(&app, "PUT", "/classes/0/emoji", Some(json!({ "emoji": " " }))).await;
    assert_eq!(st, StatusCode::UNPROCESSABLE_ENTITY);

    train_all(&app).await;
    let (_, v) = send(&app, "POST", "/predict", Some(json!({ "confidences": [0.95, 0.05, 0.0] }))).await;
    assert_eq!(v["selection"]["emoji"], json!("🥑"));
}

#[tokio::test]
async fn emoji_choices_for_known_and_unknown_classes() {
    let app = test_router();
    let (st, v) = send(&app, "GET", "/classes/2/emoji", None).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["current"], json!("🟠"));
    assert!(v["choices"].as_array().unwrap().contains(&json!("🦊")));

    let (st, _) = send(&app, "GET", "/classes/4/emoji", None).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
}
