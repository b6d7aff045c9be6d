//! Integration test: demo routes through the axum router

use automl_studio::config::DemoConfig;
use automl_studio::server::{create_router, AppState, ServerConfig, SESSION_COOKIE};
use automl_studio::training::ModelType;
use automl_studio::ui::{Form, MessageBarType, PREDICT_BUTTON};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn app_with_ttl(session_ttl: Duration) -> (axum::Router, Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        model_dir: dir.path().join("mymodelfolder"),
        session_ttl,
    };
    let demo = DemoConfig::default()
        .with_split_seed(21)
        .with_model_type(ModelType::NaiveBayes);
    let state = Arc::new(AppState::new(config, demo));
    (create_router(Arc::clone(&state)), state, dir)
}

fn test_app() -> (axum::Router, TempDir) {
    let (app, _, dir) = app_with_ttl(Duration::from_secs(1800));
    (app, dir)
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn api_demo(app: &axum::Router, cookie: Option<&str>, body: &str) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/demo")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn form_of(response: Response) -> Form {
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_initial_page_sets_cookie_and_disables_predict() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/demo").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with(&format!("{}=", SESSION_COOKIE)));

    let html = body_string(response).await;
    assert!(html.contains(r#"name="predict" value="true" class="primary" disabled>"#));
    assert!(html.contains("message-bar warning"));
    assert!(html.contains("Training will take a few seconds"));
}

#[tokio::test]
async fn test_api_initial_form() {
    let (app, _dir) = test_app();
    let response = api_demo(&app, None, "{}").await;
    assert_eq!(response.status(), StatusCode::OK);

    let form = form_of(response).await;
    assert!(form.button(PREDICT_BUTTON).unwrap().disabled);
    assert_eq!(form.message_bar().unwrap().0, MessageBarType::Warning);
}

#[tokio::test]
async fn test_train_then_predict_over_api() {
    let (app, _dir) = test_app();
    let first = api_demo(&app, None, "{}").await;
    let cookie = session_cookie(&first);

    let trained = api_demo(&app, Some(&cookie), r#"{"train": true}"#).await;
    assert_eq!(trained.status(), StatusCode::OK);
    assert!(trained.headers().get(header::SET_COOKIE).is_none());
    let form = form_of(trained).await;
    assert!(!form.button(PREDICT_BUTTON).unwrap().disabled);
    assert_eq!(
        form.message_bar(),
        Some((MessageBarType::Success, "Training successfully completed!"))
    );
    assert!(form.summary().starts_with("AutoML model id: NaiveBayes_1_AutoML_"));
    assert_eq!(form.predictions(), "");

    let predicted = api_demo(&app, Some(&cookie), r#"{"predict": true}"#).await;
    assert_eq!(predicted.status(), StatusCode::OK);
    let after = form_of(predicted).await;
    assert_eq!(
        after.message_bar(),
        Some((MessageBarType::Success, "Prediction successfully completed!"))
    );
    assert_eq!(after.summary(), form.summary());

    let lines: Vec<&str> = after.predictions().lines().skip(1).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| !l.trim().is_empty()));
}

#[tokio::test]
async fn test_predict_before_train_is_conflict() {
    let (app, _dir) = test_app();
    let first = api_demo(&app, None, "{}").await;
    let cookie = session_cookie(&first);

    let response = api_demo(&app, Some(&cookie), r#"{"predict": true}"#).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"], true);

    // The session is still usable and still idle.
    let form = form_of(api_demo(&app, Some(&cookie), "{}").await).await;
    assert!(form.button(PREDICT_BUTTON).unwrap().disabled);
}

#[tokio::test]
async fn test_html_form_post_trains() {
    let (app, _dir) = test_app();
    let first = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let cookie = session_cookie(&first);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/demo")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(header::COOKIE, cookie)
                .body(Body::from("train=true"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("message-bar success"));
    assert!(html.contains("Training successfully completed!"));
    assert!(html.contains("AutoML model id: NaiveBayes_1_AutoML_"));
    assert!(!html.contains("disabled>Predict"));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (app, _dir) = test_app();
    let a = session_cookie(&api_demo(&app, None, "{}").await);
    let b = session_cookie(&api_demo(&app, None, "{}").await);
    assert_ne!(a, b);

    let trained = form_of(api_demo(&app, Some(&a), r#"{"train": true}"#).await).await;
    assert!(!trained.button(PREDICT_BUTTON).unwrap().disabled);

    let other = api_demo(&app, Some(&b), r#"{"predict": true}"#).await;
    assert_eq!(other.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_sessions_do_not_accumulate() {
    let (app, state, _dir) = app_with_ttl(Duration::from_millis(300));
    let visit = || async {
        app.clone()
            .oneshot(Request::builder().uri("/demo").body(Body::empty()).unwrap())
            .await
            .unwrap()
    };

    for _ in 0..20 {
        assert_eq!(visit().await.status(), StatusCode::OK);
    }
    assert!(state.session_count().await <= 20);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let response = visit().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.session_count().await, 1);

    let stale = session_cookie(&response);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(state.evict_idle().await, 1);
    assert_eq!(state.session_count().await, 0);

    let response = api_demo(&app, Some(&stale), r#"{"train": true}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}
