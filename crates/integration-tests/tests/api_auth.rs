use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use integration_tests::{alumni, platform_admin, read_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn writes_without_a_token_are_unauthenticated() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/forums",
            None,
            Some(json!({ "name": "General", "description": "d" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn forged_token_is_rejected_on_protected_routes() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/topics",
            "header.payload.signature",
            json!({ "forumId": uuid::Uuid::now_v7(), "title": "t", "content": "c" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn bad_token_on_public_route_reads_as_anonymous() {
    let app = TestApp::new();
    let (status, body) = app.get_as("/api/events", "garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"], json!([]));
    assert_eq!(body["currentPage"], 1);
}

#[tokio::test]
async fn non_bearer_scheme_is_ignored() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/topics/{}", uuid::Uuid::now_v7()))
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let (status, _) = read_json(app.send(request).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn errors_carry_a_message_body() {
    let app = TestApp::new();
    let member = alumni();

    let (status, body) = app
        .post(
            "/api/forums",
            &app.token(&member),
            json!({ "name": "Mine", "description": "d" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().starts_with("Not authorized"));

    let (status, body) = app.get(&format!("/api/forums/{}", uuid::Uuid::now_v7())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("Forum"));

    let (status, body) = app.get("/api/forums/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new();
    let admin = platform_admin();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/schools")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(&admin)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = read_json(app.send(request).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    app.get("/api/forums").await;
    app.get("/api/forums").await;

    let response = app
        .send(Request::get("/metrics").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/openmetrics-text"));
    let (_, text) = read_json(response).await;
    let text = text.as_str().unwrap().to_string();
    assert!(
        text.contains(r#"alumni_hub_http_requests_total{method="GET",route="/api/forums",status="2xx"} 2"#),
        "{text}"
    );
}
