mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_returns_token_and_session_cookie() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "Owner@Example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let cookie = response.header(header::SET_COOKIE).unwrap();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = response.json();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["expiresIn"], 3600);
    assert_eq!(body["user"]["email"], "owner@example.com");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.register("dup@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "DUP@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json()["error"], "User already exists");
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "short" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(app.send(malformed).await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_checks_password() {
    let app = TestApp::new();
    app.register("login@example.com").await;

    let ok = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "login@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.json()["token"].is_string());

    let wrong = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "login@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()["error"], "Invalid email or password");

    let unknown = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new();

    let missing = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app.get("/api/invoices", "not-a-jwt").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let app = TestApp::new();
    let token = app.register("cookie@example.com").await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("access_token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], "cookie@example.com");
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = TestApp::new();
    let token = app.register("logout@example.com").await;

    let logout = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .header(header::COOKIE, format!("access_token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(logout).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let cleared = response.header(header::SET_COOKIE).unwrap().to_string();
    assert!(cleared.starts_with("access_token=;"), "{}", cleared);
    assert!(cleared.contains("Max-Age=0"), "{}", cleared);
    assert!(cleared.contains("Path=/"), "{}", cleared);

    // The browser now sends the emptied cookie back.
    let page = Request::builder()
        .uri("/invoices")
        .header(header::COOKIE, "access_token=")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(page).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_a_session_still_succeeds() {
    let app = TestApp::new();
    let response = app.request(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response
        .header(header::SET_COOKIE)
        .is_some_and(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn profile_update_does_not_touch_existing_invoices() {
    let app = TestApp::new();
    let token = app.register("profile@example.com").await;

    let mut template = app.get("/api/invoices/template", &token).await.json();
    template["customerDetails"]["name"] = json!("Globex");
    let created = app.create_invoice(&token, template).await;
    assert_eq!(created["companyDetails"]["name"], "Acme Pty Ltd");

    let response = app
        .request(
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "companyProfile": { "name": "Renamed Co", "bsb": "111-222" } })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["companyProfile"]["name"], "Renamed Co");

    let me = app.get("/api/auth/me", &token).await.json();
    assert_eq!(me["companyProfile"]["bsb"], "111-222");

    let id = created["_id"].as_str().unwrap();
    let stored = app.get(&format!("/api/invoices/{}", id), &token).await.json();
    assert_eq!(stored["companyDetails"]["name"], "Acme Pty Ltd");

    let template = app.get("/api/invoices/template", &token).await.json();
    assert_eq!(template["companyDetails"]["name"], "Renamed Co");
}
