//! Shared setup for invoicing-service integration tests: the full router over
//! the in-memory store, driven with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use invoicing_service::{
    build_router,
    export::Exporter,
    render::{MemoryAssetResolver, RenderOptions},
    services::{JwtService, MemoryStore},
    AppState,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const PAYMENT_URL: &str = "https://pay.example.com/checkout";
pub const PASSWORD: &str = "password123";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_export(
            MemoryAssetResolver::new(),
            RenderOptions {
                payment_url: PAYMENT_URL.to_string(),
                ..Default::default()
            },
        )
    }

    pub fn with_export(resolver: MemoryAssetResolver, options: RenderOptions) -> Self {
        let store = MemoryStore::new();
        let jwt = JwtService::new(&Secret::new("integration-test-secret".to_string()), 60)
            .expect("Failed to create JWT service");

        let state = AppState {
            invoices: Arc::new(store.clone()),
            users: Arc::new(store),
            jwt,
            exporter: Exporter::new(Arc::new(resolver), options, 2.0),
            db: None,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        };

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    /// Register a user with a filled-in company profile and return its token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "companyProfile": {
                        "name": "Acme Pty Ltd",
                        "address": "1 Main St\nSydney",
                        "email": "billing@acme.test",
                        "abn": "12 345 678 901",
                        "bankName": "First Bank",
                        "accountNumber": "123456789",
                        "bsb": "062-000"
                    }
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    /// Create an invoice and return its JSON.
    pub async fn create_invoice(&self, token: &str, body: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/invoices", Some(token), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()
    }
}

pub fn invoice_body(number: &str, customer: &str, status: &str, items: Value) -> Value {
    json!({
        "invoiceNumber": number,
        "invoiceDate": "2024-03-01",
        "customerDetails": { "name": customer, "address": "2 Side St" },
        "items": items,
        "status": status
    })
}
