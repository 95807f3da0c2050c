#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use dealroom_cloud::S3Config;
use dealroom_core::clock::ManualClock;
use dealroom_core::listing::Listing;
use dealroom_core::memory::{InMemoryStore, MemoryDocumentStore};
use dealroom_core::roles::{ROLE_BUYER, ROLE_SELLER};
use dealroom_core::types::DbId;
use dealroom_events::EventBus;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use dealroom_api::auth::jwt::{generate_access_token, JwtConfig};
use dealroom_api::config::ServerConfig;
use dealroom_api::router::build_app_router;
use dealroom_api::state::AppState;

pub const SELLER: DbId = 10;
pub const BUYER: DbId = 20;
pub const OTHER_BUYER: DbId = 30;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        s3: S3Config {
            bucket: "test-documents".to_string(),
            ..S3Config::default()
        },
        download_url_ttl: Duration::from_secs(900),
        orphan_sweep_interval: None,
        orphan_sweep_grace: Duration::from_secs(3600),
    }
}

/// The router plus handles on every in-memory collaborator behind it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub blobs: Arc<MemoryDocumentStore>,
    pub clock: Arc<ManualClock>,
    pub event_bus: Arc<EventBus>,
    pub config: ServerConfig,
}

/// Build the full application router with all middleware layers over
/// in-memory collaborators. Uses the same builder as `main.rs`.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::default());
    let blobs = Arc::new(MemoryDocumentStore::with_clock(clock.clone()));
    let event_bus = Arc::new(EventBus::default());

    let state = AppState::new(
        Arc::new(config.clone()),
        store.clone(),
        blobs.clone(),
        clock.clone(),
        event_bus.clone(),
    );
    let router = build_app_router(state, &config).expect("test config is valid");

    TestApp {
        router,
        store,
        blobs,
        clock,
        event_bus,
        config,
    }
}

impl TestApp {
    pub fn token(&self, user_id: DbId, role: &str) -> String {
        generate_access_token(user_id, role, true, &self.config.jwt).unwrap()
    }

    pub fn seller_token(&self) -> String {
        self.token(SELLER, ROLE_SELLER)
    }

    pub fn buyer_token(&self) -> String {
        self.token(BUYER, ROLE_BUYER)
    }

    /// An active listing owned by [`SELLER`].
    pub async fn listing(&self) -> Listing {
        self.store.seed_listing(SELLER, "Corner Bakery").await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.send(authed("GET", uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.send(authed("DELETE", uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(
            authed("POST", uri, token)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, listing_id: DbId, token: &str, form: Multipart) -> Response {
        let (content_type, body) = form.finish();
        self.send(
            authed("POST", &format!("/api/v1/listings/{listing_id}/documents"), token)
                .header(CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Request, send and sign an NDA for `buyer` on `listing_id`; returns
    /// the NDA id.
    pub async fn signed_nda(&self, listing_id: DbId, buyer_token: &str) -> DbId {
        let response = self
            .post_json(
                "/api/v1/ndas/request",
                buyer_token,
                serde_json::json!({ "listing_id": listing_id }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let nda_id = body_json(response).await["data"]["nda"]["id"]
            .as_i64()
            .unwrap();

        let seller = self.seller_token();
        let response = self
            .post_json(&format!("/api/v1/ndas/{nda_id}/send"), &seller, serde_json::json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = self
            .post_json(&format!("/api/v1/ndas/{nda_id}/sign"), buyer_token, serde_json::json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        nda_id
    }
}

pub fn authed(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Minimal `multipart/form-data` encoder for upload tests.
pub struct Multipart {
    boundary: &'static str,
    body: Vec<u8>,
}

impl Default for Multipart {
    fn default() -> Self {
        Self {
            boundary: "dealroom-test-boundary",
            body: Vec::new(),
        }
    }
}

impl Multipart {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// A PDF with the given document type and NDA flag.
    pub fn pdf(document_type: &str, requires_nda: bool) -> Self {
        Self::default()
            .text("document_type", document_type)
            .text("requires_nda", if requires_nda { "true" } else { "false" })
            .file("statement.pdf", "application/pdf", b"%PDF-1.7 test")
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
