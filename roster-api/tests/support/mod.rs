//! Shared harness for router-level tests: an in-memory store behind the full
//! router, plus request builders that carry a bearer token.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use roster_api::{create_api_router, generate_jwt_token, ApiConfig, AppState, AuthConfig};
use roster_core::{AdminId, AgentId, EntityIdType, Role};
use roster_storage::InMemoryStore;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "roster-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub auth: AuthConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let auth = AuthConfig::default();
        let state = AppState::new(store.clone(), ApiConfig::default());
        let router = create_api_router(state, auth.clone()).expect("router builds");
        Self {
            router,
            store,
            auth,
        }
    }

    pub fn admin_token(&self, admin: AdminId) -> String {
        generate_jwt_token(&self.auth, admin.as_uuid(), Role::Admin).expect("admin token")
    }

    pub fn agent_token(&self, agent: AgentId) -> String {
        generate_jwt_token(&self.auth, agent.as_uuid(), Role::Agent).expect("agent token")
    }

    /// Send a request and decode the body as JSON (`Value::Null` when empty
    /// or not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, Body::empty(), None))
            .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, Some(token), Body::empty(), None))
            .await
    }

    pub async fn post_empty(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Some(token), Body::empty(), None))
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(request(
            method,
            uri,
            Some(token),
            Body::from(body.to_string()),
            Some("application/json".to_string()),
        ))
        .await
    }

    pub async fn upload(&self, token: &str, file_name: &str, bytes: &[u8]) -> (StatusCode, Value) {
        self.send(request(
            Method::POST,
            "/api/lists/upload",
            Some(token),
            Body::from(multipart_body(file_name, bytes)),
            Some(format!("multipart/form-data; boundary={}", BOUNDARY)),
        ))
        .await
    }
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<String>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("valid request")
}

/// A multipart body with a single `file` part.
pub fn multipart_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn new_admin() -> AdminId {
    AdminId::new(Uuid::now_v7())
}
