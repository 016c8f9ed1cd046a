#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderName, Method, Request, StatusCode};
use axum::Router;
use backend::store::{MemoryStore, ProfileStore};
use backend::web::{create_router, AppState};
use serde_json::Value;
use shared::{Profile, Role};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), HeaderName::from_static("x-user-id"));
        Self {
            store,
            router: create_router(state),
        }
    }

    pub async fn add_user(&self, email: &str, role: Role) -> Uuid {
        let mut profile = Profile::new(Uuid::new_v4(), email);
        profile.role = role;
        self.store.upsert_profile(&profile).await.unwrap();
        profile.id
    }

    /// Sends a request as `user` (anonymous when `None`) and returns the
    /// status with the decoded JSON body (`Value::Null` when empty, a string
    /// when the body is not JSON).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }
}
