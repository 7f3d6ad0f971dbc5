//! Shared test helpers for HTTP tests.
#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;

use hotspot_api::{AppState, build_app};
use hotspot_auth::Claims;
use hotspot_coa::packet::{EncodedRequest, Reply, ReplyKind};
use hotspot_coa::{CoaDispatcher, NasTransport, TransportError};
use hotspot_core::config::AppConfig;
use hotspot_core::types::SessionId;
use hotspot_entity::session::SessionRecord;
use hotspot_entity::user::OperatorRole;
use hotspot_session::MemorySessionStore;

/// NAS that NAKs every request.
pub const NAK_NAS: &str = "10.0.0.66";

/// Acknowledges every Disconnect-Request except those for [`NAK_NAS`].
#[derive(Debug)]
struct LoopbackNas;

#[async_trait]
impl NasTransport for LoopbackNas {
    async fn resolve(&self, nas_identifier: &str) -> Result<SocketAddr, TransportError> {
        nas_identifier
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, 3799))
            .map_err(|e| TransportError::Resolve {
                nas: nas_identifier.to_string(),
                reason: e.to_string(),
            })
    }

    async fn exchange(
        &self,
        remote: SocketAddr,
        request: &EncodedRequest,
    ) -> Result<Reply, TransportError> {
        let kind = if remote.ip().to_string() == NAK_NAS {
            ReplyKind::Nak
        } else {
            ReplyKind::Ack
        };
        Ok(Reply {
            kind,
            identifier: request.identifier,
            error_cause: None,
        })
    }
}

/// Test application context
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemorySessionStore>,
}

/// A collected response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let store = Arc::new(MemorySessionStore::new());
        let dispatcher = CoaDispatcher::new(config.coa.clone(), Arc::new(LoopbackNas));
        let state = AppState::new(config, Arc::clone(&store) as _, dispatcher);
        Self {
            router: build_app(state.clone()),
            state,
            store,
        }
    }

    /// Track a session as if an accounting start had been received.
    pub fn add_session(&self, id: &str, nas: &str) -> SessionId {
        let session_id = SessionId::new(id);
        self.state.registry.insert(SessionRecord::new(
            session_id.clone(),
            "255712000111_GG42",
            nas,
            Utc::now(),
        ));
        session_id
    }

    /// Mint a token the app accepts.
    pub fn token(&self, role: OperatorRole) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: format!("{}-operator", role.as_str()),
            role,
            username: None,
            iat: now,
            exp: now + 600,
            iss: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.state.config.auth.jwt_secret.as_bytes()),
        )
        .unwrap()
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }
}
