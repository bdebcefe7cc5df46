//! Explicit per-client session state for the access gate.
//!
//! A session is stored once a login succeeds and is identified by the
//! `x-session-id` header afterwards. Failed logins never add entries. Handlers that need access take an
//! [`AuthenticatedSession`] argument; there is no ambient "logged in" flag.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    pub authenticated: bool,
}

impl SessionContext {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            authenticated: false,
        }
    }
}

/// In-memory session table shared by all requests.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionContext> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Returns the stored session, or an unsaved unauthenticated one when
    /// the id is missing or unknown. An unknown id is kept so a client can
    /// retry under the id it already holds.
    pub async fn resolve(&self, session_id: Option<&str>) -> SessionContext {
        match session_id {
            Some(id) => self.get(id).await.unwrap_or_else(|| SessionContext {
                session_id: id.to_string(),
                authenticated: false,
            }),
            None => SessionContext::new(),
        }
    }

    /// Stores the session as authenticated, inserting it if needed.
    pub async fn authenticate(&self, session_id: &str) -> SessionContext {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext {
                session_id: session_id.to_string(),
                authenticated: false,
            });
        session.authenticated = true;
        session.clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Shared-secret check. Plain string comparison; without a configured
/// code every caller is let through.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    access_code: Option<String>,
}

impl AccessGate {
    pub fn new(access_code: Option<String>) -> Self {
        Self {
            access_code: access_code.filter(|c| !c.is_empty()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.access_code.is_none()
    }

    pub fn verify(&self, candidate: &str) -> bool {
        match &self.access_code {
            None => true,
            Some(code) => code == candidate,
        }
    }
}

/// Extractor for routes behind the access gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub SessionContext);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok());

        if state.gate.is_open() {
            return Ok(AuthenticatedSession(SessionContext {
                session_id: header.unwrap_or("anonymous").to_string(),
                authenticated: true,
            }));
        }

        let session_id = header.ok_or(ApiError::Unauthenticated)?;
        match state.sessions.get(session_id).await {
            Some(session) if session.authenticated => Ok(AuthenticatedSession(session)),
            _ => Err(ApiError::Unauthenticated),
        }
    }
}
