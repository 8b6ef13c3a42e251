//! Optional API key check for the chat and booking routes

use axum::{
    body::Body,
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// API Key authentication state
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    /// Every request passes when no key is configured
    fn allows(&self, headers: &HeaderMap) -> bool {
        match &self.api_key {
            None => true,
            Some(expected) => headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|provided| provided == expected),
        }
    }
}

/// Reject requests without a matching `X-API-Key` header
pub async fn auth_middleware(request: Request<Body>, next: Next) -> Response {
    let auth = request.extensions().get::<ApiKeyAuth>().cloned();

    if let Some(auth) = auth {
        if !auth.allows(request.headers()) {
            tracing::warn!(path = %request.uri().path(), "Rejected request without valid API key");
            return AppError::Unauthorized("Missing or invalid API key".to_string())
                .into_response();
        }
    }

    next.run(request).await
}
