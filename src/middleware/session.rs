// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-supplied session credential extraction.
//!
//! The service may run as several instances, so the upstream cookie is
//! threaded through the client rather than kept in server-side sessions.

use crate::models::Credential;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

/// Cookie a browser may use to hand the credential back.
pub const SESSION_COOKIE_NAME: &str = "race_session";

/// Response header carrying the credential to use on the next request.
pub const SESSION_HEADER: &str = "x-session-cookie";

/// Credential the client sent with this request, if any.
#[derive(Debug, Clone, Default)]
pub struct SuppliedCredential(pub Option<Credential>);

/// Attach a [`SuppliedCredential`] extension to every request. Never rejects:
/// a missing credential simply means the server-held one is used.
pub async fn attach_session(jar: CookieJar, mut request: Request, next: Next) -> Response {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        Some(cookie.value().to_string())
    } else {
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string)
    };

    let supplied = token
        .filter(|t| !t.trim().is_empty())
        .map(Credential::from_client);

    request.extensions_mut().insert(SuppliedCredential(supplied));
    next.run(request).await
}

fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

/// Header value for handing a credential back; `None` if it is not a valid
/// header string.
pub fn session_header_value(credential: &Credential) -> Option<HeaderValue> {
    HeaderValue::from_str(credential.value()).ok()
}
