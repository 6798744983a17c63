// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Explicit upstream login route.

use crate::error::Result;
use crate::middleware::session::{session_header_value, SESSION_HEADER};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/login", post(login))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Upstream session cookie to send back as `Authorization: Bearer ...`
    pub cookie: String,
    pub issued_at: String,
}

/// Log in to the upstream platform now (subject to the login cooldown).
async fn login(State(state): State<Arc<AppState>>) -> Result<(HeaderMap, Json<LoginResponse>)> {
    tracing::info!("Explicit login requested");
    let credential = state.gateway.login().await?;

    let mut headers = HeaderMap::new();
    if let Some(value) = session_header_value(&credential) {
        headers.insert(SESSION_HEADER, value);
    }

    Ok((
        headers,
        Json(LoginResponse {
            cookie: credential.value().to_string(),
            issued_at: format_utc_rfc3339(credential.issued_at()),
        }),
    ))
}
