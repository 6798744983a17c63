// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upstream race API client.
//!
//! Handles:
//! - Account login and session cookie extraction
//! - Lightweight authenticated probe for cookie verification
//! - Race guide queries, including the link indirection
//! - Status classification (401 vs rate limit vs outage)

use crate::config::Config;
use crate::error::AppError;
use crate::models::{PageRequest, RaceGuidePayload, UpstreamRace};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use url::Url;

const AUTH_PATH: &str = "/auth";
const PROBE_PATH: &str = "/data/member/info";
const RACE_GUIDE_PATH: &str = "/data/season/race_guide";

/// The calls the auth core needs from the upstream platform.
///
/// Implemented by [`UpstreamClient`] in production and by scripted fakes in
/// tests.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Log in with the configured account and return the session cookie.
    async fn authenticate(&self) -> Result<String, AppError>;

    /// Cheap authenticated request used to check that `cookie` is still live.
    async fn probe(&self, cookie: &str) -> Result<(), AppError>;

    /// Fetch the race guide (all sessions, unfiltered).
    async fn race_guide(
        &self,
        cookie: &str,
        request: PageRequest,
    ) -> Result<Vec<UpstreamRace>, AppError>;
}

/// reqwest-backed upstream client.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl UpstreamClient {
    /// Create a client from configuration. All calls share the configured timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.upstream_base_url.clone(),
            username: config.upstream_username.clone(),
            password: config.upstream_password.clone(),
        })
    }

    /// Resolve the follow-up link carried by an indirection response.
    pub fn resolve_location(body: &serde_json::Value) -> Result<Url, AppError> {
        let link = body
            .get("link")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::UnexpectedUpstreamShape("race guide response has no link".to_string())
            })?;

        Url::parse(link).map_err(|e| {
            AppError::UnexpectedUpstreamShape(format!("race guide link is not a URL: {}", e))
        })
    }

    /// Fetch the payload a resolved link points to.
    ///
    /// Links are pre-signed, so no cookie is sent.
    pub async fn fetch_payload(&self, url: Url) -> Result<RaceGuidePayload, AppError> {
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let response = check_response(response).await?;

        response.json().await.map_err(|e| {
            AppError::UnexpectedUpstreamShape(format!("race guide payload: {}", e))
        })
    }
}

#[async_trait]
impl UpstreamApi for UpstreamClient {
    async fn authenticate(&self) -> Result<String, AppError> {
        let url = format!("{}{}", self.base_url, AUTH_PATH);
        let body = serde_json::json!({
            "email": self.username,
            "password": encode_password(&self.username, &self.password),
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_response(response).await?;

        let cookie = session_cookie(response.headers()).ok_or_else(|| {
            AppError::AuthFailure("login response carried no session cookie".to_string())
        })?;

        tracing::info!("Upstream login succeeded");
        Ok(cookie)
    }

    async fn probe(&self, cookie: &str) -> Result<(), AppError> {
        let url = format!("{}{}", self.base_url, PROBE_PATH);
        let response = self
            .http
            .get(&url)
            .header(COOKIE, cookie)
            .send()
            .await
            .map_err(transport_error)?;

        check_response(response).await?;
        Ok(())
    }

    async fn race_guide(
        &self,
        cookie: &str,
        request: PageRequest,
    ) -> Result<Vec<UpstreamRace>, AppError> {
        let url = format!("{}{}", self.base_url, RACE_GUIDE_PATH);
        let response = self
            .http
            .get(&url)
            .header(COOKIE, cookie)
            .query(&[
                ("page", request.page.to_string()),
                ("pageSize", request.page_size.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_response(response).await?;
        let body: serde_json::Value = response.json().await.map_err(|e| {
            AppError::UnexpectedUpstreamShape(format!("race guide response: {}", e))
        })?;

        let location = Self::resolve_location(&body)?;
        tracing::debug!(host = ?location.host_str(), "Following race guide link");

        let payload = self.fetch_payload(location).await?;
        Ok(payload.sessions)
    }
}

/// Password in the form the identity endpoint expects:
/// `base64(sha256(password + lowercase(email)))`.
pub fn encode_password(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(email.to_lowercase().as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Collapse every `Set-Cookie` header into one `Cookie` header value.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('=') && !pair.ends_with('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        tracing::warn!("Upstream request timed out");
    }
    AppError::UpstreamUnavailable(e.to_string())
}

/// Check response status and map failures onto the error taxonomy.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    // Unauthorized - session cookie expired or revoked
    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::CredentialRejected);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("Upstream rate limit hit (429)");
        return Err(AppError::UpstreamUnavailable("rate limited".to_string()));
    }

    // The body stays in the logs; clients only see the status.
    tracing::warn!(status = %status, body = %body, "Upstream request failed");
    Err(AppError::UpstreamUnavailable(format!("HTTP {}", status.as_u16())))
}
