// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stateless pass-through to the generative-AI endpoint.
//!
//! Requests and responses are forwarded verbatim; nothing here touches the
//! datastore.

use crate::error::AppError;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// AI endpoint client.
#[derive(Clone)]
pub struct AiProxy {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl AiProxy {
    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            endpoint,
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Forward a JSON request and return the upstream JSON body.
    pub async fn forward(&self, body: &serde_json::Value) -> Result<serde_json::Value, AppError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| AppError::Upstream("AI endpoint not configured".to_string()))?;

        let mut request = self.http.post(endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("AI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %text, "AI endpoint returned error");
            return Err(AppError::Upstream(format!("AI endpoint returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid AI response: {}", e)))
    }
}
