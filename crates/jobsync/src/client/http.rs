/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! HTTP implementation of [`StatusClient`] using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Serialize;
use tracing::debug;

use super::{StatusClient, StatusResponse};
use crate::error::StatusClientError;

const STATUS_PATH: &str = "rap/status/";

#[derive(Serialize)]
struct StatusRequest<'a> {
    rap_ids: &'a [String],
}

/// Talks to the controller's `POST /rap/status/` endpoint.
#[derive(Debug, Clone)]
pub struct HttpStatusClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpStatusClient {
    /// Builds a client for the controller at `base_url`.
    ///
    /// `token` is sent verbatim in the `Authorization` header when non-empty.
    /// `timeout` bounds the whole request, connection included.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, StatusClientError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(StatusClientError::Configuration(
                "controller base URL must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !token.is_empty() {
            let mut value = HeaderValue::from_str(token).map_err(|e| {
                StatusClientError::Configuration(format!("invalid controller token: {}", e))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StatusClientError::Configuration(e.to_string()))?;

        Ok(Self {
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), STATUS_PATH),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatusClient for HttpStatusClient {
    async fn fetch_status(&self, rap_ids: &[String]) -> Result<StatusResponse, StatusClientError> {
        debug!(endpoint = %self.endpoint, rap_ids = rap_ids.len(), "Querying controller status");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&StatusRequest { rap_ids })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(StatusClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| StatusClientError::Decode(e.to_string()))
    }
}
