// SPDX-License-Identifier: MIT

//! HTTP implementation of [`Backend`] over reqwest.

use crate::error::BackendError;
use crate::retry::{with_retry, REQUEST_TIMEOUT};
use crate::types::{ClaimOutcome, ClaimRequest, PollResponse, StatusUpdate, UpdateResponse};
use crate::Backend;
use async_trait::async_trait;
use push_core::{ExecutionStatus, MachineIdentity, Task};

pub const DEFAULT_BASE_URL: &str = "https://api.usepush.dev";

/// Heartbeat headers attached to every poll.
const HEADER_MACHINE_ID: &str = "x-machine-id";
const HEADER_MACHINE_NAME: &str = "x-machine-name";
const HEADER_REPO_URLS: &str = "x-repo-urls";

const HTTP_BODY_SNIPPET: usize = 200;

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    identity: MachineIdentity,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        identity: MachineIdentity,
    ) -> Result<Self, BackendError> {
        let api_key = api_key.ok_or(BackendError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BackendError::from_reqwest)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, api_key, identity })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response, mapping auth and HTTP-level failures first.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth { status: status.as_u16() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(HTTP_BODY_SNIPPET).collect();
            return Err(BackendError::Http { status: status.as_u16(), body });
        }
        response.json::<T>().await.map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn poll(&self, repo_urls: &[String]) -> Result<Vec<Task>, BackendError> {
        let url = self.url("/api/tasks");
        let repo_urls = repo_urls.join(",");

        let response: PollResponse = with_retry("poll", || async {
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("machineId", self.identity.machine_id.as_str())])
                .header(HEADER_MACHINE_ID, &self.identity.machine_id)
                .header(HEADER_MACHINE_NAME, &self.identity.machine_name)
                .header(HEADER_REPO_URLS, &repo_urls)
                .send()
                .await
                .map_err(BackendError::from_reqwest)?;
            Self::decode(response).await
        })
        .await?;

        Ok(response.todos)
    }

    async fn claim(&self, display_number: u32) -> Result<ClaimOutcome, BackendError> {
        let url = self.url(&format!("/api/tasks/{display_number}/claim"));
        let body = ClaimRequest {
            display_number,
            status: ExecutionStatus::Running,
            machine_id: self.identity.machine_id.clone(),
            machine_name: self.identity.machine_name.clone(),
            atomic: true,
        };

        with_retry("claim", || async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(BackendError::from_reqwest)?;
            Self::decode(response).await
        })
        .await
    }

    async fn update_status(&self, update: StatusUpdate) -> Result<(), BackendError> {
        let url = self.url(&format!("/api/tasks/{}/status", update.display_number));

        let response: UpdateResponse = with_retry("update_status", || async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&update)
                .send()
                .await
                .map_err(BackendError::from_reqwest)?;
            Self::decode(response).await
        })
        .await?;

        if !response.success {
            return Err(BackendError::Decode("backend reported success=false".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
