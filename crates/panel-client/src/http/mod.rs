// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP access to the management backend.
//!
//! Wraps a `reqwest` client bound to the backend base URL. Every request is
//! bounded by the configured timeout so a hung backend shows up as an
//! ordinary failed poll.

use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::status::ServerStatusSnapshot;

const STATUS_PATH: &str = "serverstatus";
const START_MAIN_PATH: &str = "startserver";
const START_MC_PATH: &str = "startmcserver";

/// Errors returned by backend requests.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed status payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Which start button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Start the primary host.
    Primary,
    /// Start the game server on the primary host.
    Secondary,
}

impl ActionKind {
    /// Endpoint path relative to the backend base URL.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            ActionKind::Primary => START_MAIN_PATH,
            ActionKind::Secondary => START_MC_PATH,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Primary => write!(f, "primary"),
            ActionKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://panel.example.com/`.
    pub base_url: String,
    /// Upper bound for a single request, including reading the body.
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Handle to the management backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let mut base = Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "not a hierarchical URL".to_string(),
            });
        }

        // Url::join replaces the last segment unless the path ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, base })
    }

    /// The normalised base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|e| ClientError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    /// Fetch and decode the current status.
    pub async fn fetch_status(&self) -> Result<ServerStatusSnapshot, ClientError> {
        let url = self.endpoint(STATUS_PATH)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(ServerStatusSnapshot::from_json(&bytes)?)
    }

    /// Ask the backend to start a service. The response body is ignored.
    pub async fn start(&self, kind: ActionKind) -> Result<(), ClientError> {
        let url = self.endpoint(kind.path())?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Status { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{MainState, McState};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(url: &str) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: url.to_string(),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let backend = backend_for("http://panel.local:8080/mc");
        assert_eq!(backend.base_url().as_str(), "http://panel.local:8080/mc/");
        assert_eq!(
            backend.endpoint(STATUS_PATH).unwrap().as_str(),
            "http://panel.local:8080/mc/serverstatus"
        );
    }

    #[test]
    fn test_action_paths() {
        let backend = backend_for("http://panel.local/");
        assert_eq!(
            backend.endpoint(ActionKind::Primary.path()).unwrap().as_str(),
            "http://panel.local/startserver"
        );
        assert_eq!(
            backend.endpoint(ActionKind::Secondary.path()).unwrap().as_str(),
            "http://panel.local/startmcserver"
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = HttpBackend::new(&BackendConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidUrl { .. })));

        let result = HttpBackend::new(&BackendConfig {
            base_url: "mailto:ops@example.com".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_status_decodes_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/serverstatus"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"main":"running","mc":"running","ssh":true,"ip":"1.2.3.4","players":{"Alice":true}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let snapshot = backend_for(&mock_server.uri()).fetch_status().await.unwrap();
        assert_eq!(snapshot.main, Some(MainState::Running));
        assert_eq!(snapshot.mc, Some(McState::Running));
        assert!(snapshot.ssh);
        assert_eq!(snapshot.ip.as_deref(), Some("1.2.3.4"));
    }

    #[tokio::test]
    async fn test_fetch_status_follows_base_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/panel/serverstatus"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"main":"stopped"}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/panel", mock_server.uri());
        let snapshot = backend_for(&url).fetch_status().await.unwrap();
        assert_eq!(snapshot.main, Some(MainState::Stopped));
    }

    #[tokio::test]
    async fn test_fetch_status_maps_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/serverstatus"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let result = backend_for(&mock_server.uri()).fetch_status().await;
        assert!(matches!(
            result,
            Err(ClientError::Status { status, .. }) if status == StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn test_fetch_status_maps_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/serverstatus"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"main\":"))
            .mount(&mock_server)
            .await;

        let result = backend_for(&mock_server.uri()).fetch_status().await;
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_status_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/serverstatus"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"main":"running"}"#)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let backend = HttpBackend::new(&BackendConfig {
            base_url: mock_server.uri(),
            request_timeout: Duration::from_millis(200),
        })
        .unwrap();

        match backend.fetch_status().await {
            Err(ClientError::Request(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_posts_json_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/startmcserver"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        backend_for(&mock_server.uri())
            .start(ActionKind::Secondary)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_start_reports_rejection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/startserver"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Function already called"))
            .mount(&mock_server)
            .await;

        let result = backend_for(&mock_server.uri()).start(ActionKind::Primary).await;
        match result {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "Function already called");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
