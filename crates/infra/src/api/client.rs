//! HTTP client for the attendance submission endpoints
//!
//! `POST {base_url}/attendance/clock-in` and `/attendance/clock-out` take the
//! stored payload as the JSON body. Response bodies are ignored on success;
//! on failure the status is classified and any structured message the
//! backend sent is kept for the user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use timeclock_core::AttendanceApi;
use timeclock_domain::{ApiConfig, ClockActionType, Result as DomainResult, SubmissionError};
use tracing::{debug, info, instrument};

use super::auth::AccessTokenProvider;
use crate::http::HttpClient;

/// Configuration for the attendance API client
#[derive(Debug, Clone)]
pub struct AttendanceApiConfig {
    /// Base URL for the API (e.g., "https://hr.example.com/api")
    pub base_url: String,
    /// Timeout for a single submission
    pub timeout: Duration,
    /// Attempts when the connection cannot be established
    pub connect_attempts: usize,
}

impl Default for AttendanceApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_secs(30),
            connect_attempts: 2,
        }
    }
}

impl From<&ApiConfig> for AttendanceApiConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            ..Self::default()
        }
    }
}

pub struct AttendanceApiClient {
    http_client: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    config: AttendanceApiConfig,
}

impl AttendanceApiClient {
    pub fn new(
        config: AttendanceApiConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> DomainResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.connect_attempts)
            .user_agent(concat!("timeclock/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            auth,
            config,
        })
    }

    /// Endpoint URL for an action type.
    pub fn endpoint(&self, action_type: ClockActionType) -> String {
        format!("{}/attendance/{}", self.config.base_url.trim_end_matches('/'), action_type)
    }

    fn map_status_error(status: StatusCode, url: &str, body: &str) -> SubmissionError {
        let message = format!("{} returned status {}", url, status);
        let error = SubmissionError::from_status(status.as_u16(), message);

        match extract_api_message(body) {
            Some(api_message) => error.with_api_message(api_message),
            None => error,
        }
    }
}

#[async_trait]
impl AttendanceApi for AttendanceApiClient {
    #[instrument(skip(self, payload), fields(action_type = %action_type))]
    async fn submit(
        &self,
        action_type: ClockActionType,
        payload: &Value,
    ) -> Result<(), SubmissionError> {
        let url = self.endpoint(action_type);
        debug!(url = %url, "POST clock action");

        let mut request = self
            .http_client
            .request(Method::POST, &url)
            .header("Content-Type", "application/json")
            .json(payload);

        if let Some(token) = self.auth.access_token().await? {
            request = request.bearer_auth(token);
        }

        let timeout = self.config.timeout;
        let response = match tokio::time::timeout(timeout, self.http_client.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(SubmissionError::timeout(format!(
                    "{} did not respond within {}s",
                    url,
                    timeout.as_secs()
                )))
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, &url, &body));
        }

        info!(status = %status, "Clock action accepted");
        Ok(())
    }
}

/// Pull a human-readable message out of a JSON error body.
///
/// Recognises `{"message": ..}`, `{"error": {"message": ..}}` and
/// `{"error": ".."}`. Blank strings count as absent.
pub fn extract_api_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let candidates = [
        value.get("message"),
        value.get("error").and_then(|error| error.get("message")),
        value.get("error"),
    ];

    let found = candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string);
    found
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use timeclock_domain::SubmissionErrorKind;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::auth::StaticTokenProvider;

    fn client(base_url: String, token: Option<&str>) -> AttendanceApiClient {
        let config = AttendanceApiConfig {
            base_url,
            timeout: Duration::from_secs(2),
            connect_attempts: 1,
        };
        let auth = Arc::new(StaticTokenProvider::new(token.map(str::to_string)));
        AttendanceApiClient::new(config, auth).unwrap()
    }

    #[tokio::test]
    async fn posts_payload_with_bearer_token() {
        let server = MockServer::start().await;
        let payload = json!({
            "clockInTime": "2026-03-02T07:00:00Z",
            "location": { "lat": 1.5, "lng": 2.5, "accuracy": null }
        });

        Mock::given(method("POST"))
            .and(path("/attendance/clock-in"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "att_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(server.uri(), Some("secret"));
        client.submit(ClockActionType::ClockIn, &payload).await.unwrap();
    }

    #[tokio::test]
    async fn clock_out_uses_its_own_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/attendance/clock-out"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(format!("{}/", server.uri()), None);
        client.submit(ClockActionType::ClockOut, &json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn validation_rejection_carries_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "message": "Already clocked in today" })),
            )
            .mount(&server)
            .await;

        let err = client(server.uri(), None)
            .submit(ClockActionType::ClockIn, &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), SubmissionErrorKind::Client);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message(), "Already clocked in today");
    }

    #[tokio::test]
    async fn server_error_without_body_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(server.uri(), None)
            .submit(ClockActionType::ClockIn, &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), SubmissionErrorKind::Server);
        assert!(err.api_message().is_none());
        assert!(err.user_message().contains("502"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "token expired" })),
            )
            .mount(&server)
            .await;

        let err = client(server.uri(), Some("old"))
            .submit(ClockActionType::ClockOut, &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), SubmissionErrorKind::Auth);
        assert_eq!(err.api_message(), Some("token expired"));
    }

    #[test]
    fn extracts_known_message_shapes() {
        assert_eq!(extract_api_message(r#"{"message":"a"}"#).as_deref(), Some("a"));
        assert_eq!(extract_api_message(r#"{"error":{"message":"b"}}"#).as_deref(), Some("b"));
        assert_eq!(extract_api_message(r#"{"error":"c"}"#).as_deref(), Some("c"));
        assert_eq!(extract_api_message(r#"{"message":"  ","error":"d"}"#).as_deref(), Some("d"));
        assert_eq!(extract_api_message(r#"{"error":{"code":42}}"#), None);
        assert_eq!(extract_api_message("<html>Bad Gateway</html>"), None);
        assert_eq!(extract_api_message(""), None);
    }
}
