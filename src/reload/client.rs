//! Reload client issuing the provisioning reload call.

use crate::error::{ReloaderError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default bound on a single reload call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues `POST {endpoint}` through an injected HTTP client and validates the
/// answer.
///
/// The client holds no state of its own. Authentication is the injected
/// client's concern (see [`bearer_client`](super::bearer_client)).
///
/// # Examples
///
/// ```rust,no_run
/// use provisioning_reloader::reload::ReloadClient;
///
/// # async fn example() -> provisioning_reloader::error::Result<()> {
/// let client = ReloadClient::new(reqwest::Client::new());
/// client
///     .reload("http://localhost:3000/api/admin/provisioning/dashboards/reload")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReloadClient {
    client: Client,
    timeout: Duration,
}

impl ReloadClient {
    /// Wrap an HTTP client, using the default request timeout.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the endpoint to reload provisioned configuration.
    ///
    /// The response body is always read to the end, which hands the
    /// connection back to the pool whether or not the call succeeded.
    ///
    /// # Errors
    ///
    /// - [`ReloaderError::Request`] if the request could not be completed
    /// - [`ReloaderError::ReadBody`] if the body could not be read
    /// - [`ReloaderError::UnexpectedStatus`] for any status other than 200
    pub async fn reload(&self, endpoint: &str) -> Result<()> {
        let response = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ReloaderError::Request)?;

        let status = response.status();
        let body = response.bytes().await.map_err(ReloaderError::ReadBody)?;

        check_response(status, &body)
    }
}

/// Accept exactly 200; anything else carries the status and body verbatim.
pub fn check_response(status: StatusCode, body: &[u8]) -> Result<()> {
    if status != StatusCode::OK {
        return Err(ReloaderError::UnexpectedStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RELOAD_PATH: &str = "/api/admin/provisioning/dashboards/reload";

    #[test]
    fn test_check_response_ok_with_any_body() {
        assert!(check_response(StatusCode::OK, b"").is_ok());
        assert!(check_response(StatusCode::OK, br#"{"message":"Dashboards config reloaded"}"#).is_ok());
    }

    #[test]
    fn test_check_response_rejects_other_success_codes() {
        let err = check_response(StatusCode::NO_CONTENT, b"").unwrap_err();
        assert!(matches!(err, ReloaderError::UnexpectedStatus { status: 204, .. }));
    }

    #[test]
    fn test_check_response_keeps_body_verbatim() {
        let err = check_response(StatusCode::FORBIDDEN, b"{\"message\":\"Permission denied\"}\n")
            .unwrap_err();
        match err {
            ReloaderError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "{\"message\":\"Permission denied\"}\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_reload_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(RELOAD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("reloaded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ReloadClient::new(Client::new());
        let endpoint = format!("{}{}", mock_server.uri(), RELOAD_PATH);
        assert!(client.reload(&endpoint).await.is_ok());
    }

    #[tokio::test]
    async fn test_reload_sends_no_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(RELOAD_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = ReloadClient::new(Client::new());
        let endpoint = format!("{}{}", mock_server.uri(), RELOAD_PATH);
        client.reload(&endpoint).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_reload_failure_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(RELOAD_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
            .mount(&mock_server)
            .await;

        let client = ReloadClient::new(Client::new());
        let endpoint = format!("{}{}", mock_server.uri(), RELOAD_PATH);
        let err = client.reload(&endpoint).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected status code: 500, body: database locked"
        );
    }

    #[tokio::test]
    async fn test_reload_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let client = ReloadClient::new(Client::new()).with_timeout(Duration::from_millis(100));
        let endpoint = format!("{}{}", mock_server.uri(), RELOAD_PATH);
        let err = client.reload(&endpoint).await.unwrap_err();
        assert!(matches!(err, ReloaderError::Request(_)));
    }

    #[tokio::test]
    async fn test_reload_connection_refused() {
        let client = ReloadClient::new(Client::new()).with_timeout(Duration::from_secs(1));
        let err = client
            .reload("http://127.0.0.1:1/api/admin/provisioning/dashboards/reload")
            .await
            .unwrap_err();
        assert!(matches!(err, ReloaderError::Request(_)));
    }

    #[test]
    fn test_default_timeout() {
        let client = ReloadClient::new(Client::new());
        assert_eq!(client.timeout(), DEFAULT_REQUEST_TIMEOUT);
    }
}
