//! HTTP client construction with bearer-token authentication.

use crate::error::{ReloaderError, Result};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

/// Build an HTTP client that sends `Authorization: Bearer {token}` on every
/// request.
///
/// The header is marked sensitive so it never shows up in debug output.
///
/// # Errors
///
/// Returns [`ReloaderError::InvalidToken`] if the token contains characters
/// that are not allowed in a header, and [`ReloaderError::HttpClient`] if the
/// client cannot be constructed.
///
/// # Examples
///
/// ```rust
/// use provisioning_reloader::reload::bearer_client;
///
/// # fn example() -> provisioning_reloader::error::Result<()> {
/// let client = bearer_client("glsa_service_account_token")?;
/// # Ok(())
/// # }
/// ```
pub fn bearer_client(token: &str) -> Result<Client> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ReloaderError::InvalidToken(e.to_string()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);

    Client::builder()
        .default_headers(headers)
        .build()
        .map_err(ReloaderError::HttpClient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::ReloadClient;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_bearer_header_attached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ReloadClient::new(bearer_client("s3cret").unwrap());
        let endpoint = format!("{}/api/admin/provisioning/plugins/reload", mock_server.uri());
        assert!(client.reload(&endpoint).await.is_ok());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = bearer_client("line\nbreak");
        assert!(matches!(result, Err(ReloaderError::InvalidToken(_))));
    }
}
