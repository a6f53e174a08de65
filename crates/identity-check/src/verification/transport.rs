//! HTTP transport for the allow-list service.

use std::time::Duration;

use super::error::VerificationError;

/// Sends a JSON POST and yields the raw response body of a successful (2xx) response.
///
/// Non-success statuses must come back as [`VerificationError::Status`]. The client parses the
/// body itself, so implementations don't need to know anything about the payloads.
pub trait Transport: Send + Sync + 'static {
    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<String, VerificationError>> + Send;
}

/// [`Transport`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the underlying client with a whole-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, VerificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerificationError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, VerificationError> {
        let response = self.client.post(url).json(body).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::debug!("Verification transport: HTTP {status} from {url}, body: {body}");
            return Err(VerificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        log::trace!("Verification transport: raw response body from {url}: {body}");
        Ok(body)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> VerificationError {
    if e.is_timeout() {
        VerificationError::Timeout
    } else {
        VerificationError::Transport(e.to_string())
    }
}
