//! HTTP transport for provider requests.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use blockwright_core::{
    application::ports::{GenerationTransport, TransportError, TransportResponse},
    domain::ProviderRequest,
};

/// [`GenerationTransport`] over a shared `reqwest` client.
///
/// Only reports what happened on the wire; status interpretation and
/// retries belong to the caller.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Fails when the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("blockwright/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenerationTransport for ReqwestTransport {
    #[instrument(skip_all, fields(provider = %request.provider, model = %request.model))]
    async fn send(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(timeout)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_send_error)?;
        debug!(status, bytes = body.len(), "provider responded");

        Ok(TransportResponse { status, body })
    }
}

/// Maps reqwest errors to short, credential-free reasons.
fn map_send_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect
    } else if error.is_decode() || error.is_body() {
        TransportError::Other("response body could not be read".into())
    } else {
        TransportError::Other("request failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwright_core::domain::{GenerationParams, Prompt, ProviderKind};

    #[tokio::test]
    async fn unreachable_endpoint_is_a_connect_error() {
        let transport = ReqwestTransport::new().unwrap();
        let mut request = ProviderRequest::build(
            ProviderKind::OpenAi,
            "gpt-4o-mini",
            "sk-test",
            &Prompt {
                system: "s".into(),
                user: "u".into(),
            },
            GenerationParams::default(),
        );
        // Nothing listens on the loopback discard port.
        request.url = "http://127.0.0.1:9/v1/chat/completions".into();

        let err = transport
            .send(&request, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect | TransportError::Timeout));
    }
}
