//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `blockwright-adapters` crate provides implementations.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{GeneratedArtifact, ProviderRequest, Template};
use crate::error::BlockwrightResult;

/// Port for reading the template catalog.
///
/// Implemented by:
/// - `blockwright_adapters::catalog::FilesystemCatalog` (directory scan)
/// - `blockwright_adapters::catalog::InMemoryCatalog` (tests, embedding)
///
/// ## Design Notes
///
/// - Called once per request; implementations must not cache across calls
/// - Order of the returned entries is the ranking tie-break order
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> BlockwrightResult<Vec<Template>>;
}

/// Port for writing generated artifacts back into catalog storage.
///
/// Failures are reported to the caller as warnings; a successful generation
/// is never failed by its sink.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogSink: Send + Sync {
    /// Store `artifact`. `query` is the request that produced it.
    fn persist(&self, artifact: &GeneratedArtifact, query: &str) -> BlockwrightResult<()>;
}

/// Port for placeholder substitution on catalog templates.
///
/// Implemented by:
/// - `blockwright_adapters::assembler::PlaceholderAssembler`
pub trait Assembler: Send + Sync {
    /// Render `template.body` with `overrides` taking precedence over each
    /// variable's declared default.
    fn assemble(&self, template: &Template, overrides: &BTreeMap<String, String>) -> String;
}

/// Raw HTTP outcome. Status handling belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Why a request never produced a status line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed")]
    Connect,
    /// Anything else, already reduced to a short message.
    #[error("{0}")]
    Other(String),
}

/// Port for sending one provider request.
///
/// Implemented by:
/// - `blockwright_adapters::http::ReqwestTransport`
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn send(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}
