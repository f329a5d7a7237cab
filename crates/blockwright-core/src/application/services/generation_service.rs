//! Generation Service - the generative path end to end.
//!
//! 1. Build the prompt
//! 2. Run the resilient client
//! 3. Split the response into artifacts
//! 4. Write each artifact through to the catalog (best-effort)

use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError, ProviderFailure, build_prompt,
        ports::CatalogSink,
        services::generation_client::ResilientClient,
    },
    domain::{DomainError, GeneratedArtifact, GenerationRequest, ProviderKind, ResponseSplitter},
    error::BlockwrightResult,
};

/// Everything one generation run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub provider: ProviderKind,
    pub model: String,
    pub artifacts: Vec<GeneratedArtifact>,
    /// Providers that failed or were skipped before `provider` answered.
    pub failed_providers: Vec<ProviderFailure>,
    /// Segments dropped by the splitter.
    #[serde(serialize_with = "as_strings")]
    pub discarded: Vec<DomainError>,
    /// Write-through failures; never fatal.
    #[serde(serialize_with = "as_strings")]
    pub warnings: Vec<ApplicationError>,
}

#[allow(clippy::ptr_arg)]
fn as_strings<S, E>(items: &Vec<E>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    E: std::fmt::Display,
{
    serializer.collect_seq(items.iter().map(ToString::to_string))
}

pub struct GenerationService {
    client: ResilientClient,
    splitter: ResponseSplitter,
    sink: Option<Box<dyn CatalogSink>>,
}

impl GenerationService {
    pub fn new(client: ResilientClient) -> Self {
        Self {
            client,
            splitter: ResponseSplitter::new(),
            sink: None,
        }
    }

    /// Persist generated artifacts through `sink`.
    pub fn with_sink(mut self, sink: Box<dyn CatalogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    /// Generate artifacts for `request`.
    ///
    /// # Errors
    ///
    /// Provider chain failures (`NoUsableCredential`, `AllProvidersFailed`,
    /// `DeadlineExceeded`) and `NoUsableFragments` from the splitter.
    /// Persistence failures are returned as warnings instead.
    pub async fn generate(&self, request: &GenerationRequest) -> BlockwrightResult<GenerationReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("generate", %run_id, query = %request.free_text);
        self.run(run_id, request).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, request: &GenerationRequest) -> BlockwrightResult<GenerationReport> {
        let prompt = build_prompt(request);
        let success = self.client.generate(&prompt).await?;

        let outcome = self
            .splitter
            .split(&success.text, &request.free_text, request.max_results)?;
        info!(
            provider = %success.provider,
            artifacts = outcome.artifacts.len(),
            discarded = outcome.discarded.len(),
            "response split"
        );

        let warnings = self.persist_all(&outcome.artifacts, &request.free_text);

        Ok(GenerationReport {
            run_id,
            provider: success.provider,
            model: success.model,
            artifacts: outcome.artifacts,
            failed_providers: success.failed,
            discarded: outcome.discarded,
            warnings,
        })
    }

    fn persist_all(&self, artifacts: &[GeneratedArtifact], query: &str) -> Vec<ApplicationError> {
        let Some(sink) = &self.sink else {
            return Vec::new();
        };

        artifacts
            .iter()
            .filter_map(|artifact| {
                sink.persist(artifact, query).err().map(|error| {
                    warn!(id = %artifact.id, %error, "write-through failed");
                    ApplicationError::PersistenceFailed {
                        id: artifact.id.to_string(),
                        reason: error.to_string(),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        application::ports::{
            GenerationTransport, MockCatalogSink, TransportError, TransportResponse,
        },
        domain::{CredentialSet, ProviderRegistry, ProviderRequest, config_block},
        error::BlockwrightError,
    };

    struct FixedTransport(String);

    #[async_trait]
    impl GenerationTransport for FixedTransport {
        async fn send(
            &self,
            _request: &ProviderRequest,
            _timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse {
                status: 200,
                body: serde_json::json!({ "choices": [{ "message": { "content": self.0 } }] })
                    .to_string(),
            })
        }
    }

    const TWO_SECTIONS: &str = r#"<section class="hero"><h1>{{ heading }}</h1><p>Intro copy goes here.</p></section>
{% schema %}{"name": "Hero", "settings": [{"id": "heading", "type": "text", "default": "Hi"}]}{% endschema %}
<section class="cta"><a href="{{ link }}">Start your free trial today</a></section>
{% schema %}{"name": "Call To Action"}{% endschema %}"#;

    fn service(text: &str) -> GenerationService {
        let client = ResilientClient::new(
            Arc::new(FixedTransport(text.to_string())),
            ProviderRegistry::new(vec![ProviderKind::OpenAi]),
            CredentialSet::new(BTreeMap::new(), "sk-test"),
        );
        GenerationService::new(client)
    }

    #[tokio::test]
    async fn generates_and_persists_each_artifact() {
        let mut sink = MockCatalogSink::new();
        sink.expect_persist()
            .withf(|_, query| query.to_string() == "hero and cta")
            .times(2)
            .returning(|_, _| Ok(()));

        let report = service(TWO_SECTIONS)
            .with_sink(Box::new(sink))
            .generate(&GenerationRequest::new("hero and cta", 5))
            .await
            .unwrap();

        assert_eq!(report.provider, ProviderKind::OpenAi);
        assert_eq!(report.artifacts.len(), 2);
        assert_eq!(report.artifacts[0].id.as_str(), "hero-1");
        assert_eq!(report.artifacts[1].id.as_str(), "call-to-action-2");
        assert!(report
            .artifacts
            .iter()
            .all(|a| config_block::find_blocks(&a.body).len() == 1));
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_is_a_warning() {
        let mut sink = MockCatalogSink::new();
        sink.expect_persist().returning(|_, _| {
            Err(BlockwrightError::Application(ApplicationError::CatalogIo {
                path: "/read-only".into(),
                reason: "permission denied".into(),
            }))
        });

        let report = service(TWO_SECTIONS)
            .with_sink(Box::new(sink))
            .generate(&GenerationRequest::new("hero and cta", 5))
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 2);
        assert_eq!(report.warnings.len(), 2);
        assert!(matches!(
            report.warnings[0],
            ApplicationError::PersistenceFailed { ref id, .. } if id == "hero-1"
        ));
    }

    #[tokio::test]
    async fn unusable_response_is_an_error() {
        let err = service("Sorry, I can't help with that.")
            .generate(&GenerationRequest::new("anything", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BlockwrightError::Domain(DomainError::NoUsableFragments { .. })
        ));
    }

    #[tokio::test]
    async fn report_serializes_errors_as_text() {
        let report = service(TWO_SECTIONS)
            .generate(&GenerationRequest::new("hero and cta", 1))
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["artifacts"].as_array().unwrap().len(), 1);
        assert_eq!(json["provider"], "openai");
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }
}
