//! Resilient generation client - sequential provider fallback with
//! per-provider rate-limit retry under one overall deadline.
//!
//! ## State machine
//!
//! ```text
//! NOT_STARTED
//!     │
//!     ▼
//! ATTEMPTING(provider_i, retry_j) ──429, j+1 < max──► sleep base·2^j ──┐
//!     │            ▲                                                    │
//!     │            └────────────────────────────────────────────────────┘
//!     ├── text ─────────────────────────────► SUCCESS
//!     ├── other failure / retries spent ────► ATTEMPTING(provider_i+1, 0)
//!     └── deadline ─────────────────────────► EXHAUSTED
//! ```
//!
//! Providers without a credential are skipped without a request. Retry state
//! lives inside one provider's loop, so every provider starts at attempt 0.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError, FailureReason, ProviderFailure,
        ports::{GenerationTransport, TransportError},
    },
    domain::{
        CredentialSet, GenerationParams, Prompt, ProviderKind, ProviderRegistry, ProviderRequest,
        providers::extract_text,
    },
};

/// HTTP status that means "slow down".
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Bounds for retrying and for the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per provider, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Wall-clock budget for the whole fallback chain.
    pub deadline: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            deadline: Duration::from_secs(90),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt + 1`, given attempt `attempt` (0-based)
    /// was rate limited.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Text from the first provider that answered.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSuccess {
    pub provider: ProviderKind,
    pub model: String,
    pub text: String,
    /// Providers that failed or were skipped before this one.
    pub failed: Vec<ProviderFailure>,
}

/// Executes providers in registry order until one returns text.
pub struct ResilientClient {
    transport: Arc<dyn GenerationTransport>,
    registry: ProviderRegistry,
    credentials: CredentialSet,
    models: Vec<String>,
    params: GenerationParams,
    policy: RetryPolicy,
}

impl ResilientClient {
    pub fn new(
        transport: Arc<dyn GenerationTransport>,
        registry: ProviderRegistry,
        credentials: CredentialSet,
    ) -> Self {
        Self {
            transport,
            registry,
            credentials,
            models: Vec::new(),
            params: GenerationParams::default(),
            policy: RetryPolicy::default(),
        }
    }

    /// Preferred model names, matched to providers by family markers.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run the fallback chain once.
    ///
    /// # Errors
    ///
    /// - `NoUsableCredential` when every provider was skipped
    /// - `DeadlineExceeded` when the overall budget ran out
    /// - `AllProvidersFailed` otherwise, listing each provider's reason
    #[instrument(skip_all, fields(providers = self.registry.len()))]
    pub async fn generate(&self, prompt: &Prompt) -> Result<GenerationSuccess, ApplicationError> {
        let deadline = Instant::now() + self.policy.deadline;
        let mut failed = Vec::new();
        let mut contacted = false;

        for kind in self.registry.iter() {
            let Some(credential) = self.credentials.route(kind, self.registry.providers()) else {
                debug!(provider = %kind, "skipping provider without credential");
                failed.push(ProviderFailure {
                    provider: kind,
                    reason: FailureReason::MissingCredential,
                });
                continue;
            };
            contacted = true;

            let model = kind.select_model(&self.models);
            let request =
                ProviderRequest::build(kind, &model, &credential.secret, prompt, self.params);
            debug!(provider = %kind, %model, source = %credential.source, "trying provider");

            let outcome = timeout_at(deadline, self.attempt_provider(&request, deadline))
                .await
                .unwrap_or(Err(FailureReason::DeadlineExceeded));

            match outcome {
                Ok(text) => {
                    info!(provider = %kind, %model, skipped_or_failed = failed.len(), "generation succeeded");
                    return Ok(GenerationSuccess {
                        provider: kind,
                        model,
                        text,
                        failed,
                    });
                }
                Err(FailureReason::DeadlineExceeded) => {
                    failed.push(ProviderFailure {
                        provider: kind,
                        reason: FailureReason::DeadlineExceeded,
                    });
                    warn!(provider = %kind, "generation deadline exceeded");
                    return Err(ApplicationError::DeadlineExceeded {
                        deadline: self.policy.deadline,
                        attempts: failed,
                    });
                }
                Err(reason) => {
                    warn!(provider = %kind, %reason, "provider failed, falling back");
                    failed.push(ProviderFailure {
                        provider: kind,
                        reason,
                    });
                }
            }
        }

        if !contacted {
            return Err(ApplicationError::NoUsableCredential {
                providers: self.registry.providers().to_vec(),
            });
        }
        Err(ApplicationError::AllProvidersFailed { attempts: failed })
    }

    /// Retry one provider under rate limiting. Retry state is local.
    async fn attempt_provider(
        &self,
        request: &ProviderRequest,
        deadline: Instant,
    ) -> Result<String, FailureReason> {
        let max = self.policy.max_attempts;

        for attempt in 0..max {
            let response = self
                .transport
                .send(request, self.policy.request_timeout)
                .await
                .map_err(|e| FailureReason::Transport {
                    reason: sanitize(&e),
                })?;

            if response.status == RATE_LIMIT_STATUS {
                if attempt + 1 >= max {
                    break;
                }
                let delay = self.policy.delay_for(attempt);
                if Instant::now() + delay > deadline {
                    return Err(FailureReason::DeadlineExceeded);
                }
                warn!(
                    provider = %request.provider,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "rate limited, backing off"
                );
                sleep(delay).await;
                continue;
            }

            if !(200..300).contains(&response.status) {
                return Err(FailureReason::HttpStatus {
                    status: response.status,
                });
            }

            let body: serde_json::Value = serde_json::from_str(&response.body)
                .map_err(|_| FailureReason::MalformedResponse)?;
            return extract_text(request.provider, &body).ok_or(FailureReason::EmptyResponse);
        }

        Err(FailureReason::RateLimited { attempts: max })
    }
}

/// Reduce a transport error to a short message without URLs or secrets.
fn sanitize(error: &TransportError) -> String {
    let text = error.to_string();
    let first_line = text.lines().next().unwrap_or_default();
    let cleaned: String = first_line
        .split_whitespace()
        .filter(|word| !word.contains("://") && !word.contains("key="))
        .collect::<Vec<_>>()
        .join(" ");
    cleaned.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::TransportResponse;

    type Scripted = Result<TransportResponse, TransportError>;

    /// Replays a per-provider script and records every call.
    #[derive(Default)]
    struct ScriptedTransport {
        scripts: Mutex<HashMap<ProviderKind, VecDeque<Scripted>>>,
        calls: Mutex<Vec<ProviderKind>>,
        latency: Duration,
    }

    impl ScriptedTransport {
        fn script(self, kind: ProviderKind, steps: Vec<Scripted>) -> Self {
            self.scripts.lock().unwrap().insert(kind, steps.into());
            self
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn calls(&self, kind: ProviderKind) -> usize {
            self.calls.lock().unwrap().iter().filter(|k| **k == kind).count()
        }
    }

    #[async_trait]
    impl GenerationTransport for ScriptedTransport {
        async fn send(
            &self,
            request: &ProviderRequest,
            _timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.lock().unwrap().push(request.provider);
            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            self.scripts
                .lock()
                .unwrap()
                .get_mut(&request.provider)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(status(500)))
        }
    }

    fn status(code: u16) -> TransportResponse {
        TransportResponse {
            status: code,
            body: String::new(),
        }
    }

    fn chat_ok(text: &str) -> Scripted {
        Ok(TransportResponse {
            status: 200,
            body: serde_json::json!({ "choices": [{ "message": { "content": text } }] }).to_string(),
        })
    }

    fn rate_limited() -> Scripted {
        Ok(status(429))
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "s".into(),
            user: "u".into(),
        }
    }

    fn client(transport: Arc<ScriptedTransport>, keys: &str) -> ResilientClient {
        ResilientClient::new(
            transport,
            ProviderRegistry::new(vec![ProviderKind::Groq, ProviderKind::OpenAi]),
            CredentialSet::new(BTreeMap::new(), keys),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_twice_then_success_waits_first_two_delays() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![rate_limited(), rate_limited(), chat_ok("<section/>")])
                .script(ProviderKind::OpenAi, vec![chat_ok("never")]),
        );
        let client = client(transport.clone(), "gsk_a, sk-b");

        let started = Instant::now();
        let success = client.generate(&prompt()).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(1000 + 2000));
        assert_eq!(success.provider, ProviderKind::Groq);
        assert_eq!(success.text, "<section/>");
        assert_eq!(transport.calls(ProviderKind::Groq), 3);
        assert_eq!(transport.calls(ProviderKind::OpenAi), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_provider_hands_over_with_fresh_counter() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![rate_limited(); 5])
                .script(ProviderKind::OpenAi, vec![rate_limited(), chat_ok("done")]),
        );
        let client = client(transport.clone(), "gsk_a, sk-b");

        let started = Instant::now();
        let success = client.generate(&prompt()).await.unwrap();

        assert_eq!(transport.calls(ProviderKind::Groq), 5);
        assert_eq!(transport.calls(ProviderKind::OpenAi), 2);
        assert_eq!(success.provider, ProviderKind::OpenAi);
        assert_eq!(
            success.failed,
            vec![ProviderFailure {
                provider: ProviderKind::Groq,
                reason: FailureReason::RateLimited { attempts: 5 },
            }]
        );
        // Groq: 1+2+4+8 s (no sleep after the last attempt); OpenAI restarts at 1 s.
        assert_eq!(started.elapsed(), Duration::from_secs(15 + 1));
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_failure_advances_without_waiting() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![Ok(status(401))])
                .script(ProviderKind::OpenAi, vec![chat_ok("ok")]),
        );
        let client = client(transport.clone(), "gsk_a, sk-b");

        let started = Instant::now();
        let success = client.generate(&prompt()).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(transport.calls(ProviderKind::Groq), 1);
        assert_eq!(success.failed[0].reason, FailureReason::HttpStatus { status: 401 });
    }

    #[tokio::test(start_paused = true)]
    async fn providers_without_credentials_are_skipped() {
        let transport = Arc::new(
            ScriptedTransport::default().script(ProviderKind::OpenAi, vec![chat_ok("ok")]),
        );
        let client = client(transport.clone(), "sk-only");

        let success = client.generate(&prompt()).await.unwrap();
        assert_eq!(transport.calls(ProviderKind::Groq), 0);
        assert_eq!(success.failed[0].reason, FailureReason::MissingCredential);
    }

    #[tokio::test(start_paused = true)]
    async fn no_credentials_at_all_is_configuration_error() {
        let transport = Arc::new(ScriptedTransport::default());
        let err = client(transport.clone(), "").generate(&prompt()).await.unwrap_err();

        assert!(matches!(err, ApplicationError::NoUsableCredential { .. }));
        assert_eq!(transport.calls.lock().unwrap().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_are_aggregated() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![Err(TransportError::Connect)])
                .script(
                    ProviderKind::OpenAi,
                    vec![Ok(TransportResponse {
                        status: 200,
                        body: "not json".into(),
                    })],
                ),
        );
        let err = client(transport, "gsk_a, sk-b")
            .generate(&prompt())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApplicationError::AllProvidersFailed {
                attempts: vec![
                    ProviderFailure {
                        provider: ProviderKind::Groq,
                        reason: FailureReason::Transport {
                            reason: "connection failed".into()
                        },
                    },
                    ProviderFailure {
                        provider: ProviderKind::OpenAi,
                        reason: FailureReason::MalformedResponse,
                    },
                ],
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_counts_as_failure() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![chat_ok("   ")])
                .script(ProviderKind::OpenAi, vec![chat_ok("fine")]),
        );
        let success = client(transport, "gsk_a, sk-b").generate(&prompt()).await.unwrap();
        assert_eq!(success.failed[0].reason, FailureReason::EmptyResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_that_would_pass_deadline_stops_the_chain() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![rate_limited(); 5])
                .script(ProviderKind::OpenAi, vec![chat_ok("too late")]),
        );
        let client = client(transport.clone(), "gsk_a, sk-b").with_policy(RetryPolicy {
            deadline: Duration::from_secs(5),
            ..RetryPolicy::default()
        });

        let started = Instant::now();
        let err = client.generate(&prompt()).await.unwrap_err();

        // 1 s + 2 s slept; the next 4 s wait would end past the 5 s budget.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(matches!(err, ApplicationError::DeadlineExceeded { .. }));
        assert_eq!(transport.calls(ProviderKind::OpenAi), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_is_cut_at_deadline() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script(ProviderKind::Groq, vec![chat_ok("slow")])
                .with_latency(Duration::from_secs(600)),
        );
        let client = client(transport, "gsk_a, sk-b").with_policy(RetryPolicy {
            deadline: Duration::from_secs(10),
            ..RetryPolicy::default()
        });

        let started = Instant::now();
        let err = client.generate(&prompt()).await.unwrap_err();

        assert_eq!(started.elapsed(), Duration::from_secs(10));
        match err {
            ApplicationError::DeadlineExceeded { attempts, .. } => {
                assert_eq!(attempts[0].provider, ProviderKind::Groq);
                assert_eq!(attempts[0].reason, FailureReason::DeadlineExceeded);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(8000));
    }

    #[test]
    fn sanitize_strips_urls_and_extra_lines() {
        let err = TransportError::Other(
            "error sending request for url https://api.groq.com/x?key=abc\ncaused by: ...".into(),
        );
        assert_eq!(sanitize(&err), "error sending request for url");
    }
}
