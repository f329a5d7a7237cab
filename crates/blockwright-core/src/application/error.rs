//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::ProviderKind;
use crate::error::ErrorCategory;

/// Why one provider did not produce a usable answer.
///
/// Deliberately short: no bodies, headers or transport internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No credential routed to this provider; it was never contacted.
    #[error("no credential configured")]
    MissingCredential,
    /// Every attempt was answered with a rate-limit status.
    #[error("rate limited on all {attempts} attempts")]
    RateLimited { attempts: u32 },
    /// Non-success status other than rate limiting.
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },
    /// Connection, TLS or timeout failure, already sanitised.
    #[error("transport error: {reason}")]
    Transport { reason: String },
    /// Success status, but the body was not the expected JSON shape.
    #[error("unexpected response shape")]
    MalformedResponse,
    /// Success status with no text in it.
    #[error("empty response")]
    EmptyResponse,
    /// The overall deadline ran out while this provider was in flight.
    #[error("overall deadline exceeded")]
    DeadlineExceeded,
}

/// One provider's outcome in a failed chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{provider}: {reason}")]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub reason: FailureReason,
}

fn list(attempts: &[ProviderFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No enabled provider had a credential.
    #[error("No usable credential for any enabled provider ({})", .providers.iter().map(|k| k.name()).collect::<Vec<_>>().join(", "))]
    NoUsableCredential { providers: Vec<ProviderKind> },

    /// Every provider with a credential was tried and failed.
    #[error("All providers failed: {}", list(.attempts))]
    AllProvidersFailed { attempts: Vec<ProviderFailure> },

    /// The chain ran out of time.
    #[error("Generation deadline of {}s exceeded: {}", .deadline.as_secs(), list(.attempts))]
    DeadlineExceeded {
        deadline: Duration,
        attempts: Vec<ProviderFailure>,
    },

    /// Writing a generated artifact back to the catalog failed. Reported as a
    /// warning alongside a successful result.
    #[error("Could not persist '{id}': {reason}")]
    PersistenceFailed { id: String, reason: String },

    /// Catalog storage could not be read or written.
    #[error("Catalog error at {path}: {reason}")]
    CatalogIo { path: PathBuf, reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Catalog store error")]
    StoreLockError,

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NoUsableCredential { .. } => vec![
                "Set credentials with BLOCKWRIGHT_PROVIDERS__API_KEYS=\"gsk_...,sk-...\"".into(),
                "Or add a [providers.credentials] table to the config file".into(),
                "Check routing with: blockwright providers".into(),
            ],
            Self::AllProvidersFailed { attempts } => {
                let mut hints = vec!["Every provider was tried:".to_string()];
                hints.extend(attempts.iter().map(|a| format!("  {a}")));
                hints.push("Retry later, or enable more providers".into());
                hints
            }
            Self::DeadlineExceeded { .. } => vec![
                "The provider chain ran out of time".into(),
                "Raise retry.deadline_secs or try again later".into(),
            ],
            Self::PersistenceFailed { .. } | Self::CatalogIo { .. } => vec![
                "Check that the catalog directory exists and is writable".into(),
                "Configure it with --templates-dir or catalog.templates_dir".into(),
            ],
            Self::StoreLockError => vec![
                "The catalog store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::ValidationFailed(_) => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoUsableCredential { .. } => ErrorCategory::Configuration,
            Self::AllProvidersFailed { .. } | Self::DeadlineExceeded { .. } => {
                ErrorCategory::Generation
            }
            Self::PersistenceFailed { .. } | Self::CatalogIo { .. } | Self::StoreLockError => {
                ErrorCategory::Internal
            }
            Self::ValidationFailed(_) => ErrorCategory::Validation,
        }
    }

    /// `true` when trying again later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DeadlineExceeded { .. } | Self::StoreLockError => true,
            Self::AllProvidersFailed { attempts } => attempts.iter().any(|a| {
                matches!(
                    a.reason,
                    FailureReason::RateLimited { .. }
                        | FailureReason::Transport { .. }
                        | FailureReason::DeadlineExceeded
                ) || matches!(a.reason, FailureReason::HttpStatus { status } if status >= 500)
            }),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_message_names_every_provider() {
        let err = ApplicationError::AllProvidersFailed {
            attempts: vec![
                ProviderFailure {
                    provider: ProviderKind::Groq,
                    reason: FailureReason::RateLimited { attempts: 5 },
                },
                ProviderFailure {
                    provider: ProviderKind::OpenAi,
                    reason: FailureReason::HttpStatus { status: 401 },
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("groq: rate limited on all 5 attempts"));
        assert!(text.contains("openai: HTTP 401"));
        assert!(err.is_transient());
    }

    #[test]
    fn auth_failures_are_not_transient() {
        let err = ApplicationError::AllProvidersFailed {
            attempts: vec![ProviderFailure {
                provider: ProviderKind::OpenAi,
                reason: FailureReason::HttpStatus { status: 401 },
            }],
        };
        assert!(!err.is_transient());
        assert_eq!(err.category(), ErrorCategory::Generation);
    }

    #[test]
    fn missing_credentials_are_configuration() {
        let err = ApplicationError::NoUsableCredential {
            providers: vec![ProviderKind::Groq, ProviderKind::Gemini],
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("groq, gemini"));
    }

    #[test]
    fn failures_are_std_errors() {
        let failure = ProviderFailure {
            provider: ProviderKind::Gemini,
            reason: FailureReason::Transport {
                reason: "connection failed".into(),
            },
        };
        let err: &dyn std::error::Error = &failure;
        assert_eq!(err.to_string(), "gemini: transport error: connection failed");
        assert_eq!(
            FailureReason::DeadlineExceeded.to_string(),
            "overall deadline exceeded"
        );
    }
}
