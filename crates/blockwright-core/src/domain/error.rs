// ============================================================================
// domain/error.rs - DOMAIN ERROR TAXONOMY
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (segment failures are collected and reported later)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Configuration block could not be parsed: {reason}")]
    MalformedConfigBlock { reason: String },

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    // ========================================================================
    // Generated Output Errors
    // ========================================================================
    /// A split segment was too short or unparsable. Dropped, never fatal on
    /// its own.
    #[error("Fragment #{index} discarded: {reason}")]
    MalformedFragment { index: usize, reason: String },

    /// The generated text contained no segment worth keeping.
    #[error("Generated response contained no usable fragments ({discarded} discarded)")]
    NoUsableFragments { discarded: usize },

    // ========================================================================
    // Not Found Errors (404-level equivalent)
    // ========================================================================
    #[error("No template matches query: {0}")]
    NoMatchingTemplate(String),

    // ========================================================================
    // Constraint Violations
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidTemplate(msg) => vec![
                "Check the template file for a valid {% schema %} block".into(),
                format!("Details: {}", msg),
            ],
            Self::UnknownProvider(name) => vec![
                format!("'{}' is not a known provider", name),
                "Known providers: groq, openai, anthropic, gemini, huggingface".into(),
            ],
            Self::NoMatchingTemplate(query) => vec![
                "No catalog template matched your request".into(),
                format!("Query: {}", query),
                "Try: blockwright list".into(),
                "Or let a provider write one: blockwright generate \"<request>\"".into(),
            ],
            Self::NoUsableFragments { .. } => vec![
                "The provider answered, but nothing in the answer looked like a section".into(),
                "Re-run the request or rephrase it more concretely".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTemplate(_)
            | Self::InvalidIdentifier { .. }
            | Self::MalformedConfigBlock { .. }
            | Self::UnknownProvider(_) => ErrorCategory::Validation,
            Self::NoMatchingTemplate(_) => ErrorCategory::NotFound,
            Self::MalformedFragment { .. } | Self::NoUsableFragments { .. } => {
                ErrorCategory::Generation
            }
            Self::MissingRequiredField { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Generation,
    Internal,
}
