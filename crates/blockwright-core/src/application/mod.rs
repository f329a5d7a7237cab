//! Application layer for Blockwright.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (CatalogService, ComposeService, GenerationService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. Ranking, splitting and credential routing live in
//! `crate::domain`.

pub mod error;
pub mod ports;
pub mod prompt;
pub mod services;

pub use services::{
    CatalogService, ComposeOutcome, ComposeService, GenerationReport, GenerationService,
    GenerationSuccess, Origin, ResilientClient, RetryPolicy, SourceMode,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    Assembler, CatalogSink, CatalogSource, GenerationTransport, TransportError, TransportResponse,
};

pub use error::{ApplicationError, FailureReason, ProviderFailure};
pub use prompt::build_prompt;
