//! Core domain layer for Blockwright.
//!
//! Pure logic: catalog entries, ranking, reference resolution, response
//! splitting and provider routing. All I/O (filesystem, HTTP, clocks) is
//! reached through ports defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable entities**: All domain objects are Clone + PartialEq
//! - **Rich domain model**: Behavior lives in entities, not services

pub mod common;
pub mod config_block;
pub mod entities;
pub mod error;
pub mod providers;
pub mod ranking;
pub mod resolver;
pub mod splitter;

pub use config_block::{ConfigBlock, NormalizedBody, ensure_single_block};
pub use entities::{
    category::Category,
    template::{
        GeneratedArtifact, GenerationRequest, ScoredCandidate, Template, TemplateBuilder,
        TemplateId, VariableDefinition,
    },
};
pub use error::{DomainError, ErrorCategory};
pub use providers::{
    CredentialSet, CredentialSource, GenerationParams, Prompt, ProviderKind, ProviderRegistry,
    ProviderRequest, RoutedCredential,
};
pub use ranking::{LexicalRanker, Ranker};
pub use resolver::{ReferenceResolver, Resolution, ResolutionPath};
pub use splitter::{ResponseSplitter, SplitOutcome};
