//! Blockwright Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Blockwright,
//! a tool that finds page sections in a template catalog or generates new
//! ones through a chain of LLM providers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         blockwright-cli (CLI)           │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (ComposeService, CatalogService,        │
//! │  GenerationService, ResilientClient)    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (CatalogSource, CatalogSink, Assembler, │
//! │  GenerationTransport)                   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   blockwright-adapters (Infrastructure) │
//! │ (FilesystemCatalog, ReqwestTransport)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Template, Ranker, ResponseSplitter,    │
//! │  ProviderRegistry, CredentialSet)       │
//! │       No I/O, no async runtime          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blockwright_core::prelude::*;
//!
//! let catalog = CatalogService::new(Box::new(source));
//! let compose = ComposeService::new(catalog, Box::new(assembler));
//!
//! let request = GenerationRequest::new("hero banner with video", 3);
//! let outcome = compose.compose(&request, SourceMode::Catalog, &Default::default()).await?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CatalogService, ComposeOutcome, ComposeService, GenerationReport, GenerationService,
        Origin, ResilientClient, RetryPolicy, SourceMode,
        ports::{Assembler, CatalogSink, CatalogSource, GenerationTransport},
    };
    pub use crate::domain::{
        Category, CredentialSet, GeneratedArtifact, GenerationParams, GenerationRequest,
        ProviderKind, ProviderRegistry, ScoredCandidate, Template, TemplateId,
    };
    pub use crate::error::{BlockwrightError, BlockwrightResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
