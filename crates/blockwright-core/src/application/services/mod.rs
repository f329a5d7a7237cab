//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "search the catalog" or "compose sections".

pub mod catalog_service;
pub mod compose_service;
pub mod generation_client;
pub mod generation_service;

pub use catalog_service::CatalogService;
pub use compose_service::{ComposeOutcome, ComposeService, Origin, SourceMode};
pub use generation_client::{GenerationSuccess, ResilientClient, RetryPolicy};
pub use generation_service::{GenerationReport, GenerationService};
