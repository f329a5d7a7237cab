//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `blockwright-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `CatalogSource`: Template catalog loading
//!   - `CatalogSink`: Write-through of generated artifacts
//!   - `Assembler`: Placeholder substitution
//!   - `GenerationTransport`: One HTTP round trip to a provider
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    Assembler, CatalogSink, CatalogSource, GenerationTransport, TransportError, TransportResponse,
};

#[cfg(test)]
pub use output::MockCatalogSink;
