//! Infrastructure adapters for Blockwright.
//!
//! This crate implements the ports defined in `blockwright-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod assembler;
pub mod catalog;
pub mod http;

// Re-export commonly used adapters
pub use assembler::PlaceholderAssembler;
pub use catalog::{FilesystemCatalog, InMemoryCatalog, fallback::fallback_catalog};
pub use http::ReqwestTransport;
