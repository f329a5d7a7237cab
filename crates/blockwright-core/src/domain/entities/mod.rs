pub mod category;
pub mod template;

pub use category::Category;
pub use template::{GeneratedArtifact, GenerationRequest, ScoredCandidate, Template, TemplateId};
