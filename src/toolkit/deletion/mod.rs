pub mod filter;
pub mod mapping;
pub mod marker;
pub mod models;
pub mod rewriter;

pub use filter::SoftDeleteFilter;
pub use mapping::{CacheStats, MappingCache};
pub use marker::{MarkerKind, SoftDeleteMapping};
pub use models::{FlushReport, ObjectRewrite, RewriteOutcome, SkipReason};
pub use rewriter::DeletionRewriter;
