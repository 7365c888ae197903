pub mod deletion;

pub use deletion::{
    DeletionRewriter, FlushReport, MappingCache, MarkerKind, SoftDeleteFilter, SoftDeleteMapping,
};
