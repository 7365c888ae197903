//! Flush-time hook that converts scheduled deletions of soft-deleteable
//! objects into marker-field updates, with `preSoftDelete` and
//! `postSoftDelete` notifications around each rewrite.

pub mod core;
pub mod engine;
pub mod toolkit;
pub mod utils;

pub use utils::init_tracing;


pub use crate::core::config::{
    ConfigurationResolver, SoftDeleteConfig, SoftDeleteSettings, StaticConfigurationResolver,
};
pub use crate::core::error::{Result, SoftDeleteError};
pub use crate::core::events::{EventBus, LifecycleEventArgs, NotificationBus, SoftDeleteEventKind};
pub use engine::{
    ChangeTracking, EngineError, FieldTypeTag, FieldValue, ManagedObject, MarkerTransition,
    ObjectId, SessionHandle, TypeMetadata, UnitOfWork,
};
pub use toolkit::deletion::{
    DeletionRewriter, FlushReport, MappingCache, MarkerKind, ObjectRewrite, RewriteOutcome,
    SkipReason, SoftDeleteFilter, SoftDeleteMapping,
};


pub const DEFAULT_MARKER_FIELD: &str = "deletedAt";


pub const DEFAULT_MAPPING_CACHE_SIZE: usize = 256;
