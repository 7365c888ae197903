

use tracing::{debug, info};

use super::mapping::MappingCache;
use super::marker::SoftDeleteMapping;
use super::models::{FlushReport, ObjectRewrite, RewriteOutcome, SkipReason};
use crate::DEFAULT_MAPPING_CACHE_SIZE;
use crate::core::config::{ConfigurationResolver, SoftDeleteSettings, StaticConfigurationResolver};
use crate::core::error::Result;
use crate::core::events::{LifecycleEventArgs, NotificationBus, SoftDeleteEventKind};
use crate::engine::{
    ChangeTracking, EngineError, FieldValue, MarkerTransition, ObjectId, TypeMetadata, UnitOfWork,
};


/// Flush hook that turns scheduled deletions of soft-deleteable objects into
/// marker updates.
///
/// Holds no per-flush state; the only thing kept between passes is the
/// mapping cache.
pub struct DeletionRewriter<R, B> {
    resolver: R,
    bus: B,
    mappings: MappingCache,
}

impl<R, B> DeletionRewriter<R, B>
where
    R: ConfigurationResolver,
    B: NotificationBus,
{
    pub fn new(resolver: R, bus: B) -> Self {
        Self::with_cache(resolver, bus, MappingCache::new(DEFAULT_MAPPING_CACHE_SIZE))
    }

    pub fn with_cache(resolver: R, bus: B, mappings: MappingCache) -> Self {
        Self {
            resolver,
            bus,
            mappings,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn mappings(&self) -> &MappingCache {
        &self.mappings
    }

    /// Drops cached mappings after the host reloaded its metadata.
    pub fn reload_metadata(&self) {
        info!("Metadata reloaded, clearing soft-delete mappings");
        self.mappings.clear();
    }

    pub fn mapping_for<U: UnitOfWork>(&self, uow: &U, type_name: &str) -> Result<Option<SoftDeleteMapping>> {
        let metadata = uow
            .type_metadata(type_name)
            .ok_or_else(|| EngineError::MetadataNotFound(type_name.to_string()))?;
        self.mappings.get_or_resolve(&self.resolver, metadata)
    }

    /// Runs once per flush cycle over every scheduled deletion.
    ///
    /// Stops at the first configuration, engine or listener error; objects
    /// rewritten before that point keep their in-memory marker value.
    pub fn on_flush<U: UnitOfWork>(&self, uow: &mut U) -> Result<FlushReport> {
        let scheduled = uow.scheduled_deletions();
        debug!("Inspecting {} scheduled deletions", scheduled.len());

        let mut report = FlushReport::default();
        for id in scheduled {
            report.rewrites.push(self.rewrite(uow, id)?);
        }

        info!(
            "Flush pass done: {} soft deleted, {} left as hard deletes",
            report.soft_deleted_count(),
            report.hard_deleted_count()
        );
        Ok(report)
    }

    fn rewrite<U: UnitOfWork>(&self, uow: &mut U, id: ObjectId) -> Result<ObjectRewrite> {
        let type_name = uow
            .object(id)
            .ok_or(EngineError::ObjectNotFound(id))?
            .type_name()
            .to_string();

        let Some(mapping) = self.mapping_for(uow, &type_name)? else {
            return Ok(hard_delete(id, type_name, SkipReason::NotSoftDeleteable));
        };

        let old_value = uow
            .object(id)
            .ok_or(EngineError::ObjectNotFound(id))?
            .get_field(&mapping.field_name)
            .unwrap_or(FieldValue::Null);

        if mapping.is_marked(&old_value) {
            debug!("{} {} already marked, keeping hard delete", type_name, id);
            return Ok(hard_delete(id, type_name, SkipReason::AlreadyMarked));
        }

        self.notify(uow, id, SoftDeleteEventKind::PreSoftDelete)?;

        let new_value = mapping.marker.next_marker_value();
        uow.object_mut(id)
            .ok_or(EngineError::ObjectNotFound(id))?
            .set_field(&mapping.field_name, new_value.clone())?;

        let transition = MarkerTransition {
            field_name: mapping.field_name.clone(),
            old_value,
            new_value,
        };

        uow.persist(id)?;
        match U::CHANGE_TRACKING {
            ChangeTracking::Declared => uow.mark_property_changed(id, &transition)?,
            ChangeTracking::Recompute => {
                debug!("Recomputing change set for {}", id);
                let metadata: TypeMetadata = uow
                    .type_metadata(&type_name)
                    .cloned()
                    .ok_or_else(|| EngineError::MetadataNotFound(type_name.clone()))?;
                uow.recompute_change_set(id, &metadata)?;
            }
        }

        self.notify(uow, id, SoftDeleteEventKind::PostSoftDelete)?;

        info!("Soft deleted {} {} via {}", type_name, id, transition.field_name);
        Ok(ObjectRewrite {
            object_id: id,
            type_name,
            outcome: RewriteOutcome::SoftDeleted { transition },
        })
    }

    fn notify<U: UnitOfWork>(&self, uow: &U, id: ObjectId, kind: SoftDeleteEventKind) -> Result<()> {
        let object = uow.object(id).ok_or(EngineError::ObjectNotFound(id))?;
        self.bus.dispatch(&LifecycleEventArgs::new(kind, id, object, uow))
    }
}

impl<B: NotificationBus> DeletionRewriter<StaticConfigurationResolver, B> {
    pub fn from_settings(settings: &SoftDeleteSettings, bus: B) -> Self {
        let mappings = MappingCache::new(settings.mapping_cache_capacity)
            .with_strict_marker_types(settings.strict_marker_types);
        Self::with_cache(StaticConfigurationResolver::from_settings(settings), bus, mappings)
    }
}

fn hard_delete(object_id: ObjectId, type_name: String, reason: SkipReason) -> ObjectRewrite {
    ObjectRewrite {
        object_id,
        type_name,
        outcome: RewriteOutcome::HardDelete { reason },
    }
}
