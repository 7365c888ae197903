

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::marker::{MarkerKind, SoftDeleteMapping};
use crate::core::config::ConfigurationResolver;
use crate::core::error::{Result, SoftDeleteError};
use crate::engine::TypeMetadata;


/// Process-wide cache of resolved mappings keyed by type name.
///
/// `None` entries record types that are not soft-deleteable. Entries live until
/// the host signals a metadata reload through [`MappingCache::invalidate`] or
/// [`MappingCache::clear`].
pub struct MappingCache {
    cache: Mutex<LruCache<String, Option<SoftDeleteMapping>>>,
    strict_marker_types: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl MappingCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            strict_marker_types: false,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_strict_marker_types(mut self, strict: bool) -> Self {
        self.strict_marker_types = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_marker_types
    }

    pub fn get_or_resolve<R>(
        &self,
        resolver: &R,
        metadata: &TypeMetadata,
    ) -> Result<Option<SoftDeleteMapping>>
    where
        R: ConfigurationResolver + ?Sized,
    {
        if let Some(cached) = self.cache.lock().get(&metadata.name) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let mapping = self.resolve(resolver, metadata)?;
        self.cache.lock().put(metadata.name.clone(), mapping.clone());
        Ok(mapping)
    }

    fn resolve<R>(&self, resolver: &R, metadata: &TypeMetadata) -> Result<Option<SoftDeleteMapping>>
    where
        R: ConfigurationResolver + ?Sized,
    {
        let config = resolver.resolve(&metadata.name);
        if !config.enabled {
            debug!("Type {} is not soft-deleteable", metadata.name);
            return Ok(None);
        }

        let field = config.marker_field_name;
        let field_type = metadata.field_type(&field).ok_or_else(|| {
            SoftDeleteError::configuration(&metadata.name, &field, "marker field does not exist")
        })?;

        if !MarkerKind::is_native(field_type) {
            if self.strict_marker_types {
                return Err(SoftDeleteError::configuration(
                    &metadata.name,
                    &field,
                    format!("marker field has incompatible type {field_type}"),
                ));
            }
            warn!(
                "Marker field {}.{} has type {}, treating it as boolean",
                metadata.name, field, field_type
            );
        }

        let marker = MarkerKind::from_field_type(field_type);
        debug!(
            "Resolved soft-delete mapping for {}: {} ({:?})",
            metadata.name, field, marker
        );
        Ok(Some(SoftDeleteMapping {
            type_name: metadata.name.clone(),
            field_name: field,
            marker,
        }))
    }

    pub fn invalidate(&self, type_name: &str) {
        self.cache.lock().pop(type_name);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        CacheStats {
            hits,
            misses,
            size: self.cache.lock().len(),
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{SoftDeleteConfig, StaticConfigurationResolver};
    use crate::engine::FieldTypeTag;
    use std::cell::Cell;

    fn comment_meta() -> TypeMetadata {
        TypeMetadata::new("Comment").with_field("deletedAt", FieldTypeTag::DateTime)
    }

    #[test]
    fn test_resolves_and_caches() {
        let calls = Cell::new(0);
        let resolver = |_: &str| {
            calls.set(calls.get() + 1);
            SoftDeleteConfig::enabled("deletedAt")
        };
        let cache = MappingCache::new(8);

        let first = cache.get_or_resolve(&resolver, &comment_meta()).unwrap().unwrap();
        let second = cache.get_or_resolve(&resolver, &comment_meta()).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.marker, MarkerKind::DateTime);
        assert_eq!(calls.get(), 1);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disabled_type_is_cached_as_none() {
        let resolver = StaticConfigurationResolver::new();
        let cache = MappingCache::new(8);
        let meta = TypeMetadata::new("LogEntry");

        assert!(cache.get_or_resolve(&resolver, &meta).unwrap().is_none());
        assert!(cache.get_or_resolve(&resolver, &meta).unwrap().is_none());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_missing_marker_field_is_configuration_error() {
        let resolver = StaticConfigurationResolver::new()
            .with_type("Comment", SoftDeleteConfig::enabled("removedOn"));
        let cache = MappingCache::new(8);

        let err = cache.get_or_resolve(&resolver, &comment_meta()).unwrap_err();
        match err {
            SoftDeleteError::Configuration { type_name, field, .. } => {
                assert_eq!(type_name, "Comment");
                assert_eq!(field, "removedOn");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_incompatible_type_falls_back_to_boolean() {
        let resolver = StaticConfigurationResolver::new()
            .with_type("Note", SoftDeleteConfig::enabled("state"));
        let meta = TypeMetadata::new("Note").with_field("state", FieldTypeTag::Integer);

        let mapping = MappingCache::new(8)
            .get_or_resolve(&resolver, &meta)
            .unwrap()
            .unwrap();
        assert_eq!(mapping.marker, MarkerKind::Boolean);
    }

    #[test]
    fn test_strict_mode_rejects_incompatible_type() {
        let resolver = StaticConfigurationResolver::new()
            .with_type("Note", SoftDeleteConfig::enabled("state"));
        let meta = TypeMetadata::new("Note").with_field("state", FieldTypeTag::Integer);
        let cache = MappingCache::new(8).with_strict_marker_types(true);

        assert!(cache.is_strict());
        assert!(matches!(
            cache.get_or_resolve(&resolver, &meta),
            Err(SoftDeleteError::Configuration { .. })
        ));
    }

    #[test]
    fn test_invalidate_forces_re_resolution() {
        let calls = Cell::new(0);
        let resolver = |_: &str| {
            calls.set(calls.get() + 1);
            SoftDeleteConfig::enabled("deletedAt")
        };
        let cache = MappingCache::new(8);

        cache.get_or_resolve(&resolver, &comment_meta()).unwrap();
        cache.invalidate("Comment");
        cache.get_or_resolve(&resolver, &comment_meta()).unwrap();
        assert_eq!(calls.get(), 2);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = MappingCache::new(0);
        let resolver = StaticConfigurationResolver::new();
        cache
            .get_or_resolve(&resolver, &TypeMetadata::new("LogEntry"))
            .unwrap();
        assert_eq!(cache.stats().size, 1);
    }
}
