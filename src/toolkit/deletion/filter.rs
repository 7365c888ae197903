

use std::collections::HashSet;

use tracing::debug;

use super::marker::{MarkerKind, SoftDeleteMapping};
use crate::engine::{FieldValue, ManagedObject};


/// Read-side counterpart of the rewriter: hides objects whose marker is set.
#[derive(Debug, Clone, Default)]
pub struct SoftDeleteFilter {
    disabled: HashSet<String>,
}

impl SoftDeleteFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable_for(&mut self, type_name: impl Into<String>) {
        let type_name = type_name.into();
        debug!("Soft-delete filter disabled for {}", type_name);
        self.disabled.insert(type_name);
    }

    pub fn enable_for(&mut self, type_name: &str) {
        self.disabled.remove(type_name);
    }

    pub fn is_enabled_for(&self, type_name: &str) -> bool {
        !self.disabled.contains(type_name)
    }

    /// `mapping` is `None` for types that are not soft-deleteable.
    pub fn is_visible(&self, object: &dyn ManagedObject, mapping: Option<&SoftDeleteMapping>) -> bool {
        let Some(mapping) = mapping else {
            return true;
        };
        if !self.is_enabled_for(&mapping.type_name) {
            return true;
        }
        let current = object
            .get_field(&mapping.field_name)
            .unwrap_or(FieldValue::Null);
        !mapping.is_marked(&current)
    }

    /// SQL condition selecting rows that are not soft deleted, or `None` when
    /// the filter does not apply to the mapping's type.
    pub fn sql_condition(&self, mapping: &SoftDeleteMapping, table_alias: &str, column: &str) -> Option<String> {
        if !self.is_enabled_for(&mapping.type_name) {
            return None;
        }
        let target = format!("{table_alias}.{column}");
        Some(match mapping.marker {
            MarkerKind::DateTime => format!("{target} IS NULL"),
            MarkerKind::Boolean => format!("({target} IS NULL OR {target} = FALSE)"),
        })
    }
}
