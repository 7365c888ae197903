

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::engine::{FieldTypeTag, FieldValue};


/// The two ways a marker field can encode "deleted".
///
/// Only `DateTime` declared types map to `DateTime`; every other declared
/// type, including ones that are neither datetime nor boolean, falls back to
/// `Boolean`. That fallback is intentionally permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerKind {
    DateTime,
    Boolean,
}

impl MarkerKind {
    pub fn from_field_type(field_type: &FieldTypeTag) -> Self {
        match field_type {
            FieldTypeTag::DateTime => Self::DateTime,
            _ => Self::Boolean,
        }
    }

    /// True when the declared type is one the marker kinds were made for.
    pub fn is_native(field_type: &FieldTypeTag) -> bool {
        matches!(field_type, FieldTypeTag::DateTime | FieldTypeTag::Boolean)
    }

    pub fn is_already_marked(&self, current: &FieldValue) -> bool {
        match self {
            Self::DateTime => matches!(current, FieldValue::DateTime(_)),
            Self::Boolean => matches!(current, FieldValue::Bool(true)),
        }
    }

    /// Wall-clock dependent for `DateTime`.
    pub fn next_marker_value(&self) -> FieldValue {
        match self {
            Self::DateTime => FieldValue::DateTime(Utc::now()),
            Self::Boolean => FieldValue::Bool(true),
        }
    }
}


/// Validated mapping for one soft-deleteable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteMapping {
    pub type_name: String,
    pub field_name: String,
    pub marker: MarkerKind,
}

impl SoftDeleteMapping {
    pub fn is_marked(&self, current: &FieldValue) -> bool {
        self.marker.is_already_marked(current)
    }
}
