//! Narrow view of the host persistence engine.
//!
//! The rewriter never owns objects or change tracking; it talks to the engine
//! through [`UnitOfWork`] and reads objects through [`ManagedObject`].

pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumString;
use thiserror::Error;
use uuid::Uuid;

pub use memory::{InMemoryUnitOfWork, MemoryUnitOfWork, Record, RecomputingUnitOfWork};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    DateTime(DateTime<Utc>),
    Integer(i64),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(at) => Some(*at),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}


/// Declared column type of a mapped field, parsed from the engine's type names.
///
/// Anything the engine reports that is not listed lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FieldTypeTag {
    #[strum(serialize = "datetime", serialize = "datetimetz", serialize = "datetime_immutable")]
    DateTime,
    #[strum(serialize = "boolean", serialize = "bool")]
    Boolean,
    #[strum(serialize = "integer", serialize = "smallint", serialize = "bigint")]
    Integer,
    #[strum(serialize = "string", serialize = "text")]
    Text,
    #[strum(default)]
    Other(String),
}

impl FieldTypeTag {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Text => "string",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    pub name: String,
    fields: BTreeMap<String, FieldTypeTag>,
}

impl TypeMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, field_type: FieldTypeTag) -> Self {
        self.fields.insert(field.into(), field_type);
        self
    }

    pub fn field_exists(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_type(&self, field: &str) -> Option<&FieldTypeTag> {
        self.fields.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerTransition {
    pub field_name: String,
    pub old_value: FieldValue,
    pub new_value: FieldValue,
}


/// How a backend learns about the marker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTracking {
    /// `mark_property_changed` records the change as declared.
    Declared,
    /// Only `recompute_change_set` is available.
    Recompute,
}


#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Object not managed by this unit of work: {0}")]
    ObjectNotFound(ObjectId),

    #[error("No metadata for type: {0}")]
    MetadataNotFound(String),

    #[error("Unknown field {field} on {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("Operation not supported by backend: {0}")]
    Unsupported(&'static str),

    #[error("Backend error: {0}")]
    Backend(String),
}


pub trait ManagedObject {
    fn type_name(&self) -> &str;

    fn get_field(&self, field: &str) -> Option<FieldValue>;

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EngineError>;
}


/// Read-only handle to the active session, handed to listeners.
pub trait SessionHandle {
    fn session_id(&self) -> Uuid;
}


/// One flush cycle's worth of pending changes, as seen by the rewriter.
pub trait UnitOfWork: SessionHandle {
    /// Fixed per backend; read once per pass, never probed per object.
    const CHANGE_TRACKING: ChangeTracking;

    fn scheduled_deletions(&self) -> Vec<ObjectId>;

    fn object(&self, id: ObjectId) -> Option<&dyn ManagedObject>;

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut dyn ManagedObject>;

    fn type_metadata(&self, type_name: &str) -> Option<&TypeMetadata>;

    /// Re-registers the object as a pending write. A pending physical
    /// deletion of the same object is cancelled.
    fn persist(&mut self, id: ObjectId) -> Result<(), EngineError>;

    fn mark_property_changed(
        &mut self,
        id: ObjectId,
        transition: &MarkerTransition,
    ) -> Result<(), EngineError>;

    fn recompute_change_set(&mut self, id: ObjectId, metadata: &TypeMetadata) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_tag_parsing() {
        assert_eq!("datetime".parse::<FieldTypeTag>().unwrap(), FieldTypeTag::DateTime);
        assert_eq!("DateTimeTz".parse::<FieldTypeTag>().unwrap(), FieldTypeTag::DateTime);
        assert_eq!("boolean".parse::<FieldTypeTag>().unwrap(), FieldTypeTag::Boolean);
        assert_eq!("bigint".parse::<FieldTypeTag>().unwrap(), FieldTypeTag::Integer);
        assert_eq!(
            "json".parse::<FieldTypeTag>().unwrap(),
            FieldTypeTag::Other("json".to_string())
        );
    }

    #[test]
    fn test_field_type_tag_display() {
        assert_eq!(FieldTypeTag::DateTime.to_string(), "datetime");
        assert_eq!(FieldTypeTag::Other("uuid".to_string()).to_string(), "uuid");
    }

    #[test]
    fn test_type_metadata_lookup() {
        let meta = TypeMetadata::new("Comment")
            .with_field("body", FieldTypeTag::Text)
            .with_field("deletedAt", FieldTypeTag::DateTime);

        assert!(meta.field_exists("deletedAt"));
        assert!(!meta.field_exists("isDeleted"));
        assert_eq!(meta.field_type("deletedAt"), Some(&FieldTypeTag::DateTime));
        assert_eq!(meta.field_names().collect::<Vec<_>>(), vec!["body", "deletedAt"]);
    }

    #[test]
    fn test_field_value_from_option() {
        assert_eq!(FieldValue::from(None::<bool>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(true)), FieldValue::Bool(true));
    }

    #[test]
    fn test_field_value_serializes_tagged() {
        let json = serde_json::to_value(FieldValue::Bool(true)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "bool", "value": true}));
    }
}
