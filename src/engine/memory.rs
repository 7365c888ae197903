

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use uuid::Uuid;

use super::{
    ChangeTracking, EngineError, FieldValue, ManagedObject, MarkerTransition, ObjectId,
    SessionHandle, TypeMetadata, UnitOfWork,
};


pub type ChangeSet = BTreeMap<String, (FieldValue, FieldValue)>;


#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn field(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Fills every field the metadata declares but the record lacks with `Null`.
    fn seed_declared_fields(&mut self, metadata: &TypeMetadata) {
        for field in metadata.field_names() {
            self.fields
                .entry(field.to_string())
                .or_insert(FieldValue::Null);
        }
    }
}

impl ManagedObject for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get_field(&self, field: &str) -> Option<FieldValue> {
        self.fields.get(field).cloned()
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), EngineError> {
        match self.fields.get_mut(field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EngineError::UnknownField {
                type_name: self.type_name.clone(),
                field: field.to_string(),
            }),
        }
    }
}


#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub deleted: usize,
    pub updated: usize,
}


/// Reference backend kept entirely in memory.
///
/// `DECLARED` selects whether the backend accepts declared property changes
/// or only supports recomputing change sets against the original snapshot.
#[derive(Debug)]
pub struct MemoryUnitOfWork<const DECLARED: bool> {
    session_id: Uuid,
    metadata: HashMap<String, TypeMetadata>,
    records: BTreeMap<ObjectId, Record>,
    originals: HashMap<ObjectId, Record>,
    deletions: Vec<ObjectId>,
    updates: Vec<ObjectId>,
    change_sets: HashMap<ObjectId, ChangeSet>,
}

pub type InMemoryUnitOfWork = MemoryUnitOfWork<true>;

pub type RecomputingUnitOfWork = MemoryUnitOfWork<false>;

impl<const DECLARED: bool> MemoryUnitOfWork<DECLARED> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            metadata: HashMap::new(),
            records: BTreeMap::new(),
            originals: HashMap::new(),
            deletions: Vec::new(),
            updates: Vec::new(),
            change_sets: HashMap::new(),
        }
    }

    pub fn register_type(&mut self, metadata: TypeMetadata) {
        debug!("Registering metadata for type: {}", metadata.name);
        for record in self
            .records
            .values_mut()
            .chain(self.originals.values_mut())
            .filter(|record| record.type_name == metadata.name)
        {
            record.seed_declared_fields(&metadata);
        }
        self.metadata.insert(metadata.name.clone(), metadata);
    }

    /// Takes ownership of a record; declared fields it does not carry start as `Null`.
    pub fn manage(&mut self, mut record: Record) -> ObjectId {
        if let Some(metadata) = self.metadata.get(&record.type_name) {
            record.seed_declared_fields(metadata);
        }
        let id = ObjectId::new();
        self.originals.insert(id, record.clone());
        self.records.insert(id, record);
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<(), EngineError> {
        if !self.records.contains_key(&id) {
            return Err(EngineError::ObjectNotFound(id));
        }
        self.updates.retain(|pending| *pending != id);
        if !self.deletions.contains(&id) {
            self.deletions.push(id);
        }
        Ok(())
    }

    pub fn get(&self, id: ObjectId) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn is_scheduled_for_deletion(&self, id: ObjectId) -> bool {
        self.deletions.contains(&id)
    }

    pub fn is_scheduled_for_update(&self, id: ObjectId) -> bool {
        self.updates.contains(&id)
    }

    pub fn change_set(&self, id: ObjectId) -> Option<&ChangeSet> {
        self.change_sets.get(&id)
    }

    /// Drops deleted records, snapshots updated ones and clears all schedules.
    pub fn commit(&mut self) -> CommitSummary {
        let summary = CommitSummary {
            deleted: self.deletions.len(),
            updated: self.updates.len(),
        };

        for id in self.deletions.drain(..) {
            self.records.remove(&id);
            self.originals.remove(&id);
        }
        for id in self.updates.drain(..) {
            if let Some(record) = self.records.get(&id) {
                self.originals.insert(id, record.clone());
            }
        }
        self.change_sets.clear();

        debug!(
            "Committed unit of work {}: {} deleted, {} updated",
            self.session_id, summary.deleted, summary.updated
        );
        summary
    }
}

impl<const DECLARED: bool> Default for MemoryUnitOfWork<DECLARED> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DECLARED: bool> SessionHandle for MemoryUnitOfWork<DECLARED> {
    fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl<const DECLARED: bool> UnitOfWork for MemoryUnitOfWork<DECLARED> {
    const CHANGE_TRACKING: ChangeTracking = if DECLARED {
        ChangeTracking::Declared
    } else {
        ChangeTracking::Recompute
    };

    fn scheduled_deletions(&self) -> Vec<ObjectId> {
        self.deletions.clone()
    }

    fn object(&self, id: ObjectId) -> Option<&dyn ManagedObject> {
        self.records.get(&id).map(|record| record as &dyn ManagedObject)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut dyn ManagedObject> {
        self.records
            .get_mut(&id)
            .map(|record| record as &mut dyn ManagedObject)
    }

    fn type_metadata(&self, type_name: &str) -> Option<&TypeMetadata> {
        self.metadata.get(type_name)
    }

    fn persist(&mut self, id: ObjectId) -> Result<(), EngineError> {
        if !self.records.contains_key(&id) {
            return Err(EngineError::ObjectNotFound(id));
        }
        self.deletions.retain(|pending| *pending != id);
        if !self.updates.contains(&id) {
            self.updates.push(id);
        }
        Ok(())
    }

    fn mark_property_changed(
        &mut self,
        id: ObjectId,
        transition: &MarkerTransition,
    ) -> Result<(), EngineError> {
        if !DECLARED {
            return Err(EngineError::Unsupported("mark_property_changed"));
        }
        if !self.records.contains_key(&id) {
            return Err(EngineError::ObjectNotFound(id));
        }
        self.change_sets.entry(id).or_default().insert(
            transition.field_name.clone(),
            (transition.old_value.clone(), transition.new_value.clone()),
        );
        Ok(())
    }

    fn recompute_change_set(&mut self, id: ObjectId, metadata: &TypeMetadata) -> Result<(), EngineError> {
        let current = self.records.get(&id).ok_or(EngineError::ObjectNotFound(id))?;
        let original = self.originals.get(&id).ok_or(EngineError::ObjectNotFound(id))?;

        let mut change_set = ChangeSet::new();
        for field in metadata.field_names() {
            let before = original.field(field).cloned().unwrap_or(FieldValue::Null);
            let after = current.field(field).cloned().unwrap_or(FieldValue::Null);
            if before != after {
                change_set.insert(field.to_string(), (before, after));
            }
        }

        if change_set.is_empty() {
            self.change_sets.remove(&id);
        } else {
            self.change_sets.insert(id, change_set);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FieldTypeTag;

    fn comment_meta() -> TypeMetadata {
        TypeMetadata::new("Comment")
            .with_field("body", FieldTypeTag::Text)
            .with_field("deletedAt", FieldTypeTag::DateTime)
    }

    #[test]
    fn test_persist_cancels_deletion() {
        let mut uow = InMemoryUnitOfWork::new();
        let id = uow.manage(Record::new("Comment").with("deletedAt", FieldValue::Null));

        uow.remove(id).unwrap();
        assert_eq!(uow.scheduled_deletions(), vec![id]);

        uow.persist(id).unwrap();
        assert!(!uow.is_scheduled_for_deletion(id));
        assert!(uow.is_scheduled_for_update(id));
    }

    #[test]
    fn test_remove_unknown_object() {
        let mut uow = InMemoryUnitOfWork::new();
        let id = ObjectId::new();
        assert_eq!(uow.remove(id), Err(EngineError::ObjectNotFound(id)));
    }

    #[test]
    fn test_set_unknown_field_fails() {
        let mut record = Record::new("Comment");
        let err = record.set_field("deletedAt", FieldValue::Bool(true)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownField { .. }));
    }

    #[test]
    fn test_declared_change_is_recorded() {
        let mut uow = InMemoryUnitOfWork::new();
        let id = uow.manage(Record::new("Tag").with("isDeleted", false));

        let transition = MarkerTransition {
            field_name: "isDeleted".to_string(),
            old_value: FieldValue::Bool(false),
            new_value: FieldValue::Bool(true),
        };
        uow.mark_property_changed(id, &transition).unwrap();

        let change_set = uow.change_set(id).unwrap();
        assert_eq!(
            change_set.get("isDeleted"),
            Some(&(FieldValue::Bool(false), FieldValue::Bool(true)))
        );
    }

    #[test]
    fn test_recomputing_backend_rejects_declared_changes() {
        let mut uow = RecomputingUnitOfWork::new();
        let id = uow.manage(Record::new("Tag").with("isDeleted", false));
        let transition = MarkerTransition {
            field_name: "isDeleted".to_string(),
            old_value: FieldValue::Bool(false),
            new_value: FieldValue::Bool(true),
        };

        assert_eq!(
            uow.mark_property_changed(id, &transition),
            Err(EngineError::Unsupported("mark_property_changed"))
        );
        assert_eq!(RecomputingUnitOfWork::CHANGE_TRACKING, ChangeTracking::Recompute);
        assert_eq!(InMemoryUnitOfWork::CHANGE_TRACKING, ChangeTracking::Declared);
    }

    #[test]
    fn test_recompute_diffs_against_original() {
        let mut uow = RecomputingUnitOfWork::new();
        uow.register_type(comment_meta());
        let id = uow.manage(
            Record::new("Comment")
                .with("body", FieldValue::Text("hi".to_string()))
                .with("deletedAt", FieldValue::Null),
        );

        let now = chrono::Utc::now();
        uow.object_mut(id)
            .unwrap()
            .set_field("deletedAt", FieldValue::DateTime(now))
            .unwrap();
        let meta = comment_meta();
        uow.recompute_change_set(id, &meta).unwrap();

        let change_set = uow.change_set(id).unwrap();
        assert_eq!(change_set.len(), 1);
        assert_eq!(
            change_set.get("deletedAt"),
            Some(&(FieldValue::Null, FieldValue::DateTime(now)))
        );
    }

    #[test]
    fn test_manage_seeds_declared_fields() {
        let mut uow = InMemoryUnitOfWork::new();
        uow.register_type(comment_meta());
        let id = uow.manage(Record::new("Comment").with("body", FieldValue::Text("hi".to_string())));

        assert_eq!(uow.get(id).unwrap().field("deletedAt"), Some(&FieldValue::Null));
        uow.object_mut(id)
            .unwrap()
            .set_field("deletedAt", FieldValue::Bool(true))
            .unwrap();
    }

    #[test]
    fn test_register_type_seeds_existing_records() {
        let mut uow = InMemoryUnitOfWork::new();
        let id = uow.manage(Record::new("Comment").with("body", FieldValue::Text("hi".to_string())));
        assert!(uow.get(id).unwrap().field("deletedAt").is_none());

        uow.register_type(comment_meta());
        assert_eq!(uow.get(id).unwrap().field("deletedAt"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_commit_drops_deleted_records() {
        let mut uow = InMemoryUnitOfWork::new();
        let kept = uow.manage(Record::new("Tag").with("isDeleted", false));
        let dropped = uow.manage(Record::new("Tag").with("isDeleted", false));

        uow.remove(dropped).unwrap();
        uow.persist(kept).unwrap();
        let summary = uow.commit();

        assert_eq!(summary, CommitSummary { deleted: 1, updated: 1 });
        assert!(uow.get(dropped).is_none());
        assert!(uow.get(kept).is_some());
        assert!(uow.scheduled_deletions().is_empty());
    }
}
