

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::engine::{FieldValue, ManagedObject, ObjectId, SessionHandle};


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SoftDeleteEventKind {
    PreSoftDelete,
    PostSoftDelete,
}

impl fmt::Display for SoftDeleteEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}


/// Payload handed to listeners: the affected object and the active session.
pub struct LifecycleEventArgs<'a> {
    pub kind: SoftDeleteEventKind,
    pub object_id: ObjectId,
    pub object: &'a dyn ManagedObject,
    pub session: &'a dyn SessionHandle,
}

impl<'a> LifecycleEventArgs<'a> {
    pub fn new(
        kind: SoftDeleteEventKind,
        object_id: ObjectId,
        object: &'a dyn ManagedObject,
        session: &'a dyn SessionHandle,
    ) -> Self {
        Self {
            kind,
            object_id,
            object,
            session,
        }
    }

    pub fn type_name(&self) -> &str {
        self.object.type_name()
    }

    pub fn field(&self, field: &str) -> Option<FieldValue> {
        self.object.get_field(field)
    }

    pub fn session_id(&self) -> Uuid {
        self.session.session_id()
    }
}

impl fmt::Debug for LifecycleEventArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleEventArgs")
            .field("kind", &self.kind)
            .field("object_id", &self.object_id)
            .field("type_name", &self.object.type_name())
            .field("session_id", &self.session.session_id())
            .finish()
    }
}
