use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::engine::{MarkerTransition, ObjectId};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    NotSoftDeleteable,
    AlreadyMarked,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RewriteOutcome {
    HardDelete { reason: SkipReason },
    SoftDeleted { transition: MarkerTransition },
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRewrite {
    pub object_id: ObjectId,
    pub type_name: String,
    pub outcome: RewriteOutcome,
}

impl ObjectRewrite {
    pub fn is_soft_deleted(&self) -> bool {
        matches!(self.outcome, RewriteOutcome::SoftDeleted { .. })
    }

    pub fn transition(&self) -> Option<&MarkerTransition> {
        match &self.outcome {
            RewriteOutcome::SoftDeleted { transition } => Some(transition),
            RewriteOutcome::HardDelete { .. } => None,
        }
    }
}


/// What one flush pass did to each scheduled deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlushReport {
    pub rewrites: Vec<ObjectRewrite>,
}

impl FlushReport {
    pub fn soft_deleted(&self) -> impl Iterator<Item = &ObjectRewrite> {
        self.rewrites.iter().filter(|r| r.is_soft_deleted())
    }

    pub fn soft_deleted_count(&self) -> usize {
        self.soft_deleted().count()
    }

    pub fn hard_deleted_count(&self) -> usize {
        self.rewrites.len() - self.soft_deleted_count()
    }

    pub fn get(&self, object_id: ObjectId) -> Option<&ObjectRewrite> {
        self.rewrites.iter().find(|r| r.object_id == object_id)
    }
}
