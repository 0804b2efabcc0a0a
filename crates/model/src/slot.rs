use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};

use crate::ids::SlotId;

/// One concrete occurrence of a training, derived from a schedule term.
/// Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// `{training}-{term}-{day of month}`.
    pub key: String,
    pub training_id: ObjectId,
    pub term_id: ObjectId,
    pub start_at: DateTime<Utc>,
    pub duration_min: u32,
    pub trainer: Option<ObjectId>,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        SlotId::new(self.training_id, self.start_at)
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + Duration::minutes(self.duration_min as i64)
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.start_at < now
    }
}
