use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SlotId;

/// Override of one generated session, independent of the schedule.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionException {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub training_id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_at: DateTime<Utc>,
    /// Group booking is restricted; only staff may book the slot.
    pub individual_only: bool,
}

impl SessionException {
    pub fn individual_only(slot: SlotId) -> SessionException {
        SessionException {
            id: ObjectId::new(),
            training_id: slot.training_id,
            start_at: slot.start_at,
            individual_only: true,
        }
    }

    pub fn slot(&self) -> SlotId {
        SlotId::new(self.training_id, self.start_at)
    }
}
