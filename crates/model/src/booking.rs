use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SlotId;

/// A reservation of one session. Deleted outright on cancellation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub training_id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_at: DateTime<Utc>,
    /// The owner plus guests.
    #[serde(default = "default_participants")]
    pub participants: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

fn default_participants() -> u32 {
    1
}

impl Booking {
    pub fn new(
        user_id: ObjectId,
        slot: SlotId,
        participants: u32,
        created_at: DateTime<Utc>,
    ) -> Booking {
        Booking {
            id: ObjectId::new(),
            user_id,
            training_id: slot.training_id,
            start_at: slot.start_at,
            participants,
            created_at,
        }
    }

    pub fn slot(&self) -> SlotId {
        SlotId::new(self.training_id, self.start_at)
    }

    /// Headcount this booking occupies; a zero stored by older clients counts as one.
    pub fn headcount(&self) -> u32 {
        self.participants.max(1)
    }
}
