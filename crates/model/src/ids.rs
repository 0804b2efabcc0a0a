use std::fmt::{self, Display};

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one concrete session: the training type and its start instant.
/// Two sessions are the same iff both parts match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId {
    pub training_id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_at: DateTime<Utc>,
}

impl SlotId {
    pub fn new(training_id: ObjectId, start_at: DateTime<Utc>) -> SlotId {
        SlotId {
            training_id,
            start_at,
        }
    }
}

impl Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.training_id, self.start_at.to_rfc3339())
    }
}
