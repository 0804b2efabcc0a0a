use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user mutable state the booking engine reads and adjusts.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credits: i64,
    /// Unmetered personal access until this instant.
    #[serde(default, with = "opt_bson_datetime")]
    pub unlimited_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

impl Profile {
    pub fn new(id: ObjectId, email: String, credits: i64) -> Profile {
        Profile {
            id,
            email,
            name: String::new(),
            credits,
            unlimited_expires_at: None,
            version: 0,
        }
    }

    pub fn is_unlimited(&self, now: DateTime<Utc>) -> bool {
        self.unlimited_expires_at
            .map(|expires_at| expires_at > now)
            .unwrap_or(false)
    }
}

mod opt_bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize as _, Deserializer, Serialize as _, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|dt| dt.to_chrono()))
    }
}
