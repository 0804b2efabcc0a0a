use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_ATTEMPTS: u32 = 5;

/// Something the user has to be told about.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BookingEvent {
    Created {
        booking_id: ObjectId,
        training: String,
        #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
        start_at: DateTime<Utc>,
        participants: u32,
        cost: u32,
    },
    Cancelled {
        booking_id: ObjectId,
        training: String,
        #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
        start_at: DateTime<Utc>,
        participants: u32,
        refund: Option<u32>,
    },
}

impl BookingEvent {
    pub fn booking_id(&self) -> ObjectId {
        match self {
            BookingEvent::Created { booking_id, .. } | BookingEvent::Cancelled { booking_id, .. } => {
                *booking_id
            }
        }
    }
}

/// Outbox record consumed by the delivery worker.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub to: String,
    pub event: BookingEvent,
    pub sent: bool,
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub next_attempt_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(to: String, event: BookingEvent, now: DateTime<Utc>) -> Notification {
        Notification {
            id: ObjectId::new(),
            to,
            event,
            sent: false,
            attempts: 0,
            last_error: None,
            created_at: now,
            next_attempt_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.attempts < MAX_ATTEMPTS && self.next_attempt_at <= now
    }
}

/// Delay before the next delivery attempt after `attempts` failures.
pub fn backoff(attempts: u32) -> Duration {
    let minutes = 1i64 << attempts.min(6);
    Duration::minutes(minutes.min(60))
}
