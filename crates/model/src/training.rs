use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::schedule::ScheduleTerm;

/// A class of recurring sessions.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrainingType {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub capacity: u32,
    /// Credits charged per participant per session.
    pub price: u32,
    pub duration_min: u32,
    #[serde(default)]
    pub schedule: Vec<ScheduleTerm>,
    #[serde(default)]
    pub version: u64,
}

impl TrainingType {
    pub fn new(name: String, capacity: u32, price: u32, duration_min: u32) -> TrainingType {
        TrainingType {
            id: ObjectId::new(),
            name,
            description: String::new(),
            capacity,
            price,
            duration_min,
            schedule: Vec::new(),
            version: 0,
        }
    }

    pub fn with_term(mut self, term: ScheduleTerm) -> TrainingType {
        self.schedule.push(term);
        self
    }
}
