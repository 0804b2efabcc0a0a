use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trainer {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

impl Trainer {
    pub fn new(name: &str) -> Trainer {
        Trainer {
            id: ObjectId::new(),
            name: name.to_owned(),
        }
    }
}
