use std::sync::Arc;

use eyre::{bail, Result};
use log::info;
use model::profile::Profile;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection,
};

use crate::session::{Db, Session};

const COLLECTION: &str = "profiles";

#[derive(Clone)]
pub struct ProfileStore {
    pub(crate) store: Arc<Collection<Profile>>,
}

impl ProfileStore {
    pub(crate) fn new(db: &Db) -> Self {
        ProfileStore {
            store: Arc::new(db.collection(COLLECTION)),
        }
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Profile>> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn add_credits(&self, session: &mut Session, id: ObjectId, delta: i64) -> Result<()> {
        info!("Add credits: {} {}", id, delta);
        let result = self
            .store
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "credits": delta, "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count == 0 {
            bail!("Profile not found: {}", id);
        }
        Ok(())
    }
}
