use std::sync::Arc;

use bson::to_document;
use chrono::{DateTime, Utc};
use eyre::Result;
use futures_util::TryStreamExt as _;
use log::info;
use model::{exception::SessionException, ids::SlotId};
use mongodb::{
    bson::doc,
    options::{IndexOptions, UpdateOptions},
    Collection, IndexModel,
};

use crate::session::{Db, Session};

const COLLECTION: &str = "training_session_exceptions";

#[derive(Clone)]
pub struct ExceptionStore {
    pub(crate) store: Arc<Collection<SessionException>>,
}

fn slot_filter(slot: SlotId) -> bson::Document {
    doc! {
        "training_id": slot.training_id,
        "start_at": slot.start_at,
    }
}

impl ExceptionStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "training_id": 1, "start_at": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        Ok(ExceptionStore {
            store: Arc::new(store),
        })
    }

    pub async fn get(&self, session: &mut Session, slot: SlotId) -> Result<Option<SessionException>> {
        Ok(self
            .store
            .find_one(slot_filter(slot))
            .session(&mut *session)
            .await?)
    }

    pub async fn in_range(
        &self,
        session: &mut Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionException>> {
        let filter = doc! {
            "start_at": {
                "$gte": from,
                "$lt": to,
            }
        };
        let mut cursor = self.store.find(filter).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn upsert(&self, session: &mut Session, exception: &SessionException) -> Result<()> {
        info!("Set session exception: {:?}", exception);
        let mut fields = to_document(exception)?;
        fields.remove("_id");
        self.store
            .update_one(
                slot_filter(exception.slot()),
                doc! {
                    "$set": fields,
                    "$setOnInsert": { "_id": exception.id },
                },
            )
            .session(&mut *session)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        Ok(())
    }

    pub async fn remove(&self, session: &mut Session, slot: SlotId) -> Result<bool> {
        info!("Remove session exception: {}", slot);
        let result = self
            .store
            .delete_one(slot_filter(slot))
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
