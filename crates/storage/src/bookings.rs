use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use eyre::Result;
use futures_util::TryStreamExt as _;
use log::info;
use model::{booking::Booking, ids::SlotId};
use mongodb::{
    bson::doc,
    options::FindOptions,
    Collection, IndexModel,
};

use crate::session::{Db, Session};

const COLLECTION: &str = "bookings";

#[derive(Clone)]
pub struct BookingStore {
    pub(crate) store: Arc<Collection<Booking>>,
}

impl BookingStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "training_id": 1, "start_at": 1 })
                    .build(),
            )
            .await?;
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "start_at": 1 })
                    .build(),
            )
            .await?;
        Ok(BookingStore {
            store: Arc::new(store),
        })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Booking>> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn by_slot(&self, session: &mut Session, slot: SlotId) -> Result<Vec<Booking>> {
        let filter = doc! {
            "training_id": slot.training_id,
            "start_at": slot.start_at,
        };
        let mut cursor = self.store.find(filter).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn in_range(
        &self,
        session: &mut Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let filter = doc! {
            "start_at": {
                "$gte": from,
                "$lt": to,
            }
        };
        let mut cursor = self.store.find(filter).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn by_user(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        from: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let filter = doc! {
            "user_id": user_id,
            "start_at": { "$gte": from },
        };
        let mut cursor = self
            .store
            .find(filter)
            .with_options(FindOptions::builder().sort(doc! { "start_at": 1 }).build())
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn insert(&self, session: &mut Session, booking: &Booking) -> Result<()> {
        info!("Insert booking: {:?}", booking);
        self.store
            .insert_one(booking)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<bool> {
        info!("Delete booking: {}", id);
        let result = self
            .store
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count == 1)
    }
}
