use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::Result;
use futures_util::TryStreamExt as _;
use model::notification::{Notification, MAX_ATTEMPTS};
use mongodb::{options::FindOptions, Collection, IndexModel};

use crate::session::{Db, Session};

const TABLE_NAME: &str = "notifications";

#[derive(Clone)]
pub struct NotificationStore {
    store: Arc<Collection<Notification>>,
}

impl NotificationStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let store = db.collection(TABLE_NAME);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "sent": 1, "next_attempt_at": 1 })
                    .build(),
            )
            .await?;
        Ok(NotificationStore {
            store: Arc::new(store),
        })
    }

    pub async fn insert(&self, session: &mut Session, notification: &Notification) -> Result<()> {
        self.store
            .insert_one(notification)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn due(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let filter = doc! {
            "sent": false,
            "attempts": { "$lt": MAX_ATTEMPTS as i64 },
            "next_attempt_at": { "$lte": now },
        };
        let options = FindOptions::builder()
            .sort(doc! { "next_attempt_at": 1 })
            .limit(limit as i64)
            .build();
        let mut cursor = self
            .store
            .find(filter)
            .with_options(options)
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn mark_as_sent(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        self.store
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "sent": true, "last_error": null } },
            )
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn mark_as_failed(
        &self,
        session: &mut Session,
        id: ObjectId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<()> {
        self.store
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "last_error": error, "next_attempt_at": next_attempt_at },
                    "$inc": { "attempts": 1 },
                },
            )
            .session(&mut *session)
            .await?;
        Ok(())
    }
}
