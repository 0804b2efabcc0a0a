use std::sync::Arc;

use eyre::Error;
use futures_util::TryStreamExt as _;
use model::training::TrainingType;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection,
};

use crate::session::{Db, Session};

const COLLECTION: &str = "training_types";

#[derive(Clone)]
pub struct TrainingStore {
    pub(crate) store: Arc<Collection<TrainingType>>,
}

impl TrainingStore {
    pub(crate) fn new(db: &Db) -> Self {
        let store = db.collection(COLLECTION);

        TrainingStore {
            store: Arc::new(store),
        }
    }

    pub async fn get(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<Option<TrainingType>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn get_all(&self, session: &mut Session) -> Result<Vec<TrainingType>, Error> {
        let mut cursor = self.store.find(doc! {}).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }
}
