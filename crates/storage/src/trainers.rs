use std::sync::Arc;

use eyre::Error;
use futures_util::TryStreamExt as _;
use model::trainer::Trainer;
use mongodb::{bson::doc, Collection};

use crate::session::{Db, Session};

const COLLECTION: &str = "trainers";

#[derive(Clone)]
pub struct TrainerStore {
    pub(crate) store: Arc<Collection<Trainer>>,
}

impl TrainerStore {
    pub(crate) fn new(db: &Db) -> Self {
        TrainerStore {
            store: Arc::new(db.collection(COLLECTION)),
        }
    }

    pub async fn get_all(&self, session: &mut Session) -> Result<Vec<Trainer>, Error> {
        let mut cursor = self.store.find(doc! {}).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }
}
