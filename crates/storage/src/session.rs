use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use bson::doc;
use eyre::{Context as _, Error, Result};
use mongodb::{Client, ClientSession, Database};

use crate::Transaction;

#[derive(Clone)]
pub struct Db {
    client: Client,
    db: Database,
}

impl Db {
    pub(crate) async fn new(uri: &str, db_name: &str) -> Result<Self, Error> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .context("Failed to ping MongoDB")?;
        Ok(Db { client, db })
    }

    pub async fn start_session(&self) -> Result<Session> {
        let client_session = self
            .client
            .start_session()
            .await
            .context("Failed to start session")?;
        Ok(Session::new(client_session))
    }
}

impl Deref for Db {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

pub struct Session {
    client_session: ClientSession,
}

impl Session {
    pub fn new(client_session: ClientSession) -> Self {
        Session { client_session }
    }
}

impl Deref for Session {
    type Target = ClientSession;

    fn deref(&self) -> &Self::Target {
        &self.client_session
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.client_session
    }
}

impl<'a> From<&'a mut Session> for &'a mut ClientSession {
    fn from(session: &'a mut Session) -> &'a mut ClientSession {
        &mut session.client_session
    }
}

#[async_trait]
impl Transaction for Session {
    async fn start_transaction(&mut self) -> Result<()> {
        self.client_session
            .start_transaction()
            .await
            .context("start_transaction")
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.client_session
            .commit_transaction()
            .await
            .context("commit_transaction")
    }

    async fn abort_transaction(&mut self) -> Result<()> {
        self.client_session
            .abort_transaction()
            .await
            .context("abort_transaction")
    }
}
