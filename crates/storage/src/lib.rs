pub mod bookings;
pub mod exceptions;
pub mod memory;
pub mod notification;
pub mod profiles;
pub mod session;
pub mod trainers;
pub mod training;

use async_trait::async_trait;
use bookings::BookingStore;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use eyre::Result;
use exceptions::ExceptionStore;
use model::{
    booking::Booking, exception::SessionException, ids::SlotId, notification::Notification,
    profile::Profile, trainer::Trainer, training::TrainingType,
};
use notification::NotificationStore;
use profiles::ProfileStore;
use session::{Db, Session};
use trainers::TrainerStore;
use training::TrainingStore;

const DB_NAME: &str = "studio_db";

/// A unit of work against the store. Writes made between `start_transaction`
/// and `commit_transaction` become visible together or not at all.
#[async_trait]
pub trait Transaction: Send {
    async fn start_transaction(&mut self) -> Result<()>;
    async fn commit_transaction(&mut self) -> Result<()>;
    async fn abort_transaction(&mut self) -> Result<()>;
}

/// Row-level access to the tables the booking engine works with.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Session: Transaction;

    async fn start_session(&self) -> Result<Self::Session>;

    async fn get_training(
        &self,
        session: &mut Self::Session,
        id: ObjectId,
    ) -> Result<Option<TrainingType>>;
    async fn trainings(&self, session: &mut Self::Session) -> Result<Vec<TrainingType>>;
    async fn trainers(&self, session: &mut Self::Session) -> Result<Vec<Trainer>>;

    async fn get_profile(
        &self,
        session: &mut Self::Session,
        user_id: ObjectId,
    ) -> Result<Option<Profile>>;
    /// Adds `delta` (negative to charge) to the user's credit balance.
    async fn add_credits(
        &self,
        session: &mut Self::Session,
        user_id: ObjectId,
        delta: i64,
    ) -> Result<()>;

    async fn get_booking(
        &self,
        session: &mut Self::Session,
        id: ObjectId,
    ) -> Result<Option<Booking>>;
    async fn slot_bookings(
        &self,
        session: &mut Self::Session,
        slot: SlotId,
    ) -> Result<Vec<Booking>>;
    /// Bookings starting in `[from, to)`.
    async fn bookings_in_range(
        &self,
        session: &mut Self::Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;
    async fn user_bookings(
        &self,
        session: &mut Self::Session,
        user_id: ObjectId,
        from: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;
    async fn insert_booking(&self, session: &mut Self::Session, booking: &Booking) -> Result<()>;
    /// Returns false when there was nothing to delete.
    async fn delete_booking(&self, session: &mut Self::Session, id: ObjectId) -> Result<bool>;

    async fn get_exception(
        &self,
        session: &mut Self::Session,
        slot: SlotId,
    ) -> Result<Option<SessionException>>;
    async fn exceptions_in_range(
        &self,
        session: &mut Self::Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionException>>;
    async fn set_exception(
        &self,
        session: &mut Self::Session,
        exception: &SessionException,
    ) -> Result<()>;
    async fn remove_exception(&self, session: &mut Self::Session, slot: SlotId) -> Result<bool>;

    async fn push_notification(
        &self,
        session: &mut Self::Session,
        notification: &Notification,
    ) -> Result<()>;
    async fn due_notifications(
        &self,
        session: &mut Self::Session,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Notification>>;
    async fn mark_sent(&self, session: &mut Self::Session, id: ObjectId) -> Result<()>;
    async fn mark_failed(
        &self,
        session: &mut Self::Session,
        id: ObjectId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub bookings: BookingStore,
    pub training: TrainingStore,
    pub profiles: ProfileStore,
    pub exceptions: ExceptionStore,
    pub trainers: TrainerStore,
    pub notifications: NotificationStore,
}

impl Storage {
    pub async fn new(uri: &str) -> Result<Self> {
        let db = Db::new(uri, DB_NAME).await?;
        let bookings = BookingStore::new(&db).await?;
        let training = TrainingStore::new(&db);
        let profiles = ProfileStore::new(&db);
        let exceptions = ExceptionStore::new(&db).await?;
        let trainers = TrainerStore::new(&db);
        let notifications = NotificationStore::new(&db).await?;

        Ok(Storage {
            db,
            bookings,
            training,
            profiles,
            exceptions,
            trainers,
            notifications,
        })
    }
}

#[async_trait]
impl Store for Storage {
    type Session = Session;

    async fn start_session(&self) -> Result<Session> {
        self.db.start_session().await
    }

    async fn get_training(&self, session: &mut Session, id: ObjectId) -> Result<Option<TrainingType>> {
        self.training.get(session, id).await
    }

    async fn trainings(&self, session: &mut Session) -> Result<Vec<TrainingType>> {
        self.training.get_all(session).await
    }

    async fn trainers(&self, session: &mut Session) -> Result<Vec<Trainer>> {
        self.trainers.get_all(session).await
    }

    async fn get_profile(&self, session: &mut Session, user_id: ObjectId) -> Result<Option<Profile>> {
        self.profiles.get(session, user_id).await
    }

    async fn add_credits(&self, session: &mut Session, user_id: ObjectId, delta: i64) -> Result<()> {
        self.profiles.add_credits(session, user_id, delta).await
    }

    async fn get_booking(&self, session: &mut Session, id: ObjectId) -> Result<Option<Booking>> {
        self.bookings.get(session, id).await
    }

    async fn slot_bookings(&self, session: &mut Session, slot: SlotId) -> Result<Vec<Booking>> {
        self.bookings.by_slot(session, slot).await
    }

    async fn bookings_in_range(
        &self,
        session: &mut Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.bookings.in_range(session, from, to).await
    }

    async fn user_bookings(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        from: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.bookings.by_user(session, user_id, from).await
    }

    async fn insert_booking(&self, session: &mut Session, booking: &Booking) -> Result<()> {
        self.bookings.insert(session, booking).await
    }

    async fn delete_booking(&self, session: &mut Session, id: ObjectId) -> Result<bool> {
        self.bookings.delete(session, id).await
    }

    async fn get_exception(
        &self,
        session: &mut Session,
        slot: SlotId,
    ) -> Result<Option<SessionException>> {
        self.exceptions.get(session, slot).await
    }

    async fn exceptions_in_range(
        &self,
        session: &mut Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionException>> {
        self.exceptions.in_range(session, from, to).await
    }

    async fn set_exception(&self, session: &mut Session, exception: &SessionException) -> Result<()> {
        self.exceptions.upsert(session, exception).await
    }

    async fn remove_exception(&self, session: &mut Session, slot: SlotId) -> Result<bool> {
        self.exceptions.remove(session, slot).await
    }

    async fn push_notification(
        &self,
        session: &mut Session,
        notification: &Notification,
    ) -> Result<()> {
        self.notifications.insert(session, notification).await
    }

    async fn due_notifications(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        self.notifications.due(session, now, limit).await
    }

    async fn mark_sent(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        self.notifications.mark_as_sent(session, id).await
    }

    async fn mark_failed(
        &self,
        session: &mut Session,
        id: ObjectId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<()> {
        self.notifications
            .mark_as_failed(session, id, error, next_attempt_at)
            .await
    }
}
