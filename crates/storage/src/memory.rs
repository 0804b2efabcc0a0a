//! In-process store used by tests and local runs without MongoDB.
//!
//! Transactions snapshot the whole state on start and restore it on abort, so
//! they are only meaningful while one session writes at a time.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use eyre::{bail, eyre, Result};
use model::{
    booking::Booking, exception::SessionException, ids::SlotId, notification::Notification,
    profile::Profile, trainer::Trainer, training::TrainingType,
};
use parking_lot::Mutex;

use crate::{Store, Transaction};

#[derive(Debug, Clone, Default)]
struct State {
    trainings: Vec<TrainingType>,
    trainers: Vec<Trainer>,
    profiles: HashMap<ObjectId, Profile>,
    bookings: Vec<Booking>,
    exceptions: Vec<SessionException>,
    notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    credits: bool,
    notifications: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn add_training(&self, training: TrainingType) {
        self.state.lock().trainings.push(training);
    }

    pub fn add_trainer(&self, trainer: Trainer) {
        self.state.lock().trainers.push(trainer);
    }

    pub fn add_profile(&self, profile: Profile) {
        self.state.lock().profiles.insert(profile.id, profile);
    }

    pub fn add_booking(&self, booking: Booking) {
        self.state.lock().bookings.push(booking);
    }

    pub fn set_unlimited(&self, user_id: ObjectId, expires_at: Option<DateTime<Utc>>) {
        if let Some(profile) = self.state.lock().profiles.get_mut(&user_id) {
            profile.unlimited_expires_at = expires_at;
        }
    }

    pub fn set_price(&self, training_id: ObjectId, price: u32) {
        let mut state = self.state.lock();
        if let Some(training) = state.trainings.iter_mut().find(|t| t.id == training_id) {
            training.price = price;
        }
    }

    pub fn profile(&self, user_id: ObjectId) -> Option<Profile> {
        self.state.lock().profiles.get(&user_id).cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state.lock().bookings.clone()
    }

    pub fn exceptions(&self) -> Vec<SessionException> {
        self.state.lock().exceptions.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().notifications.clone()
    }

    /// Makes every credit update fail until switched off.
    pub fn fail_credit_updates(&self, fail: bool) {
        self.faults.lock().credits = fail;
    }

    /// Makes every notification write fail until switched off.
    pub fn fail_notifications(&self, fail: bool) {
        self.faults.lock().notifications = fail;
    }
}

pub struct MemorySession {
    state: Arc<Mutex<State>>,
    snapshot: Option<State>,
}

#[async_trait]
impl Transaction for MemorySession {
    async fn start_transaction(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            bail!("Transaction already in progress");
        }
        self.snapshot = Some(self.state.lock().clone());
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| eyre!("No transaction in progress"))
    }

    async fn abort_transaction(&mut self) -> Result<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| eyre!("No transaction in progress"))?;
        *self.state.lock() = snapshot;
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStorage {
    type Session = MemorySession;

    async fn start_session(&self) -> Result<MemorySession> {
        Ok(MemorySession {
            state: self.state.clone(),
            snapshot: None,
        })
    }

    async fn get_training(
        &self,
        _: &mut MemorySession,
        id: ObjectId,
    ) -> Result<Option<TrainingType>> {
        Ok(self
            .state
            .lock()
            .trainings
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn trainings(&self, _: &mut MemorySession) -> Result<Vec<TrainingType>> {
        Ok(self.state.lock().trainings.clone())
    }

    async fn trainers(&self, _: &mut MemorySession) -> Result<Vec<Trainer>> {
        Ok(self.state.lock().trainers.clone())
    }

    async fn get_profile(&self, _: &mut MemorySession, user_id: ObjectId) -> Result<Option<Profile>> {
        Ok(self.state.lock().profiles.get(&user_id).cloned())
    }

    async fn add_credits(&self, _: &mut MemorySession, user_id: ObjectId, delta: i64) -> Result<()> {
        if self.faults.lock().credits {
            bail!("Credit update failed");
        }
        let mut state = self.state.lock();
        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| eyre!("Profile not found: {}", user_id))?;
        profile.credits += delta;
        profile.version += 1;
        Ok(())
    }

    async fn get_booking(&self, _: &mut MemorySession, id: ObjectId) -> Result<Option<Booking>> {
        Ok(self
            .state
            .lock()
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn slot_bookings(&self, _: &mut MemorySession, slot: SlotId) -> Result<Vec<Booking>> {
        Ok(self
            .state
            .lock()
            .bookings
            .iter()
            .filter(|b| b.slot() == slot)
            .cloned()
            .collect())
    }

    async fn bookings_in_range(
        &self,
        _: &mut MemorySession,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .state
            .lock()
            .bookings
            .iter()
            .filter(|b| b.start_at >= from && b.start_at < to)
            .cloned()
            .collect())
    }

    async fn user_bookings(
        &self,
        _: &mut MemorySession,
        user_id: ObjectId,
        from: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let mut bookings: Vec<_> = self
            .state
            .lock()
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.start_at >= from)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_at);
        Ok(bookings)
    }

    async fn insert_booking(&self, _: &mut MemorySession, booking: &Booking) -> Result<()> {
        let mut state = self.state.lock();
        if state.bookings.iter().any(|b| b.id == booking.id) {
            bail!("Duplicate key: {}", booking.id);
        }
        state.bookings.push(booking.clone());
        Ok(())
    }

    async fn delete_booking(&self, _: &mut MemorySession, id: ObjectId) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.bookings.len();
        state.bookings.retain(|b| b.id != id);
        Ok(state.bookings.len() != before)
    }

    async fn get_exception(
        &self,
        _: &mut MemorySession,
        slot: SlotId,
    ) -> Result<Option<SessionException>> {
        Ok(self
            .state
            .lock()
            .exceptions
            .iter()
            .find(|e| e.slot() == slot)
            .cloned())
    }

    async fn exceptions_in_range(
        &self,
        _: &mut MemorySession,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionException>> {
        Ok(self
            .state
            .lock()
            .exceptions
            .iter()
            .filter(|e| e.start_at >= from && e.start_at < to)
            .cloned()
            .collect())
    }

    async fn set_exception(
        &self,
        _: &mut MemorySession,
        exception: &SessionException,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let position = state
            .exceptions
            .iter()
            .position(|e| e.slot() == exception.slot());
        match position {
            Some(idx) => state.exceptions[idx].individual_only = exception.individual_only,
            None => state.exceptions.push(exception.clone()),
        }
        Ok(())
    }

    async fn remove_exception(&self, _: &mut MemorySession, slot: SlotId) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.exceptions.len();
        state.exceptions.retain(|e| e.slot() != slot);
        Ok(state.exceptions.len() != before)
    }

    async fn push_notification(
        &self,
        _: &mut MemorySession,
        notification: &Notification,
    ) -> Result<()> {
        if self.faults.lock().notifications {
            bail!("Notification write failed");
        }
        self.state.lock().notifications.push(notification.clone());
        Ok(())
    }

    async fn due_notifications(
        &self,
        _: &mut MemorySession,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let mut due: Vec<_> = self
            .state
            .lock()
            .notifications
            .iter()
            .filter(|n| n.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|n| n.next_attempt_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn mark_sent(&self, _: &mut MemorySession, id: ObjectId) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) {
            notification.sent = true;
            notification.last_error = None;
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        _: &mut MemorySession,
        id: ObjectId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) {
            notification.attempts += 1;
            notification.last_error = Some(error.to_owned());
            notification.next_attempt_at = next_attempt_at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn booking(user_id: ObjectId) -> Booking {
        let start = Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
        Booking::new(user_id, SlotId::new(ObjectId::new(), start), 1, start)
    }

    #[tokio::test]
    async fn test_abort_restores_state() {
        let store = MemoryStorage::new();
        let user = ObjectId::new();
        store.add_profile(Profile::new(user, "a@b.sk".to_owned(), 5));
        let mut session = store.start_session().await.unwrap();

        session.start_transaction().await.unwrap();
        store.insert_booking(&mut session, &booking(user)).await.unwrap();
        store.add_credits(&mut session, user, -1).await.unwrap();
        session.abort_transaction().await.unwrap();

        assert!(store.bookings().is_empty());
        assert_eq!(store.profile(user).unwrap().credits, 5);
    }

    #[tokio::test]
    async fn test_commit_keeps_state() {
        let store = MemoryStorage::new();
        let user = ObjectId::new();
        store.add_profile(Profile::new(user, "a@b.sk".to_owned(), 5));
        let mut session = store.start_session().await.unwrap();

        session.start_transaction().await.unwrap();
        store.insert_booking(&mut session, &booking(user)).await.unwrap();
        store.add_credits(&mut session, user, -1).await.unwrap();
        session.commit_transaction().await.unwrap();

        assert_eq!(store.bookings().len(), 1);
        assert_eq!(store.profile(user).unwrap().credits, 4);
        assert!(session.commit_transaction().await.is_err());
    }

    #[tokio::test]
    async fn test_credit_fault() {
        let store = MemoryStorage::new();
        let user = ObjectId::new();
        store.add_profile(Profile::new(user, "a@b.sk".to_owned(), 5));
        let mut session = store.start_session().await.unwrap();
        store.fail_credit_updates(true);
        assert!(store.add_credits(&mut session, user, -1).await.is_err());
        store.fail_credit_updates(false);
        store.add_credits(&mut session, user, -1).await.unwrap();
        assert_eq!(store.profile(user).unwrap().credits, 4);
    }
}
