use std::sync::Arc;

use bson::oid::ObjectId;
use eyre::Result;
use log::{info, warn};
use model::notification::{backoff, BookingEvent, Notification, MAX_ATTEMPTS};
use storage::Store;
use time::Clock;

/// Outbox of booking events waiting to be delivered to users.
pub struct Notifications<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for Notifications<S> {
    fn clone(&self) -> Self {
        Notifications {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: Store> Notifications<S> {
    pub(crate) fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Notifications { store, clock }
    }

    /// Never fails: a lost notification must not undo a committed booking.
    pub async fn enqueue(&self, session: &mut S::Session, to: &str, event: BookingEvent) {
        let booking_id = event.booking_id();
        let notification = Notification::new(to.to_owned(), event, self.clock.now());
        if let Err(err) = self.store.push_notification(session, &notification).await {
            warn!(
                "Failed to enqueue notification for booking {}: {:#}",
                booking_id, err
            );
        }
    }

    pub async fn pending(&self, session: &mut S::Session, limit: usize) -> Result<Vec<Notification>> {
        self.store
            .due_notifications(session, self.clock.now(), limit)
            .await
    }

    pub async fn sent(&self, session: &mut S::Session, id: ObjectId) -> Result<()> {
        self.store.mark_sent(session, id).await
    }

    /// Records a failed delivery. `attempts` counts the failures before this one.
    pub async fn failed(
        &self,
        session: &mut S::Session,
        id: ObjectId,
        attempts: u32,
        error: &str,
    ) -> Result<()> {
        if attempts + 1 >= MAX_ATTEMPTS {
            info!("Notification {} gave up after {} attempts", id, attempts + 1);
        }
        let next_attempt_at = self.clock.now() + backoff(attempts);
        self.store
            .mark_failed(session, id, error, next_attempt_at)
            .await
    }
}
