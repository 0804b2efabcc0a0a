use std::{collections::HashMap, sync::Arc};

use bson::oid::ObjectId;
use eyre::{eyre, Result};
use model::{booking::Booking, ids::SlotId, slot::Slot, training::TrainingType};
use serde::Serialize;
use storage::Store;
use time::{Clock, CivilZone, DateWindow};

use crate::{occupancy::Occupancy, policy::BookingLockoutPolicy, schedule};

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub key: String,
    pub training_id: ObjectId,
    pub term_id: ObjectId,
    pub start_at: chrono::DateTime<chrono::Utc>,
    pub duration_min: u32,
    pub training: String,
    pub trainer: Option<String>,
    pub capacity: u32,
    pub occupancy: u32,
    pub free: u32,
    pub individual_only: bool,
    /// Always false without a viewer.
    pub is_registered: bool,
    /// Whether a regular user could book the slot right now.
    pub open: bool,
}

impl SlotView {
    pub fn id(&self) -> SlotId {
        SlotId::new(self.training_id, self.start_at)
    }
}

pub struct Calendar<S> {
    store: Arc<S>,
    zone: CivilZone,
    clock: Arc<dyn Clock>,
    lockout: BookingLockoutPolicy,
}

impl<S> Clone for Calendar<S> {
    fn clone(&self) -> Self {
        Calendar {
            store: self.store.clone(),
            zone: self.zone,
            clock: self.clock.clone(),
            lockout: self.lockout,
        }
    }
}

impl<S: Store> Calendar<S> {
    pub(crate) fn new(
        store: Arc<S>,
        zone: CivilZone,
        clock: Arc<dyn Clock>,
        lockout: BookingLockoutPolicy,
    ) -> Self {
        Calendar {
            store,
            zone,
            clock,
            lockout,
        }
    }

    /// Sessions of every training type in the window, ordered by start.
    pub async fn slots(
        &self,
        session: &mut S::Session,
        window: DateWindow,
        viewer: Option<ObjectId>,
    ) -> Result<Vec<SlotView>> {
        let trainings = self.store.trainings(session).await?;
        self.views(session, &trainings, window, viewer).await
    }

    pub async fn training_slots(
        &self,
        session: &mut S::Session,
        training_id: ObjectId,
        window: DateWindow,
        viewer: Option<ObjectId>,
    ) -> Result<Vec<SlotView>> {
        let training = self
            .store
            .get_training(session, training_id)
            .await?
            .ok_or_else(|| eyre!("Training not found: {}", training_id))?;
        self.views(session, &[training], window, viewer).await
    }

    async fn views(
        &self,
        session: &mut S::Session,
        trainings: &[TrainingType],
        window: DateWindow,
        viewer: Option<ObjectId>,
    ) -> Result<Vec<SlotView>> {
        let (from, to) = window.bounds(&self.zone);
        let trainers: HashMap<ObjectId, String> = self
            .store
            .trainers(session)
            .await?
            .into_iter()
            .map(|trainer| (trainer.id, trainer.name))
            .collect();

        let mut bookings: HashMap<SlotId, Vec<Booking>> = HashMap::new();
        for booking in self.store.bookings_in_range(session, from, to).await? {
            bookings.entry(booking.slot()).or_default().push(booking);
        }
        let individual: HashMap<SlotId, bool> = self
            .store
            .exceptions_in_range(session, from, to)
            .await?
            .into_iter()
            .map(|exception| (exception.slot(), exception.individual_only))
            .collect();

        let now = self.clock.now();
        let mut views = trainings
            .iter()
            .flat_map(|training| {
                schedule::expand(training, window, self.zone).map(move |slot| (training, slot))
            })
            .map(|(training, slot)| {
                let slot_bookings = bookings.get(&slot.id()).map(Vec::as_slice).unwrap_or(&[]);
                let individual_only = individual.get(&slot.id()).copied().unwrap_or(false);
                self.view(training, slot, slot_bookings, individual_only, viewer, &trainers, now)
            })
            .collect::<Vec<_>>();
        views.sort_by(|a, b| {
            a.start_at
                .cmp(&b.start_at)
                .then_with(|| a.training.cmp(&b.training))
        });
        Ok(views)
    }

    #[allow(clippy::too_many_arguments)]
    fn view(
        &self,
        training: &TrainingType,
        slot: Slot,
        bookings: &[Booking],
        individual_only: bool,
        viewer: Option<ObjectId>,
        trainers: &HashMap<ObjectId, String>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> SlotView {
        let occupancy = Occupancy::of(bookings);
        let free = occupancy.free(training.capacity);
        let locked = occupancy.is_empty() && self.lockout.is_locked(slot.start_at, now, &self.zone);
        let open = !slot.is_past(now) && !individual_only && free > 0 && !locked;
        let is_registered = viewer
            .map(|user| bookings.iter().any(|booking| booking.user_id == user))
            .unwrap_or(false);

        SlotView {
            trainer: slot.trainer.and_then(|id| trainers.get(&id).cloned()),
            key: slot.key,
            training_id: slot.training_id,
            term_id: slot.term_id,
            start_at: slot.start_at,
            duration_min: slot.duration_min,
            training: training.name.clone(),
            capacity: training.capacity,
            occupancy: occupancy.taken(),
            free,
            individual_only,
            is_registered,
            open,
        }
    }
}
