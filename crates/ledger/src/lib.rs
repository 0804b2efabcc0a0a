use std::sync::Arc;

use bson::oid::ObjectId;
use calendar::Calendar;
use chrono::{DateTime, Utc};
use eyre::Result;
use exceptions::Exceptions;
use log::{info, warn};
use model::{
    actor::Actor, booking::Booking, ids::SlotId, notification::BookingEvent,
};
use notifications::Notifications;
use occupancy::Occupancy;
use policy::{BookingLockoutPolicy, CancellationRefundPolicy};
use pricing::Cost;
use storage::Store;
use thiserror::Error;
use time::{Clock, CivilZone};
use tx_macro::tx;

pub mod calendar;
pub mod exceptions;
pub mod notifications;
pub mod occupancy;
pub mod outcome;
pub mod policy;
pub mod pricing;
pub mod schedule;

pub use outcome::Outcome;

pub struct Ledger<S> {
    store: Arc<S>,
    zone: CivilZone,
    clock: Arc<dyn Clock>,
    lockout: BookingLockoutPolicy,
    refund: CancellationRefundPolicy,
    pub calendar: Calendar<S>,
    pub exceptions: Exceptions<S>,
    pub notifications: Notifications<S>,
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Ledger {
            store: self.store.clone(),
            zone: self.zone,
            clock: self.clock.clone(),
            lockout: self.lockout,
            refund: self.refund,
            calendar: self.calendar.clone(),
            exceptions: self.exceptions.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

impl<S: Store> Ledger<S> {
    pub fn new(store: S, zone: CivilZone, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(store);
        let lockout = BookingLockoutPolicy::default();
        Ledger {
            calendar: Calendar::new(store.clone(), zone, clock.clone(), lockout),
            exceptions: Exceptions::new(store.clone(), zone),
            notifications: Notifications::new(store.clone(), clock.clone()),
            store,
            zone,
            clock,
            lockout,
            refund: CancellationRefundPolicy::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn zone(&self) -> CivilZone {
        self.zone
    }

    pub async fn start_session(&self) -> Result<S::Session> {
        self.store.start_session().await
    }

    /// Reserves a session and charges for it, then queues the confirmation.
    pub async fn book(&self, actor: Actor, request: BookRequest) -> Result<Booked, BookError> {
        let mut session = self.store.start_session().await?;
        let (booked, email) = self.sign_up(&mut session, actor, request).await?;
        let event = BookingEvent::Created {
            booking_id: booked.booking.id,
            training: booked.training.clone(),
            start_at: booked.booking.start_at,
            participants: booked.booking.headcount(),
            cost: booked.cost.total(),
        };
        self.notifications.enqueue(&mut session, &email, event).await;
        Ok(booked)
    }

    /// Releases a booking, refunding it when cancelled in time, then queues
    /// the confirmation.
    pub async fn cancel(&self, actor: Actor, booking_id: ObjectId) -> Result<Cancelled, CancelError> {
        let mut session = self.store.start_session().await?;
        let (cancelled, email) = self.sign_out(&mut session, actor, booking_id).await?;
        let Some(email) = email else {
            return Ok(cancelled);
        };
        let event = BookingEvent::Cancelled {
            booking_id: cancelled.booking.id,
            training: cancelled.training.clone().unwrap_or_default(),
            start_at: cancelled.booking.start_at,
            participants: cancelled.booking.headcount(),
            refund: cancelled.refund.credited(),
        };
        self.notifications.enqueue(&mut session, &email, event).await;
        Ok(cancelled)
    }

    /// Upcoming bookings of a user, earliest first.
    pub async fn user_bookings(&self, user_id: ObjectId) -> Result<Vec<Booking>> {
        let mut session = self.store.start_session().await?;
        self.store
            .user_bookings(&mut session, user_id, self.clock.now())
            .await
    }

    /// Returns the booking and the address to confirm it to.
    #[tx]
    pub async fn sign_up(
        &self,
        session: &mut S::Session,
        actor: Actor,
        request: BookRequest,
    ) -> Result<(Booked, String), BookError> {
        if !actor.may_book() {
            return Err(BookError::EmailNotVerified);
        }
        if request.participants == 0 {
            return Err(BookError::InvalidParticipants);
        }
        let training = self
            .store
            .get_training(session, request.training_id)
            .await?
            .ok_or(BookError::TrainingNotFound)?;
        let profile = self
            .store
            .get_profile(session, actor.user_id)
            .await?
            .ok_or(BookError::ProfileNotFound)?;

        let slot = schedule::find_slot(&training, request.start_at, &self.zone)
            .ok_or(BookError::SlotNotFound)?;
        let now = self.clock.now();
        if slot.is_past(now) {
            return Err(BookError::SessionInPast);
        }
        if !actor.is_staff() && self.exceptions.is_individual_only(session, slot.id()).await? {
            return Err(BookError::IndividualOnly);
        }

        let bookings = self.store.slot_bookings(session, slot.id()).await?;
        let occupancy = Occupancy::of(&bookings);
        if !occupancy.admits(training.capacity, request.participants) {
            return Err(BookError::CapacityExceeded {
                free: occupancy.free(training.capacity),
            });
        }
        if occupancy.is_empty() && self.lockout.is_locked(slot.start_at, now, &self.zone) {
            info!(
                "Lockout for {} {}: {:.1}h before start",
                training.name,
                self.zone.fmt(slot.start_at),
                time::hours(slot.start_at - now)
            );
            return Err(BookError::BookingClosed {
                hours: self.lockout.notice(slot.start_at, &self.zone).num_hours(),
            });
        }
        if bookings.iter().any(|booking| booking.user_id == actor.user_id) {
            return Err(BookError::AlreadyBooked);
        }

        let cost = Cost::new(training.price, request.participants, profile.is_unlimited(now));
        if profile.credits < i64::from(cost.total()) {
            return Err(BookError::NotEnoughCredits {
                required: cost.total(),
                available: profile.credits,
            });
        }

        let booking = Booking::new(actor.user_id, slot.id(), request.participants, now);
        self.store.insert_booking(session, &booking).await?;
        if !cost.is_free() {
            self.store
                .add_credits(session, actor.user_id, -i64::from(cost.total()))
                .await?;
        }
        info!(
            "User {} booked {} at {} for {} (cost {})",
            actor.user_id,
            training.name,
            self.zone.fmt(slot.start_at),
            request.participants,
            cost.total()
        );
        Ok((
            Booked {
                booking,
                training: training.name,
                cost,
            },
            profile.email,
        ))
    }

    /// Returns the cancellation and the address to confirm it to, if the
    /// owner still has a profile.
    #[tx]
    pub async fn sign_out(
        &self,
        session: &mut S::Session,
        actor: Actor,
        booking_id: ObjectId,
    ) -> Result<(Cancelled, Option<String>), CancelError> {
        let booking = self
            .store
            .get_booking(session, booking_id)
            .await?
            .filter(|booking| booking.user_id == actor.user_id)
            .ok_or(CancelError::NotFound)?;
        let profile = self.store.get_profile(session, booking.user_id).await?;
        let training = self.store.get_training(session, booking.training_id).await?;

        let now = self.clock.now();
        let in_time = self.refund.should_refund(booking.start_at, now);
        if !self.store.delete_booking(session, booking.id).await? {
            return Err(CancelError::NotFound);
        }

        let refund = match (&training, &profile, in_time) {
            (_, _, false) => Refund::Late,
            (None, _, true) => {
                warn!(
                    "Training {} of booking {} is gone, nothing to refund",
                    booking.training_id, booking.id
                );
                Refund::Unpriced
            }
            (Some(_), None, true) => {
                warn!(
                    "Profile of user {} is gone, booking {} is released without refund",
                    booking.user_id, booking.id
                );
                Refund::NoProfile
            }
            (Some(training), Some(profile), true) => {
                let cost = Cost::new(training.price, booking.headcount(), profile.is_unlimited(now));
                if !cost.is_free() {
                    self.store
                        .add_credits(session, booking.user_id, i64::from(cost.total()))
                        .await?;
                }
                Refund::Credited(cost)
            }
        };
        info!(
            "User {} cancelled booking {} at {}: {:?}",
            actor.user_id,
            booking.id,
            self.zone.fmt(booking.start_at),
            refund
        );
        Ok((
            Cancelled {
                booking,
                training: training.map(|training| training.name),
                refund,
            },
            profile.map(|profile| profile.email),
        ))
    }
}

/// A request to book one session, identified by its true start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookRequest {
    pub training_id: ObjectId,
    pub start_at: DateTime<Utc>,
    pub participants: u32,
}

impl BookRequest {
    pub fn new(slot: SlotId, participants: u32) -> BookRequest {
        BookRequest {
            training_id: slot.training_id,
            start_at: slot.start_at,
            participants,
        }
    }

    /// For start times whose clock fields are civil time in `zone` but were
    /// stored as UTC.
    pub fn from_face_value(
        training_id: ObjectId,
        face_value: DateTime<Utc>,
        participants: u32,
        zone: &CivilZone,
    ) -> BookRequest {
        BookRequest {
            training_id,
            start_at: zone.normalize(face_value),
            participants,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Booked {
    pub booking: Booking,
    pub training: String,
    pub cost: Cost,
}

#[derive(Debug, Clone)]
pub struct Cancelled {
    pub booking: Booking,
    /// `None` when the training type no longer exists.
    pub training: Option<String>,
    pub refund: Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refund {
    Credited(Cost),
    /// Cancelled too close to the start.
    Late,
    /// The training type is gone, there is no price to refund.
    Unpriced,
    /// The owner's profile is gone, there is no balance to credit.
    NoProfile,
}

impl Refund {
    pub fn credited(&self) -> Option<u32> {
        match self {
            Refund::Credited(cost) => Some(cost.total()),
            Refund::Late | Refund::Unpriced | Refund::NoProfile => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("Pred rezerváciou si prosím overte svoju e-mailovú adresu.")]
    EmailNotVerified,
    #[error("Počet účastníkov musí byť aspoň 1.")]
    InvalidParticipants,
    #[error("Tréning neexistuje.")]
    TrainingNotFound,
    #[error("Používateľský profil sa nenašiel.")]
    ProfileNotFound,
    #[error("Tento termín v rozvrhu neexistuje.")]
    SlotNotFound,
    #[error("Tento tréning už začal alebo prebehol.")]
    SessionInPast,
    #[error("Tento termín je vyhradený pre individuálny tréning.")]
    IndividualOnly,
    #[error("Kapacita tréningu je naplnená. Voľné miesta: {free}.")]
    CapacityExceeded { free: u32 },
    #[error("Na tento tréning sa dá prihlásiť najneskôr {hours} hodín pred začiatkom.")]
    BookingClosed { hours: i64 },
    #[error("Na tento tréning už máte rezerváciu.")]
    AlreadyBooked,
    #[error("Nemáte dostatok kreditov. Potrebné: {required}, k dispozícii: {available}.")]
    NotEnoughCredits { required: u32, available: i64 },
    #[error("Rezerváciu sa nepodarilo uložiť. Skúste to prosím znova.")]
    Common(#[from] eyre::Error),
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("Rezervácia sa nenašla.")]
    NotFound,
    #[error("Rezerváciu sa nepodarilo zrušiť. Skúste to prosím znova.")]
    Common(#[from] eyre::Error),
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone as _, Weekday};
    use model::{
        actor::Role, notification::Notification, profile::Profile, schedule::ScheduleTerm,
        training::TrainingType,
    };
    use storage::memory::MemoryStorage;
    use time::FixedClock;

    use super::*;

    struct Fixture {
        ledger: Ledger<MemoryStorage>,
        store: MemoryStorage,
        clock: Arc<FixedClock>,
        training: TrainingType,
        user: ObjectId,
    }

    impl Fixture {
        fn new(capacity: u32) -> Fixture {
            let store = MemoryStorage::new();
            let training = TrainingType::new("Pilates".to_owned(), capacity, 1, 60)
                .with_term(ScheduleTerm::weekly(Weekday::Wed, "18:00", None))
                .with_term(ScheduleTerm::weekly(Weekday::Wed, "10:00", None));
            store.add_training(training.clone());
            let user = ObjectId::new();
            store.add_profile(Profile::new(user, "jana@studio.sk".to_owned(), 10));
            let clock = Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2026, 2, 16, 12, 0, 0).unwrap(),
            ));
            let ledger = Ledger::new(store.clone(), CivilZone::default(), clock.clone());
            Fixture {
                ledger,
                store,
                clock,
                training,
                user,
            }
        }

        fn profile(&self, credits: i64) -> ObjectId {
            let user = ObjectId::new();
            self.store
                .add_profile(Profile::new(user, format!("{}@studio.sk", user), credits));
            user
        }

        fn credits(&self, user: ObjectId) -> i64 {
            self.store.profile(user).unwrap().credits
        }

        fn request(&self, participants: u32) -> BookRequest {
            BookRequest::new(SlotId::new(self.training.id, evening()), participants)
        }

        async fn book(&self, user: ObjectId, participants: u32) -> Result<Booked, BookError> {
            self.ledger
                .book(Actor::user(user), self.request(participants))
                .await
        }
    }

    /// Wednesday 18:00 in Bratislava.
    fn evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_book() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        assert_eq!(booked.cost.total(), 1);
        assert_eq!(booked.training, "Pilates");
        assert_eq!(fx.credits(fx.user), 9);
        assert_eq!(fx.store.bookings(), vec![booked.booking.clone()]);
        assert_eq!(
            fx.ledger.user_bookings(fx.user).await.unwrap(),
            vec![booked.booking]
        );
    }

    #[tokio::test]
    async fn test_duplicate_booking() {
        let fx = Fixture::new(8);
        fx.book(fx.user, 1).await.unwrap();
        let err = fx.book(fx.user, 1).await.unwrap_err();
        assert!(matches!(err, BookError::AlreadyBooked));
        assert_eq!(fx.store.bookings().len(), 1);
        assert_eq!(fx.credits(fx.user), 9);
    }

    #[tokio::test]
    async fn test_capacity_is_never_exceeded() {
        let fx = Fixture::new(3);
        fx.book(fx.user, 2).await.unwrap();
        let second = fx.profile(10);
        let err = fx.book(second, 2).await.unwrap_err();
        assert!(matches!(err, BookError::CapacityExceeded { free: 1 }));
        fx.book(second, 1).await.unwrap();
        let third = fx.profile(10);
        assert!(matches!(
            fx.book(third, 1).await,
            Err(BookError::CapacityExceeded { free: 0 })
        ));
        let taken: u32 = fx.store.bookings().iter().map(Booking::headcount).sum();
        assert_eq!(taken, 3);
    }

    #[tokio::test]
    async fn test_huge_party_is_rejected_by_capacity() {
        let fx = Fixture::new(8);
        fx.book(fx.user, 1).await.unwrap();
        let second = fx.profile(10);
        let err = fx.book(second, u32::MAX).await.unwrap_err();
        assert!(matches!(err, BookError::CapacityExceeded { free: 7 }));
        assert_eq!(fx.store.bookings().len(), 1);
        assert_eq!(fx.credits(second), 10);
    }

    #[tokio::test]
    async fn test_lockout_allows_four_hours_before() {
        let fx = Fixture::new(8);
        fx.clock.set(evening() - Duration::hours(4));
        fx.book(fx.user, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_lockout_rejects_two_hours_before() {
        let fx = Fixture::new(8);
        fx.clock.set(evening() - Duration::hours(2));
        let err = fx.book(fx.user, 1).await.unwrap_err();
        assert!(matches!(err, BookError::BookingClosed { hours: 3 }));
        assert!(fx.store.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_lockout_exempts_later_joiners() {
        let fx = Fixture::new(8);
        fx.clock.set(evening() - Duration::hours(4));
        fx.book(fx.user, 1).await.unwrap();
        fx.clock.set(evening() - Duration::hours(1));
        let second = fx.profile(10);
        fx.book(second, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_morning_lockout_is_twelve_hours() {
        let fx = Fixture::new(8);
        let morning = Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap();
        fx.clock.set(morning - Duration::hours(11));
        let request = BookRequest::new(SlotId::new(fx.training.id, morning), 1);
        let err = fx
            .ledger
            .book(Actor::user(fx.user), request)
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::BookingClosed { hours: 12 }));
    }

    #[tokio::test]
    async fn test_past_session() {
        let fx = Fixture::new(8);
        fx.clock.set(evening() + Duration::minutes(5));
        let err = fx.book(fx.user, 1).await.unwrap_err();
        assert!(matches!(err, BookError::SessionInPast));
    }

    #[tokio::test]
    async fn test_unknown_slot() {
        let fx = Fixture::new(8);
        let request = BookRequest::new(
            SlotId::new(fx.training.id, evening() + Duration::minutes(30)),
            1,
        );
        let err = fx
            .ledger
            .book(Actor::user(fx.user), request)
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::SlotNotFound));

        let request = BookRequest::new(SlotId::new(ObjectId::new(), evening()), 1);
        let err = fx
            .ledger
            .book(Actor::user(fx.user), request)
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::TrainingNotFound));
    }

    #[tokio::test]
    async fn test_participants_must_be_positive() {
        let fx = Fixture::new(8);
        let err = fx.book(fx.user, 0).await.unwrap_err();
        assert!(matches!(err, BookError::InvalidParticipants));
    }

    #[tokio::test]
    async fn test_unverified_email() {
        let fx = Fixture::new(8);
        let actor = Actor::new(fx.user, false, Role::User);
        let err = fx.ledger.book(actor, fx.request(1)).await.unwrap_err();
        assert!(matches!(err, BookError::EmailNotVerified));

        let staff = Actor::new(fx.user, false, Role::Employee);
        fx.ledger.book(staff, fx.request(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_not_enough_credits() {
        let fx = Fixture::new(8);
        let poor = fx.profile(1);
        let err = fx.book(poor, 2).await.unwrap_err();
        assert!(matches!(
            err,
            BookError::NotEnoughCredits {
                required: 2,
                available: 1
            }
        ));
        assert!(fx.store.bookings().is_empty());
        assert_eq!(fx.credits(poor), 1);
    }

    #[tokio::test]
    async fn test_unlimited_user_pays_for_guests_only() {
        let fx = Fixture::new(8);
        let unlimited = fx.profile(0);
        fx.store
            .set_unlimited(unlimited, Some(evening() + Duration::days(30)));
        let booked = fx.book(unlimited, 1).await.unwrap();
        assert!(booked.cost.is_free());
        assert_eq!(fx.credits(unlimited), 0);

        let other = fx.profile(1);
        fx.store.set_unlimited(other, Some(evening() + Duration::days(30)));
        let booked = fx.book(other, 2).await.unwrap();
        assert_eq!(booked.cost, Cost { own: 0, guests: 1 });
        assert_eq!(fx.credits(other), 0);
    }

    #[tokio::test]
    async fn test_expired_unlimited_pays() {
        let fx = Fixture::new(8);
        fx.store
            .set_unlimited(fx.user, Some(fx.clock.now() - Duration::days(1)));
        assert_eq!(fx.book(fx.user, 1).await.unwrap().cost.total(), 1);
    }

    #[tokio::test]
    async fn test_individual_only_slot() {
        let fx = Fixture::new(8);
        let admin = Actor::new(ObjectId::new(), true, Role::Admin);
        let mut session = fx.ledger.start_session().await.unwrap();
        fx.ledger
            .exceptions
            .set_individual_only(&mut session, admin, SlotId::new(fx.training.id, evening()), true)
            .await
            .unwrap();

        let err = fx.book(fx.user, 1).await.unwrap_err();
        assert!(matches!(err, BookError::IndividualOnly));

        let staff = Actor::new(fx.user, true, Role::Employee);
        fx.ledger.book(staff, fx.request(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_debit_rolls_back_booking() {
        let fx = Fixture::new(8);
        fx.store.fail_credit_updates(true);
        let err = fx.book(fx.user, 1).await.unwrap_err();
        assert!(matches!(err, BookError::Common(_)));
        assert_eq!(
            Outcome::from(Err::<Booked, _>(err)).message,
            "Rezerváciu sa nepodarilo uložiť. Skúste to prosím znova."
        );
        assert!(fx.store.bookings().is_empty());
        assert_eq!(fx.credits(fx.user), 10);
        assert!(fx.store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refund_keeps_booking() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        fx.store.fail_credit_updates(true);
        let err = fx
            .ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CancelError::Common(_)));
        assert_eq!(fx.store.bookings().len(), 1);
        assert_eq!(fx.credits(fx.user), 9);
    }

    #[tokio::test]
    async fn test_refund_twelve_and_a_half_hours_before() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        fx.clock.set(evening() - Duration::minutes(12 * 60 + 30));
        let cancelled = fx
            .ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund, Refund::Credited(Cost { own: 1, guests: 0 }));
        assert_eq!(fx.credits(fx.user), 10);
        assert!(fx.store.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_no_refund_eleven_hours_before() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        fx.clock.set(evening() - Duration::hours(11));
        let cancelled = fx
            .ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund, Refund::Late);
        assert_eq!(fx.credits(fx.user), 9);
        assert!(fx.store.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_cost_symmetry() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 2).await.unwrap();
        assert_eq!(booked.cost.total(), 2);
        assert_eq!(fx.credits(fx.user), 8);
        let cancelled = fx
            .ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund.credited(), Some(2));
        assert_eq!(fx.credits(fx.user), 10);
    }

    #[tokio::test]
    async fn test_refund_uses_unlimited_status_at_cancel_time() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        fx.store
            .set_unlimited(fx.user, Some(evening() + Duration::days(30)));
        let cancelled = fx
            .ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund, Refund::Credited(Cost::default()));
        assert_eq!(fx.credits(fx.user), 9);
    }

    #[tokio::test]
    async fn test_cancel_of_gone_training() {
        let fx = Fixture::new(8);
        let booking = Booking::new(
            fx.user,
            SlotId::new(ObjectId::new(), evening()),
            1,
            fx.clock.now(),
        );
        fx.store.add_booking(booking.clone());
        let cancelled = fx
            .ledger
            .cancel(Actor::user(fx.user), booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund, Refund::Unpriced);
        assert_eq!(cancelled.training, None);
        assert_eq!(fx.credits(fx.user), 10);
    }

    #[tokio::test]
    async fn test_refund_uses_price_at_cancel_time() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        assert_eq!(fx.credits(fx.user), 9);
        fx.store.set_price(fx.training.id, 3);
        fx.clock.set(evening() - Duration::hours(13));
        let cancelled = fx
            .ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund, Refund::Credited(Cost { own: 3, guests: 0 }));
        assert_eq!(fx.credits(fx.user), 12);
    }

    #[tokio::test]
    async fn test_cancel_without_profile_releases_place() {
        let fx = Fixture::new(8);
        let orphan = ObjectId::new();
        let booking = Booking::new(
            orphan,
            SlotId::new(fx.training.id, evening()),
            2,
            fx.clock.now(),
        );
        fx.store.add_booking(booking.clone());
        let cancelled = fx
            .ledger
            .cancel(Actor::user(orphan), booking.id)
            .await
            .unwrap();
        assert_eq!(cancelled.refund, Refund::NoProfile);
        assert_eq!(cancelled.refund.credited(), None);
        assert!(fx.store.bookings().is_empty());
        assert!(fx.store.notifications().is_empty());
        assert_eq!(
            Outcome::from(Ok::<_, CancelError>(cancelled)).message,
            "Rezervácia bola zrušená."
        );
    }

    #[tokio::test]
    async fn test_cancel_requires_ownership() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 1).await.unwrap();
        let stranger = fx.profile(10);
        let err = fx
            .ledger
            .cancel(Actor::user(stranger), booked.booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CancelError::NotFound));
        assert_eq!(fx.store.bookings().len(), 1);

        let err = fx
            .ledger
            .cancel(Actor::user(fx.user), ObjectId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CancelError::NotFound));
    }

    #[tokio::test]
    async fn test_notifications_are_queued() {
        let fx = Fixture::new(8);
        let booked = fx.book(fx.user, 2).await.unwrap();
        fx.ledger
            .cancel(Actor::user(fx.user), booked.booking.id)
            .await
            .unwrap();

        let queued: Vec<Notification> = fx.store.notifications();
        assert_eq!(queued.len(), 2);
        assert!(queued.iter().all(|n| n.to == "jana@studio.sk"));
        assert!(matches!(
            queued[0].event,
            BookingEvent::Created { cost: 2, participants: 2, .. }
        ));
        assert!(matches!(
            queued[1].event,
            BookingEvent::Cancelled { refund: Some(2), .. }
        ));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_booking() {
        let fx = Fixture::new(8);
        fx.store.fail_notifications(true);
        fx.book(fx.user, 1).await.unwrap();
        assert_eq!(fx.store.bookings().len(), 1);
        assert_eq!(fx.credits(fx.user), 9);
        assert!(fx.store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_face_value_request() {
        let fx = Fixture::new(8);
        // 18:00 stored with UTC clock fields
        let face_value = Utc.with_ymd_and_hms(2026, 2, 18, 18, 0, 0).unwrap();
        let request =
            BookRequest::from_face_value(fx.training.id, face_value, 1, &CivilZone::default());
        assert_eq!(request.start_at, evening());
        fx.ledger.book(Actor::user(fx.user), request).await.unwrap();
    }
}
