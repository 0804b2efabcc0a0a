use std::sync::Arc;

use eyre::Result;
use log::info;
use model::{actor::Actor, exception::SessionException, ids::SlotId};
use storage::Store;
use thiserror::Error;
use time::CivilZone;
use tx_macro::tx;

use crate::schedule;

pub struct Exceptions<S> {
    store: Arc<S>,
    zone: CivilZone,
}

impl<S> Clone for Exceptions<S> {
    fn clone(&self) -> Self {
        Exceptions {
            store: self.store.clone(),
            zone: self.zone,
        }
    }
}

impl<S: Store> Exceptions<S> {
    pub(crate) fn new(store: Arc<S>, zone: CivilZone) -> Self {
        Exceptions { store, zone }
    }

    pub async fn is_individual_only(&self, session: &mut S::Session, slot: SlotId) -> Result<bool> {
        Ok(self
            .store
            .get_exception(session, slot)
            .await?
            .map(|exception| exception.individual_only)
            .unwrap_or(false))
    }

    /// Marks a generated session as bookable by staff only, or lifts the mark.
    #[tx]
    pub async fn set_individual_only(
        &self,
        session: &mut S::Session,
        actor: Actor,
        slot: SlotId,
        individual_only: bool,
    ) -> Result<(), ExceptionError> {
        if !actor.is_staff() {
            return Err(ExceptionError::Forbidden);
        }
        let training = self
            .store
            .get_training(session, slot.training_id)
            .await?
            .ok_or(ExceptionError::TrainingNotFound)?;
        if schedule::find_slot(&training, slot.start_at, &self.zone).is_none() {
            return Err(ExceptionError::SlotNotFound);
        }

        if individual_only {
            self.store
                .set_exception(session, &SessionException::individual_only(slot))
                .await?;
        } else {
            self.store.remove_exception(session, slot).await?;
        }
        info!(
            "{} set individual_only={} on {} {}",
            actor.user_id, individual_only, training.name, slot
        );
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ExceptionError {
    #[error("Na túto akciu nemáte oprávnenie.")]
    Forbidden,
    #[error("Tréning neexistuje.")]
    TrainingNotFound,
    #[error("Tento termín v rozvrhu neexistuje.")]
    SlotNotFound,
    #[error("Zmenu sa nepodarilo uložiť. Skúste to prosím znova.")]
    Common(#[from] eyre::Error),
}
