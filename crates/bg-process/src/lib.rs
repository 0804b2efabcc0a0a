pub mod email;
pub mod notifier;

use std::{sync::Arc, time::Duration};

use eyre::{Context as _, Error};
use ledger::Ledger;
use log::{error, info, warn};
use notifier::Notifier;
use storage::Store;
use tokio::task::JoinHandle;

const BATCH_SIZE: usize = 50;

/// Delivers queued booking notifications.
pub struct Outbox<S, N> {
    ledger: Ledger<S>,
    notifier: Arc<N>,
}

impl<S: Store, N: Notifier> Outbox<S, N> {
    pub fn new(ledger: Ledger<S>, notifier: Arc<N>) -> Self {
        Outbox { ledger, notifier }
    }

    /// One pass over the due notifications. Returns how many were delivered.
    pub async fn process(&self) -> Result<usize, Error> {
        let mut session = self.ledger.start_session().await?;
        let due = self
            .ledger
            .notifications
            .pending(&mut session, BATCH_SIZE)
            .await
            .context("pending notifications")?;

        let mut delivered = 0;
        for notification in due {
            let email = email::render(&notification, &self.ledger.zone());
            match self.notifier.send(&email).await {
                Ok(()) => {
                    self.ledger
                        .notifications
                        .sent(&mut session, notification.id)
                        .await?;
                    delivered += 1;
                }
                Err(err) => {
                    warn!(
                        "Failed to deliver notification {} to {}: {:#}",
                        notification.id, notification.to, err
                    );
                    self.ledger
                        .notifications
                        .failed(
                            &mut session,
                            notification.id,
                            notification.attempts,
                            &format!("{:#}", err),
                        )
                        .await?;
                }
            }
        }
        if delivered > 0 {
            info!("Delivered {} notifications", delivered);
        }
        Ok(delivered)
    }
}

pub fn start<S, N>(ledger: Ledger<S>, notifier: N, interval: Duration) -> JoinHandle<()>
where
    S: Store,
    N: Notifier + 'static,
{
    let outbox = Outbox::new(ledger, Arc::new(notifier));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = outbox.process().await {
                error!("Error in background process: {:#}", err);
            }
        }
    })
}
