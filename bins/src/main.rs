use std::{sync::Arc, time::Duration};

use bg_process::notifier::MailRelay;
use env::Env;
use eyre::Context;
use log::info;
use time::{CivilZone, SystemClock};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env = Env::load()?;
    pretty_env_logger::init();
    color_eyre::install()?;

    let zone: CivilZone = env.civil_zone().parse()?;
    info!("connecting to mongo");
    let storage = storage::Storage::new(env.mongo_url())
        .await
        .context("Failed to create storage")?;
    info!("creating ledger in {}", zone);
    let ledger = ledger::Ledger::new(storage, zone, Arc::new(SystemClock));

    info!("starting notification worker");
    let worker = bg_process::start(
        ledger,
        MailRelay::new(&env),
        Duration::from_secs(env.notify_interval_secs()),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown")?;
    info!("shutting down");
    worker.abort();
    Ok(())
}
