use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{eyre, Context, Error};
use log::info;

const DEFAULT_CIVIL_ZONE: &str = "Europe/Bratislava";
const DEFAULT_MAIL_FROM: &str = "rezervacie@studio.sk";
const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 60;

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    mongo_url: String,
    civil_zone: String,
    mail_relay_url: String,
    mail_relay_token: String,
    mail_from: String,
    notify_interval_secs: u64,
}

impl Env {
    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    /// IANA name of the zone session times are written in.
    pub fn civil_zone(&self) -> &str {
        &self.0.civil_zone
    }

    pub fn mail_relay_url(&self) -> &str {
        &self.0.mail_relay_url
    }

    pub fn mail_relay_token(&self) -> &str {
        &self.0.mail_relay_token
    }

    pub fn mail_from(&self) -> &str {
        &self.0.mail_from
    }

    pub fn notify_interval_secs(&self) -> u64 {
        self.0.notify_interval_secs
    }

    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            info!("Failed to load .env file: {}", err);
        }
        Env::from_lookup(|key| var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Env, Error> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| eyre!("{} is not set", key))
        };

        let notify_interval_secs = match lookup("NOTIFY_INTERVAL_SECS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("NOTIFY_INTERVAL_SECS is not a number: {}", value))?,
            None => DEFAULT_NOTIFY_INTERVAL_SECS,
        };

        Ok(Env(Arc::new(EnvInner {
            mongo_url: required("MONGO_URL")?,
            civil_zone: lookup("CIVIL_ZONE").unwrap_or_else(|| DEFAULT_CIVIL_ZONE.to_owned()),
            mail_relay_url: required("MAIL_RELAY_URL")?,
            mail_relay_token: required("MAIL_RELAY_TOKEN")?,
            mail_from: lookup("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_owned()),
            notify_interval_secs,
        })))
    }
}
