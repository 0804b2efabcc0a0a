use async_trait::async_trait;
use env::Env;
use eyre::{Context as _, Error};
use serde::Serialize;

use crate::email::Email;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), Error>;
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Hands emails to an HTTP mail relay.
pub struct MailRelay {
    client: reqwest::Client,
    url: String,
    token: String,
    from: String,
}

impl MailRelay {
    pub fn new(env: &Env) -> Self {
        MailRelay {
            client: reqwest::Client::new(),
            url: env.mail_relay_url().to_owned(),
            token: env.mail_relay_token().to_owned(),
            from: env.mail_from().to_owned(),
        }
    }
}

#[async_trait]
impl Notifier for MailRelay {
    async fn send(&self, email: &Email) -> Result<(), Error> {
        let message = RelayMessage {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };
        self.client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&message)
            .send()
            .await
            .context("mail relay unreachable")?
            .error_for_status()
            .context("mail relay rejected message")?;
        Ok(())
    }
}
