use model::notification::{BookingEvent, Notification};
use time::CivilZone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub fn render(notification: &Notification, zone: &CivilZone) -> Email {
    let (subject, html) = match &notification.event {
        BookingEvent::Created {
            training,
            start_at,
            participants,
            cost,
            ..
        } => (
            format!("Potvrdenie rezervácie: {}", training),
            format!(
                "<p>Dobrý deň,</p>\
                 <p>vaša rezervácia tréningu <b>{}</b> dňa {} je potvrdená.</p>\
                 <p>Počet účastníkov: {}<br>Odpísané kredity: {}</p>",
                escape(training),
                zone.fmt(*start_at),
                participants,
                cost
            ),
        ),
        BookingEvent::Cancelled {
            training,
            start_at,
            participants,
            refund,
            ..
        } => {
            let refund = match refund {
                Some(credits) => format!("Vrátené kredity: {}", credits),
                None => "Kredity sa pri neskorom zrušení nevracajú.".to_owned(),
            };
            (
                format!("Zrušenie rezervácie: {}", training),
                format!(
                    "<p>Dobrý deň,</p>\
                     <p>vaša rezervácia tréningu <b>{}</b> dňa {} bola zrušená.</p>\
                     <p>Počet účastníkov: {}<br>{}</p>",
                    escape(training),
                    zone.fmt(*start_at),
                    participants,
                    refund
                ),
            )
        }
    };
    Email {
        to: notification.to.clone(),
        subject,
        html,
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
