use log::error;
use serde::Serialize;

use crate::{BookError, Booked, CancelError, Cancelled, Refund};

/// What the caller shows the user after a booking transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Outcome {
        Outcome {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Outcome {
        Outcome {
            success: false,
            message: message.into(),
        }
    }
}

impl From<Result<Booked, BookError>> for Outcome {
    fn from(result: Result<Booked, BookError>) -> Self {
        match result {
            Ok(booked) if booked.cost.is_free() => Outcome::ok("Rezervácia bola vytvorená."),
            Ok(booked) => Outcome::ok(format!(
                "Rezervácia bola vytvorená. Odpísali sme {} kr.",
                booked.cost.total()
            )),
            Err(BookError::Common(err)) => {
                error!("Booking failed: {:#}", err);
                Outcome::fail(BookError::Common(err).to_string())
            }
            Err(err) => Outcome::fail(err.to_string()),
        }
    }
}

impl From<Result<Cancelled, CancelError>> for Outcome {
    fn from(result: Result<Cancelled, CancelError>) -> Self {
        match result {
            Ok(cancelled) => match cancelled.refund {
                Refund::Credited(cost) if !cost.is_free() => Outcome::ok(format!(
                    "Rezervácia bola zrušená. Vrátili sme {} kr.",
                    cost.total()
                )),
                Refund::Late => Outcome::ok(
                    "Rezervácia bola zrušená. Pri zrušení menej ako 12 hodín pred začiatkom sa kredity nevracajú.",
                ),
                Refund::Credited(_) | Refund::Unpriced | Refund::NoProfile => {
                    Outcome::ok("Rezervácia bola zrušená.")
                }
            },
            Err(CancelError::Common(err)) => {
                error!("Cancellation failed: {:#}", err);
                Outcome::fail(CancelError::Common(err).to_string())
            }
            Err(err) => Outcome::fail(err.to_string()),
        }
    }
}
