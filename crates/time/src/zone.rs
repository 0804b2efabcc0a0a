use std::{fmt, str::FromStr};

use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _, Timelike as _, Utc,
};
use chrono_tz::Tz;
use eyre::{eyre, Error};

pub const DEFAULT_ZONE: Tz = chrono_tz::Europe::Bratislava;

/// The civil time zone the studio's opening hours and deadlines are defined in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilZone(Tz);

impl CivilZone {
    pub fn new(tz: Tz) -> CivilZone {
        CivilZone(tz)
    }

    pub fn tz(&self) -> Tz {
        self.0
    }

    /// Corrects a face-value timestamp whose clock fields were meant as civil
    /// wall-clock time but were stored as if they were UTC.
    ///
    /// Formatting the result in this zone reproduces the clock fields of
    /// `face_value`. One iteration is enough as long as the zone's offset does
    /// not change between the two instants; inside a DST transition window
    /// the offset of the wrong side may be applied.
    pub fn normalize(&self, face_value: DateTime<Utc>) -> DateTime<Utc> {
        let local_as_utc = face_value.with_timezone(&self.0).naive_local().and_utc();
        let offset = local_as_utc - face_value;
        face_value - offset
    }

    /// Civil wall-clock time to an instant.
    ///
    /// A time repeated by a fall-back transition resolves to the earlier
    /// instant. A time skipped by a spring-forward transition does not exist
    /// and yields `None`.
    pub fn localize(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.localize_naive(&date.and_time(time))
    }

    pub fn localize_naive(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.0.from_local_datetime(naive) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }

    /// First instant of the civil day.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let mut time = NaiveTime::MIN;
        loop {
            if let Some(instant) = self.localize(date, time) {
                return instant;
            }
            // midnight skipped by a transition, the day starts later
            time += chrono::Duration::minutes(30);
        }
    }

    pub fn to_civil(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.0)
    }

    pub fn hour(&self, instant: DateTime<Utc>) -> u32 {
        self.to_civil(instant).hour()
    }

    pub fn date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_civil(instant).date_naive()
    }

    pub fn fmt(&self, instant: DateTime<Utc>) -> String {
        self.to_civil(instant).format("%d.%m.%Y %H:%M").to_string()
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        CivilZone(DEFAULT_ZONE)
    }
}

impl FromStr for CivilZone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Tz>()
            .map(CivilZone)
            .map_err(|_| eyre!("Unknown time zone: {}", s))
    }
}

impl fmt::Display for CivilZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name())
    }
}
