use chrono::{DateTime, Datelike as _, Days, NaiveDate, Utc, Weekday};
use eyre::{bail, Result};

use crate::CivilZone;

/// Inclusive window of civil dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<DateWindow> {
        if to < from {
            bail!("Invalid date window: {} > {}", from, to);
        }
        Ok(DateWindow { from, to })
    }

    pub fn day(date: NaiveDate) -> DateWindow {
        DateWindow { from: date, to: date }
    }

    /// Monday to Sunday of the week containing `date`.
    pub fn week(date: NaiveDate) -> DateWindow {
        let week = date.week(Weekday::Mon);
        DateWindow {
            from: week.first_day(),
            to: week.last_day(),
        }
    }

    pub fn month(date: NaiveDate) -> DateWindow {
        let from = date.with_day(1).unwrap_or(date);
        let to = from
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(from);
        DateWindow { from, to }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + Clone {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }

    /// Half-open instant range `[start of first day, start of the day after the last)`.
    pub fn bounds(&self, zone: &CivilZone) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.to.checked_add_days(Days::new(1)).unwrap_or(self.to);
        (zone.start_of_day(self.from), zone.start_of_day(end))
    }
}
