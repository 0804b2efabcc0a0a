use std::{fmt, str::FromStr};

use bson::oid::ObjectId;
use chrono::{Datelike as _, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    /// Every occurrence of the weekday.
    Weekly { weekday: Weekday },
    /// A single calendar date.
    Once { date: NaiveDate },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduleTerm {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub recurrence: Recurrence,
    /// Civil wall-clock time, "HH:MM" or "HH:MM-HH:MM".
    pub time: String,
    #[serde(default)]
    pub trainer: Option<ObjectId>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ScheduleTerm {
    pub fn weekly(weekday: Weekday, time: &str, trainer: Option<ObjectId>) -> ScheduleTerm {
        ScheduleTerm {
            id: ObjectId::new(),
            recurrence: Recurrence::Weekly { weekday },
            time: time.to_owned(),
            trainer,
            active: true,
        }
    }

    pub fn once(date: NaiveDate, time: &str, trainer: Option<ObjectId>) -> ScheduleTerm {
        ScheduleTerm {
            id: ObjectId::new(),
            recurrence: Recurrence::Once { date },
            time: time.to_owned(),
            trainer,
            active: true,
        }
    }

    /// Whether the term produces a session on `date`. Inactive terms never do.
    pub fn matches(&self, date: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        match self.recurrence {
            Recurrence::Weekly { weekday } => date.weekday() == weekday,
            Recurrence::Once { date: once } => once == date,
        }
    }

    pub fn term_time(&self) -> Result<TermTime, TermTimeError> {
        self.time.parse()
    }
}

/// Parsed `ScheduleTerm::time`. Only the start is used for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TermTime {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TermTimeError {
    #[error("Empty time")]
    Empty,
    #[error("Invalid time: {0}")]
    Invalid(String),
}

fn parse_hm(value: &str) -> Result<NaiveTime, TermTimeError> {
    let value = value.trim();
    let (hour, minute) = value
        .split_once(':')
        .ok_or_else(|| TermTimeError::Invalid(value.to_owned()))?;
    let hour = hour
        .trim()
        .parse::<u32>()
        .map_err(|_| TermTimeError::Invalid(value.to_owned()))?;
    let minute = minute
        .trim()
        .parse::<u32>()
        .map_err(|_| TermTimeError::Invalid(value.to_owned()))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| TermTimeError::Invalid(value.to_owned()))
}

impl FromStr for TermTime {
    type Err = TermTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TermTimeError::Empty);
        }
        match s.split_once('-') {
            Some((start, end)) => Ok(TermTime {
                start: parse_hm(start)?,
                end: Some(parse_hm(end)?),
            }),
            None => Ok(TermTime {
                start: parse_hm(s)?,
                end: None,
            }),
        }
    }
}

impl fmt::Display for TermTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format("%H:%M"))?;
        if let Some(end) = self.end {
            write!(f, "-{}", end.format("%H:%M"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_single() {
        let time: TermTime = "18:00".parse().unwrap();
        assert_eq!(time.start, hm(18, 0));
        assert_eq!(time.end, None);
    }

    #[test]
    fn test_parse_range() {
        let time: TermTime = " 07:30 - 08:45 ".parse().unwrap();
        assert_eq!(time.start, hm(7, 30));
        assert_eq!(time.end, Some(hm(8, 45)));
        assert_eq!(time.to_string(), "07:30-08:45");
    }

    #[test]
    fn test_parse_short_hour() {
        let time: TermTime = "9:05".parse().unwrap();
        assert_eq!(time.start, hm(9, 5));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!("".parse::<TermTime>(), Err(TermTimeError::Empty));
        assert!("25:00".parse::<TermTime>().is_err());
        assert!("18".parse::<TermTime>().is_err());
        assert!("18:xx".parse::<TermTime>().is_err());
        assert!("18:00-".parse::<TermTime>().is_err());
    }

    #[test]
    fn test_matches_weekly() {
        let term = ScheduleTerm::weekly(Weekday::Wed, "18:00", None);
        assert!(term.matches(NaiveDate::from_ymd_opt(2026, 2, 18).unwrap()));
        assert!(term.matches(NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()));
        assert!(!term.matches(NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()));
    }

    #[test]
    fn test_matches_once() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let term = ScheduleTerm::once(date, "10:00", None);
        assert!(term.matches(date));
        assert!(!term.matches(NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()));
    }

    #[test]
    fn test_inactive_never_matches() {
        let mut term = ScheduleTerm::weekly(Weekday::Wed, "18:00", None);
        term.active = false;
        assert!(!term.matches(NaiveDate::from_ymd_opt(2026, 2, 18).unwrap()));
    }

    #[test]
    fn test_term_serde() {
        let term = ScheduleTerm::weekly(Weekday::Mon, "18:00", None);
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["recurrence"]["kind"], "weekly");
        let back: ScheduleTerm = serde_json::from_value(json).unwrap();
        assert_eq!(back.recurrence, term.recurrence);
        assert!(back.active);
    }
}
