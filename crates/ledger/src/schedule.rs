use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use log::warn;
use model::{schedule::TermTime, slot::Slot, training::TrainingType};
use time::{CivilZone, DateWindow};

/// Sessions of one training over a window of civil dates.
///
/// Days come in ascending order, sessions of one day ordered by time of day.
/// Term times are civil wall-clock time in `zone` for recurring and dated
/// terms alike. Inactive terms, unparsable times and times that do not exist
/// on that day (skipped by a DST transition) produce nothing.
pub fn expand(
    training: &TrainingType,
    window: DateWindow,
    zone: CivilZone,
) -> impl Iterator<Item = Slot> + '_ {
    window
        .days()
        .flat_map(move |day| slots_on(training, day, &zone).into_iter())
}

/// The generated session of `training` starting exactly at `start_at`.
pub fn find_slot(training: &TrainingType, start_at: DateTime<Utc>, zone: &CivilZone) -> Option<Slot> {
    let day = DateWindow::day(zone.date(start_at));
    expand(training, day, *zone).find(|slot| slot.start_at == start_at)
}

fn slots_on(training: &TrainingType, day: NaiveDate, zone: &CivilZone) -> Vec<Slot> {
    let mut slots = training
        .schedule
        .iter()
        .filter(|term| term.matches(day))
        .filter_map(|term| {
            let time = match term.term_time() {
                Ok(time) => time,
                Err(err) => {
                    warn!(
                        "Skip term {} of training {}: {}",
                        term.id, training.id, err
                    );
                    return None;
                }
            };
            let Some(start_at) = zone.localize(day, time.start) else {
                warn!(
                    "Skip term {} of training {}: {} {} does not exist in {}",
                    term.id, training.id, day, time, zone
                );
                return None;
            };
            Some((
                time,
                Slot {
                    key: format!("{}-{}-{}", training.id, term.id, day.day()),
                    training_id: training.id,
                    term_id: term.id,
                    start_at,
                    duration_min: training.duration_min,
                    trainer: term.trainer,
                },
            ))
        })
        .collect::<Vec<(TermTime, Slot)>>();
    slots.sort_by_key(|(time, _)| time.start);
    slots.into_iter().map(|(_, slot)| slot).collect()
}
