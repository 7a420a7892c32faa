use crate::{
    reminder::{Reminder, ReminderKind},
    shared::local_time::{local_to_timestamp_millis, timestamp_to_local},
    time_of_day::TimeOfDay,
};
use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;

const MINUTE_MILLIS: i64 = 60 * 1000;
/// A weekly schedule always has a match within a week, the extra day
/// covers today's times that have already passed.
const RECURRING_SEARCH_DAYS: i64 = 7;

/// All times of day at which a single or recurring `Reminder` fires on an
/// active day: the scheduled time and every interval slot, ordered and
/// without duplicates.
pub fn trigger_times_of_day(reminder: &Reminder) -> Vec<TimeOfDay> {
    let mut times = Vec::new();
    if let Some(time) = reminder.scheduled_time {
        times.push(time);
    }
    if let Some(interval) = &reminder.interval {
        times.extend(interval.slots());
    }
    times.sort();
    times.dedup();
    times
}

/// Computes the earliest trigger timestamp of `reminder` that is at or after
/// `now`. A trigger that equals `now` is due and is returned.
///
/// `due_at` is the due timestamp of the owning entity and is only used by
/// `ReminderKind::BeforeDue`.
pub fn next_trigger(reminder: &Reminder, now: i64, tz: &Tz, due_at: Option<i64>) -> Option<i64> {
    match reminder.kind {
        ReminderKind::Single => {
            let date = reminder.reminder_date?;
            first_on_date(date, &trigger_times_of_day(reminder), now, tz)
        }
        ReminderKind::Recurring => next_recurring(reminder, now, tz),
        ReminderKind::BeforeDue => {
            let offset = reminder.minutes_before?.checked_mul(MINUTE_MILLIS)?;
            let remind_at = due_at?.checked_sub(offset)?;
            if remind_at >= now {
                Some(remind_at)
            } else {
                None
            }
        }
    }
}

/// Next trigger once the occurrence at `fired_at` has been handled. The
/// result is always strictly after `fired_at`.
pub fn next_trigger_after(
    reminder: &Reminder,
    fired_at: i64,
    now: i64,
    tz: &Tz,
    due_at: Option<i64>,
) -> Option<i64> {
    next_trigger(reminder, std::cmp::max(now, fired_at + 1), tz, due_at)
}

fn next_recurring(reminder: &Reminder, now: i64, tz: &Tz) -> Option<i64> {
    if reminder.days_of_week.is_empty() {
        return None;
    }
    let times = trigger_times_of_day(reminder);
    let today = timestamp_to_local(tz, now)?.date_naive();

    (0..=RECURRING_SEARCH_DAYS)
        .map(|offset| today + Duration::days(offset))
        .filter(|day| reminder.days_of_week.contains(&day.weekday()))
        .find_map(|day| first_on_date(day, &times, now, tz))
}

fn first_on_date(date: NaiveDate, times: &[TimeOfDay], now: i64, tz: &Tz) -> Option<i64> {
    times
        .iter()
        .filter_map(|time| local_to_timestamp_millis(tz, date, *time))
        .filter(|ts| *ts >= now)
        .min()
}
