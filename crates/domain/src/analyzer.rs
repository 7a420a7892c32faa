use crate::{
    reminder::{Reminder, MAX_REMINDERS_PER_ENTITY},
    shared::entity::ID,
    time_of_day::TimeOfDay,
};
use chrono::Weekday;

/// One entry per `Reminder` that has an interval. The slots themselves are
/// not listed, only the window and how many slots it produces per day.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSummary {
    pub reminder_id: ID,
    pub minutes: u32,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub slots_per_day: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderAnalysis {
    /// Every reminder, as each one has a primary trigger from its kind. A
    /// reminder with an interval is listed here and in `interval_reminders`.
    pub main_reminders: Vec<Reminder>,
    pub interval_reminders: Vec<IntervalSummary>,
    /// Number of reminders counted against `MAX_REMINDERS_PER_ENTITY`.
    /// A reminder with an interval is counted once.
    pub total: usize,
    pub summary: String,
}

impl ReminderAnalysis {
    pub fn remaining_capacity(&self) -> usize {
        MAX_REMINDERS_PER_ENTITY.saturating_sub(self.total)
    }

    pub fn is_full(&self) -> bool {
        self.total >= MAX_REMINDERS_PER_ENTITY
    }
}

/// Classifies the reminders of a single task or habit
pub fn analyze_reminders(reminders: &[Reminder]) -> ReminderAnalysis {
    let main_reminders = reminders.to_vec();
    let interval_reminders = reminders
        .iter()
        .filter_map(|reminder| {
            let interval = reminder.interval.as_ref()?;
            let slots_per_day = interval.slots().len();
            Some(IntervalSummary {
                reminder_id: reminder.id.clone(),
                minutes: interval.minutes,
                start_time: interval.start_time,
                end_time: interval.end_time,
                slots_per_day,
                description: format!(
                    "Every {} from {} to {} ({} per day)",
                    minutes_to_human_readable(i64::from(interval.minutes)),
                    interval.start_time,
                    interval.end_time,
                    slots_per_day
                ),
            })
        })
        .collect::<Vec<_>>();

    let total = reminders.len();
    let summary = format_summary(total, main_reminders.len(), interval_reminders.len());

    ReminderAnalysis {
        main_reminders,
        interval_reminders,
        total,
        summary,
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

fn format_summary(total: usize, main: usize, intervals: usize) -> String {
    if total == 0 {
        return "No reminders configured".into();
    }
    let mut parts = vec![format!("{} main", main)];
    if intervals > 0 {
        parts.push(plural(intervals, "interval"));
    }
    format!("{}: {}", plural(total, "reminder"), parts.join(", "))
}

pub fn minutes_to_human_readable(minutes: i64) -> String {
    if minutes < 60 {
        return plural(minutes.max(0) as usize, "minute");
    }
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if remaining == 0 {
        plural(hours as usize, "hour")
    } else {
        format!("{}h {}min", hours, remaining)
    }
}

pub fn days_to_human_readable(days: &[Weekday]) -> String {
    let mut days = days.to_vec();
    days.sort_by_key(|day| day.num_days_from_sunday());
    days.dedup();

    let is_weekend = |day: &Weekday| matches!(day, Weekday::Sat | Weekday::Sun);
    match days.len() {
        0 => "Never".into(),
        7 => "Every day".into(),
        5 if days.iter().all(|day| !is_weekend(day)) => "Weekdays".into(),
        2 if days.iter().all(is_weekend) => "Weekends".into(),
        _ => days
            .iter()
            .map(|day| day.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
