use crate::{
    interval::{ReminderInterval, MAX_INTERVAL_SLOTS_PER_DAY},
    shared::entity::{Entity, ID},
    time_of_day::TimeOfDay,
};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Maximum number of active `Reminder`s a single task or habit can have
pub const MAX_REMINDERS_PER_ENTITY: usize = 5;
/// A before_due reminder fires at most a year ahead of the due date
pub const MAX_MINUTES_BEFORE: i64 = 366 * 24 * 60;

/// The kind of object a `Reminder` is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Task,
    Habit,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Habit => "habit",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "habit" => Ok(Self::Habit),
            _ => Err(UnknownVariantError(s.to_string())),
        }
    }
}

/// What drives the primary trigger of a `Reminder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Fires once at `reminder_date` + `scheduled_time`
    Single,
    /// Fires at `scheduled_time` on each of `days_of_week`
    Recurring,
    /// Fires `minutes_before` the due timestamp of the owning entity
    BeforeDue,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Recurring => "recurring",
            Self::BeforeDue => "before_due",
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderKind {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "recurring" => Ok(Self::Recurring),
            "before_due" => Ok(Self::BeforeDue),
            _ => Err(UnknownVariantError(s.to_string())),
        }
    }
}

/// Delivery channel for a triggered `Reminder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Push,
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            _ => Err(UnknownVariantError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown value: `{0}`")]
pub struct UnknownVariantError(pub String);

/// Weekdays are exchanged as indices where 0 is Sunday and 6 is Saturday
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn weekday_to_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

/// A `Reminder` tells when the owner of a task or habit should be notified,
/// and through which `Channel`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// Owner of the task or habit, used to resolve channel recipients
    pub user_id: ID,
    pub entity_id: ID,
    pub entity_type: EntityType,
    pub kind: ReminderKind,
    pub scheduled_time: Option<TimeOfDay>,
    /// Only used by `ReminderKind::Single`
    pub reminder_date: Option<NaiveDate>,
    /// Only used by `ReminderKind::Recurring`
    pub days_of_week: Vec<Weekday>,
    /// Only used by `ReminderKind::BeforeDue`
    pub minutes_before: Option<i64>,
    pub interval: Option<ReminderInterval>,
    pub notification_types: Vec<Channel>,
    pub message: Option<String>,
    pub is_active: bool,
    /// Next absolute trigger in millis. `None` when nothing is left to fire.
    pub next_scheduled_at: Option<i64>,
    /// Timestamp of the latest delivery attempt. Also marks the occurrence
    /// at `next_scheduled_at` as claimed when it is not older than it.
    pub last_attempt_at: Option<i64>,
    pub last_success_at: Option<i64>,
    /// Incremented on every write. Writers compare it to detect that
    /// somebody else modified the `Reminder` in between.
    pub version: i64,
    pub created: i64,
    pub updated: i64,
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ReminderValidationError {
    #[error("At least one notification type is required")]
    EmptyNotificationTypes,
    #[error("Recurring reminders need at least one day of the week")]
    EmptyDaysOfWeek,
    #[error("A {0} reminder needs a scheduled time")]
    MissingScheduledTime(ReminderKind),
    #[error("A single reminder needs a reminder date")]
    MissingReminderDate,
    #[error("A before_due reminder needs minutes_before between 1 and {}, got: {0:?}", MAX_MINUTES_BEFORE)]
    InvalidMinutesBefore(Option<i64>),
    #[error("Intervals can only be used by single and recurring reminders")]
    IntervalNotSupported,
    #[error("Interval start time {start} must be before end time {end}")]
    InvalidIntervalWindow { start: TimeOfDay, end: TimeOfDay },
    #[error("Interval step must be at least one minute")]
    InvalidIntervalStep,
    #[error("Interval produces {0} reminders per day, the maximum is {}", MAX_INTERVAL_SLOTS_PER_DAY)]
    TooManyIntervalSlots(usize),
}

impl Reminder {
    pub fn has_interval(&self) -> bool {
        self.interval.is_some()
    }

    /// Whether the occurrence at `next_scheduled_at` is due at `now` and
    /// nobody is working on it. An attempt at or after the occurrence marks
    /// it as claimed, unless that attempt started at or before `stale_before`.
    pub fn is_claimable(&self, now: i64, stale_before: i64) -> bool {
        let next = match self.next_scheduled_at {
            Some(next) if self.is_active && next <= now => next,
            _ => return false,
        };
        match self.last_attempt_at {
            None => true,
            Some(attempt) => attempt < next || attempt <= stale_before,
        }
    }

    /// Whether nothing is left to fire for this `Reminder`
    pub fn is_exhausted(&self) -> bool {
        !self.is_active || self.next_scheduled_at.is_none()
    }

    /// Whether `other` fires at the same times, ignoring the message, the
    /// channels and the delivery bookkeeping
    pub fn has_same_schedule(&self, other: &Reminder) -> bool {
        self.kind == other.kind
            && self.is_active == other.is_active
            && self.scheduled_time == other.scheduled_time
            && self.reminder_date == other.reminder_date
            && self.days_of_week == other.days_of_week
            && self.minutes_before == other.minutes_before
            && self.interval == other.interval
    }

    /// Removes duplicate days and channels and puts them in a stable order
    pub fn normalize(&mut self) {
        self.days_of_week
            .sort_by_key(|day| day.num_days_from_sunday());
        self.days_of_week.dedup();
        self.notification_types.sort();
        self.notification_types.dedup();
    }

    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.is_active && self.notification_types.is_empty() {
            return Err(ReminderValidationError::EmptyNotificationTypes);
        }

        match self.kind {
            ReminderKind::Single => {
                if self.scheduled_time.is_none() {
                    return Err(ReminderValidationError::MissingScheduledTime(self.kind));
                }
                if self.reminder_date.is_none() {
                    return Err(ReminderValidationError::MissingReminderDate);
                }
            }
            ReminderKind::Recurring => {
                if self.scheduled_time.is_none() {
                    return Err(ReminderValidationError::MissingScheduledTime(self.kind));
                }
                if self.is_active && self.days_of_week.is_empty() {
                    return Err(ReminderValidationError::EmptyDaysOfWeek);
                }
            }
            ReminderKind::BeforeDue => match self.minutes_before {
                Some(minutes) if minutes > 0 && minutes <= MAX_MINUTES_BEFORE => {}
                other => return Err(ReminderValidationError::InvalidMinutesBefore(other)),
            },
        }

        if let Some(interval) = &self.interval {
            if self.kind == ReminderKind::BeforeDue {
                return Err(ReminderValidationError::IntervalNotSupported);
            }
            validate_interval(interval)?;
        }

        Ok(())
    }
}

pub fn validate_interval(interval: &ReminderInterval) -> Result<(), ReminderValidationError> {
    if interval.start_time >= interval.end_time {
        return Err(ReminderValidationError::InvalidIntervalWindow {
            start: interval.start_time,
            end: interval.end_time,
        });
    }
    if interval.minutes == 0 {
        return Err(ReminderValidationError::InvalidIntervalStep);
    }
    let slots = interval.slots().len();
    if slots > MAX_INTERVAL_SLOTS_PER_DAY {
        return Err(ReminderValidationError::TooManyIntervalSlots(slots));
    }
    Ok(())
}


#[cfg(test)]
mod test {
    use super::test_utils::recurring_reminder;
    use super::*;

    fn interval(start: &str, end: &str, minutes: u32) -> ReminderInterval {
        ReminderInterval {
            minutes,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    #[test]
    fn it_accepts_valid_recurring_reminder() {
        let mut reminder = recurring_reminder("09:00", vec![Weekday::Mon, Weekday::Fri]);
        reminder.interval = Some(interval("09:00", "18:00", 60));
        assert_eq!(reminder.validate(), Ok(()));
    }

    #[test]
    fn it_rejects_empty_channels_and_days() {
        let mut reminder = recurring_reminder("09:00", vec![Weekday::Mon]);
        reminder.notification_types.clear();
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::EmptyNotificationTypes)
        );

        let reminder = recurring_reminder("09:00", vec![]);
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::EmptyDaysOfWeek)
        );

        // Inactive reminders are allowed to be incomplete
        let mut reminder = recurring_reminder("09:00", vec![]);
        reminder.is_active = false;
        assert_eq!(reminder.validate(), Ok(()));
    }

    #[test]
    fn it_rejects_invalid_intervals() {
        let mut reminder = recurring_reminder("09:00", vec![Weekday::Mon]);
        reminder.interval = Some(interval("18:00", "09:00", 60));
        assert!(matches!(
            reminder.validate(),
            Err(ReminderValidationError::InvalidIntervalWindow { .. })
        ));

        reminder.interval = Some(interval("09:00", "18:00", 0));
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::InvalidIntervalStep)
        );

        reminder.interval = Some(interval("00:00", "23:59", 15));
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::TooManyIntervalSlots(96))
        );

        reminder.kind = ReminderKind::BeforeDue;
        reminder.minutes_before = Some(30);
        reminder.interval = Some(interval("09:00", "10:00", 15));
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::IntervalNotSupported)
        );
    }

    #[test]
    fn it_requires_fields_per_kind() {
        let mut reminder = recurring_reminder("09:00", vec![Weekday::Mon]);
        reminder.kind = ReminderKind::Single;
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::MissingReminderDate)
        );

        reminder.kind = ReminderKind::BeforeDue;
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::InvalidMinutesBefore(None))
        );
        reminder.minutes_before = Some(0);
        assert!(reminder.validate().is_err());
        reminder.minutes_before = Some(15);
        assert_eq!(reminder.validate(), Ok(()));
        reminder.minutes_before = Some(MAX_MINUTES_BEFORE);
        assert_eq!(reminder.validate(), Ok(()));
        reminder.minutes_before = Some(i64::MAX / 1000);
        assert_eq!(
            reminder.validate(),
            Err(ReminderValidationError::InvalidMinutesBefore(Some(i64::MAX / 1000)))
        );
    }

    #[test]
    fn schedule_comparison_ignores_content() {
        let reminder = recurring_reminder("09:00", vec![Weekday::Mon]);
        let mut edited = reminder.clone();
        edited.message = Some("Drink water".into());
        edited.notification_types = vec![Channel::Email];
        edited.version += 1;
        assert!(reminder.has_same_schedule(&edited));

        edited.days_of_week = vec![Weekday::Tue];
        assert!(!reminder.has_same_schedule(&edited));
        let mut paused = reminder.clone();
        paused.is_active = false;
        assert!(!reminder.has_same_schedule(&paused));
    }

    #[test]
    fn it_normalizes_days_and_channels() {
        let mut reminder =
            recurring_reminder("09:00", vec![Weekday::Fri, Weekday::Mon, Weekday::Fri]);
        reminder.notification_types = vec![Channel::Sms, Channel::Push, Channel::Sms];
        reminder.normalize();
        assert_eq!(reminder.days_of_week, vec![Weekday::Mon, Weekday::Fri]);
        assert_eq!(reminder.notification_types, vec![Channel::Push, Channel::Sms]);
    }

    #[test]
    fn claimable_only_when_due_and_unclaimed() {
        let mut reminder = recurring_reminder("09:00", vec![Weekday::Mon]);
        assert!(!reminder.is_claimable(100, 0));

        reminder.next_scheduled_at = Some(100);
        assert!(!reminder.is_claimable(99, 0));
        assert!(reminder.is_claimable(100, 0));

        // Claimed by an attempt at 100
        reminder.last_attempt_at = Some(100);
        assert!(!reminder.is_claimable(150, 50));
        // Claim went stale
        assert!(reminder.is_claimable(150, 100));

        // Attempt for an earlier occurrence
        reminder.last_attempt_at = Some(40);
        assert!(reminder.is_claimable(150, 0));

        reminder.is_active = false;
        assert!(!reminder.is_claimable(150, 0));
        assert!(reminder.is_exhausted());
    }

    #[test]
    fn weekday_indices_start_on_sunday() {
        assert_eq!(weekday_from_index(0), Some(Weekday::Sun));
        assert_eq!(weekday_from_index(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_index(7), None);
        assert_eq!(weekday_to_index(Weekday::Wed), 3);
    }
}
