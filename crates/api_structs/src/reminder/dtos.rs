use chrono::NaiveDate;
use nudge_domain::{
    weekday_to_index, Channel, EntityType, Reminder, ReminderInterval, ReminderKind, TimeOfDay,
    ID,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: ID,
    pub user_id: ID,
    pub entity_id: ID,
    pub entity_type: EntityType,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub scheduled_time: Option<TimeOfDay>,
    pub reminder_date: Option<NaiveDate>,
    /// 0 is Sunday
    pub days_of_week: Vec<u8>,
    pub minutes_before: Option<i64>,
    #[serde(flatten)]
    pub interval: IntervalFields,
    pub notification_types: Vec<Channel>,
    pub message: Option<String>,
    pub is_active: bool,
    pub next_scheduled_at: Option<i64>,
    pub last_attempt_at: Option<i64>,
    pub last_success_at: Option<i64>,
    pub version: i64,
    pub created: i64,
    pub updated: i64,
}

impl ReminderDTO {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            id: reminder.id.clone(),
            user_id: reminder.user_id.clone(),
            entity_id: reminder.entity_id.clone(),
            entity_type: reminder.entity_type,
            kind: reminder.kind,
            scheduled_time: reminder.scheduled_time,
            reminder_date: reminder.reminder_date,
            days_of_week: reminder
                .days_of_week
                .iter()
                .map(|day| weekday_to_index(*day))
                .collect(),
            minutes_before: reminder.minutes_before,
            interval: IntervalFields::new(reminder.interval.as_ref()),
            notification_types: reminder.notification_types,
            message: reminder.message,
            is_active: reminder.is_active,
            next_scheduled_at: reminder.next_scheduled_at,
            last_attempt_at: reminder.last_attempt_at,
            last_success_at: reminder.last_success_at,
            version: reminder.version,
            created: reminder.created,
            updated: reminder.updated,
        }
    }
}

/// The interval of a reminder as flat fields
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntervalFields {
    pub interval_enabled: Option<bool>,
    pub interval_minutes: Option<u32>,
    pub interval_start_time: Option<TimeOfDay>,
    pub interval_end_time: Option<TimeOfDay>,
}

impl IntervalFields {
    pub fn new(interval: Option<&ReminderInterval>) -> Self {
        match interval {
            Some(interval) => Self {
                interval_enabled: Some(true),
                interval_minutes: Some(interval.minutes),
                interval_start_time: Some(interval.start_time),
                interval_end_time: Some(interval.end_time),
            },
            None => Self {
                interval_enabled: Some(false),
                ..Default::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies these fields on top of `current`. Disabling removes the
    /// interval and any other field sets or updates it. Fields given without
    /// the flag also enable the interval.
    pub fn merge(
        &self,
        current: Option<&ReminderInterval>,
    ) -> Result<Option<ReminderInterval>, MissingIntervalField> {
        if self.interval_enabled == Some(false) {
            return Ok(None);
        }
        if self.interval_enabled.is_none() && current.is_none() && !self.has_any_field() {
            return Ok(None);
        }
        let minutes = self
            .interval_minutes
            .or_else(|| current.map(|i| i.minutes))
            .ok_or(MissingIntervalField("intervalMinutes"))?;
        let start_time = self
            .interval_start_time
            .or_else(|| current.map(|i| i.start_time))
            .ok_or(MissingIntervalField("intervalStartTime"))?;
        let end_time = self
            .interval_end_time
            .or_else(|| current.map(|i| i.end_time))
            .ok_or(MissingIntervalField("intervalEndTime"))?;

        Ok(Some(ReminderInterval {
            minutes,
            start_time,
            end_time,
        }))
    }

    fn has_any_field(&self) -> bool {
        self.interval_minutes.is_some()
            || self.interval_start_time.is_some()
            || self.interval_end_time.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingIntervalField(pub &'static str);

#[cfg(test)]
mod tests {
    use super::*;

    fn time(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn merges_interval_fields() {
        let current = ReminderInterval {
            minutes: 30,
            start_time: time("09:00"),
            end_time: time("12:00"),
        };

        let disable = IntervalFields {
            interval_enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(disable.merge(Some(&current)), Ok(None));

        let untouched = IntervalFields::default();
        assert_eq!(untouched.merge(Some(&current)), Ok(Some(current)));
        assert_eq!(untouched.merge(None), Ok(None));

        let change_step = IntervalFields {
            interval_minutes: Some(60),
            ..Default::default()
        };
        assert_eq!(
            change_step.merge(Some(&current)).unwrap().unwrap().minutes,
            60
        );

        let incomplete = IntervalFields {
            interval_enabled: Some(true),
            interval_minutes: Some(60),
            ..Default::default()
        };
        assert_eq!(
            incomplete.merge(None),
            Err(MissingIntervalField("intervalStartTime"))
        );
    }

    #[test]
    fn serializes_flat_camel_case_fields() {
        let fields = IntervalFields::new(Some(&ReminderInterval {
            minutes: 60,
            start_time: time("09:00"),
            end_time: time("18:00"),
        }));
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["intervalEnabled"], true);
        assert_eq!(json["intervalStartTime"], "09:00");
    }
}
