use crate::{
    shared::local_time::{local_to_timestamp_millis, timestamp_to_local},
    time_of_day::TimeOfDay,
    tracked_entity::Appointment,
};
use chrono::NaiveDate;
use chrono_tz::Tz;

pub const DEFAULT_PREPARATION_MINUTES: i64 = 15;
/// Extra lead time added to the "prepare" reminder
const PREPARE_BUFFER_MINUTES: i64 = 10;
const MINUTE_MILLIS: i64 = 60 * 1000;

/// The two automatic reminders of an appointment. They are computed on
/// every read and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentReminders {
    pub appointment_at: i64,
    pub preparation_minutes: i64,
    /// `appointment - (2 * preparation + 10 minutes)`
    pub prepare_at: i64,
    pub prepare_time: TimeOfDay,
    /// `appointment - 2 * preparation`
    pub urgent_at: i64,
    pub urgent_time: TimeOfDay,
}

pub fn derive_appointment_reminders(
    date: NaiveDate,
    time: TimeOfDay,
    preparation_minutes: Option<i64>,
    tz: &Tz,
) -> Option<AppointmentReminders> {
    let preparation_minutes = preparation_minutes
        .filter(|minutes| *minutes > 0)
        .unwrap_or(DEFAULT_PREPARATION_MINUTES);
    let appointment_at = local_to_timestamp_millis(tz, date, time)?;

    let urgent_at = appointment_at - 2 * preparation_minutes * MINUTE_MILLIS;
    let prepare_at = urgent_at - PREPARE_BUFFER_MINUTES * MINUTE_MILLIS;

    let local_time = |millis| timestamp_to_local(tz, millis).map(|dt| TimeOfDay::from(dt.time()));

    Some(AppointmentReminders {
        appointment_at,
        preparation_minutes,
        prepare_at,
        prepare_time: local_time(prepare_at)?,
        urgent_at,
        urgent_time: local_time(urgent_at)?,
    })
}

impl Appointment {
    pub fn reminders(&self, tz: &Tz) -> Option<AppointmentReminders> {
        derive_appointment_reminders(self.date, self.time, self.preparation_minutes, tz)
    }
}
