use crate::dtos::ReminderDTO;
use chrono::NaiveDate;
use nudge_domain::{AppointmentReminders, IntervalSummary, ReminderAnalysis, TimeOfDay, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSummaryDTO {
    pub reminder_id: ID,
    pub interval_minutes: u32,
    pub interval_start_time: TimeOfDay,
    pub interval_end_time: TimeOfDay,
    pub slots_per_day: usize,
    pub description: String,
}

impl IntervalSummaryDTO {
    pub fn new(summary: IntervalSummary) -> Self {
        Self {
            reminder_id: summary.reminder_id,
            interval_minutes: summary.minutes,
            interval_start_time: summary.start_time,
            interval_end_time: summary.end_time,
            slots_per_day: summary.slots_per_day,
            description: summary.description,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSummaryDTO {
    pub total: usize,
    pub remaining_capacity: usize,
    pub main_reminders: Vec<ReminderDTO>,
    pub interval_reminders: Vec<IntervalSummaryDTO>,
    pub summary: String,
}

impl ReminderSummaryDTO {
    pub fn new(analysis: ReminderAnalysis) -> Self {
        Self {
            total: analysis.total,
            remaining_capacity: analysis.remaining_capacity(),
            main_reminders: analysis
                .main_reminders
                .into_iter()
                .map(ReminderDTO::new)
                .collect(),
            interval_reminders: analysis
                .interval_reminders
                .into_iter()
                .map(IntervalSummaryDTO::new)
                .collect(),
            summary: analysis.summary,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedReminderDTO {
    pub remind_at: i64,
    pub time: TimeOfDay,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRemindersDTO {
    pub appointment_at: i64,
    pub preparation_minutes: i64,
    pub prepare: DerivedReminderDTO,
    pub urgent: DerivedReminderDTO,
}

impl AppointmentRemindersDTO {
    pub fn new(reminders: AppointmentReminders) -> Self {
        Self {
            appointment_at: reminders.appointment_at,
            preparation_minutes: reminders.preparation_minutes,
            prepare: DerivedReminderDTO {
                remind_at: reminders.prepare_at,
                time: reminders.prepare_time,
            },
            urgent: DerivedReminderDTO {
                remind_at: reminders.urgent_at,
                time: reminders.urgent_time,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDTO {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub preparation_minutes: Option<i64>,
}
