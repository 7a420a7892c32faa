use crate::dtos::{IntervalFields, ReminderDTO};
use chrono::NaiveDate;
use nudge_domain::{Channel, EntityType, Reminder, ReminderKind, TimeOfDay, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub reminder: ReminderDTO,
}

impl ReminderResponse {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            reminder: ReminderDTO::new(reminder),
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindersResponse {
    pub reminders: Vec<ReminderDTO>,
}

impl RemindersResponse {
    pub fn new(reminders: Vec<Reminder>) -> Self {
        Self {
            reminders: reminders.into_iter().map(ReminderDTO::new).collect(),
        }
    }
}

pub mod create_reminder {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub user_id: ID,
        pub entity_id: ID,
        pub entity_type: EntityType,
        #[serde(rename = "type")]
        pub kind: ReminderKind,
        pub scheduled_time: Option<TimeOfDay>,
        pub reminder_date: Option<NaiveDate>,
        /// 0 is Sunday
        #[serde(default)]
        pub days_of_week: Vec<u8>,
        pub minutes_before: Option<i64>,
        #[serde(flatten)]
        pub interval: IntervalFields,
        pub notification_types: Vec<Channel>,
        pub message: Option<String>,
        pub is_active: Option<bool>,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod get_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod update_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    #[derive(Deserialize, Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(rename = "type")]
        pub kind: Option<ReminderKind>,
        pub scheduled_time: Option<TimeOfDay>,
        pub reminder_date: Option<NaiveDate>,
        pub days_of_week: Option<Vec<u8>>,
        pub minutes_before: Option<i64>,
        #[serde(flatten)]
        pub interval: IntervalFields,
        pub notification_types: Option<Vec<Channel>>,
        pub message: Option<String>,
        pub is_active: Option<bool>,
        /// When given, the update is rejected if the reminder has been
        /// modified since this version was read
        pub version: Option<i64>,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod delete_reminder {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reminder_id: ID,
    }

    pub type APIResponse = ReminderResponse;
}

pub mod get_upcoming_reminders {
    use super::*;

    #[derive(Deserialize)]
    pub struct QueryParams {
        pub limit: Option<usize>,
    }

    pub type APIResponse = RemindersResponse;
}
