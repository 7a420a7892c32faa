use crate::dtos::{AppointmentDTO, AppointmentRemindersDTO, ReminderSummaryDTO};
use nudge_domain::{EntityType, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct EntityPathParams {
    pub entity_type: EntityType,
    pub entity_id: ID,
}

pub mod get_entity_reminders {
    pub use super::EntityPathParams as PathParams;

    pub type APIResponse = crate::reminder::api::RemindersResponse;
}

pub mod get_entity_reminder_summary {
    use super::*;
    pub use super::EntityPathParams as PathParams;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub summary: ReminderSummaryDTO,
    }
}

pub mod get_appointment_reminders {
    use super::*;
    pub use super::EntityPathParams as PathParams;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        /// `None` when the entity is not an appointment
        pub appointment_reminders: Option<AppointmentRemindersDTO>,
    }
}

pub mod sync_entity {
    use super::*;
    pub use super::EntityPathParams as PathParams;

    /// Latest state of a task or habit, pushed by the service owning it
    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub user_id: ID,
        pub due_at: Option<i64>,
        pub appointment: Option<AppointmentDTO>,
    }

    pub type APIResponse = crate::reminder::api::RemindersResponse;
}

pub mod delete_entity {
    use super::*;
    pub use super::EntityPathParams as PathParams;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub deleted_reminders: i64,
    }
}
