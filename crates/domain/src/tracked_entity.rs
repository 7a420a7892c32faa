use crate::{
    reminder::EntityType,
    shared::entity::{Entity, ID},
    time_of_day::TimeOfDay,
};
use chrono::NaiveDate;

/// Read only view of a task or habit that `Reminder`s are attached to.
/// The owning service is the source of truth; this is what the reminder
/// engine needs to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    pub id: ID,
    pub entity_type: EntityType,
    pub user_id: ID,
    /// Due timestamp in millis, drives `ReminderKind::BeforeDue`
    pub due_at: Option<i64>,
    pub appointment: Option<Appointment>,
}

impl Entity for TrackedEntity {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    /// Defaults to `DEFAULT_PREPARATION_MINUTES` when not given
    pub preparation_minutes: Option<i64>,
}
