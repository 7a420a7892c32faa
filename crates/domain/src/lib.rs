mod analyzer;
mod appointment;
mod interval;
mod push_subscription;
mod recurrence;
mod reminder;
mod shared;
mod time_of_day;
mod tracked_entity;

pub use analyzer::{
    analyze_reminders, days_to_human_readable, minutes_to_human_readable, IntervalSummary,
    ReminderAnalysis,
};
pub use appointment::{
    derive_appointment_reminders, AppointmentReminders, DEFAULT_PREPARATION_MINUTES,
};
pub use interval::{
    expand_interval, IntervalSlots, IntervalSlotsIter, ReminderInterval,
    MAX_INTERVAL_SLOTS_PER_DAY,
};
pub use push_subscription::PushSubscription;
pub use recurrence::{next_trigger, next_trigger_after, trigger_times_of_day};
pub use reminder::{
    validate_interval, weekday_from_index, weekday_to_index, Channel, EntityType, Reminder,
    ReminderKind, ReminderValidationError, UnknownVariantError, MAX_MINUTES_BEFORE,
    MAX_REMINDERS_PER_ENTITY,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use shared::local_time::{local_to_timestamp_millis, timestamp_to_local};
pub use time_of_day::{InvalidTimeOfDayError, TimeOfDay, MINUTES_PER_DAY};
pub use tracked_entity::{Appointment, TrackedEntity};
