use chrono::Weekday;
use nudge_domain::{next_trigger, weekday_from_index, Reminder, ReminderKind};
use nudge_infra::NudgeContext;

/// Due timestamp of the task or habit owning `reminder`. Only looked up for
/// before_due reminders, the other kinds do not depend on it.
pub async fn entity_due_at(reminder: &Reminder, ctx: &NudgeContext) -> Option<i64> {
    if reminder.kind != ReminderKind::BeforeDue {
        return None;
    }
    ctx.repos
        .tracked_entities
        .find(&reminder.entity_id, reminder.entity_type)
        .await
        .and_then(|entity| entity.due_at)
}

/// Next trigger of `reminder` at or after `now`, `None` for inactive reminders
pub async fn compute_next_trigger(reminder: &Reminder, now: i64, ctx: &NudgeContext) -> Option<i64> {
    if !reminder.is_active {
        return None;
    }
    let due_at = entity_due_at(reminder, ctx).await;
    next_trigger(reminder, now, &ctx.config.timezone, due_at)
}

/// Parses weekday indices where 0 is Sunday. Returns the first invalid index on failure.
pub fn parse_days_of_week(indices: &[u8]) -> Result<Vec<Weekday>, u8> {
    indices
        .iter()
        .map(|index| weekday_from_index(*index).ok_or(*index))
        .collect()
}
