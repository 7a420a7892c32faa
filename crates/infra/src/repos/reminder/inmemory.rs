use super::{ActiveLimit, IReminderRepo, ReminderCompletion};
use crate::repos::shared::{inmemory_repo::*, repo::DeleteResult};
use nudge_domain::{analyze_reminders, EntityType, Reminder, ID};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(Vec::new()),
        }
    }
}

/// Which limit activating `reminder` would exceed, a stored version of
/// `reminder` itself is not counted
fn exceeded_limit(
    reminders: &[Reminder],
    reminder: &Reminder,
    max_per_user: usize,
) -> Option<ActiveLimit> {
    let others = reminders
        .iter()
        .filter(|r| r.is_active && r.id != reminder.id);
    let same_entity = others
        .clone()
        .filter(|r| r.entity_id == reminder.entity_id && r.entity_type == reminder.entity_type)
        .cloned()
        .collect::<Vec<_>>();
    if analyze_reminders(&same_entity).is_full() {
        return Some(ActiveLimit::PerEntity);
    }
    if others.filter(|r| r.user_id == reminder.user_id).count() >= max_per_user {
        return Some(ActiveLimit::PerUser);
    }
    None
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn insert_active(
        &self,
        reminder: &Reminder,
        max_per_user: usize,
    ) -> anyhow::Result<Result<(), ActiveLimit>> {
        Ok(with_lock(&self.reminders, |reminders| {
            if let Some(limit) = exceeded_limit(reminders, reminder, max_per_user) {
                return Err(limit);
            }
            reminders.push(reminder.clone());
            Ok(())
        }))
    }

    async fn save_active(
        &self,
        reminder: &Reminder,
        max_per_user: usize,
    ) -> anyhow::Result<Result<Option<Reminder>, ActiveLimit>> {
        Ok(with_lock(&self.reminders, |reminders| {
            let index = match reminders
                .iter()
                .position(|r| r.id == reminder.id && r.version == reminder.version)
            {
                Some(index) => index,
                None => return Ok(None),
            };
            if let Some(limit) = exceeded_limit(reminders, reminder, max_per_user) {
                return Err(limit);
            }
            let mut saved = reminder.clone();
            saved.version += 1;
            reminders[index] = saved.clone();
            Ok(Some(saved))
        }))
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<Option<Reminder>> {
        Ok(update_one(&reminder.id, &self.reminders, |stored| {
            if stored.version != reminder.version {
                return false;
            }
            *stored = reminder.clone();
            stored.version += 1;
            true
        }))
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_by_entity(
        &self,
        entity_id: &ID,
        entity_type: EntityType,
    ) -> anyhow::Result<Vec<Reminder>> {
        let mut reminders = find_by(&self.reminders, |r| {
            r.entity_id == *entity_id && r.entity_type == entity_type
        });
        reminders.sort_by_key(|r| r.created);
        Ok(reminders)
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        delete(reminder_id, &self.reminders)
    }

    async fn delete_by_entity(
        &self,
        entity_id: &ID,
        entity_type: EntityType,
    ) -> anyhow::Result<DeleteResult> {
        Ok(delete_by(&self.reminders, |r| {
            r.entity_id == *entity_id && r.entity_type == entity_type
        }))
    }

    async fn find_due(
        &self,
        now: i64,
        stale_before: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<Reminder>> {
        let mut due = find_by(&self.reminders, |r| r.is_claimable(now, stale_before));
        due.sort_by_key(|r| r.next_scheduled_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn claim(
        &self,
        reminder_id: &ID,
        version: i64,
        now: i64,
        stale_before: i64,
    ) -> anyhow::Result<Option<Reminder>> {
        Ok(update_one(reminder_id, &self.reminders, |stored| {
            if stored.version != version || !stored.is_claimable(now, stale_before) {
                return false;
            }
            stored.last_attempt_at = Some(now);
            stored.version += 1;
            true
        }))
    }

    async fn complete(&self, completion: &ReminderCompletion) -> anyhow::Result<bool> {
        let completed = update_one(&completion.reminder_id, &self.reminders, |stored| {
            if stored.version != completion.claimed_version {
                return false;
            }
            stored.next_scheduled_at = completion.next_scheduled_at;
            stored.last_attempt_at = completion.last_attempt_at;
            if completion.last_success_at.is_some() {
                stored.last_success_at = completion.last_success_at;
            }
            if completion.deactivate {
                stored.is_active = false;
            }
            stored.updated = completion.updated;
            stored.version += 1;
            true
        });
        Ok(completed.is_some())
    }

    async fn find_upcoming(&self, limit: usize) -> Vec<Reminder> {
        let mut upcoming = find_by(&self.reminders, |r| {
            r.is_active && r.next_scheduled_at.is_some()
        });
        upcoming.sort_by_key(|r| r.next_scheduled_at);
        upcoming.truncate(limit);
        upcoming
    }

    async fn delete_stale(&self, updated_before: i64) -> anyhow::Result<DeleteResult> {
        Ok(delete_by(&self.reminders, |r| {
            r.is_exhausted() && r.updated < updated_before
        }))
    }
}
