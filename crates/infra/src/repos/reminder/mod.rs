mod inmemory;
mod postgres;

use crate::repos::shared::repo::DeleteResult;
pub use inmemory::InMemoryReminderRepo;
use nudge_domain::{EntityType, Reminder, ID};
pub use postgres::PostgresReminderRepo;

/// Outcome of processing a claimed occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderCompletion {
    pub reminder_id: ID,
    /// The version returned by `IReminderRepo::claim`
    pub claimed_version: i64,
    pub next_scheduled_at: Option<i64>,
    /// `None` hands the occurrence back unattempted, restoring the state
    /// from before the claim
    pub last_attempt_at: Option<i64>,
    /// Only set when at least one channel delivered
    pub last_success_at: Option<i64>,
    pub deactivate: bool,
    pub updated: i64,
}

/// Limit that rejected a write activating a `Reminder`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveLimit {
    /// `MAX_REMINDERS_PER_ENTITY` active reminders for the task or habit
    PerEntity,
    PerUser,
}

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    /// Inserts an active `reminder` unless the owning entity or user already
    /// reached its limit of active reminders. Counting and inserting happen
    /// in one atomic step.
    async fn insert_active(
        &self,
        reminder: &Reminder,
        max_per_user: usize,
    ) -> anyhow::Result<Result<(), ActiveLimit>>;
    /// Stores `reminder` if the stored version still equals `reminder.version`.
    /// Returns the stored `Reminder` with its bumped version, or `None` when
    /// somebody else wrote it in the meantime.
    async fn save(&self, reminder: &Reminder) -> anyhow::Result<Option<Reminder>>;
    /// `save` for a `Reminder` that turns active, checking the limits like
    /// `insert_active` does
    async fn save_active(
        &self,
        reminder: &Reminder,
        max_per_user: usize,
    ) -> anyhow::Result<Result<Option<Reminder>, ActiveLimit>>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    /// Ordered by `created`
    async fn find_by_entity(
        &self,
        entity_id: &ID,
        entity_type: EntityType,
    ) -> anyhow::Result<Vec<Reminder>>;
    async fn delete(&self, reminder_id: &ID) -> Option<Reminder>;
    /// Removes every reminder of a deleted task or habit
    async fn delete_by_entity(
        &self,
        entity_id: &ID,
        entity_type: EntityType,
    ) -> anyhow::Result<DeleteResult>;
    /// Active reminders whose occurrence is due at `now` and not claimed,
    /// see `Reminder::is_claimable`. Ordered by `next_scheduled_at`.
    async fn find_due(
        &self,
        now: i64,
        stale_before: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<Reminder>>;
    /// Atomically marks the due occurrence as being worked on by setting
    /// `last_attempt_at = now` and bumping the version. Only succeeds when the
    /// version is unchanged and the `Reminder` is still claimable.
    async fn claim(
        &self,
        reminder_id: &ID,
        version: i64,
        now: i64,
        stale_before: i64,
    ) -> anyhow::Result<Option<Reminder>>;
    /// Returns false when the `Reminder` was modified or deleted after it was claimed
    async fn complete(&self, completion: &ReminderCompletion) -> anyhow::Result<bool>;
    async fn find_upcoming(&self, limit: usize) -> Vec<Reminder>;
    /// Deletes inactive or exhausted reminders last updated before `updated_before`
    async fn delete_stale(&self, updated_before: i64) -> anyhow::Result<DeleteResult>;
}
