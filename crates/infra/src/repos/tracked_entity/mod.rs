mod inmemory;
mod postgres;

pub use inmemory::InMemoryTrackedEntityRepo;
use nudge_domain::{EntityType, TrackedEntity, ID};
pub use postgres::PostgresTrackedEntityRepo;

/// Read side of the tasks and habits owned by other services. Writes only
/// happen when those services push their latest state or a deletion.
#[async_trait::async_trait]
pub trait ITrackedEntityRepo: Send + Sync {
    async fn save(&self, entity: &TrackedEntity) -> anyhow::Result<()>;
    async fn find(&self, entity_id: &ID, entity_type: EntityType) -> Option<TrackedEntity>;
    /// Returns whether the entity was known
    async fn delete(&self, entity_id: &ID, entity_type: EntityType) -> anyhow::Result<bool>;
}
