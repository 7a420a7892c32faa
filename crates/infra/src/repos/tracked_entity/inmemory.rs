use super::ITrackedEntityRepo;
use crate::repos::shared::inmemory_repo::*;
use nudge_domain::{EntityType, TrackedEntity, ID};

pub struct InMemoryTrackedEntityRepo {
    entities: std::sync::Mutex<Vec<TrackedEntity>>,
}

impl InMemoryTrackedEntityRepo {
    pub fn new() -> Self {
        Self {
            entities: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ITrackedEntityRepo for InMemoryTrackedEntityRepo {
    async fn save(&self, entity: &TrackedEntity) -> anyhow::Result<()> {
        find_and_delete_by(&self.entities, |e| {
            e.id == entity.id && e.entity_type == entity.entity_type
        });
        insert(entity, &self.entities);
        Ok(())
    }

    async fn find(&self, entity_id: &ID, entity_type: EntityType) -> Option<TrackedEntity> {
        find_by(&self.entities, |e| {
            e.id == *entity_id && e.entity_type == entity_type
        })
        .pop()
    }

    async fn delete(&self, entity_id: &ID, entity_type: EntityType) -> anyhow::Result<bool> {
        let deleted = find_and_delete_by(&self.entities, |e| {
            e.id == *entity_id && e.entity_type == entity_type
        });
        Ok(!deleted.is_empty())
    }
}
