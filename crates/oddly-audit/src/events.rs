//! Append-only audit event recorder.

use chrono::Utc;
use oddly_core::*;
use oddly_store::EventStore;
use std::sync::Arc;

/// Writes and reads the immutable event trail. The recorder only appends;
/// there is no way to mutate or delete an event through this type or the
/// store trait beneath it.
pub struct EventRecorder {
    events: Arc<dyn EventStore>,
}

impl EventRecorder {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Record one event and return it as written.
    pub async fn emit(
        &self,
        actor_id: UserId,
        entity: EntityRef,
        action: impl Into<String>,
        metadata: Option<serde_json::Value>,
        content_hash: Option<ContentHash>,
    ) -> Result<EventRecord> {
        let event = EventRecord {
            id: EventId::generate(),
            actor_id,
            entity,
            action: action.into(),
            content_hash,
            metadata: metadata.unwrap_or(serde_json::Value::Null),
            created_at: Utc::now(),
        };
        self.events.append_event(event.clone()).await?;
        tracing::debug!(event_id = %event.id, action = %event.action, entity = %event.entity, "event recorded");
        Ok(event)
    }

    /// Full trail for an entity, oldest first.
    pub async fn trail(&self, entity: &EntityRef) -> Result<Vec<EventRecord>> {
        self.events.trail(entity).await
    }

    /// Latest events by one actor, newest first.
    pub async fn by_actor(&self, actor_id: UserId, limit: usize) -> Result<Vec<EventRecord>> {
        self.events.events_by_actor(actor_id, limit).await
    }

    /// Latest events platform-wide, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<EventRecord>> {
        self.events.recent_events(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddly_store::MemStore;

    fn recorder() -> (EventRecorder, Arc<MemStore>) {
        let store = Arc::new(MemStore::new());
        (EventRecorder::new(store.clone()), store)
    }

    #[tokio::test]
    async fn trail_preserves_append_order() {
        let (recorder, _) = recorder();
        let actor = UserId::generate();
        let entity = EntityRef::challenge(ChallengeId::generate());

        for action in ["challenge.created", "challenge.vetted", "challenge.closed"] {
            recorder
                .emit(actor, entity.clone(), action, None, None)
                .await
                .unwrap();
        }

        let trail = recorder.trail(&entity).await.unwrap();
        let actions: Vec<&str> = trail.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(
            actions,
            ["challenge.created", "challenge.vetted", "challenge.closed"]
        );
    }

    #[tokio::test]
    async fn by_actor_is_newest_first_and_bounded() {
        let (recorder, _) = recorder();
        let actor = UserId::generate();
        let entity = EntityRef::system();

        for i in 0..5 {
            recorder
                .emit(actor, entity.clone(), format!("step.{i}"), None, None)
                .await
                .unwrap();
        }

        let recent = recorder.by_actor(actor, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "step.4");
        assert_eq!(recent[1].action, "step.3");
    }

    #[tokio::test]
    async fn emit_carries_metadata_and_hash() {
        let (recorder, _) = recorder();
        let hash = ContentHash::from_content(b"attached payload");
        let event = recorder
            .emit(
                UserId::generate(),
                EntityRef::system(),
                "file.uploaded",
                Some(serde_json::json!({"filename": "report.csv"})),
                Some(hash),
            )
            .await
            .unwrap();

        assert_eq!(event.content_hash, Some(hash));
        assert_eq!(event.metadata["filename"], "report.csv");
    }
}
