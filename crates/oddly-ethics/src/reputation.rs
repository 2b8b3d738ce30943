//! Contributor reputation.
//!
//! A 0-1000 standing derived from audit-trail activity and safety
//! incidents. Recomputed from inputs on demand; the stored record is a
//! snapshot, not a source of truth.

use chrono::Utc;
use oddly_core::*;
use oddly_store::{AuditStore, EventStore, ModerationStore};
use std::sync::Arc;

/// Neutral starting score for a contributor with no history.
pub const BASE_SCORE: u32 = 500;
/// Most activity credit a contributor can accumulate.
pub const MAX_ACTIVITY_BONUS: u32 = 300;
/// Score penalty per incident severity point.
pub const PENALTY_PER_SEVERITY: u32 = 50;
/// Ceiling of the scale.
pub const MAX_SCORE: u32 = 1000;

pub struct ReputationScorer {
    events: Arc<dyn EventStore>,
    moderation: Arc<dyn ModerationStore>,
    audits: Arc<dyn AuditStore>,
}

impl ReputationScorer {
    pub fn new(
        events: Arc<dyn EventStore>,
        moderation: Arc<dyn ModerationStore>,
        audits: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            events,
            moderation,
            audits,
        }
    }

    /// Recompute and persist a contributor's reputation.
    pub async fn score(&self, user_id: UserId) -> Result<ReputationRecord> {
        let activity = self.events.events_by_actor(user_id, 1000).await?;
        let incidents = self
            .moderation
            .incidents_for(&EntityRef::user(user_id))
            .await?;

        let positive_actions = activity.len() as u64;
        let negative_actions = incidents.len() as u64;

        let bonus = ((positive_actions as u32).saturating_mul(2)).min(MAX_ACTIVITY_BONUS);
        let penalty: u32 = incidents
            .iter()
            .map(|i| u32::from(i.severity) * PENALTY_PER_SEVERITY)
            .sum();

        let score = (BASE_SCORE + bonus).saturating_sub(penalty).min(MAX_SCORE);

        let record = ReputationRecord {
            user_id,
            score,
            positive_actions,
            negative_actions,
            updated_at: Utc::now(),
        };
        self.audits.put_reputation(record.clone()).await?;

        tracing::debug!(%user_id, score, positive_actions, negative_actions, "reputation scored");
        Ok(record)
    }
}
