//! Repository traits, one per aggregate.
//!
//! Implementations map these onto whatever query layer backs the platform;
//! the domain crates only ever see plain data structures coming back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oddly_core::*;

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>>;

    /// Insert or update. Updating a `Closed` challenge is rejected with a
    /// validation error; closed challenges are immutable.
    async fn put_challenge(&self, challenge: Challenge) -> Result<()>;

    async fn list_challenges(&self) -> Result<Vec<Challenge>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn put_user(&self, user: User) -> Result<()>;
}

#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// All contributions for a challenge, ordered by creation time
    /// ascending. Split calculation depends on this ordering.
    async fn contributions_for(&self, challenge_id: ChallengeId) -> Result<Vec<Contribution>>;

    async fn put_contribution(&self, contribution: Contribution) -> Result<()>;
}

#[async_trait]
pub trait ManifestStore: Send + Sync {
    async fn manifest_for(&self, challenge_id: ChallengeId)
        -> Result<Option<CompositionManifest>>;

    /// Upsert; a challenge has at most one manifest.
    async fn put_manifest(&self, manifest: CompositionManifest) -> Result<()>;
}

#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Most recently created proposal for a challenge, if any.
    async fn latest_proposal_for(&self, challenge_id: ChallengeId)
        -> Result<Option<PayoutProposal>>;

    async fn put_proposal(&self, proposal: PayoutProposal) -> Result<()>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn payments_for(&self, challenge_id: ChallengeId) -> Result<Vec<Payment>>;

    /// All-or-nothing batch insert. Every row is validated before any row
    /// lands; if one row is rejected the store must contain none of them.
    async fn insert_batch(&self, payments: Vec<Payment>) -> Result<Vec<Payment>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one immutable event. There is deliberately no update or
    /// delete operation on this trait.
    async fn append_event(&self, event: EventRecord) -> Result<()>;

    /// Full trail for an entity, ordered by creation time ascending.
    async fn trail(&self, entity: &EntityRef) -> Result<Vec<EventRecord>>;

    /// Most recent events by one actor, newest first, bounded.
    async fn events_by_actor(&self, actor_id: UserId, limit: usize) -> Result<Vec<EventRecord>>;

    /// System-wide recent activity, newest first, bounded.
    async fn recent_events(&self, limit: usize) -> Result<Vec<EventRecord>>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn get_file(&self, id: FileId) -> Result<Option<FileArtifact>>;

    /// Dedup lookup: any existing row with this content hash.
    async fn file_by_hash(&self, sha256: ContentHash) -> Result<Option<FileArtifact>>;

    async fn put_file(&self, file: FileArtifact) -> Result<()>;

    async fn delete_file(&self, id: FileId) -> Result<()>;

    async fn files_for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<FileArtifact>>;
}

#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Cache lookup honoring expiry: a record whose `expires_at` is in the
    /// past is treated as absent.
    async fn cached_analysis(
        &self,
        cache_key: ContentHash,
        now: DateTime<Utc>,
    ) -> Result<Option<ModerationRecord>>;

    async fn put_analysis(&self, record: ModerationRecord) -> Result<()>;

    async fn put_incident(&self, incident: SafetyIncident) -> Result<()>;

    async fn incidents_for(&self, entity: &EntityRef) -> Result<Vec<SafetyIncident>>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn put_ethics_audit(&self, record: EthicsAuditRecord) -> Result<()>;
    async fn latest_ethics_audit(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<Option<EthicsAuditRecord>>;

    async fn put_reputation(&self, record: ReputationRecord) -> Result<()>;
    async fn get_reputation(&self, user_id: UserId) -> Result<Option<ReputationRecord>>;

    async fn put_ir35(&self, record: Ir35Record) -> Result<()>;
    async fn get_ir35(&self, challenge_id: ChallengeId) -> Result<Option<Ir35Record>>;

    async fn put_package(&self, package: EvidencePackage) -> Result<()>;
    async fn get_package(&self, id: PackageId) -> Result<Option<EvidencePackage>>;
}
