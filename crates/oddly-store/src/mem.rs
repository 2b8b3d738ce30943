//! In-memory store backend.
//!
//! Backs embedded runs and every test in the workspace. Events and payments
//! are kept in insertion order, so "creation time ascending" falls out of
//! append order even when two rows share a timestamp.

use crate::traits::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oddly_core::*;
use parking_lot::RwLock;
use std::collections::HashMap;

/// One struct implements every repository trait; hand out `Arc<MemStore>`
/// and coerce to whichever trait object a component needs.
#[derive(Default)]
pub struct MemStore {
    challenges: RwLock<HashMap<ChallengeId, Challenge>>,
    users: RwLock<HashMap<UserId, User>>,
    contributions: RwLock<HashMap<ChallengeId, Vec<Contribution>>>,
    manifests: RwLock<HashMap<ChallengeId, CompositionManifest>>,
    proposals: RwLock<Vec<PayoutProposal>>,
    payments: RwLock<Vec<Payment>>,
    events: RwLock<Vec<EventRecord>>,
    files: RwLock<HashMap<FileId, FileArtifact>>,
    moderation: RwLock<HashMap<ContentHash, ModerationRecord>>,
    incidents: RwLock<Vec<SafetyIncident>>,
    ethics_audits: RwLock<Vec<EthicsAuditRecord>>,
    reputation: RwLock<HashMap<UserId, ReputationRecord>>,
    ir35: RwLock<HashMap<ChallengeId, Ir35Record>>,
    packages: RwLock<HashMap<PackageId, EvidencePackage>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemStore {
    async fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>> {
        Ok(self.challenges.read().get(&id).cloned())
    }

    async fn put_challenge(&self, challenge: Challenge) -> Result<()> {
        let mut table = self.challenges.write();
        if let Some(existing) = table.get(&challenge.id) {
            if existing.status == ChallengeStatus::Closed {
                return Err(Error::Validation(format!(
                    "challenge {} is closed and immutable",
                    challenge.id
                )));
            }
        }
        table.insert(challenge.id, challenge);
        Ok(())
    }

    async fn list_challenges(&self) -> Result<Vec<Challenge>> {
        Ok(self.challenges.read().values().cloned().collect())
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.users.write().insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl ContributionStore for MemStore {
    async fn contributions_for(&self, challenge_id: ChallengeId) -> Result<Vec<Contribution>> {
        Ok(self
            .contributions
            .read()
            .get(&challenge_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_contribution(&self, contribution: Contribution) -> Result<()> {
        self.contributions
            .write()
            .entry(contribution.challenge_id)
            .or_default()
            .push(contribution);
        Ok(())
    }
}

#[async_trait]
impl ManifestStore for MemStore {
    async fn manifest_for(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<Option<CompositionManifest>> {
        Ok(self.manifests.read().get(&challenge_id).cloned())
    }

    async fn put_manifest(&self, manifest: CompositionManifest) -> Result<()> {
        self.manifests.write().insert(manifest.challenge_id, manifest);
        Ok(())
    }
}

#[async_trait]
impl ProposalStore for MemStore {
    async fn latest_proposal_for(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<Option<PayoutProposal>> {
        Ok(self
            .proposals
            .read()
            .iter()
            .filter(|p| p.challenge_id == challenge_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn put_proposal(&self, proposal: PayoutProposal) -> Result<()> {
        let mut table = self.proposals.write();
        if let Some(existing) = table.iter_mut().find(|p| p.id == proposal.id) {
            *existing = proposal;
        } else {
            table.push(proposal);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for MemStore {
    async fn payments_for(&self, challenge_id: ChallengeId) -> Result<Vec<Payment>> {
        Ok(self
            .payments
            .read()
            .iter()
            .filter(|p| p.challenge_id == challenge_id)
            .cloned()
            .collect())
    }

    async fn insert_batch(&self, payments: Vec<Payment>) -> Result<Vec<Payment>> {
        let mut table = self.payments.write();

        // Validate the whole batch before touching the table.
        for payment in &payments {
            if !payment.amount.is_finite() || payment.amount < 0.0 {
                return Err(Error::Validation(format!(
                    "payment {} has invalid amount {}",
                    payment.id, payment.amount
                )));
            }
            if table.iter().any(|existing| existing.id == payment.id) {
                return Err(Error::Validation(format!(
                    "payment {} already exists",
                    payment.id
                )));
            }
        }
        let duplicate_in_batch = payments
            .iter()
            .enumerate()
            .any(|(i, p)| payments[..i].iter().any(|q| q.id == p.id));
        if duplicate_in_batch {
            return Err(Error::Validation("duplicate payment id in batch".into()));
        }

        table.extend(payments.iter().cloned());
        Ok(payments)
    }
}

#[async_trait]
impl EventStore for MemStore {
    async fn append_event(&self, event: EventRecord) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn trail(&self, entity: &EntityRef) -> Result<Vec<EventRecord>> {
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| &e.entity == entity)
            .cloned()
            .collect())
    }

    async fn events_by_actor(&self, actor_id: UserId, limit: usize) -> Result<Vec<EventRecord>> {
        Ok(self
            .events
            .read()
            .iter()
            .rev()
            .filter(|e| e.actor_id == actor_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<EventRecord>> {
        Ok(self.events.read().iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl FileStore for MemStore {
    async fn get_file(&self, id: FileId) -> Result<Option<FileArtifact>> {
        Ok(self.files.read().get(&id).cloned())
    }

    async fn file_by_hash(&self, sha256: ContentHash) -> Result<Option<FileArtifact>> {
        Ok(self
            .files
            .read()
            .values()
            .find(|f| f.sha256 == sha256)
            .cloned())
    }

    async fn put_file(&self, file: FileArtifact) -> Result<()> {
        self.files.write().insert(file.id, file);
        Ok(())
    }

    async fn delete_file(&self, id: FileId) -> Result<()> {
        self.files.write().remove(&id);
        Ok(())
    }

    async fn files_for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<FileArtifact>> {
        let mut files: Vec<FileArtifact> = self
            .files
            .read()
            .values()
            .filter(|f| f.challenge_id == Some(challenge_id))
            .cloned()
            .collect();
        files.sort_by_key(|f| f.created_at);
        Ok(files)
    }
}

#[async_trait]
impl ModerationStore for MemStore {
    async fn cached_analysis(
        &self,
        cache_key: ContentHash,
        now: DateTime<Utc>,
    ) -> Result<Option<ModerationRecord>> {
        Ok(self
            .moderation
            .read()
            .get(&cache_key)
            .filter(|r| r.expires_at > now)
            .cloned())
    }

    async fn put_analysis(&self, record: ModerationRecord) -> Result<()> {
        self.moderation.write().insert(record.cache_key, record);
        Ok(())
    }

    async fn put_incident(&self, incident: SafetyIncident) -> Result<()> {
        self.incidents.write().push(incident);
        Ok(())
    }

    async fn incidents_for(&self, entity: &EntityRef) -> Result<Vec<SafetyIncident>> {
        Ok(self
            .incidents
            .read()
            .iter()
            .filter(|i| &i.entity == entity)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditStore for MemStore {
    async fn put_ethics_audit(&self, record: EthicsAuditRecord) -> Result<()> {
        self.ethics_audits.write().push(record);
        Ok(())
    }

    async fn latest_ethics_audit(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<Option<EthicsAuditRecord>> {
        Ok(self
            .ethics_audits
            .read()
            .iter()
            .filter(|r| r.challenge_id == challenge_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn put_reputation(&self, record: ReputationRecord) -> Result<()> {
        self.reputation.write().insert(record.user_id, record);
        Ok(())
    }

    async fn get_reputation(&self, user_id: UserId) -> Result<Option<ReputationRecord>> {
        Ok(self.reputation.read().get(&user_id).cloned())
    }

    async fn put_ir35(&self, record: Ir35Record) -> Result<()> {
        self.ir35.write().insert(record.challenge_id, record);
        Ok(())
    }

    async fn get_ir35(&self, challenge_id: ChallengeId) -> Result<Option<Ir35Record>> {
        Ok(self.ir35.read().get(&challenge_id).cloned())
    }

    async fn put_package(&self, package: EvidencePackage) -> Result<()> {
        self.packages.write().insert(package.id, package);
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> Result<Option<EvidencePackage>> {
        Ok(self.packages.read().get(&id).cloned())
    }
}
