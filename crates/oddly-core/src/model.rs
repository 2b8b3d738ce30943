//! Entity model for the bounty platform.
//!
//! These are plain data rows: every component re-reads what it needs per
//! call and no struct carries cross-request mutable state. Derived records
//! (moderation results, ethics audits, evidence packages) keep their full
//! payload as JSON so they can be reproduced and compared byte-for-byte.

use crate::hash::ContentHash;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A platform user: sponsor, project leader or contributor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub kyc: KycStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            email: email.into(),
            display_name: display_name.into(),
            kyc: KycStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// A sponsored bounty challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    pub bounty_amount: f64,
    pub status: ChallengeStatus,
    pub vetting: VettingStatus,
    pub sponsor_id: UserId,
    pub project_leader_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn new(title: impl Into<String>, bounty_amount: f64, sponsor_id: UserId) -> Self {
        Self {
            id: ChallengeId::generate(),
            title: title.into(),
            bounty_amount,
            status: ChallengeStatus::Open,
            vetting: VettingStatus::Pending,
            sponsor_id,
            project_leader_id: None,
            created_at: Utc::now(),
        }
    }
}

/// A participant's contribution to a challenge. Append-only: never mutated
/// after the payout calculation has read it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub challenge_id: ChallengeId,
    pub contributor_id: UserId,
    pub kind: ContributionKind,
    pub content: String,
    /// Assigned at creation from the fixed kind table.
    pub token_value: f64,
    pub created_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(
        challenge_id: ChallengeId,
        contributor_id: UserId,
        kind: ContributionKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: ContributionId::generate(),
            challenge_id,
            contributor_id,
            kind,
            content: content.into(),
            token_value: kind.token_value(),
            created_at: Utc::now(),
        }
    }
}

/// Signed declaration of each contributor's share of the credit for a
/// challenge. One per challenge; total must sum to 1.0 within tolerance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompositionManifest {
    pub challenge_id: ChallengeId,
    pub shares: HashMap<UserId, f64>,
    pub total_declared: f64,
    pub signed_by_leader: bool,
    pub signed_at: Option<DateTime<Utc>>,
}

impl CompositionManifest {
    pub fn new(challenge_id: ChallengeId, shares: HashMap<UserId, f64>) -> Self {
        let total_declared = shares.values().sum();
        Self {
            challenge_id,
            shares,
            total_declared,
            signed_by_leader: false,
            signed_at: None,
        }
    }

    pub fn sign(&mut self, at: DateTime<Utc>) {
        self.signed_by_leader = true;
        self.signed_at = Some(at);
    }
}

/// A proposed payout distribution awaiting signature and approval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PayoutProposal {
    pub id: ProposalId,
    pub challenge_id: ChallengeId,
    /// Proposed recipient -> amount map, stored as JSON.
    pub distribution: serde_json::Value,
    pub within_tolerance: bool,
    pub leader_signed: bool,
    pub leader_signed_at: Option<DateTime<Utc>>,
    pub sponsor_approved: bool,
    pub sponsor_approved_at: Option<DateTime<Utc>>,
    pub audit_status: AuditStatus,
    pub evidence_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One payment row. Created in bulk at distribution; settled externally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub challenge_id: ChallengeId,
    pub recipient_id: UserId,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An immutable audit event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub actor_id: UserId,
    pub entity: EntityRef,
    pub action: String,
    pub content_hash: Option<ContentHash>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A stored file, content-addressed by SHA-256 for dedup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileArtifact {
    pub id: FileId,
    pub owner_id: UserId,
    pub challenge_id: Option<ChallengeId>,
    pub filename: String,
    pub mime: String,
    pub size: u64,
    pub sha256: ContentHash,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// Cached content-moderation result, keyed by the analysis cache hash.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModerationRecord {
    pub cache_key: ContentHash,
    pub entity: EntityRef,
    /// Full analysis payload, stored verbatim so a cache hit returns a
    /// byte-identical result.
    pub analysis: serde_json::Value,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A safety incident raised for flagged content.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SafetyIncident {
    pub id: IncidentId,
    pub entity: EntityRef,
    pub severity: u8,
    pub categories: Vec<String>,
    pub ai_detected: bool,
    pub created_at: DateTime<Utc>,
}

/// Persisted fairness audit for a challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EthicsAuditRecord {
    pub challenge_id: ChallengeId,
    pub fairness_score: f64,
    pub gini_coefficient: f64,
    /// Full report payload.
    pub report: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Reputation standing of a contributor, derived from event activity and
/// safety incidents.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub user_id: UserId,
    pub score: u32,
    pub positive_actions: u64,
    pub negative_actions: u64,
    pub updated_at: DateTime<Utc>,
}

/// Persisted IR35 working-practices determination for a challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ir35Record {
    pub challenge_id: ChallengeId,
    pub determination: String,
    pub factors: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A generated, hash-verifiable evidence package.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidencePackage {
    pub id: PackageId,
    pub challenge_id: ChallengeId,
    pub file_name: String,
    pub file_size: u64,
    pub sha256: ContentHash,
    pub includes_events: bool,
    pub includes_files: bool,
    pub includes_signatures: bool,
    pub includes_ai_analysis: bool,
    pub verification_url: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contribution_gets_fixed_token_value() {
        let c = Contribution::new(
            ChallengeId::generate(),
            UserId::generate(),
            ContributionKind::Code,
            "initial matching engine",
        );
        assert_eq!(c.token_value, 100.0);
    }

    #[test]
    fn manifest_totals_declared_shares() {
        let (a, b) = (UserId::generate(), UserId::generate());
        let manifest = CompositionManifest::new(
            ChallengeId::generate(),
            HashMap::from([(a, 0.6), (b, 0.4)]),
        );
        assert!((manifest.total_declared - 1.0).abs() < 1e-9);
        assert!(!manifest.signed_by_leader);
    }

    #[test]
    fn manifest_sign_sets_timestamp() {
        let mut manifest = CompositionManifest::new(ChallengeId::generate(), HashMap::new());
        let now = Utc::now();
        manifest.sign(now);
        assert!(manifest.signed_by_leader);
        assert_eq!(manifest.signed_at, Some(now));
    }

    #[test]
    fn new_challenge_is_open_and_unvetted() {
        let c = Challenge::new("port the renderer", 5000.0, UserId::generate());
        assert_eq!(c.status, ChallengeStatus::Open);
        assert_eq!(c.vetting, VettingStatus::Pending);
    }
}
