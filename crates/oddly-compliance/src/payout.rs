//! Payout validation.
//!
//! Strict rule set for a payout proposal: hard violations flip `ok`, soft
//! warnings never do. Evaluation does not short-circuit, so a caller always
//! sees the complete list.

use oddly_core::*;
use oddly_store::{
    ChallengeStore, ContributionStore, EventStore, ManifestStore, ProposalStore, UserStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Allowed deviation of a manifest total from 1.0.
pub const MANIFEST_TOLERANCE: f64 = 0.01;

/// Payout validation result contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PayoutValidation {
    pub ok: bool,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct PayoutValidator {
    challenges: Arc<dyn ChallengeStore>,
    users: Arc<dyn UserStore>,
    contributions: Arc<dyn ContributionStore>,
    manifests: Arc<dyn ManifestStore>,
    proposals: Arc<dyn ProposalStore>,
    events: Arc<dyn EventStore>,
}

impl PayoutValidator {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        users: Arc<dyn UserStore>,
        contributions: Arc<dyn ContributionStore>,
        manifests: Arc<dyn ManifestStore>,
        proposals: Arc<dyn ProposalStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            challenges,
            users,
            contributions,
            manifests,
            proposals,
            events,
        }
    }

    pub async fn validate(&self, challenge_id: ChallengeId) -> Result<PayoutValidation> {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        let challenge = self.challenges.get_challenge(challenge_id).await?;
        if challenge.is_none() {
            // Nothing else can be evaluated without the challenge row.
            return Ok(PayoutValidation {
                ok: false,
                violations: vec!["Challenge not found".to_string()],
                warnings,
            });
        }

        match self.manifests.manifest_for(challenge_id).await? {
            None => violations.push("No composition manifest".to_string()),
            Some(manifest) => {
                if !manifest.signed_by_leader {
                    violations.push("Manifest not signed by project leader".to_string());
                }
                if (manifest.total_declared - 1.0).abs() > MANIFEST_TOLERANCE {
                    violations.push(format!(
                        "Manifest total is {:.3}, expected 1.0 within ±{}",
                        manifest.total_declared, MANIFEST_TOLERANCE
                    ));
                }
            }
        }

        let contributions = self.contributions.contributions_for(challenge_id).await?;
        let mut seen: Vec<UserId> = Vec::new();
        for contribution in &contributions {
            if seen.contains(&contribution.contributor_id) {
                continue;
            }
            seen.push(contribution.contributor_id);

            match self.users.get_user(contribution.contributor_id).await? {
                Some(user) if user.kyc == KycStatus::Verified => {}
                Some(user) => violations.push(format!(
                    "Contributor {} KYC status is {:?}, expected Verified",
                    user.email, user.kyc
                )),
                None => violations.push(format!(
                    "Contributor {} has no user record",
                    contribution.contributor_id
                )),
            }
        }

        let trail = self.events.trail(&EntityRef::challenge(challenge_id)).await?;
        if trail.is_empty() {
            warnings.push("No event trail for challenge".to_string());
        }

        match self.proposals.latest_proposal_for(challenge_id).await? {
            None => warnings.push("No payout proposal for challenge".to_string()),
            Some(p) if !p.sponsor_approved => {
                warnings.push("Latest payout proposal not approved by sponsor".to_string())
            }
            Some(_) => {}
        }

        let ok = violations.is_empty();
        tracing::info!(
            %challenge_id,
            ok,
            violations = violations.len(),
            warnings = warnings.len(),
            "payout validated"
        );

        Ok(PayoutValidation {
            ok,
            violations,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use oddly_store::MemStore;
    use std::collections::HashMap;

    fn validator(store: Arc<MemStore>) -> PayoutValidator {
        PayoutValidator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    async fn challenge_with_contributor(
        store: &MemStore,
        kyc: KycStatus,
    ) -> (ChallengeId, UserId) {
        let mut user = User::new("maker@example.com", "maker");
        user.kyc = kyc;
        let user_id = user.id;
        store.put_user(user).await.unwrap();

        let challenge = Challenge::new("validated challenge", 1000.0, UserId::generate());
        let challenge_id = challenge.id;
        store.put_challenge(challenge).await.unwrap();
        store
            .put_contribution(Contribution::new(
                challenge_id,
                user_id,
                ContributionKind::Code,
                "impl",
            ))
            .await
            .unwrap();

        (challenge_id, user_id)
    }

    #[tokio::test]
    async fn unknown_challenge_is_a_violation_not_an_error() {
        let store = Arc::new(MemStore::new());
        let result = validator(store)
            .validate(ChallengeId::generate())
            .await
            .unwrap();

        assert!(!result.ok);
        assert_eq!(result.violations, vec!["Challenge not found".to_string()]);
    }

    #[tokio::test]
    async fn missing_manifest_is_the_exact_violation() {
        let store = Arc::new(MemStore::new());
        let (challenge_id, _) = challenge_with_contributor(&store, KycStatus::Verified).await;

        let result = validator(store).validate(challenge_id).await.unwrap();
        assert!(!result.ok);
        assert!(result
            .violations
            .contains(&"No composition manifest".to_string()));
    }

    #[tokio::test]
    async fn off_tolerance_manifest_total_is_reported() {
        let store = Arc::new(MemStore::new());
        let (challenge_id, user_id) = challenge_with_contributor(&store, KycStatus::Verified).await;

        let mut manifest =
            CompositionManifest::new(challenge_id, HashMap::from([(user_id, 0.95)]));
        manifest.sign(Utc::now());
        store.put_manifest(manifest).await.unwrap();

        let result = validator(store).validate(challenge_id).await.unwrap();
        assert!(!result.ok);
        assert!(
            result.violations.iter().any(|v| v.contains("Manifest total is")),
            "violations: {:?}",
            result.violations
        );
    }

    #[tokio::test]
    async fn violations_accumulate_without_short_circuit() {
        let store = Arc::new(MemStore::new());
        let (challenge_id, user_id) = challenge_with_contributor(&store, KycStatus::Pending).await;

        // Unsigned manifest with a bad total plus an unverified contributor.
        let manifest = CompositionManifest::new(challenge_id, HashMap::from([(user_id, 0.5)]));
        store.put_manifest(manifest).await.unwrap();

        let result = validator(store).validate(challenge_id).await.unwrap();
        assert!(!result.ok);
        assert_eq!(result.violations.len(), 3, "violations: {:?}", result.violations);
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("maker@example.com")));
    }

    #[tokio::test]
    async fn clean_payout_is_ok_with_warnings_allowed() {
        let store = Arc::new(MemStore::new());
        let (challenge_id, user_id) = challenge_with_contributor(&store, KycStatus::Verified).await;

        let mut manifest =
            CompositionManifest::new(challenge_id, HashMap::from([(user_id, 1.0)]));
        manifest.sign(Utc::now());
        store.put_manifest(manifest).await.unwrap();

        let result = validator(store).validate(challenge_id).await.unwrap();
        assert!(result.ok);
        assert!(result.violations.is_empty());
        // No events and no proposal yet: warnings only.
        assert!(!result.warnings.is_empty());
    }
}
