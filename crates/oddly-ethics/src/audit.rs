//! Ethics audit over a challenge's realized payout.

use crate::gini::{fairness_score, gini_coefficient};
use chrono::{Duration, Utc};
use oddly_core::*;
use oddly_store::{
    AuditStore, ChallengeStore, ContributionStore, ManifestStore, PaymentStore, ProposalStore,
    UserStore,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// Red flags
pub const SINGLE_CONTRIBUTOR_DOMINANCE: &str = "SINGLE_CONTRIBUTOR_DOMINANCE";
pub const UNPAID_WORK_DETECTED: &str = "UNPAID_WORK_DETECTED";
pub const EXTREME_INEQUALITY: &str = "EXTREME_INEQUALITY";
pub const MISSING_ATTRIBUTION: &str = "MISSING_ATTRIBUTION";
pub const SUSPICIOUS_TIMING: &str = "SUSPICIOUS_TIMING";
pub const NO_DIVERSE_ROLES: &str = "NO_DIVERSE_ROLES";

// Yellow flags
pub const HIGH_CONCENTRATION: &str = "HIGH_CONCENTRATION";
pub const ELEVATED_INEQUALITY: &str = "ELEVATED_INEQUALITY";
pub const UNSIGNED_MANIFEST: &str = "UNSIGNED_MANIFEST";

// Green flags
pub const DIVERSE_CONTRIBUTION_TYPES: &str = "DIVERSE_CONTRIBUTION_TYPES";
pub const SIGNED_MANIFEST: &str = "SIGNED_MANIFEST";
pub const MANIFEST_MATCHES_PAYOUTS: &str = "MANIFEST_MATCHES_PAYOUTS";
pub const BALANCED_DISTRIBUTION: &str = "BALANCED_DISTRIBUTION";

/// Dominance threshold: one recipient above this share is a red flag.
const DOMINANCE_THRESHOLD: f64 = 0.70;
/// Gini above this is extreme inequality.
const EXTREME_GINI: f64 = 0.7;
/// Declared vs realized share tolerance for the matching green flag.
const SHARE_MATCH_TOLERANCE: f64 = 0.05;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub action_required: bool,
}

/// Ethics audit result contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthicsAuditReport {
    pub fairness_score: f64,
    pub gini_coefficient: f64,
    pub red_flags: Vec<String>,
    pub yellow_flags: Vec<String>,
    pub green_flags: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub evidence_links: Vec<String>,
}

pub struct EthicsAuditor {
    challenges: Arc<dyn ChallengeStore>,
    users: Arc<dyn UserStore>,
    contributions: Arc<dyn ContributionStore>,
    manifests: Arc<dyn ManifestStore>,
    proposals: Arc<dyn ProposalStore>,
    payments: Arc<dyn PaymentStore>,
    audits: Arc<dyn AuditStore>,
}

impl EthicsAuditor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        users: Arc<dyn UserStore>,
        contributions: Arc<dyn ContributionStore>,
        manifests: Arc<dyn ManifestStore>,
        proposals: Arc<dyn ProposalStore>,
        payments: Arc<dyn PaymentStore>,
        audits: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            challenges,
            users,
            contributions,
            manifests,
            proposals,
            payments,
            audits,
        }
    }

    /// Audit a challenge's payout and persist the report.
    pub async fn audit(&self, challenge_id: ChallengeId) -> Result<EthicsAuditReport> {
        self.challenges
            .get_challenge(challenge_id)
            .await?
            .ok_or(Error::ChallengeNotFound(challenge_id))?;

        let proposal = self.proposals.latest_proposal_for(challenge_id).await?;
        let payouts = match proposal
            .as_ref()
            .map(|p| distribution_amounts(&p.distribution))
        {
            Some(map) if !map.is_empty() => map,
            // Fall back to the realized payment rows.
            _ => {
                let mut map: HashMap<UserId, f64> = HashMap::new();
                for payment in self.payments.payments_for(challenge_id).await? {
                    *map.entry(payment.recipient_id).or_insert(0.0) += payment.amount;
                }
                map
            }
        };

        let total: f64 = payouts.values().sum();
        let shares: HashMap<UserId, f64> = if total > 0.0 {
            payouts.iter().map(|(k, v)| (*k, v / total)).collect()
        } else {
            payouts.keys().map(|k| (*k, 0.0)).collect()
        };
        let share_values: Vec<f64> = shares.values().copied().collect();
        let gini = gini_coefficient(&share_values);

        let contributions = self.contributions.contributions_for(challenge_id).await?;
        let manifest = self.manifests.manifest_for(challenge_id).await?;

        let mut red = Vec::new();
        let mut yellow = Vec::new();
        let mut green = Vec::new();

        if let Some(max_share) = share_values.iter().cloned().fold(None::<f64>, |acc, x| {
            Some(acc.map_or(x, |m| m.max(x)))
        }) {
            if max_share > DOMINANCE_THRESHOLD {
                red.push(SINGLE_CONTRIBUTOR_DOMINANCE.to_string());
            } else if max_share > 0.5 {
                yellow.push(HIGH_CONCENTRATION.to_string());
            }
        }

        // Verified contributors who walked away with nothing.
        for contribution in &contributions {
            let paid = shares
                .get(&contribution.contributor_id)
                .copied()
                .unwrap_or(0.0);
            if paid > 0.0 {
                continue;
            }
            if let Some(user) = self.users.get_user(contribution.contributor_id).await? {
                if user.kyc == KycStatus::Verified
                    && !red.contains(&UNPAID_WORK_DETECTED.to_string())
                {
                    red.push(UNPAID_WORK_DETECTED.to_string());
                }
            }
        }

        if gini > EXTREME_GINI {
            red.push(EXTREME_INEQUALITY.to_string());
        } else if gini > 0.4 {
            yellow.push(ELEVATED_INEQUALITY.to_string());
        } else if !share_values.is_empty() {
            green.push(BALANCED_DISTRIBUTION.to_string());
        }

        match &manifest {
            Some(m) => {
                let missing = contributions
                    .iter()
                    .any(|c| !m.shares.contains_key(&c.contributor_id));
                if missing {
                    red.push(MISSING_ATTRIBUTION.to_string());
                }

                if m.signed_by_leader {
                    green.push(SIGNED_MANIFEST.to_string());
                } else {
                    yellow.push(UNSIGNED_MANIFEST.to_string());
                }

                if let (Some(signed_at), Some(p)) = (m.signed_at, proposal.as_ref()) {
                    let gap = p.created_at - signed_at;
                    if gap >= Duration::zero() && gap < Duration::hours(1) {
                        red.push(SUSPICIOUS_TIMING.to_string());
                    }
                }

                if m.signed_by_leader && shares_match(&m.shares, &shares) {
                    green.push(MANIFEST_MATCHES_PAYOUTS.to_string());
                }
            }
            None => yellow.push(UNSIGNED_MANIFEST.to_string()),
        }

        if !contributions.is_empty() {
            let mut kinds: Vec<ContributionKind> = contributions.iter().map(|c| c.kind).collect();
            kinds.sort_by_key(|k| k.token_value() as u64);
            kinds.dedup();
            if kinds.len() == 1 {
                red.push(NO_DIVERSE_ROLES.to_string());
            } else {
                green.push(DIVERSE_CONTRIBUTION_TYPES.to_string());
            }
        }

        let score = fairness_score(gini, red.len());
        let recommendations = recommendations_for(&red);
        let evidence_links = vec![
            format!("/api/events/CHALLENGE/{challenge_id}"),
            format!("/api/challenges/{challenge_id}/payments"),
        ];

        let report = EthicsAuditReport {
            fairness_score: score,
            gini_coefficient: gini,
            red_flags: red,
            yellow_flags: yellow,
            green_flags: green,
            recommendations,
            evidence_links,
        };

        self.audits
            .put_ethics_audit(EthicsAuditRecord {
                challenge_id,
                fairness_score: report.fairness_score,
                gini_coefficient: report.gini_coefficient,
                report: serde_json::to_value(&report)?,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            %challenge_id,
            gini = report.gini_coefficient,
            score = report.fairness_score,
            red_flags = report.red_flags.len(),
            "ethics audit complete"
        );
        Ok(report)
    }
}

/// Parse a proposal distribution object (`user id -> amount`) into a map.
/// Unparsable entries are skipped rather than failing the audit.
fn distribution_amounts(distribution: &serde_json::Value) -> HashMap<UserId, f64> {
    let mut map = HashMap::new();
    if let Some(object) = distribution.as_object() {
        for (key, value) in object {
            let Ok(uuid) = key.parse() else { continue };
            let Some(amount) = value.as_f64() else {
                continue;
            };
            map.insert(UserId::from_uuid(uuid), amount);
        }
    }
    map
}

fn shares_match(declared: &HashMap<UserId, f64>, realized: &HashMap<UserId, f64>) -> bool {
    declared.iter().all(|(user, share)| {
        (realized.get(user).copied().unwrap_or(0.0) - share).abs() <= SHARE_MATCH_TOLERANCE
    })
}

fn recommendations_for(red_flags: &[String]) -> Vec<Recommendation> {
    red_flags
        .iter()
        .map(|flag| {
            let (kind, description) = match flag.as_str() {
                SINGLE_CONTRIBUTOR_DOMINANCE => (
                    "REVIEW_DISTRIBUTION",
                    "One recipient takes more than 70% of the payout; review whether the split reflects actual contribution.",
                ),
                UNPAID_WORK_DETECTED => (
                    "COMPENSATE_CONTRIBUTOR",
                    "A verified contributor received no payout; confirm their work was accounted for.",
                ),
                EXTREME_INEQUALITY => (
                    "REBALANCE_PAYOUT",
                    "Payout inequality is extreme (Gini above 0.7); consider rebalancing before settlement.",
                ),
                MISSING_ATTRIBUTION => (
                    "UPDATE_MANIFEST",
                    "A contribution exists with no manifest entry; add the contributor to the composition manifest.",
                ),
                SUSPICIOUS_TIMING => (
                    "VERIFY_SIGNATURES",
                    "The manifest was signed less than an hour before the payout proposal; verify both were reviewed independently.",
                ),
                NO_DIVERSE_ROLES => (
                    "REVIEW_SCOPE",
                    "All contributions are the same kind; confirm the challenge scope actually needed only one role.",
                ),
                _ => ("REVIEW", "Flag raised; manual review recommended."),
            };
            Recommendation {
                kind: kind.to_string(),
                description: description.to_string(),
                action_required: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auditor(store: Arc<oddly_store::MemStore>) -> EthicsAuditor {
        EthicsAuditor::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    async fn verified_user(store: &oddly_store::MemStore) -> UserId {
        let mut user = User::new("worker@example.com", "worker");
        user.kyc = KycStatus::Verified;
        let id = user.id;
        store.put_user(user).await.unwrap();
        id
    }

    async fn completed_challenge(store: &oddly_store::MemStore) -> ChallengeId {
        let mut challenge = Challenge::new("audited", 1000.0, UserId::generate());
        challenge.status = ChallengeStatus::Completed;
        let id = challenge.id;
        store.put_challenge(challenge).await.unwrap();
        id
    }

    fn payment(challenge_id: ChallengeId, recipient_id: UserId, amount: f64) -> Payment {
        Payment {
            id: PaymentId::generate(),
            challenge_id,
            recipient_id,
            amount,
            method: PaymentMethod::Fiat,
            status: PaymentStatus::Completed,
            tx_hash: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sole_recipient_has_zero_gini_but_dominance_flag() {
        let store = Arc::new(oddly_store::MemStore::new());
        let challenge_id = completed_challenge(&store).await;
        let winner = verified_user(&store).await;

        store
            .put_contribution(Contribution::new(
                challenge_id,
                winner,
                ContributionKind::Code,
                "all of it",
            ))
            .await
            .unwrap();
        store
            .insert_batch(vec![payment(challenge_id, winner, 1000.0)])
            .await
            .unwrap();

        let report = auditor(store).audit(challenge_id).await.unwrap();

        // n = 1 is the defined boundary: perfectly "equal", no divide by zero.
        assert_eq!(report.gini_coefficient, 0.0);
        assert!(report
            .red_flags
            .contains(&SINGLE_CONTRIBUTOR_DOMINANCE.to_string()));
        assert!(report.red_flags.contains(&NO_DIVERSE_ROLES.to_string()));
        assert!(!report.recommendations.is_empty());
        assert!(report.recommendations.iter().all(|r| r.action_required));
    }

    #[tokio::test]
    async fn unpaid_verified_contributor_is_flagged() {
        let store = Arc::new(oddly_store::MemStore::new());
        let challenge_id = completed_challenge(&store).await;
        let paid = verified_user(&store).await;
        let unpaid = verified_user(&store).await;

        for (user, kind) in [(paid, ContributionKind::Code), (unpaid, ContributionKind::Design)] {
            store
                .put_contribution(Contribution::new(challenge_id, user, kind, "work"))
                .await
                .unwrap();
        }
        store
            .insert_batch(vec![payment(challenge_id, paid, 1000.0)])
            .await
            .unwrap();

        let report = auditor(store).audit(challenge_id).await.unwrap();
        assert!(report.red_flags.contains(&UNPAID_WORK_DETECTED.to_string()));
    }

    #[tokio::test]
    async fn balanced_diverse_payout_scores_high() {
        let store = Arc::new(oddly_store::MemStore::new());
        let challenge_id = completed_challenge(&store).await;

        let mut rows = Vec::new();
        let mut shares = HashMap::new();
        for kind in [
            ContributionKind::Code,
            ContributionKind::Design,
            ContributionKind::Research,
            ContributionKind::Idea,
        ] {
            let user = verified_user(&store).await;
            store
                .put_contribution(Contribution::new(challenge_id, user, kind, "work"))
                .await
                .unwrap();
            rows.push(payment(challenge_id, user, 250.0));
            shares.insert(user, 0.25);
        }
        store.insert_batch(rows).await.unwrap();

        let mut manifest = CompositionManifest::new(challenge_id, shares);
        manifest.sign(Utc::now() - Duration::days(2));
        store.put_manifest(manifest).await.unwrap();

        let report = auditor(store.clone()).audit(challenge_id).await.unwrap();

        assert!(report.red_flags.is_empty(), "red: {:?}", report.red_flags);
        assert_eq!(report.gini_coefficient, 0.0);
        assert_eq!(report.fairness_score, 1.0);
        assert!(report
            .green_flags
            .contains(&DIVERSE_CONTRIBUTION_TYPES.to_string()));
        assert!(report
            .green_flags
            .contains(&MANIFEST_MATCHES_PAYOUTS.to_string()));

        // Report is persisted and reproducible.
        let record = store.latest_ethics_audit(challenge_id).await.unwrap().unwrap();
        assert_eq!(record.fairness_score, 1.0);
    }

    #[tokio::test]
    async fn manifest_signed_just_before_proposal_is_suspicious() {
        let store = Arc::new(oddly_store::MemStore::new());
        let challenge_id = completed_challenge(&store).await;
        let user = verified_user(&store).await;
        store
            .put_contribution(Contribution::new(
                challenge_id,
                user,
                ContributionKind::Code,
                "work",
            ))
            .await
            .unwrap();

        let now = Utc::now();
        let mut manifest = CompositionManifest::new(challenge_id, HashMap::from([(user, 1.0)]));
        manifest.sign(now - Duration::minutes(10));
        store.put_manifest(manifest).await.unwrap();

        store
            .put_proposal(PayoutProposal {
                id: ProposalId::generate(),
                challenge_id,
                distribution: serde_json::json!({user.to_string(): 1000.0}),
                within_tolerance: true,
                leader_signed: true,
                leader_signed_at: Some(now),
                sponsor_approved: false,
                sponsor_approved_at: None,
                audit_status: AuditStatus::Pending,
                evidence_url: None,
                created_at: now,
            })
            .await
            .unwrap();

        let report = auditor(store).audit(challenge_id).await.unwrap();
        assert!(report.red_flags.contains(&SUSPICIOUS_TIMING.to_string()));
    }

    #[tokio::test]
    async fn missing_challenge_errors() {
        let store = Arc::new(oddly_store::MemStore::new());
        assert!(auditor(store).audit(ChallengeId::generate()).await.is_err());
    }
}
