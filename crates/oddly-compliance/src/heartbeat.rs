//! Compliance heartbeat.
//!
//! Point-in-time aggregate status from a fixed battery of independent
//! checks. Checks that need a challenge id report Green / "not applicable"
//! when none is given; a missing related row (no manifest, no proposal) is
//! a check result, never a thrown error.

use crate::{reduce_checks, CheckStatus, ComplianceCheck};
use chrono::{DateTime, Utc};
use oddly_core::*;
use oddly_store::{
    ChallengeStore, ContributionStore, EventStore, ManifestStore, ProposalStore, UserStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Heartbeat result contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub overall: CheckStatus,
    pub checks: Vec<ComplianceCheck>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<ChallengeId>,
}

pub struct HeartbeatEvaluator {
    challenges: Arc<dyn ChallengeStore>,
    users: Arc<dyn UserStore>,
    contributions: Arc<dyn ContributionStore>,
    manifests: Arc<dyn ManifestStore>,
    proposals: Arc<dyn ProposalStore>,
    events: Arc<dyn EventStore>,
}

impl HeartbeatEvaluator {
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

    /// Run the full battery for one challenge, or systemwide when no
    /// challenge id is given.
    pub async fn evaluate(&self, challenge_id: Option<ChallengeId>) -> Result<Heartbeat> {
        let checks = vec![
            self.check_kyc(challenge_id).await?,
            self.check_manifest(challenge_id).await?,
            self.check_payout_tolerance(challenge_id).await?,
            self.check_event_trail(challenge_id).await?,
            self.check_systemwide().await?,
        ];

        let overall = reduce_checks(&checks);
        tracing::info!(?challenge_id, %overall, "compliance heartbeat");

        Ok(Heartbeat {
            overall,
            checks,
            timestamp: Utc::now(),
            challenge_id,
        })
    }

    async fn check_kyc(&self, challenge_id: Option<ChallengeId>) -> Result<ComplianceCheck> {
        const NAME: &str = "KYC/AML";

        let Some(challenge_id) = challenge_id else {
            return Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                "not applicable",
            ));
        };

        let contributions = self.contributions.contributions_for(challenge_id).await?;
        if contributions.is_empty() {
            return Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Amber,
                "no contributors to verify yet",
            ));
        }

        let mut contributors: Vec<UserId> = contributions.iter().map(|c| c.contributor_id).collect();
        contributors.sort_by_key(|id| *id.as_uuid());
        contributors.dedup();

        let mut unverified = 0usize;
        let mut unknown = 0usize;
        for id in &contributors {
            match self.users.get_user(*id).await? {
                Some(user) if user.kyc == KycStatus::Verified => {}
                Some(_) => unverified += 1,
                None => unknown += 1,
            }
        }

        if unverified > 0 {
            Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Red,
                format!("{unverified} of {} contributors not KYC verified", contributors.len()),
            ))
        } else if unknown > 0 {
            Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Amber,
                format!("{unknown} contributors without a user record"),
            ))
        } else {
            Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                format!("all {} contributors verified", contributors.len()),
            ))
        }
    }

    async fn check_manifest(&self, challenge_id: Option<ChallengeId>) -> Result<ComplianceCheck> {
        const NAME: &str = "Manifest Signed";

        let Some(challenge_id) = challenge_id else {
            return Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                "not applicable",
            ));
        };

        match self.manifests.manifest_for(challenge_id).await? {
            None => Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Red,
                "no composition manifest",
            )),
            Some(m) if !m.signed_by_leader => Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Amber,
                "manifest present but not signed by leader",
            )),
            Some(_) => Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                "manifest signed by leader",
            )),
        }
    }

    async fn check_payout_tolerance(
        &self,
        challenge_id: Option<ChallengeId>,
    ) -> Result<ComplianceCheck> {
        const NAME: &str = "Payout Tolerance";

        let Some(challenge_id) = challenge_id else {
            return Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                "not applicable",
            ));
        };

        match self.proposals.latest_proposal_for(challenge_id).await? {
            None => Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Amber,
                "no payout proposal to check",
            )),
            Some(p) if !p.within_tolerance => Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Red,
                "proposal distribution outside tolerance",
            )),
            Some(_) => Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                "proposal within tolerance",
            )),
        }
    }

    async fn check_event_trail(
        &self,
        challenge_id: Option<ChallengeId>,
    ) -> Result<ComplianceCheck> {
        const NAME: &str = "Event Trail";

        let Some(challenge_id) = challenge_id else {
            return Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                "not applicable",
            ));
        };

        let trail = self.events.trail(&EntityRef::challenge(challenge_id)).await?;
        if trail.is_empty() {
            Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Amber,
                "no audit events recorded for challenge",
            ))
        } else {
            Ok(ComplianceCheck::new(
                NAME,
                CheckStatus::Green,
                format!("{} audit events recorded", trail.len()),
            ))
        }
    }

    async fn check_systemwide(&self) -> Result<ComplianceCheck> {
        const NAME: &str = "Systemwide";

        // Store failures propagate here like in every other check; only
        // business states become statuses.
        let challenges = self.challenges.list_challenges().await?;
        Ok(ComplianceCheck::new(
            NAME,
            CheckStatus::Green,
            format!("{} challenges tracked", challenges.len()),
        ))
    }
}
