//! IR35 working-practices assessment.
//!
//! A fixed battery of factor checks over how a challenge was actually
//! worked, reduced to an Inside/Outside/Undetermined determination. The
//! factors are indicative, rule-based signals, not legal advice; the
//! determination record is reproducible from challenge data alone.

use chrono::Utc;
use oddly_core::*;
use oddly_store::{AuditStore, ChallengeStore, ContributionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of one working-practices factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorOutcome {
    /// Points towards a genuine outside-IR35 engagement.
    Pass,
    /// Points towards disguised employment.
    Fail,
    /// Not determinable from platform data.
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ir35Factor {
    pub name: String,
    pub outcome: FactorOutcome,
    pub details: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ir35Determination {
    Inside,
    Outside,
    Undetermined,
}

impl std::fmt::Display for Ir35Determination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ir35Determination::Inside => write!(f, "INSIDE"),
            Ir35Determination::Outside => write!(f, "OUTSIDE"),
            Ir35Determination::Undetermined => write!(f, "UNDETERMINED"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ir35Assessment {
    pub challenge_id: ChallengeId,
    pub determination: Ir35Determination,
    pub factors: Vec<Ir35Factor>,
}

pub struct Ir35Assessor {
    challenges: Arc<dyn ChallengeStore>,
    contributions: Arc<dyn ContributionStore>,
    audits: Arc<dyn AuditStore>,
}

impl Ir35Assessor {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        contributions: Arc<dyn ContributionStore>,
        audits: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            challenges,
            contributions,
            audits,
        }
    }

    /// Assess a challenge and persist the determination record.
    pub async fn assess(&self, challenge_id: ChallengeId) -> Result<Ir35Assessment> {
        let challenge = self
            .challenges
            .get_challenge(challenge_id)
            .await?
            .ok_or(Error::ChallengeNotFound(challenge_id))?;
        let contributions = self.contributions.contributions_for(challenge_id).await?;

        let mut contributors: Vec<UserId> =
            contributions.iter().map(|c| c.contributor_id).collect();
        contributors.sort_by_key(|id| *id.as_uuid());
        contributors.dedup();

        let mut kinds: Vec<ContributionKind> = contributions.iter().map(|c| c.kind).collect();
        kinds.sort_by_key(|k| format!("{k}"));
        kinds.dedup();

        let factors = vec![
            Ir35Factor {
                name: "Right of substitution".into(),
                outcome: if contributors.len() > 1 {
                    FactorOutcome::Pass
                } else {
                    FactorOutcome::Fail
                },
                details: format!("{} distinct contributors delivered work", contributors.len()),
            },
            Ir35Factor {
                name: "Control over working method".into(),
                outcome: if challenge.project_leader_id.is_some() {
                    FactorOutcome::Fail
                } else {
                    FactorOutcome::Pass
                },
                details: match challenge.project_leader_id {
                    Some(_) => "a project leader directs the work".into(),
                    None => "contributors self-direct against the brief".into(),
                },
            },
            Ir35Factor {
                name: "Mutuality of obligation".into(),
                outcome: match challenge.status {
                    ChallengeStatus::Completed | ChallengeStatus::Closed => FactorOutcome::Pass,
                    _ => FactorOutcome::Unknown,
                },
                details: format!("challenge status is {:?}", challenge.status),
            },
            Ir35Factor {
                name: "Outcome-based engagement".into(),
                outcome: if kinds.len() > 1 {
                    FactorOutcome::Pass
                } else {
                    FactorOutcome::Unknown
                },
                details: format!("{} contribution kinds present", kinds.len()),
            },
            Ir35Factor {
                name: "Own equipment".into(),
                outcome: FactorOutcome::Unknown,
                details: "equipment provision is not tracked by the platform".into(),
            },
        ];

        let fails = factors
            .iter()
            .filter(|f| f.outcome == FactorOutcome::Fail)
            .count();
        let passes = factors
            .iter()
            .filter(|f| f.outcome == FactorOutcome::Pass)
            .count();

        let determination = if fails >= 3 {
            Ir35Determination::Inside
        } else if fails == 0 && passes >= 3 {
            Ir35Determination::Outside
        } else {
            Ir35Determination::Undetermined
        };

        let assessment = Ir35Assessment {
            challenge_id,
            determination,
            factors,
        };

        self.audits
            .put_ir35(Ir35Record {
                challenge_id,
                determination: determination.to_string(),
                factors: serde_json::to_value(&assessment.factors)?,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(%challenge_id, %determination, "IR35 assessed");
        Ok(assessment)
    }
}
