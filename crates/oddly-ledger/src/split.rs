//! Payment split calculation and distribution.

use chrono::Utc;
use oddly_core::*;
use oddly_store::{ChallengeStore, ContributionStore, EventStore, PaymentStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One contributor's share of a challenge bounty.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitShare {
    pub contributor_id: UserId,
    pub contribution_id: ContributionId,
    pub percentage: f64,
    pub amount: f64,
    pub token_value: f64,
}

/// Pure split computation over an ordered contribution list.
///
/// - no contributions: empty split, not an error
/// - contributions present but zero total token value: validation error,
///   the division would be degenerate
pub fn split_shares(
    challenge_id: ChallengeId,
    bounty_amount: f64,
    contributions: &[Contribution],
) -> Result<Vec<SplitShare>> {
    if contributions.is_empty() {
        return Ok(Vec::new());
    }

    let total_tokens: f64 = contributions.iter().map(|c| c.token_value).sum();
    if total_tokens == 0.0 {
        return Err(Error::ZeroTotalTokens(challenge_id));
    }

    Ok(contributions
        .iter()
        .map(|c| SplitShare {
            contributor_id: c.contributor_id,
            contribution_id: c.id,
            percentage: c.token_value / total_tokens * 100.0,
            amount: c.token_value / total_tokens * bounty_amount,
            token_value: c.token_value,
        })
        .collect())
}

/// Computes bounty splits and distributes them as pending payments.
pub struct SplitCalculator {
    challenges: Arc<dyn ChallengeStore>,
    contributions: Arc<dyn ContributionStore>,
    payments: Arc<dyn PaymentStore>,
    events: Arc<dyn EventStore>,
}

impl SplitCalculator {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        contributions: Arc<dyn ContributionStore>,
        payments: Arc<dyn PaymentStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            challenges,
            contributions,
            payments,
            events,
        }
    }

    /// Compute the proportional split for a challenge's bounty.
    pub async fn compute(&self, challenge_id: ChallengeId) -> Result<Vec<SplitShare>> {
        let challenge = self
            .challenges
            .get_challenge(challenge_id)
            .await?
            .ok_or(Error::ChallengeNotFound(challenge_id))?;

        let contributions = self.contributions.contributions_for(challenge_id).await?;
        if contributions.is_empty() {
            tracing::info!(%challenge_id, "no contributions, empty split");
            return Ok(Vec::new());
        }

        let shares = split_shares(challenge_id, challenge.bounty_amount, &contributions)?;
        tracing::debug!(
            %challenge_id,
            shares = shares.len(),
            bounty = challenge.bounty_amount,
            "split computed"
        );
        Ok(shares)
    }

    /// Materialize a computed split as `Pending` payment rows.
    ///
    /// The batch is whole-or-nothing: a failure partway leaves zero new
    /// payment rows.
    pub async fn distribute(
        &self,
        actor_id: UserId,
        challenge_id: ChallengeId,
        splits: &[SplitShare],
        method: PaymentMethod,
    ) -> Result<Vec<Payment>> {
        self.challenges
            .get_challenge(challenge_id)
            .await?
            .ok_or(Error::ChallengeNotFound(challenge_id))?;

        let now = Utc::now();
        let rows: Vec<Payment> = splits
            .iter()
            .map(|s| Payment {
                id: PaymentId::generate(),
                challenge_id,
                recipient_id: s.contributor_id,
                amount: s.amount,
                method,
                status: PaymentStatus::Pending,
                tx_hash: None,
                created_at: now,
            })
            .collect();

        let created = self.payments.insert_batch(rows).await?;

        let total: f64 = created.iter().map(|p| p.amount).sum();
        self.events
            .append_event(EventRecord {
                id: EventId::generate(),
                actor_id,
                entity: EntityRef::challenge(challenge_id),
                action: "payments.distributed".into(),
                content_hash: None,
                metadata: serde_json::json!({
                    "count": created.len(),
                    "total": total,
                    "method": method,
                }),
                created_at: now,
            })
            .await?;

        tracing::info!(%challenge_id, count = created.len(), total, "payments distributed");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddly_store::MemStore;
    use proptest::prelude::*;

    fn contribution(challenge_id: ChallengeId, kind: ContributionKind) -> Contribution {
        Contribution::new(challenge_id, UserId::generate(), kind, "work")
    }

    async fn calculator_with(store: Arc<MemStore>) -> SplitCalculator {
        SplitCalculator::new(store.clone(), store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn split_preserves_contribution_order() {
        let store = Arc::new(MemStore::new());
        let challenge = Challenge::new("build the parser", 1000.0, UserId::generate());
        let challenge_id = challenge.id;
        store.put_challenge(challenge).await.unwrap();

        let kinds = [
            ContributionKind::Idea,
            ContributionKind::Code,
            ContributionKind::Design,
        ];
        let mut ids = Vec::new();
        for kind in kinds {
            let c = contribution(challenge_id, kind);
            ids.push(c.id);
            store.put_contribution(c).await.unwrap();
        }

        let calc = calculator_with(store).await;
        let shares = calc.compute(challenge_id).await.unwrap();

        assert_eq!(shares.len(), 3);
        let got: Vec<ContributionId> = shares.iter().map(|s| s.contribution_id).collect();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn zero_contributions_is_an_empty_split() {
        let store = Arc::new(MemStore::new());
        let challenge = Challenge::new("nobody showed up", 500.0, UserId::generate());
        let challenge_id = challenge.id;
        store.put_challenge(challenge).await.unwrap();

        let calc = calculator_with(store).await;
        assert!(calc.compute(challenge_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_challenge_is_not_found() {
        let store = Arc::new(MemStore::new());
        let calc = calculator_with(store).await;
        let err = calc.compute(ChallengeId::generate()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn zero_total_tokens_is_a_validation_error() {
        let challenge_id = ChallengeId::generate();
        let mut c = contribution(challenge_id, ContributionKind::Code);
        c.token_value = 0.0;

        let err = split_shares(challenge_id, 1000.0, &[c]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn distribute_creates_pending_rows_and_an_event() {
        let store = Arc::new(MemStore::new());
        let sponsor = UserId::generate();
        let challenge = Challenge::new("ship the codec", 900.0, sponsor);
        let challenge_id = challenge.id;
        store.put_challenge(challenge).await.unwrap();
        for kind in [ContributionKind::Code, ContributionKind::Design] {
            store
                .put_contribution(contribution(challenge_id, kind))
                .await
                .unwrap();
        }

        let calc = calculator_with(store.clone()).await;
        let shares = calc.compute(challenge_id).await.unwrap();
        let created = calc
            .distribute(sponsor, challenge_id, &shares, PaymentMethod::Crypto)
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|p| p.status == PaymentStatus::Pending));

        let trail = store
            .trail(&EntityRef::challenge(challenge_id))
            .await
            .unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, "payments.distributed");
    }

    #[tokio::test]
    async fn failed_distribution_leaves_no_rows() {
        let store = Arc::new(MemStore::new());
        let sponsor = UserId::generate();
        // Negative bounty produces negative amounts, which the payment
        // store rejects as a batch.
        let challenge = Challenge::new("bad bounty", -900.0, sponsor);
        let challenge_id = challenge.id;
        store.put_challenge(challenge).await.unwrap();
        store
            .put_contribution(contribution(challenge_id, ContributionKind::Code))
            .await
            .unwrap();

        let calc = calculator_with(store.clone()).await;
        let shares = calc.compute(challenge_id).await.unwrap();
        assert!(calc
            .distribute(sponsor, challenge_id, &shares, PaymentMethod::Fiat)
            .await
            .is_err());

        assert!(store.payments_for(challenge_id).await.unwrap().is_empty());
        // No partial event either.
        assert!(store
            .trail(&EntityRef::challenge(challenge_id))
            .await
            .unwrap()
            .is_empty());
    }

    proptest! {
        #[test]
        fn split_sums_match_bounty_and_100(
            token_values in proptest::collection::vec(1.0f64..10_000.0, 1..40),
            bounty in 1.0f64..1_000_000.0,
        ) {
            let challenge_id = ChallengeId::generate();
            let contributions: Vec<Contribution> = token_values
                .iter()
                .map(|tv| {
                    let mut c = Contribution::new(
                        challenge_id,
                        UserId::generate(),
                        ContributionKind::Code,
                        "work",
                    );
                    c.token_value = *tv;
                    c
                })
                .collect();

            let shares = split_shares(challenge_id, bounty, &contributions).unwrap();

            let pct_sum: f64 = shares.iter().map(|s| s.percentage).sum();
            let amount_sum: f64 = shares.iter().map(|s| s.amount).sum();

            prop_assert!((pct_sum - 100.0).abs() < 1e-6 * 100.0);
            prop_assert!((amount_sum - bounty).abs() < 1e-6 * bounty);
        }
    }
}
