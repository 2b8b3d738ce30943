//! Content screener with cached analysis and incident creation.

use crate::{Category, DetectionMethod, Lexicon, SafetyAnalysis};
use chrono::{Duration, Utc};
use oddly_core::*;
use oddly_store::ModerationStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Screener tuning knobs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Overall score at or above which content is flagged.
    pub flag_threshold: f64,
    /// Cache lifetime for analysis results, in seconds.
    pub cache_ttl_secs: i64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            flag_threshold: 0.35,
            cache_ttl_secs: 3600,
        }
    }
}

/// Result of `moderate`: whether content was blocked and the incident that
/// blocked it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationOutcome {
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<IncidentId>,
    pub analysis: SafetyAnalysis,
}

pub struct ContentScreener {
    store: Arc<dyn ModerationStore>,
    lexicon: Arc<Lexicon>,
    config: ScreenerConfig,
}

impl ContentScreener {
    pub fn new(store: Arc<dyn ModerationStore>, lexicon: Arc<Lexicon>, config: ScreenerConfig) -> Self {
        Self {
            store,
            lexicon,
            config,
        }
    }

    /// Cache key over content and the entity it belongs to, so the same
    /// text moderated for two different entities is cached separately.
    pub fn cache_key(content: &str, entity: &EntityRef) -> ContentHash {
        ContentHash::from_parts([
            content.as_bytes(),
            entity.kind.to_string().as_bytes(),
            entity.id.as_bytes(),
        ])
    }

    /// Analyze content, serving a verbatim stored result on a cache hit.
    ///
    /// A hit within the TTL short-circuits before any scoring runs and
    /// does not write a new record.
    pub async fn analyze(&self, content: &str, entity: &EntityRef) -> Result<SafetyAnalysis> {
        let key = Self::cache_key(content, entity);
        let now = Utc::now();

        if let Some(record) = self.store.cached_analysis(key, now).await? {
            tracing::debug!(cache_key = %key, "moderation cache hit");
            return Ok(serde_json::from_value(record.analysis)?);
        }

        let categories = self.lexicon.score(content);
        let analysis = combine(&categories, self.config.flag_threshold);

        self.store
            .put_analysis(ModerationRecord {
                cache_key: key,
                entity: entity.clone(),
                analysis: serde_json::to_value(&analysis)?,
                flagged: analysis.flagged,
                created_at: now,
                expires_at: now + Duration::seconds(self.config.cache_ttl_secs),
            })
            .await?;

        tracing::debug!(
            cache_key = %key,
            overall = analysis.overall_score,
            flagged = analysis.flagged,
            "content analyzed"
        );
        Ok(analysis)
    }

    /// Analyze and, when flagged, raise a safety incident. Safe content
    /// creates nothing.
    pub async fn moderate(&self, content: &str, entity: &EntityRef) -> Result<ModerationOutcome> {
        let analysis = self.analyze(content, entity).await?;
        if !analysis.flagged {
            return Ok(ModerationOutcome {
                blocked: false,
                incident_id: None,
                analysis,
            });
        }

        let severity = incident_severity(&analysis);
        let categories: Vec<String> = tripped_categories(&analysis)
            .iter()
            .map(|c| c.to_string())
            .collect();

        let incident = SafetyIncident {
            id: IncidentId::generate(),
            entity: entity.clone(),
            severity,
            categories,
            ai_detected: true,
            created_at: Utc::now(),
        };
        let incident_id = incident.id;
        self.store.put_incident(incident).await?;

        tracing::warn!(%entity, severity, "content blocked, incident raised");
        Ok(ModerationOutcome {
            blocked: true,
            incident_id: Some(incident_id),
            analysis,
        })
    }
}

/// Weighted combination over the categories that actually matched, so a
/// single strong category is not diluted by the silent ones. Self-harm
/// carries the largest weight.
fn combine(categories: &BTreeMap<Category, f64>, threshold: f64) -> SafetyAnalysis {
    let active: Vec<(Category, f64)> = categories
        .iter()
        .filter(|(_, s)| **s > 0.0)
        .map(|(c, s)| (*c, *s))
        .collect();

    let overall = if active.is_empty() {
        0.0
    } else {
        let weight_sum: f64 = active.iter().map(|(c, _)| c.weight()).sum();
        active.iter().map(|(c, s)| c.weight() * s).sum::<f64>() / weight_sum
    };

    SafetyAnalysis {
        overall_score: overall,
        categories: categories.clone(),
        flagged: overall >= threshold,
        confidence: if active.is_empty() { 0.9 } else { 0.7 },
        detection_method: DetectionMethod::Local,
    }
}

/// Categories considered tripped for incident reporting.
fn tripped_categories(analysis: &SafetyAnalysis) -> Vec<Category> {
    let tripped: Vec<Category> = analysis
        .categories
        .iter()
        .filter(|(_, s)| **s >= 0.4)
        .map(|(c, _)| *c)
        .collect();
    if !tripped.is_empty() {
        return tripped;
    }

    // Flagged on aggregate alone: report the strongest category.
    analysis
        .categories
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| vec![*c])
        .unwrap_or_default()
}

/// Integer severity, monotone in the analysis scores with per-category
/// floors: violence and self-harm incidents never drop below 3.
fn incident_severity(analysis: &SafetyAnalysis) -> u8 {
    let base = (analysis.overall_score * 5.0).ceil().clamp(1.0, 5.0) as u8;
    tripped_categories(analysis)
        .iter()
        .map(|c| c.min_severity())
        .fold(base, u8::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use mockall::mock;
    use oddly_store::MemStore;
    use parking_lot::RwLock;

    mock! {
        ModStore {}

        #[async_trait]
        impl ModerationStore for ModStore {
            async fn cached_analysis(
                &self,
                cache_key: ContentHash,
                now: DateTime<Utc>,
            ) -> Result<Option<ModerationRecord>>;
            async fn put_analysis(&self, record: ModerationRecord) -> Result<()>;
            async fn put_incident(&self, incident: SafetyIncident) -> Result<()>;
            async fn incidents_for(&self, entity: &EntityRef) -> Result<Vec<SafetyIncident>>;
        }
    }

    fn screener(store: Arc<dyn ModerationStore>) -> ContentScreener {
        ContentScreener::new(store, Arc::new(Lexicon::new()), ScreenerConfig::default())
    }

    #[tokio::test]
    async fn safe_content_is_not_flagged_and_raises_nothing() {
        let store = Arc::new(MemStore::new());
        let entity = EntityRef::system();
        let outcome = screener(store.clone())
            .moderate("shipped the review tooling, tests pass", &entity)
            .await
            .unwrap();

        assert!(!outcome.blocked);
        assert!(outcome.incident_id.is_none());
        assert!(store.incidents_for(&entity).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_harm_content_raises_a_severe_incident() {
        let store = Arc::new(MemStore::new());
        let entity = EntityRef::new(EntityKind::Contribution, ContributionId::generate());
        let outcome = screener(store.clone())
            .moderate("there is no reason to live anymore", &entity)
            .await
            .unwrap();

        assert!(outcome.blocked);
        let incidents = store.incidents_for(&entity).await.unwrap();
        assert_eq!(incidents.len(), 1);
        assert!(incidents[0].severity >= 3);
        assert!(incidents[0].ai_detected);
        assert!(incidents[0].categories.contains(&"self_harm".to_string()));
    }

    #[tokio::test]
    async fn identical_input_is_served_from_cache_without_rescoring() {
        // The cache hit must short-circuit before the persist path, so the
        // second call never reaches put_analysis.
        let saved: Arc<RwLock<Option<ModerationRecord>>> = Arc::new(RwLock::new(None));

        let mut mock = MockModStore::new();
        {
            let saved = saved.clone();
            mock.expect_cached_analysis()
                .times(2)
                .returning(move |_, _| Ok(saved.read().clone()));
        }
        {
            let saved = saved.clone();
            mock.expect_put_analysis()
                .times(1)
                .returning(move |record| {
                    *saved.write() = Some(record);
                    Ok(())
                });
        }

        let screener = screener(Arc::new(mock));
        let entity = EntityRef::system();

        let first = screener.analyze("free money, click here!!!", &entity).await.unwrap();
        let second = screener.analyze("free money, click here!!!", &entity).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn different_entities_do_not_share_cache_entries() {
        let a = EntityRef::new(EntityKind::Contribution, ContributionId::generate());
        let b = EntityRef::new(EntityKind::Contribution, ContributionId::generate());
        assert_ne!(
            ContentScreener::cache_key("same text", &a),
            ContentScreener::cache_key("same text", &b)
        );
    }

    #[tokio::test]
    async fn severity_is_monotone_in_score() {
        let mild = SafetyAnalysis {
            overall_score: 0.4,
            categories: BTreeMap::from([(Category::Spam, 0.4)]),
            flagged: true,
            confidence: 0.7,
            detection_method: DetectionMethod::Local,
        };
        let harsh = SafetyAnalysis {
            overall_score: 0.9,
            categories: BTreeMap::from([(Category::Violence, 0.9)]),
            flagged: true,
            confidence: 0.7,
            detection_method: DetectionMethod::Local,
        };

        assert!(incident_severity(&harsh) >= incident_severity(&mild));
        assert!(incident_severity(&harsh) >= Category::Violence.min_severity());
    }
}
