//! Evidence package builder and verification.
//!
//! A package is a rendered PDF bundling the audit material for one
//! challenge: event trail, file hashes, payout validation and optionally
//! the ethics audit. The document embeds a digest of its own report body
//! and a verification URL; the stored row carries the SHA-256 of the
//! finished file so anyone holding the bytes can check them.

use crate::pdf;
use chrono::{DateTime, Utc};
use oddly_compliance::PayoutValidation;
use oddly_core::*;
use oddly_ethics::EthicsAuditReport;
use oddly_store::{AuditStore, BlobStore, ChallengeStore, EventStore, FileStore, ManifestStore, ProposalStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to bundle into a package.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EvidenceRequest {
    pub include_events: bool,
    pub include_files: bool,
    pub include_signatures: bool,
    pub include_ai_analysis: bool,
}

impl Default for EvidenceRequest {
    fn default() -> Self {
        Self {
            include_events: true,
            include_files: true,
            include_signatures: true,
            include_ai_analysis: true,
        }
    }
}

/// Package metadata contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub sha256: String,
    pub includes_events: bool,
    pub includes_files: bool,
    pub includes_signatures: bool,
    #[serde(rename = "includesAIAnalysis")]
    pub includes_ai_analysis: bool,
    pub verification_url: String,
    pub created_at: DateTime<Utc>,
}

/// Result of verifying a stored package against its recorded hash.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVerification {
    pub file_exists: bool,
    pub hash_matches: bool,
    pub valid: bool,
}

pub struct EvidenceBuilder {
    challenges: Arc<dyn ChallengeStore>,
    events: Arc<dyn EventStore>,
    files: Arc<dyn FileStore>,
    manifests: Arc<dyn ManifestStore>,
    proposals: Arc<dyn ProposalStore>,
    audits: Arc<dyn AuditStore>,
    blobs: Arc<dyn BlobStore>,
    /// Base for verification URLs, e.g. `https://oddlybrilliant.dev/evidence`.
    base_url: String,
}

impl EvidenceBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        events: Arc<dyn EventStore>,
        files: Arc<dyn FileStore>,
        manifests: Arc<dyn ManifestStore>,
        proposals: Arc<dyn ProposalStore>,
        audits: Arc<dyn AuditStore>,
        blobs: Arc<dyn BlobStore>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            challenges,
            events,
            files,
            manifests,
            proposals,
            audits,
            blobs,
            base_url: base_url.into(),
        }
    }

    /// Build, store and register a package for a challenge. The payout
    /// validation must be supplied; the ethics report is bundled when
    /// present and AI analysis is requested.
    pub async fn build(
        &self,
        challenge_id: ChallengeId,
        validation: &PayoutValidation,
        ethics: Option<&EthicsAuditReport>,
        request: EvidenceRequest,
    ) -> Result<(EvidencePackage, EvidenceMetadata)> {
        let challenge = self
            .challenges
            .get_challenge(challenge_id)
            .await?
            .ok_or(Error::ChallengeNotFound(challenge_id))?;

        let package_id = PackageId::generate();
        let verification_url = format!("{}/verify/{}", self.base_url, package_id);
        let created_at = Utc::now();

        let mut lines: Vec<String> = vec![
            format!("Challenge: {} ({})", challenge.title, challenge.id),
            format!("Bounty: {:.2}", challenge.bounty_amount),
            format!("Generated: {}", created_at.to_rfc3339()),
            String::new(),
        ];

        lines.push("== Payout Validation ==".to_string());
        lines.push(format!("ok: {}", validation.ok));
        for violation in &validation.violations {
            lines.push(format!("violation: {violation}"));
        }
        for warning in &validation.warnings {
            lines.push(format!("warning: {warning}"));
        }
        lines.push(String::new());

        let include_ai = request.include_ai_analysis && ethics.is_some();
        if let Some(report) = ethics.filter(|_| request.include_ai_analysis) {
            lines.push("== Ethics Audit ==".to_string());
            lines.push(format!("fairness score: {:.3}", report.fairness_score));
            lines.push(format!("gini coefficient: {:.3}", report.gini_coefficient));
            for flag in &report.red_flags {
                lines.push(format!("red: {flag}"));
            }
            for flag in &report.yellow_flags {
                lines.push(format!("yellow: {flag}"));
            }
            for flag in &report.green_flags {
                lines.push(format!("green: {flag}"));
            }
            lines.push(String::new());
        }

        if request.include_signatures {
            lines.push("== Signatures ==".to_string());
            match self.manifests.manifest_for(challenge_id).await? {
                Some(manifest) if manifest.signed_by_leader => {
                    let at = manifest
                        .signed_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default();
                    lines.push(format!("manifest: signed by leader at {at}"));
                }
                Some(_) => lines.push("manifest: present, unsigned".to_string()),
                None => lines.push("manifest: absent".to_string()),
            }
            match self.proposals.latest_proposal_for(challenge_id).await? {
                Some(proposal) => lines.push(format!(
                    "proposal {}: leader_signed={} sponsor_approved={}",
                    proposal.id, proposal.leader_signed, proposal.sponsor_approved
                )),
                None => lines.push("proposal: absent".to_string()),
            }
            lines.push(String::new());
        }

        if request.include_files {
            lines.push("== File Hashes ==".to_string());
            for file in self.files.files_for_challenge(challenge_id).await? {
                lines.push(format!("{}  {}", file.sha256.to_hex(), file.filename));
            }
            lines.push(String::new());
        }

        if request.include_events {
            lines.push("== Event Trail ==".to_string());
            let entity = EntityRef::challenge(challenge_id);
            for event in self.events.trail(&entity).await? {
                lines.push(format!(
                    "{}  {}  actor={}",
                    event.created_at.to_rfc3339(),
                    event.action,
                    event.actor_id
                ));
            }
            lines.push(String::new());
        }

        // The report digest goes inside the document; the hash of the
        // finished file cannot (it would change itself) and is stored on
        // the package row instead.
        let report_digest = ContentHash::from_parts(lines.iter().map(|l| l.as_bytes()));
        lines.push(format!("Report digest: {}", report_digest.to_hex()));
        lines.push(format!("Verify at: {verification_url}"));

        let pdf_bytes = pdf::render("Oddly Brilliant Evidence Package", &lines);
        let sha256 = ContentHash::from_content(&pdf_bytes);
        let file_size = pdf_bytes.len() as u64;
        let storage_key = format!("evidence/{package_id}.pdf");

        self.blobs.put_blob(&storage_key, pdf_bytes).await?;

        let package = EvidencePackage {
            id: package_id,
            challenge_id,
            file_name: format!("evidence-{challenge_id}.pdf"),
            file_size,
            sha256,
            includes_events: request.include_events,
            includes_files: request.include_files,
            includes_signatures: request.include_signatures,
            includes_ai_analysis: include_ai,
            verification_url,
            storage_key,
            created_at,
        };
        self.audits.put_package(package.clone()).await?;

        tracing::info!(package_id = %package_id, %challenge_id, size = file_size, "evidence package built");
        let meta = metadata(&package);
        Ok((package, meta))
    }

    /// Check a stored package: the blob must exist and hash to the
    /// recorded SHA-256.
    pub async fn verify(&self, id: PackageId) -> Result<PackageVerification> {
        let package = self
            .audits
            .get_package(id)
            .await?
            .ok_or(Error::PackageNotFound(id))?;

        let blob = self.blobs.get_blob(&package.storage_key).await?;
        let file_exists = blob.is_some();
        let hash_matches = blob
            .map(|bytes| ContentHash::from_content(&bytes) == package.sha256)
            .unwrap_or(false);

        Ok(PackageVerification {
            file_exists,
            hash_matches,
            valid: file_exists && hash_matches,
        })
    }

    pub async fn metadata_for(&self, id: PackageId) -> Result<EvidenceMetadata> {
        let package = self
            .audits
            .get_package(id)
            .await?
            .ok_or(Error::PackageNotFound(id))?;
        Ok(metadata(&package))
    }
}

fn metadata(package: &EvidencePackage) -> EvidenceMetadata {
    EvidenceMetadata {
        file_name: package.file_name.clone(),
        file_size: package.file_size,
        sha256: package.sha256.to_hex(),
        includes_events: package.includes_events,
        includes_files: package.includes_files,
        includes_signatures: package.includes_signatures,
        includes_ai_analysis: package.includes_ai_analysis,
        verification_url: package.verification_url.clone(),
        created_at: package.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddly_store::{MemBlobStore, MemStore};

    struct Fixture {
        builder: EvidenceBuilder,
        store: Arc<MemStore>,
        blobs: Arc<MemBlobStore>,
        challenge_id: ChallengeId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemStore::new());
        let blobs = Arc::new(MemBlobStore::new());
        let challenge = Challenge::new("build the audit engine", 10_000.0, UserId::generate());
        let challenge_id = challenge.id;
        store.put_challenge(challenge).await.unwrap();

        let builder = EvidenceBuilder::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            blobs.clone(),
            "https://oddlybrilliant.dev/evidence",
        );
        Fixture {
            builder,
            store,
            blobs,
            challenge_id,
        }
    }

    fn clean_validation() -> PayoutValidation {
        PayoutValidation {
            ok: true,
            violations: vec![],
            warnings: vec![],
        }
    }

    #[tokio::test]
    async fn fresh_package_verifies_fully() {
        let fx = fixture().await;
        let (package, meta) = fx
            .builder
            .build(fx.challenge_id, &clean_validation(), None, EvidenceRequest::default())
            .await
            .unwrap();

        assert_eq!(meta.sha256, package.sha256.to_hex());
        assert_eq!(meta.file_size, package.file_size);
        assert!(meta.verification_url.contains(&package.id.to_string()));

        let verification = fx.builder.verify(package.id).await.unwrap();
        assert!(verification.file_exists);
        assert!(verification.hash_matches);
        assert!(verification.valid);
    }

    #[tokio::test]
    async fn tampered_blob_fails_hash_check() {
        let fx = fixture().await;
        let (package, _) = fx
            .builder
            .build(fx.challenge_id, &clean_validation(), None, EvidenceRequest::default())
            .await
            .unwrap();

        fx.blobs
            .put_blob(&package.storage_key, b"not the original pdf".to_vec())
            .await
            .unwrap();

        let verification = fx.builder.verify(package.id).await.unwrap();
        assert!(verification.file_exists);
        assert!(!verification.hash_matches);
        assert!(!verification.valid);
    }

    #[tokio::test]
    async fn missing_blob_is_reported_not_erred() {
        let fx = fixture().await;
        let (package, _) = fx
            .builder
            .build(fx.challenge_id, &clean_validation(), None, EvidenceRequest::default())
            .await
            .unwrap();

        fx.blobs.delete_blob(&package.storage_key).await.unwrap();

        let verification = fx.builder.verify(package.id).await.unwrap();
        assert!(!verification.file_exists);
        assert!(!verification.hash_matches);
        assert!(!verification.valid);
    }

    #[tokio::test]
    async fn package_bundles_trail_and_file_hashes() {
        let fx = fixture().await;
        let actor = UserId::generate();
        let entity = EntityRef::challenge(fx.challenge_id);
        fx.store
            .append_event(EventRecord {
                id: EventId::generate(),
                actor_id: actor,
                entity,
                action: "challenge.created".into(),
                content_hash: None,
                metadata: serde_json::Value::Null,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let file_hash = ContentHash::from_content(b"deliverable bytes");
        fx.store
            .put_file(FileArtifact {
                id: FileId::generate(),
                owner_id: actor,
                challenge_id: Some(fx.challenge_id),
                filename: "deliverable.zip".into(),
                mime: "application/zip".into(),
                size: 17,
                sha256: file_hash,
                storage_key: "files/whatever".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let (package, _) = fx
            .builder
            .build(fx.challenge_id, &clean_validation(), None, EvidenceRequest::default())
            .await
            .unwrap();

        let pdf = fx.blobs.get_blob(&package.storage_key).await.unwrap().unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("challenge.created"));
        assert!(text.contains(&file_hash.to_hex()));
        assert!(text.contains("Verify at:"));
    }

    #[tokio::test]
    async fn metadata_flags_mirror_the_request() {
        let fx = fixture().await;
        let request = EvidenceRequest {
            include_events: false,
            include_files: true,
            include_signatures: false,
            include_ai_analysis: true,
        };
        // AI analysis requested but no report supplied.
        let (package, meta) = fx
            .builder
            .build(fx.challenge_id, &clean_validation(), None, request)
            .await
            .unwrap();

        assert!(!meta.includes_events);
        assert!(meta.includes_files);
        assert!(!meta.includes_signatures);
        assert!(!meta.includes_ai_analysis);
        assert!(!package.includes_ai_analysis);
    }

    #[tokio::test]
    async fn unknown_challenge_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .builder
            .build(
                ChallengeId::generate(),
                &clean_validation(),
                None,
                EvidenceRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
