//! Content-addressed file vault.
//!
//! Files are keyed by the SHA-256 of their raw bytes. Uploading bytes the
//! vault has already seen returns the existing artifact row untouched, so
//! the same content never occupies storage twice.

use chrono::Utc;
use oddly_core::*;
use oddly_store::{BlobStore, FileStore};
use std::sync::Arc;

/// An upload submission. The hash is computed here, never trusted from
/// the caller.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub owner_id: UserId,
    pub challenge_id: Option<ChallengeId>,
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub struct FileVault {
    files: Arc<dyn FileStore>,
    blobs: Arc<dyn BlobStore>,
}

impl FileVault {
    pub fn new(files: Arc<dyn FileStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { files, blobs }
    }

    /// Store a file, deduplicating on content hash. Identical bytes map to
    /// one artifact row and one stored blob regardless of who uploads them
    /// or under what name.
    pub async fn upload(&self, request: UploadRequest) -> Result<FileArtifact> {
        if request.bytes.is_empty() {
            return Err(Error::Validation("uploaded file is empty".into()));
        }

        let sha256 = ContentHash::from_content(&request.bytes);
        if let Some(existing) = self.files.file_by_hash(sha256).await? {
            tracing::debug!(file_id = %existing.id, sha256 = %sha256, "upload deduplicated");
            return Ok(existing);
        }

        let storage_key = format!("files/{}", sha256.to_hex());
        self.blobs.put_blob(&storage_key, request.bytes.clone()).await?;

        let artifact = FileArtifact {
            id: FileId::generate(),
            owner_id: request.owner_id,
            challenge_id: request.challenge_id,
            filename: request.filename,
            mime: request.mime,
            size: request.bytes.len() as u64,
            sha256,
            storage_key,
            created_at: Utc::now(),
        };
        self.files.put_file(artifact.clone()).await?;

        tracing::info!(file_id = %artifact.id, size = artifact.size, sha256 = %sha256, "file stored");
        Ok(artifact)
    }

    pub async fn download(&self, id: FileId) -> Result<(FileArtifact, Vec<u8>)> {
        let artifact = self
            .files
            .get_file(id)
            .await?
            .ok_or(Error::FileNotFound(id))?;
        let bytes = self
            .blobs
            .get_blob(&artifact.storage_key)
            .await?
            .ok_or(Error::FileNotFound(id))?;
        Ok((artifact, bytes))
    }

    /// Delete a file the actor owns. A failing blob removal is logged and
    /// the row is removed anyway; an orphaned blob is recoverable, a
    /// dangling row is not.
    pub async fn delete(&self, actor_id: UserId, id: FileId) -> Result<()> {
        let artifact = self
            .files
            .get_file(id)
            .await?
            .ok_or(Error::FileNotFound(id))?;

        if artifact.owner_id != actor_id {
            return Err(Error::Unauthorized(format!(
                "user {actor_id} does not own file {id}"
            )));
        }

        if let Err(err) = self.blobs.delete_blob(&artifact.storage_key).await {
            tracing::warn!(file_id = %id, error = %err, "blob removal failed, continuing");
        }
        self.files.delete_file(id).await?;

        tracing::info!(file_id = %id, "file deleted");
        Ok(())
    }
}
