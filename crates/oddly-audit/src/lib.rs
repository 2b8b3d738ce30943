//! # Oddly Audit
//!
//! The evidentiary backbone of the platform:
//!
//! - **EventRecorder**: append-only audit trail. Events are written once
//!   and never touched again; reads come back in defined orders.
//! - **FileVault**: content-addressed file storage. Identical bytes land
//!   once and resolve to one artifact row regardless of uploader.
//! - **EvidenceBuilder**: renders the trail, file hashes and audit
//!   results for a challenge into a hash-verifiable PDF package.

pub mod events;
pub mod evidence;
pub mod files;
pub mod pdf;

pub use events::EventRecorder;
pub use evidence::{EvidenceBuilder, EvidenceMetadata, EvidenceRequest, PackageVerification};
pub use files::{FileVault, UploadRequest};
