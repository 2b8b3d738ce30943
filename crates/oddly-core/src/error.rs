//! Error taxonomy for oddly-brilliant domain operations.
//!
//! Evaluators deliberately do NOT raise errors for bad business states
//! (missing manifest, unsigned proposal, pending KYC); those are results.
//! Only genuinely exceptional conditions surface here: an absent entity, a
//! degenerate computation, a failed store operation.

use crate::types::{ChallengeId, FileId, PackageId, PaymentId, UserId};
use thiserror::Error;

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by domain components.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // === Not found ===
    #[error("Challenge not found: {0}")]
    ChallengeNotFound(ChallengeId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("File not found: {0}")]
    FileNotFound(FileId),

    #[error("Evidence package not found: {0}")]
    PackageNotFound(PackageId),

    // === Validation ===
    /// Contributions exist but their token values sum to zero; a split
    /// would divide by zero.
    #[error("Total token value is zero for challenge {0} with contributions present")]
    ZeroTotalTokens(ChallengeId),

    #[error("Validation failed: {0}")]
    Validation(String),

    // === Authorization ===
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // === Infrastructure ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification used by the request layer to pick a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Unauthorized,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChallengeNotFound(_)
            | Self::UserNotFound(_)
            | Self::PaymentNotFound(_)
            | Self::FileNotFound(_)
            | Self::PackageNotFound(_) => ErrorKind::NotFound,
            Self::ZeroTotalTokens(_) | Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Storage(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Stable error code for API responses.
    pub fn code(&self) -> u32 {
        match self {
            Self::ChallengeNotFound(_) => 1001,
            Self::UserNotFound(_) => 1002,
            Self::PaymentNotFound(_) => 1003,
            Self::FileNotFound(_) => 1004,
            Self::PackageNotFound(_) => 1005,
            Self::ZeroTotalTokens(_) => 2001,
            Self::Validation(_) => 2000,
            Self::Unauthorized(_) => 3000,
            Self::Storage(_) => 9001,
            Self::Serialization(_) => 9002,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
