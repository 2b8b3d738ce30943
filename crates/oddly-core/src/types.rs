//! Typed identifiers and domain enumerations.
//!
//! Every aggregate gets its own UUID newtype so a challenge id can never be
//! handed to a function expecting a user id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier for a bounty challenge.
    ChallengeId
);
define_id!(
    /// Identifier for a platform user (sponsor, leader or contributor).
    UserId
);
define_id!(
    /// Identifier for a single contribution to a challenge.
    ContributionId
);
define_id!(
    /// Identifier for a payout proposal.
    ProposalId
);
define_id!(
    /// Identifier for a payment row.
    PaymentId
);
define_id!(
    /// Identifier for an audit event.
    EventId
);
define_id!(
    /// Identifier for a stored file artifact.
    FileId
);
define_id!(
    /// Identifier for a safety incident.
    IncidentId
);
define_id!(
    /// Identifier for an evidence package.
    PackageId
);

/// Lifecycle status of a challenge. A `Closed` challenge is immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    Open,
    InProgress,
    Completed,
    Closed,
}

/// Sponsor/admin vetting state for a submitted challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VettingStatus {
    Pending,
    Approved,
    Rejected,
}

/// KYC verification state of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

/// Kind of work a contribution represents.
///
/// The token value table is the fixed basis for proportional payout
/// splitting; it is assigned once at contribution creation and never
/// recomputed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionKind {
    Code,
    Design,
    Idea,
    Research,
}

impl ContributionKind {
    /// Fixed kind -> token value table.
    pub fn token_value(&self) -> f64 {
        match self {
            ContributionKind::Code => 100.0,
            ContributionKind::Design => 80.0,
            ContributionKind::Research => 60.0,
            ContributionKind::Idea => 50.0,
        }
    }

    pub const ALL: [ContributionKind; 4] = [
        ContributionKind::Code,
        ContributionKind::Design,
        ContributionKind::Idea,
        ContributionKind::Research,
    ];
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributionKind::Code => write!(f, "CODE"),
            ContributionKind::Design => write!(f, "DESIGN"),
            ContributionKind::Idea => write!(f, "IDEA"),
            ContributionKind::Research => write!(f, "RESEARCH"),
        }
    }
}

/// Settlement rail for a payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Crypto,
    Fiat,
}

/// Settlement state of a payment. Rows are created `Pending`; settlement
/// runs out-of-process and flips them later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Audit pipeline state of a payout proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Pending,
    Passed,
    Failed,
}

/// The kinds of entities audit events can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Challenge,
    Contribution,
    User,
    Payment,
    Proposal,
    Manifest,
    File,
    System,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Challenge => write!(f, "CHALLENGE"),
            EntityKind::Contribution => write!(f, "CONTRIBUTION"),
            EntityKind::User => write!(f, "USER"),
            EntityKind::Payment => write!(f, "PAYMENT"),
            EntityKind::Proposal => write!(f, "PROPOSAL"),
            EntityKind::Manifest => write!(f, "MANIFEST"),
            EntityKind::File => write!(f, "FILE"),
            EntityKind::System => write!(f, "SYSTEM"),
        }
    }
}

/// A typed reference to some entity, as recorded on audit events and
/// moderation results.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }

    pub fn challenge(id: ChallengeId) -> Self {
        Self::new(EntityKind::Challenge, id)
    }

    pub fn contribution(id: ContributionId) -> Self {
        Self::new(EntityKind::Contribution, id)
    }

    pub fn user(id: UserId) -> Self {
        Self::new(EntityKind::User, id)
    }

    pub fn system() -> Self {
        Self::new(EntityKind::System, "system")
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
