//! # Oddly Compliance
//!
//! Rule-based governance checks over challenges and payouts:
//!
//! - **Heartbeat**: a fixed battery of independent checks reduced to one
//!   traffic-light status
//! - **Payout validation**: hard violations vs soft warnings for a payout
//!   proposal
//! - **IR35 assessment**: working-practices factor battery for contractor
//!   status
//!
//! Bad business states (missing manifest, pending KYC, unsigned proposal)
//! are first-class results here, never errors. Only absent entities and
//! store failures propagate as `Err`.

pub mod heartbeat;
pub mod ir35;
pub mod payout;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use heartbeat::{Heartbeat, HeartbeatEvaluator};
pub use ir35::{Ir35Assessment, Ir35Assessor, Ir35Determination, Ir35Factor};
pub use payout::{PayoutValidation, PayoutValidator};

/// Traffic-light status of a single compliance check.
///
/// Ordered so that reduction over a battery is just `max`: any Red makes
/// the whole heartbeat Red, otherwise any Amber makes it Amber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Green,
    Amber,
    Red,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Green => write!(f, "GREEN"),
            CheckStatus::Amber => write!(f, "AMBER"),
            CheckStatus::Red => write!(f, "RED"),
        }
    }
}

/// One named check result inside a heartbeat.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks_action: Option<bool>,
}

impl ComplianceCheck {
    pub fn new(name: &str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            details: details.into(),
            blocks_action: match status {
                CheckStatus::Red => Some(true),
                _ => None,
            },
        }
    }
}

/// Reduce a battery of checks: any Red wins, then any Amber, else Green.
pub fn reduce_checks(checks: &[ComplianceCheck]) -> CheckStatus {
    checks
        .iter()
        .map(|c| c.status)
        .max()
        .unwrap_or(CheckStatus::Green)
}
