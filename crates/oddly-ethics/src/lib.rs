//! # Oddly Ethics
//!
//! Distributional fairness over realized payouts:
//!
//! - **Gini coefficient** over payout shares
//! - **Ethics audit**: named red/yellow/green flags from threshold rules
//!   plus a fairness score
//! - **Reputation**: contributor standing derived from activity and
//!   safety incidents
//!
//! The flag -> score penalty is a tunable policy, not a contract; the
//! guaranteed properties are that more red flags never increase the score
//! and that a perfectly equal payout with no flags scores exactly 1.0.

pub mod audit;
pub mod gini;
pub mod reputation;

pub use audit::{EthicsAuditReport, EthicsAuditor, Recommendation};
pub use gini::{fairness_score, gini_coefficient};
pub use reputation::ReputationScorer;
