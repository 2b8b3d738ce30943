//! # Oddly Ledger
//!
//! Proportional bounty payout:
//!
//! - **Split calculation**: each contribution's share of a fixed bounty by
//!   relative token value, preserving contribution order
//! - **Distribution**: materializes a computed split as pending payment
//!   rows in one all-or-nothing batch
//!
//! Percentages and amounts use plain floating-point division; their sums
//! match 100 and the bounty amount only up to rounding. This is accepted
//! behavior, not something the calculator corrects.

pub mod split;

pub use split::{split_shares, SplitCalculator, SplitShare};
