//! # Oddly Safety
//!
//! Keyword/pattern content moderation:
//!
//! - **Lexicon**: per-category term tables held as data, extensible at
//!   runtime without touching scoring logic
//! - **Screener**: hash-keyed cached analysis plus incident creation for
//!   flagged content
//!
//! Keyword matching is an approximate signal, not a strong safety
//! guarantee; the thresholds and term tables are meant to be tuned.

pub mod lexicon;
pub mod screener;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use lexicon::{Lexicon, Term};
pub use screener::{ContentScreener, ModerationOutcome, ScreenerConfig};

/// Moderated content category.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Harassment,
    Hate,
    SelfHarm,
    Violence,
    Sexual,
    Spam,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Harassment,
        Category::Hate,
        Category::SelfHarm,
        Category::Violence,
        Category::Sexual,
        Category::Spam,
    ];

    /// Weight of this category in the overall score. Self-harm is weighted
    /// highest; the weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Category::SelfHarm => 0.25,
            Category::Hate => 0.20,
            Category::Violence => 0.20,
            Category::Harassment => 0.15,
            Category::Sexual => 0.10,
            Category::Spam => 0.10,
        }
    }

    /// Minimum incident severity when this category trips.
    pub fn min_severity(&self) -> u8 {
        match self {
            Category::SelfHarm | Category::Violence => 3,
            Category::Hate | Category::Harassment | Category::Sexual => 2,
            Category::Spam => 1,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Harassment => write!(f, "harassment"),
            Category::Hate => write!(f, "hate"),
            Category::SelfHarm => write!(f, "self_harm"),
            Category::Violence => write!(f, "violence"),
            Category::Sexual => write!(f, "sexual"),
            Category::Spam => write!(f, "spam"),
        }
    }
}

/// How an analysis result was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    Local,
    Api,
    Manual,
}

/// Safety analysis result contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    pub overall_score: f64,
    pub categories: BTreeMap<Category, f64>,
    pub flagged: bool,
    pub confidence: f64,
    pub detection_method: DetectionMethod,
}
