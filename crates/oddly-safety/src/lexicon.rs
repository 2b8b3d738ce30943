//! Keyword lexicon.
//!
//! Category term tables are data, not code: they live behind a lock and can
//! be extended at runtime, so tuning the screener never means redeploying
//! scoring logic.

use crate::Category;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// One weighted phrase in a category table.
#[derive(Clone, Debug)]
pub struct Term {
    pub phrase: String,
    pub weight: f64,
}

impl Term {
    fn new(phrase: &str, weight: f64) -> Self {
        Self {
            phrase: phrase.to_string(),
            weight,
        }
    }
}

/// Per-category keyword tables plus the spam shape heuristics.
pub struct Lexicon {
    terms: RwLock<HashMap<Category, Vec<Term>>>,
    repeated_punctuation: Regex,
}

impl Lexicon {
    /// Create a lexicon with the built-in tables.
    pub fn new() -> Self {
        let lexicon = Self {
            terms: RwLock::new(HashMap::new()),
            // Three or more bangs/question marks in a row reads as shouting.
            repeated_punctuation: Regex::new(r"[!?]{3,}").expect("static regex"),
        };
        lexicon.load_builtin_terms();
        lexicon
    }

    fn load_builtin_terms(&self) {
        let mut terms = self.terms.write();

        terms.insert(
            Category::Harassment,
            vec![
                Term::new("worthless", 0.6),
                Term::new("pathetic", 0.5),
                Term::new("nobody wants you", 0.8),
                Term::new("get lost", 0.4),
                Term::new("you are a failure", 0.6),
            ],
        );

        terms.insert(
            Category::Hate,
            vec![
                Term::new("subhuman", 0.9),
                Term::new("go back to your country", 0.9),
                Term::new("your kind", 0.5),
                Term::new("vermin", 0.7),
            ],
        );

        terms.insert(
            Category::SelfHarm,
            vec![
                Term::new("suicide", 0.8),
                Term::new("self-harm", 0.8),
                Term::new("end my life", 0.9),
                Term::new("hurt myself", 0.8),
                Term::new("no reason to live", 0.9),
            ],
        );

        terms.insert(
            Category::Violence,
            vec![
                Term::new("kill you", 0.9),
                Term::new("beat you up", 0.8),
                Term::new("hunt you down", 0.8),
                Term::new("bomb", 0.7),
                Term::new("shoot", 0.6),
            ],
        );

        terms.insert(
            Category::Sexual,
            vec![
                Term::new("sexual favors", 0.8),
                Term::new("explicit photos", 0.7),
                Term::new("nsfw", 0.4),
            ],
        );

        terms.insert(
            Category::Spam,
            vec![
                Term::new("free money", 0.7),
                Term::new("click here", 0.5),
                Term::new("limited time offer", 0.6),
                Term::new("guaranteed returns", 0.7),
                Term::new("crypto giveaway", 0.8),
            ],
        );
    }

    /// Extend a category table at runtime.
    pub fn add_term(&self, category: Category, phrase: &str, weight: f64) {
        self.terms
            .write()
            .entry(category)
            .or_default()
            .push(Term::new(phrase, weight.clamp(0.0, 1.0)));
    }

    /// Score content against every category table. Each score is in
    /// [0, 1]: the strongest matched term, nudged up 0.1 per additional
    /// match.
    pub fn score(&self, content: &str) -> BTreeMap<Category, f64> {
        let lowered = content.to_lowercase();
        let tables = self.terms.read();

        let mut scores = BTreeMap::new();
        for category in Category::ALL {
            let matched: Vec<&Term> = tables
                .get(&category)
                .map(|terms| {
                    terms
                        .iter()
                        .filter(|t| lowered.contains(&t.phrase))
                        .collect()
                })
                .unwrap_or_default();

            let mut score = match matched.iter().map(|t| t.weight).fold(0.0f64, f64::max) {
                max if max > 0.0 => max + 0.1 * (matched.len() as f64 - 1.0),
                _ => 0.0,
            };

            if category == Category::Spam {
                score += self.spam_shape_score(content);
            }

            scores.insert(category, score.clamp(0.0, 1.0));
        }
        scores
    }

    /// Shape heuristics that apply to spam regardless of vocabulary.
    fn spam_shape_score(&self, content: &str) -> f64 {
        let mut score = 0.0;

        if self.repeated_punctuation.is_match(content) {
            score += 0.2;
        }

        let alpha: Vec<char> = content.chars().filter(|c| c.is_alphabetic()).collect();
        if alpha.len() > 20 {
            let upper = alpha.iter().filter(|c| c.is_uppercase()).count();
            if upper as f64 / alpha.len() as f64 > 0.6 {
                score += 0.3;
            }
        }

        score
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}
