//! Offline information extraction from member messages.
//!
//! Each message is run through an ordered table of case-insensitive regex
//! rules ([`rules::default_rules`]). Every rule is applied independently, so
//! one message can feed several categories. Recall is traded for zero
//! external dependencies and explainable output.

pub mod profile;
pub mod rules;

pub use profile::{MemberIndex, MemberProfile, ProfileBuilder};
pub use rules::{Category, DedupPolicy, ExtractionRule, PostProcess};

use crate::error::{ConciergeError, Result};
use crate::types::Message;
use regex::Regex;

/// A message containing any of these (lower-cased substring test) is
/// recorded verbatim as a request.
pub const REQUEST_KEYWORDS: [&str; 5] = ["book", "reserve", "arrange", "need", "tickets"];

pub fn is_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    REQUEST_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<ExtractionRule>,
    filler: Regex,
}

impl Extractor {
    /// Extractor with the standard rule table.
    pub fn new() -> Result<Self> {
        Self::with_rules(rules::default_rules()?)
    }

    pub fn with_rules(rules: Vec<ExtractionRule>) -> Result<Self> {
        let filler = Regex::new(rules::FILLER_WORDS)
            .map_err(|e| ConciergeError::Validation(format!("invalid filler pattern: {}", e)))?;
        Ok(Self { rules, filler })
    }

    /// Fold one message's findings into `profile`. Not idempotent: fields
    /// without dedup grow on every call.
    pub fn extract(&self, message: &Message, profile: &mut MemberProfile) {
        let text = message.message.as_str();

        for rule in &self.rules {
            for value in rule.candidates(text, &self.filler) {
                if !rule.dedup.admits(profile.field(rule.category), &value) {
                    continue;
                }
                if rule.category == Category::Travel {
                    profile.travel.push(format!("Trip to {}", value));
                }
                profile.field_mut(rule.category).push(value);
            }
        }

        if is_request(text) {
            profile.requests.push(message.message.clone());
        }
    }
}
