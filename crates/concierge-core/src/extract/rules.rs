use crate::error::{ConciergeError, Result};
use regex::Regex;

/// Profile field family a rule writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Destinations. Written to `locations`, mirrored into `travel`.
    Travel,
    Restaurant,
    Preference,
    Activity,
}

/// Clean-up applied to a captured value before it is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Keep the capture as-is.
    Raw,
    /// Trim surrounding whitespace.
    Trim,
    /// Drop filler words (`for`, `on`, `tonight`, `this`, `next`, `the`) and
    /// collapse whitespace. Captures differing only in spacing become equal,
    /// so `Exact` dedup merges them.
    StripFiller,
}

/// How a candidate is checked against values already in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Every candidate is appended.
    Allow,
    /// Rejected if an identical string is present.
    Exact,
    /// Rejected if a string equal ignoring case is present.
    CaseInsensitive,
}

impl DedupPolicy {
    pub fn admits(&self, existing: &[String], candidate: &str) -> bool {
        match self {
            Self::Allow => true,
            Self::Exact => !existing.iter().any(|e| e == candidate),
            Self::CaseInsensitive => {
                let lower = candidate.to_lowercase();
                !existing.iter().any(|e| e.to_lowercase() == lower)
            }
        }
    }
}

/// One compiled extraction pattern. The first capture group is the value.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub category: Category,
    pub pattern: Regex,
    pub post: PostProcess,
    /// Candidates need strictly more characters than this.
    pub min_chars: usize,
    pub dedup: DedupPolicy,
}

impl ExtractionRule {
    pub fn new(
        category: Category,
        pattern: &str,
        post: PostProcess,
        min_chars: usize,
        dedup: DedupPolicy,
    ) -> Result<Self> {
        let pattern = Regex::new(&format!("(?i){}", pattern))
            .map_err(|e| ConciergeError::Validation(format!("invalid pattern {:?}: {}", pattern, e)))?;
        Ok(Self {
            category,
            pattern,
            post,
            min_chars,
            dedup,
        })
    }

    pub fn travel(pattern: &str) -> Result<Self> {
        Self::new(Category::Travel, pattern, PostProcess::Raw, 0, DedupPolicy::CaseInsensitive)
    }

    pub fn restaurant(pattern: &str) -> Result<Self> {
        Self::new(Category::Restaurant, pattern, PostProcess::StripFiller, 3, DedupPolicy::Exact)
    }

    pub fn preference(pattern: &str) -> Result<Self> {
        Self::new(Category::Preference, pattern, PostProcess::Trim, 3, DedupPolicy::Allow)
    }

    pub fn activity(pattern: &str) -> Result<Self> {
        Self::new(Category::Activity, pattern, PostProcess::Trim, 3, DedupPolicy::Exact)
    }

    /// Every post-processed capture in `text` that passes the length gate,
    /// in match order. Dedup is left to the caller.
    pub fn candidates(&self, text: &str, filler: &Regex) -> Vec<String> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| match self.post {
                PostProcess::Raw => m.as_str().to_string(),
                PostProcess::Trim => m.as_str().trim().to_string(),
                PostProcess::StripFiller => filler
                    .replace_all(m.as_str(), "")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            })
            .filter(|v| v.chars().count() > self.min_chars)
            .collect()
    }
}

pub(crate) const FILLER_WORDS: &str = r"(?i)\b(?:for|on|tonight|this|next|the)\b";

/// The full rule table in evaluation order. Order decides which rule claims
/// an ambiguous match first, so it must not be rearranged casually.
pub fn default_rules() -> Result<Vec<ExtractionRule>> {
    let mut rules = Vec::new();

    for pat in [
        r"trip to (\w+)",
        r"travel to (\w+)",
        r"visit (\w+)",
        r"going to (\w+)",
        r"tickets to.*in (\w+)",
        r"villa in (\w+)",
        r"tour of .*(\w+)",
        r"weekend in (\w+)",
    ] {
        rules.push(ExtractionRule::travel(pat)?);
    }

    for pat in [
        r"dinner.*at ([\w\s]+)",
        r"table.*at ([\w\s]+)",
        r"reservation at ([\w\s]+)",
        r"restaurant ([\w\s]+)",
    ] {
        rules.push(ExtractionRule::restaurant(pat)?);
    }

    for pat in [
        r"prefer ([\w\s]+)",
        r"preference for ([\w\s]+)",
        r"I.*like ([\w\s]+)",
        r"ensure ([\w\s]+) next time",
    ] {
        rules.push(ExtractionRule::preference(pat)?);
    }

    for pat in [
        r"tickets to ([\w\s]+)",
        r"passes for ([\w\s]+)",
        r"seats for ([\w\s]+)",
        r"book.*(\w+\s+\w+).*for",
        r"arrange.*(\w+\s+\w+)",
    ] {
        rules.push(ExtractionRule::activity(pat)?);
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler() -> Regex {
        Regex::new(FILLER_WORDS).unwrap()
    }

    #[test]
    fn test_rule_table_order() {
        let rules = default_rules().unwrap();
        assert_eq!(rules.len(), 21);
        assert_eq!(rules[0].category, Category::Travel);
        assert_eq!(rules[8].category, Category::Restaurant);
        assert_eq!(rules[12].category, Category::Preference);
        assert_eq!(rules[16].category, Category::Activity);
    }

    #[test]
    fn test_travel_rule_is_case_insensitive() {
        let rule = ExtractionRule::travel(r"villa in (\w+)").unwrap();
        let found = rule.candidates("Please book a VILLA IN Santorini for July", &filler());
        assert_eq!(found, vec!["Santorini".to_string()]);
    }

    #[test]
    fn test_restaurant_rule_strips_filler() {
        let rule = ExtractionRule::restaurant(r"reservation at ([\w\s]+)").unwrap();
        let found = rule.candidates("Make a reservation at the French Laundry this Friday", &filler());
        assert_eq!(found, vec!["French Laundry Friday".to_string()]);
    }

    #[test]
    fn test_length_gate_is_exclusive() {
        let rule = ExtractionRule::preference(r"prefer ([\w\s]+)").unwrap();
        assert!(rule.candidates("I prefer tea", &filler()).is_empty());
        assert_eq!(rule.candidates("I prefer aisle seats", &filler()), vec!["aisle seats"]);
    }

    #[test]
    fn test_dedup_policies() {
        let existing = vec!["Paris".to_string()];
        assert!(!DedupPolicy::CaseInsensitive.admits(&existing, "paris"));
        assert!(DedupPolicy::Exact.admits(&existing, "paris"));
        assert!(!DedupPolicy::Exact.admits(&existing, "Paris"));
        assert!(DedupPolicy::Allow.admits(&existing, "Paris"));
        // Substring containment is never treated as a duplicate.
        assert!(DedupPolicy::Exact.admits(&existing, "Paris Opera"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = ExtractionRule::activity(r"unclosed (group").unwrap_err();
        assert!(matches!(err, ConciergeError::Validation(_)));
    }
}
