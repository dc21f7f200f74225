//! Maps a free-text question onto a known member name.

use crate::error::{ConciergeError, Result};
use crate::extract::MemberIndex;
use regex::Regex;

/// Capitalised-name patterns in priority order. Full "First Last" forms come
/// before single tokens; the first pattern that produces a hit wins.
const NAME_PATTERNS: [&str; 7] = [
    r"\b([A-Z][a-z]+ [A-Z][a-z-']+)\b",
    r"\b([A-Z][a-z]+)\s+(?:planning|has|have|owns?|likes?|is|'s)\b",
    r"\b(?:is|does)\s+([A-Z][a-z]+ [A-Z][a-z-']+)\b",
    r"\b(?:is|does)\s+([A-Z][a-z]+)\b",
    r"\b([A-Z][a-z]+)'s\b",
    r"(?:about|of)\s+([A-Z][a-z]+ [A-Z][a-z-']+)",
    r"(?:about|of)\s+([A-Z][a-z]+)",
];

#[derive(Debug, Clone)]
pub struct NameResolver {
    patterns: Vec<Regex>,
}

impl NameResolver {
    pub fn new() -> Result<Self> {
        let patterns = NAME_PATTERNS
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ConciergeError::Validation(format!("invalid name pattern {:?}: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Resolve the member a question is about.
    pub fn resolve(&self, question: &str, index: &MemberIndex) -> Option<String> {
        for pattern in &self.patterns {
            let Some(caps) = pattern.captures(question) else {
                continue;
            };
            let Some(m) = caps.get(1) else {
                continue;
            };
            let candidate = m.as_str().replace("'s", "");

            if index.contains(&candidate) {
                return Some(candidate);
            }

            if let Some(name) = fuzzy_match(&candidate, index.names()) {
                log::debug!("resolved {:?} to {:?} by token match", candidate, name);
                return Some(name.to_string());
            }
        }
        None
    }
}

/// First known name sharing a token with `candidate`, where tokens match if
/// equal or one contains the other, ignoring case.
fn fuzzy_match<'a>(candidate: &str, names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let wanted: Vec<String> = candidate.split_whitespace().map(str::to_lowercase).collect();

    for name in names {
        let hit = name.split_whitespace().map(str::to_lowercase).any(|part| {
            wanted
                .iter()
                .any(|w| *w == part || part.contains(w.as_str()) || w.contains(part.as_str()))
        });
        if hit {
            return Some(name);
        }
    }
    None
}
