/// Phrases that mark an answer as hedged. First hit wins.
const UNCERTAINTY_PHRASES: [&str; 11] = [
    "i don't have",
    "not available",
    "unclear",
    "uncertain",
    "might be",
    "possibly",
    "seems like",
    "appears to",
    "no information",
    "can't find",
    "don't see",
];

/// Literal markers of dates or concrete details. Case-sensitive.
const DETAIL_MARKERS: [&str; 6] = ["2024", "2025", ":", "-", "reservation", "requested"];

const BASE: f32 = 0.8;
const HEDGED: f32 = 0.4;
const SPECIFIC_BONUS: f32 = 0.15;
const DETAIL_BONUS: f32 = 0.1;

/// Heuristic score for a model answer, always in [0.1, 1.0].
///
/// Starts at 0.8, drops to 0.4 on hedging language, then gains +0.15 for
/// any digit or title-case word and +0.1 for any detail marker. Bonuses
/// still apply to hedged answers.
pub fn estimate_confidence(answer: &str) -> f32 {
    let lower = answer.to_lowercase();
    let mut confidence = if UNCERTAINTY_PHRASES.iter().any(|p| lower.contains(p)) {
        HEDGED
    } else {
        BASE
    };

    let has_digit = answer.chars().any(|c| c.is_ascii_digit());
    if has_digit || answer.split_whitespace().any(is_title) {
        confidence = (confidence + SPECIFIC_BONUS).min(1.0);
    }

    if DETAIL_MARKERS.iter().any(|m| answer.contains(m)) {
        confidence = (confidence + DETAIL_BONUS).min(1.0);
    }

    confidence.clamp(0.1, 1.0)
}

/// Title case per word: at least one cased character, uppercase only at the
/// start of a cased run and lowercase only inside one ("Paris", "Al-Farsi",
/// but not "NYC" or "iPhone").
fn is_title(word: &str) -> bool {
    let mut any_cased = false;
    let mut prev_cased = false;

    for c in word.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else {
            prev_cased = false;
        }
    }
    any_cased
}
