//! Bounded text context for the completion service.
//!
//! The feed can hold thousands of messages; the context keeps at most
//! `max_messages_per_member` per member, in feed order, so the prompt size
//! depends on the number of members rather than the number of messages.

use crate::types::{MemberSummary, Message, MessageBatch};
use serde_json::Value;
use std::collections::HashMap;

/// Returned when the input is neither a `{items: [...]}` object nor a list.
pub const NO_VALID_DATA: &str = "No valid member data available.";

pub const DEFAULT_MAX_MESSAGES_PER_MEMBER: usize = 10;
pub const DEFAULT_PREVIEW_CHARS: usize = 800;
const LATEST_MESSAGE_CHARS: usize = 100;

/// Group messages by member, keeping first-seen member order and feed order
/// within each member.
pub fn group_by_member(items: &[Message]) -> Vec<(&str, Vec<&Message>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Message>)> = Vec::new();

    for msg in items {
        let name = msg.user_name.as_str();
        match slots.get(name) {
            Some(&i) => groups[i].1.push(msg),
            None => {
                slots.insert(name, groups.len());
                groups.push((name, vec![msg]));
            }
        }
    }
    groups
}

/// First `max_chars` Unicode scalar values of `s`.
fn char_prefix(s: &str, max_chars: usize) -> &str {
    let byte_end = s
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..byte_end]
}

/// Latest message (cut to 100 characters) and its timestamp, compared
/// lexically. Messages without a timestamp never win.
pub(crate) fn latest_of<'a>(messages: impl IntoIterator<Item = &'a Message>) -> (String, String) {
    let mut latest_message = String::new();
    let mut latest_timestamp = String::new();
    for msg in messages {
        if msg.timestamp_str() > latest_timestamp.as_str() {
            latest_message = char_prefix(&msg.message, LATEST_MESSAGE_CHARS).to_string();
            latest_timestamp = msg.timestamp_str().to_string();
        }
    }
    (latest_message, latest_timestamp)
}

fn date_label(msg: &Message) -> &str {
    match msg.timestamp.as_deref() {
        Some(ts) if !ts.is_empty() => char_prefix(ts, 10),
        _ => "Unknown date",
    }
}

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    pub max_messages_per_member: usize,
    pub preview_chars: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            max_messages_per_member: DEFAULT_MAX_MESSAGES_PER_MEMBER,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl ContextBuilder {
    pub fn new(max_messages_per_member: usize) -> Self {
        Self {
            max_messages_per_member,
            ..Default::default()
        }
    }

    /// Render a batch as the per-member document sent to the model.
    pub fn build(&self, batch: &MessageBatch) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.push(format!("Member Data System - {} total messages", batch.total));
        parts.push("=".repeat(50));

        for (name, messages) in group_by_member(&batch.items) {
            parts.push(format!("\nMEMBER: {}", name));
            parts.push("-".repeat(30));

            for msg in messages.iter().take(self.max_messages_per_member) {
                parts.push(format!("[{}] {}", date_label(msg), msg.message));
            }

            if messages.len() > self.max_messages_per_member {
                parts.push(format!(
                    "... and {} more messages",
                    messages.len() - self.max_messages_per_member
                ));
            }

            parts.push(String::new());
        }

        parts.join("\n")
    }

    /// Same as [`build`](Self::build), for raw JSON of unknown shape.
    pub fn build_from_value(&self, value: &Value) -> String {
        match MessageBatch::from_value(value) {
            Some(batch) => self.build(&batch),
            None => NO_VALID_DATA.to_string(),
        }
    }

    /// Per-member message counts and the latest message by timestamp.
    pub fn summarize(&self, batch: &MessageBatch) -> Vec<MemberSummary> {
        group_by_member(&batch.items)
            .into_iter()
            .map(|(name, messages)| {
                let (latest_message, latest_timestamp) = latest_of(messages.iter().copied());
                MemberSummary {
                    name: name.to_string(),
                    message_count: messages.len(),
                    latest_message,
                    latest_timestamp,
                    categories: None,
                }
            })
            .collect()
    }

    /// Leading slice of a rendered context for display.
    pub fn preview(&self, context: &str) -> String {
        format!("{}...", char_prefix(context, self.preview_chars))
    }
}
