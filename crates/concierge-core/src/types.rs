use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single member service-request message as served by the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Display name of the member who sent the message. Also the grouping key.
    pub user_name: String,

    /// Raw message text, never rewritten.
    pub message: String,

    /// ISO-like timestamp. Lexically sortable when present.
    #[serde(default)]
    pub timestamp: Option<String>,

    /// Upstream identifier. Opaque to this crate.
    #[serde(default)]
    pub id: Value,
}

impl Message {
    pub fn new(user_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            message: message.into(),
            timestamp: None,
            id: Value::Null,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    /// Lenient conversion from one feed item. Items without a string
    /// `user_name` and `message` are not messages.
    pub fn from_value(item: &Value) -> Option<Self> {
        let obj = item.as_object()?;
        let user_name = obj.get("user_name")?.as_str()?;
        let message = obj.get("message")?.as_str()?;
        Some(Self {
            user_name: user_name.to_string(),
            message: message.to_string(),
            timestamp: obj
                .get("timestamp")
                .and_then(Value::as_str)
                .map(str::to_string),
            id: obj.get("id").cloned().unwrap_or(Value::Null),
        })
    }

    /// Timestamp or the empty string, for lexical comparisons.
    pub fn timestamp_str(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }
}

/// One full snapshot of the upstream feed. Replaced wholesale on refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageBatch {
    /// Total reported by the upstream. May exceed `items.len()` when the
    /// feed is paginated.
    pub total: u64,
    pub items: Vec<Message>,
}

impl MessageBatch {
    pub fn new(items: Vec<Message>) -> Self {
        Self {
            total: items.len() as u64,
            items,
        }
    }

    /// Accepts either `{"total": n, "items": [...]}` or a bare array of items.
    /// Returns `None` for any other shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        let (items, total) = match value {
            Value::Object(map) => {
                let items = map.get("items")?.as_array()?;
                let total = map
                    .get("total")
                    .and_then(Value::as_u64)
                    .unwrap_or(items.len() as u64);
                (items, total)
            }
            Value::Array(items) => (items, items.len() as u64),
            _ => return None,
        };

        Some(Self {
            total,
            items: items.iter().filter_map(Message::from_value).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// What a caller gets back for one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResult {
    pub answer: String,

    /// Heuristic score in [0.1, 1.0]. Only the LLM strategy produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_used: Option<Vec<String>>,
}

impl AnswerResult {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            confidence: None,
            sources_used: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_sources(mut self, sources: &[&str]) -> Self {
        self.sources_used = Some(sources.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// An answer plus the bookkeeping behind it.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerDetail {
    #[serde(flatten)]
    pub result: AnswerResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,

    /// Token usage as reported by the completion service, passed through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,

    /// Characters of context sent to the model, or messages scanned by the
    /// local strategy.
    pub context_length: usize,

    #[serde(rename = "timestamp")]
    pub generated_at: DateTime<Utc>,
}

/// Per-member category lists, only filled by the local strategy.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategorySummary {
    pub restaurants: Vec<String>,
    pub locations: Vec<String>,
    pub preferences: Vec<String>,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemberSummary {
    pub name: String,
    pub message_count: usize,
    /// Most recent message by lexical timestamp, cut to 100 characters.
    pub latest_message: String,
    pub latest_timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategorySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberOverview {
    pub total_messages: u64,
    pub unique_members: usize,
    pub members: Vec<MemberSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_preview: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_from_paginated_object() {
        let value = json!({
            "total": 3349,
            "items": [
                {"user_name": "Sophia Al-Farsi", "message": "Book a table", "timestamp": "2024-05-01T10:00:00", "id": "a1"},
                {"user_name": "Fatima El-Tahir", "message": "Need tickets"}
            ]
        });

        let batch = MessageBatch::from_value(&value).unwrap();
        assert_eq!(batch.total, 3349);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.items[0].timestamp.as_deref(), Some("2024-05-01T10:00:00"));
        assert_eq!(batch.items[0].id, json!("a1"));
        assert_eq!(batch.items[1].timestamp, None);
    }

    #[test]
    fn test_batch_from_bare_array_skips_incomplete_items() {
        let value = json!([
            {"user_name": "Layla Kawaguchi", "message": "Hello"},
            {"user_name": "Layla Kawaguchi"},
            "not an item",
            {"message": "orphan"}
        ]);

        let batch = MessageBatch::from_value(&value).unwrap();
        assert_eq!(batch.total, 4);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_batch_rejects_other_shapes() {
        assert!(MessageBatch::from_value(&json!({})).is_none());
        assert!(MessageBatch::from_value(&json!("abc")).is_none());
        assert!(MessageBatch::from_value(&Value::Null).is_none());
        assert!(MessageBatch::from_value(&json!({"items": "nope"})).is_none());
    }

    #[test]
    fn test_answer_result_serialization_skips_missing_fields() {
        let plain = serde_json::to_value(AnswerResult::new("hi")).unwrap();
        assert_eq!(plain, json!({"answer": "hi"}));

        let full = AnswerResult::new("hi")
            .with_confidence(0.8)
            .with_sources(&["member_data_api"]);
        let value = serde_json::to_value(full).unwrap();
        assert_eq!(value["sources_used"], json!(["member_data_api"]));
    }
}
