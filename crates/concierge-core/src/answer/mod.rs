//! Question answering over the member feed.
//!
//! Two interchangeable strategies implement [`AnswerEngine`]:
//!
//! - [`LlmEngine`] renders a bounded context and asks a completion service.
//! - [`LocalEngine`] extracts structured profiles with regex rules and
//!   answers from fixed templates, without any model.
//!
//! Both reject blank questions before doing any I/O.

pub mod confidence;
pub mod llm;
pub mod local;

pub use confidence::estimate_confidence;
pub use llm::LlmEngine;
pub use local::LocalEngine;

use crate::error::{ConciergeError, Result};
use crate::types::{AnswerDetail, AnswerResult, MemberOverview};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SOURCE_MEMBER_DATA: &str = "member_data_api";
pub const SOURCE_AI: &str = "ai_processing";
pub const SOURCE_PATTERNS: &str = "pattern_extraction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Llm,
    Local,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Llm => write!(f, "llm"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConciergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "local" => Ok(Self::Local),
            other => Err(ConciergeError::Validation(format!(
                "unknown strategy '{}' (expected 'llm' or 'local')",
                other
            ))),
        }
    }
}

#[async_trait]
pub trait AnswerEngine: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Model identifier, when the strategy uses one.
    fn model(&self) -> Option<&str> {
        None
    }

    /// Whether the strategy can run at all with the current credentials.
    fn is_configured(&self) -> bool {
        true
    }

    async fn answer(&self, question: &str) -> Result<AnswerResult> {
        Ok(self.answer_detailed(question).await?.result)
    }

    async fn answer_detailed(&self, question: &str) -> Result<AnswerDetail>;

    async fn members(&self) -> Result<MemberOverview>;
}

/// Reject empty or whitespace-only questions.
pub fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(ConciergeError::BadInput("Question cannot be empty".into()));
    }
    Ok(trimmed)
}
