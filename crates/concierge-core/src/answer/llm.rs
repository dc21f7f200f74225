use super::{
    estimate_confidence, validate_question, AnswerEngine, Strategy, SOURCE_AI, SOURCE_MEMBER_DATA,
};
use crate::completion::{CompletionClient, CompletionRequest};
use crate::context::ContextBuilder;
use crate::error::Result;
use crate::store::{MessageSource, MessageStore};
use crate::types::{AnswerDetail, AnswerResult, MemberOverview};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

pub const SYSTEM_PROMPT: &str = r#"You are a precise data analyst for a luxury concierge service. Your job is to extract and report specific information from member service requests.

ANALYSIS RULES:
1. Answer ONLY with information explicitly stated in the member messages
2. Quote specific dates, locations, restaurant names, and request details exactly as written
3. If asked about preferences, extract them word-for-word from the messages
4. For "how many" questions, count actual occurrences in the data
5. For comparison questions, analyze all relevant members' data
6. If information doesn't exist in the messages, state: "No information available in the data"

RESPONSE FORMAT:
- Give direct, factual answers without speculation
- Include specific dates, numbers, and names when available
- Use bullet points or numbered lists for multiple items
- Cite member names exactly as they appear in the data
- For trends/patterns, only mention what can be directly observed

WHAT TO EXTRACT:
- Restaurant reservations (name, date, party size)
- Travel requests (destinations, dates, accommodation types)
- Event tickets (venue, event type, quantity, dates)
- Personal preferences (exact wording from messages)
- Service feedback (positive/negative, specific comments)
- Contact updates (phone numbers, addresses)
- Special requirements (dietary, accessibility, room preferences)

DO NOT:
- Make assumptions beyond what's explicitly stated
- Generalize from limited data
- Add interpretive language like "seems to prefer" - use "requested" or "stated preference for"
- Include information not present in the member messages"#;

pub fn user_prompt(context: &str, question: &str) -> String {
    format!(
        "Member Service Data:\n{}\n\nQuestion: {}\n\nPlease analyze the member messages above and answer the question. \
         Focus on extracting relevant information from the actual messages and requests made by the members.",
        context, question
    )
}

/// Where a question got to before it finished or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NeedContext,
    NeedCompletion,
    Done,
}

/// Answers by sending the bounded member context to a completion service.
pub struct LlmEngine<S: MessageSource, C: CompletionClient> {
    store: Arc<MessageStore<S>>,
    client: C,
    context: ContextBuilder,
}

impl<S: MessageSource, C: CompletionClient> LlmEngine<S, C> {
    pub fn new(store: Arc<MessageStore<S>>, client: C) -> Self {
        Self {
            store,
            client,
            context: ContextBuilder::default(),
        }
    }

    pub fn with_context_builder(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    pub fn store(&self) -> &Arc<MessageStore<S>> {
        &self.store
    }

    async fn run(&self, question: &str, phase: &mut Phase) -> Result<AnswerDetail> {
        let batch = self.store.get().await?;
        let context = self.context.build(&batch);
        *phase = Phase::NeedCompletion;

        let request = CompletionRequest::new(SYSTEM_PROMPT, user_prompt(&context, question));
        let completion = self.client.complete(&request).await?;
        *phase = Phase::Done;

        let confidence = estimate_confidence(&completion.content);
        Ok(AnswerDetail {
            result: AnswerResult::new(completion.content)
                .with_confidence(confidence)
                .with_sources(&[SOURCE_MEMBER_DATA, SOURCE_AI]),
            model_used: Some(completion.model),
            usage: completion.usage,
            context_length: context.chars().count(),
            generated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl<S: MessageSource, C: CompletionClient> AnswerEngine for LlmEngine<S, C> {
    fn strategy(&self) -> Strategy {
        Strategy::Llm
    }

    fn model(&self) -> Option<&str> {
        Some(self.client.model())
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn answer_detailed(&self, question: &str) -> Result<AnswerDetail> {
        let question = validate_question(question)?;

        let mut phase = Phase::NeedContext;
        let outcome = self.run(question, &mut phase).await;
        match &outcome {
            Ok(detail) => log::debug!(
                "answered with confidence {:?} from {} chars of context",
                detail.result.confidence,
                detail.context_length
            ),
            Err(e) => log::warn!("question failed at {:?}: {}", phase, e),
        }
        outcome
    }

    async fn members(&self) -> Result<MemberOverview> {
        let batch = self.store.get().await?;
        let members = self.context.summarize(&batch);
        let context = self.context.build(&batch);

        Ok(MemberOverview {
            total_messages: batch.total,
            unique_members: members.len(),
            members,
            context_preview: Some(self.context.preview(&context)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Completion;
    use crate::error::ConciergeError;
    use crate::store::testing::StaticSource;
    use crate::types::{Message, MessageBatch};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records requests and replays a canned answer.
    struct ScriptedClient {
        reply: std::result::Result<String, fn() -> ConciergeError>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(make: fn() -> ConciergeError) -> Self {
            Self {
                reply: Err(make),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        fn model(&self) -> &str {
            "scripted"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(Completion {
                    content: text.clone(),
                    usage: Some(json!({"total_tokens": 42})),
                    model: "scripted".into(),
                }),
                Err(make) => Err(make()),
            }
        }
    }

    fn store() -> Arc<MessageStore<StaticSource>> {
        Arc::new(MessageStore::new(StaticSource::new(MessageBatch::new(vec![
            Message::new("Layla Kawaguchi", "Arrange a weekend in Lisbon").with_timestamp("2025-04-02T10:00:00"),
            Message::new("Armand Dupont", "Reserve a table at Le Bernardin").with_timestamp("2025-04-03T10:00:00"),
        ]))))
    }

    #[tokio::test]
    async fn test_answer_carries_confidence_and_sources() {
        let engine = LlmEngine::new(store(), ScriptedClient::answering("Layla requested Lisbon on 2025-04-02."));

        let result = engine.answer("Where is Layla going?").await.unwrap();
        assert_eq!(result.answer, "Layla requested Lisbon on 2025-04-02.");
        assert_eq!(result.confidence, Some(1.0));
        assert_eq!(
            result.sources_used,
            Some(vec!["member_data_api".to_string(), "ai_processing".to_string()])
        );
    }

    #[tokio::test]
    async fn test_prompt_embeds_context_and_question() {
        let engine = LlmEngine::new(store(), ScriptedClient::answering("ok"));
        let detail = engine.answer_detailed("Who booked Le Bernardin?").await.unwrap();

        let seen = engine.client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages[0].role, "system");
        assert_eq!(seen[0].messages[0].content, SYSTEM_PROMPT);

        let user = &seen[0].messages[1].content;
        assert!(user.starts_with("Member Service Data:\nMember Data System - 2 total messages"));
        assert!(user.contains("[2025-04-03] Reserve a table at Le Bernardin"));
        assert!(user.contains("\n\nQuestion: Who booked Le Bernardin?\n\n"));

        assert_eq!(detail.model_used.as_deref(), Some("scripted"));
        assert_eq!(detail.usage, Some(json!({"total_tokens": 42})));
        assert!(detail.context_length > 0);
    }

    #[tokio::test]
    async fn test_blank_question_skips_fetch() {
        let engine = LlmEngine::new(store(), ScriptedClient::answering("ok"));
        let err = engine.answer("  ").await.unwrap_err();
        assert!(matches!(err, ConciergeError::BadInput(_)));
        assert_eq!(engine.store().source().calls(), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let engine = LlmEngine::new(store(), ScriptedClient::failing(|| ConciergeError::RateLimited));
        let err = engine.answer("Where is Layla going?").await.unwrap_err();
        assert!(matches!(err, ConciergeError::RateLimited));
    }

    #[tokio::test]
    async fn test_upstream_failure_stops_before_completion() {
        let store = Arc::new(MessageStore::new(StaticSource::failing(|| ConciergeError::UpstreamTimeout)));
        let engine = LlmEngine::new(store, ScriptedClient::answering("ok"));

        let err = engine.answer("Where is Layla going?").await.unwrap_err();
        assert!(matches!(err, ConciergeError::UpstreamTimeout));
        assert!(engine.client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_members_overview_has_preview() {
        let engine = LlmEngine::new(store(), ScriptedClient::answering("ok"));
        let overview = engine.members().await.unwrap();

        assert_eq!(overview.total_messages, 2);
        assert_eq!(overview.unique_members, 2);
        assert_eq!(overview.members[0].name, "Layla Kawaguchi");
        let preview = overview.context_preview.unwrap();
        assert!(preview.starts_with("Member Data System"));
        assert!(preview.ends_with("..."));
    }
}
