use super::{validate_question, AnswerEngine, Strategy, SOURCE_MEMBER_DATA, SOURCE_PATTERNS};
use crate::error::Result;
use crate::extract::{Extractor, MemberIndex, MemberProfile, ProfileBuilder};
use crate::resolve::NameResolver;
use crate::store::{MessageSource, MessageStore};
use crate::types::{AnswerDetail, AnswerResult, MemberOverview, MemberSummary};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

pub const NO_MEMBER_DATA: &str = "No member data is currently available.";

/// Member names listed when the subject of a question can't be identified.
const LISTED_MEMBERS: usize = 10;

/// Question topics in match priority. The first topic with a keyword
/// contained in the lower-cased question decides the answer template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Restaurant,
    Travel,
    Preference,
    Activity,
    Vehicle,
    General,
}

const TOPIC_KEYWORDS: [(Topic, &[&str]); 5] = [
    (
        Topic::Restaurant,
        &["restaurant", "restaurants", "dining", "eat", "food", "table"],
    ),
    (
        Topic::Travel,
        &["trip", "travel", "visit", "vacation", "where", "location"],
    ),
    (Topic::Preference, &["prefer", "preference", "like", "favorite"]),
    (
        Topic::Activity,
        &["activity", "activities", "tickets", "event", "show"],
    ),
    (Topic::Vehicle, &["car", "cars", "vehicle", "how many"]),
];

impl Topic {
    pub fn classify(question: &str) -> Self {
        let lower = question.to_lowercase();
        TOPIC_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }
}

fn first_n(values: &[String], n: usize) -> String {
    values.iter().take(n).map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Answer template for one resolved member.
pub fn respond(topic: Topic, profile: &MemberProfile) -> String {
    let name = &profile.name;
    match topic {
        Topic::Restaurant if !profile.restaurants.is_empty() => format!(
            "{} has made reservations at: {}.",
            name,
            first_n(&profile.restaurants, 5)
        ),
        Topic::Restaurant => format!("I don't have restaurant reservation information for {}.", name),

        Topic::Travel if !profile.locations.is_empty() => format!(
            "{} has traveled to or mentioned: {}.",
            name,
            first_n(&profile.locations, 5)
        ),
        Topic::Travel if !profile.travel.is_empty() => {
            format!("{}'s travel activities: {}.", name, first_n(&profile.travel, 3))
        }
        Topic::Travel => format!("I don't have travel information for {}.", name),

        Topic::Preference if !profile.preferences.is_empty() => {
            format!("{}'s preferences: {}.", name, first_n(&profile.preferences, 3))
        }
        Topic::Preference => format!("I don't have preference information for {}.", name),

        Topic::Activity if !profile.activities.is_empty() => format!(
            "{} has requested tickets/activities for: {}.",
            name,
            first_n(&profile.activities, 3)
        ),
        Topic::Activity => format!("I don't have activity information for {}.", name),

        Topic::Vehicle => format!(
            "I don't have vehicle ownership information for {} in the current dataset.",
            name
        ),

        Topic::General if !profile.has_categorized_info() => format!(
            "I have {} messages from {}, but no specific categorized information extracted yet.",
            profile.messages.len(),
            name
        ),
        Topic::General => {
            let parts: Vec<String> = [
                ("restaurants", &profile.restaurants),
                ("locations", &profile.locations),
                ("preferences", &profile.preferences),
            ]
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(label, values)| format!("{}: {}", label, first_n(values, 2)))
            .collect();
            format!("Here's what I know about {}: {}.", name, parts.join("; "))
        }
    }
}

/// Reply when no member could be resolved from the question.
pub fn unidentified(index: &MemberIndex) -> String {
    if index.is_empty() {
        return NO_MEMBER_DATA.to_string();
    }
    let names: Vec<&str> = index.names().take(LISTED_MEMBERS).collect();
    let more = if index.len() > LISTED_MEMBERS { "..." } else { "" };
    format!(
        "I couldn't identify which member you're asking about. Available members: {}{}",
        names.join(", "),
        more
    )
}

/// Answers from regex-extracted member profiles, without any model.
pub struct LocalEngine<S: MessageSource> {
    store: Arc<MessageStore<S>>,
    profiles: ProfileBuilder,
    resolver: NameResolver,
}

impl<S: MessageSource> LocalEngine<S> {
    pub fn new(store: Arc<MessageStore<S>>) -> Result<Self> {
        Ok(Self {
            store,
            profiles: ProfileBuilder::new(Extractor::new()?),
            resolver: NameResolver::new()?,
        })
    }

    pub fn store(&self) -> &Arc<MessageStore<S>> {
        &self.store
    }

    /// Answer text for a question against an already built index.
    pub fn respond_to(&self, question: &str, index: &MemberIndex) -> String {
        let Some(name) = self.resolver.resolve(question, index) else {
            log::debug!("no member resolved for question");
            return unidentified(index);
        };
        match index.get(&name) {
            Some(profile) => respond(Topic::classify(question), profile),
            None => unidentified(index),
        }
    }
}

#[async_trait]
impl<S: MessageSource> AnswerEngine for LocalEngine<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Local
    }

    async fn answer_detailed(&self, question: &str) -> Result<AnswerDetail> {
        let question = validate_question(question)?;
        let batch = self.store.get().await?;
        let index = self.profiles.build(&batch);

        Ok(AnswerDetail {
            result: AnswerResult::new(self.respond_to(question, &index))
                .with_sources(&[SOURCE_MEMBER_DATA, SOURCE_PATTERNS]),
            model_used: None,
            usage: None,
            context_length: batch.len(),
            generated_at: Utc::now(),
        })
    }

    async fn members(&self) -> Result<MemberOverview> {
        let batch = self.store.get().await?;
        let index = self.profiles.build(&batch);
        let members: Vec<MemberSummary> = index.iter().map(MemberProfile::summary).collect();

        Ok(MemberOverview {
            total_messages: batch.total,
            unique_members: members.len(),
            members,
            context_preview: None,
        })
    }
}
