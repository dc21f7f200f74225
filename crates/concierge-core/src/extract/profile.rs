use super::rules::Category;
use super::Extractor;
use crate::context::latest_of;
use crate::types::{CategorySummary, MemberSummary, MessageBatch, Message};
use serde::Serialize;
use std::collections::HashMap;

/// Everything extracted for one member during a single pass over the feed.
/// Derived data: rebuilt from scratch after every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberProfile {
    pub name: String,
    pub messages: Vec<Message>,
    pub requests: Vec<String>,
    pub preferences: Vec<String>,
    pub locations: Vec<String>,
    pub activities: Vec<String>,
    pub restaurants: Vec<String>,
    pub travel: Vec<String>,
    pub other_info: Vec<String>,
}

impl MemberProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, category: Category) -> &Vec<String> {
        match category {
            Category::Travel => &self.locations,
            Category::Restaurant => &self.restaurants,
            Category::Preference => &self.preferences,
            Category::Activity => &self.activities,
        }
    }

    pub fn field_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Travel => &mut self.locations,
            Category::Restaurant => &mut self.restaurants,
            Category::Preference => &mut self.preferences,
            Category::Activity => &mut self.activities,
        }
    }

    pub fn has_categorized_info(&self) -> bool {
        !self.restaurants.is_empty() || !self.locations.is_empty() || !self.preferences.is_empty()
    }

    pub fn summary(&self) -> MemberSummary {
        let (latest_message, latest_timestamp) = latest_of(&self.messages);
        MemberSummary {
            name: self.name.clone(),
            message_count: self.messages.len(),
            latest_message,
            latest_timestamp,
            categories: Some(CategorySummary {
                restaurants: self.restaurants.clone(),
                locations: self.locations.clone(),
                preferences: self.preferences.clone(),
                activities: self.activities.clone(),
            }),
        }
    }
}

/// Profiles keyed by member name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberIndex {
    profiles: Vec<MemberProfile>,
    slots: HashMap<String, usize>,
}

impl MemberIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&MemberProfile> {
        self.slots.get(name).map(|&i| &self.profiles[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Profile for `name`, created empty on first sight.
    pub fn entry(&mut self, name: &str) -> &mut MemberProfile {
        let i = match self.slots.get(name) {
            Some(&i) => i,
            None => {
                self.slots.insert(name.to_string(), self.profiles.len());
                self.profiles.push(MemberProfile::new(name));
                self.profiles.len() - 1
            }
        };
        &mut self.profiles[i]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn message_count(&self) -> usize {
        self.profiles.iter().map(|p| p.messages.len()).sum()
    }
}

/// Groups a batch by member and runs the extractor over every message in
/// the same pass.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    extractor: Extractor,
}

impl ProfileBuilder {
    pub fn new(extractor: Extractor) -> Self {
        Self { extractor }
    }

    pub fn build(&self, batch: &MessageBatch) -> MemberIndex {
        let mut index = MemberIndex::new();
        for msg in &batch.items {
            let profile = index.entry(&msg.user_name);
            profile.messages.push(msg.clone());
            self.extractor.extract(msg, profile);
        }
        log::debug!(
            "built {} member profiles from {} messages",
            index.len(),
            batch.len()
        );
        index
    }
}
